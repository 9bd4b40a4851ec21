use crate::domain::model::{FilterCriteria, Listing, StatusFilter};

/// Narrows `listings` to those matching every active predicate, keeping order.
///
/// Predicates are independent conjunctions: status, then category, then a
/// case-insensitive substring match over title, description and interests.
/// With no active predicate the input comes back unchanged.
pub fn filter(listings: &[Listing], criteria: &FilterCriteria) -> Vec<Listing> {
    let mut filtered: Vec<Listing> = listings.to_vec();

    if let StatusFilter::Only(status) = criteria.status {
        filtered.retain(|listing| listing.status == status);
    }

    if let Some(category_id) = criteria.category_id.as_deref().filter(|id| !id.is_empty()) {
        if !filtered.is_empty() {
            filtered.retain(|listing| listing.category_id == category_id);
        }
    }

    if !criteria.search_term.is_empty() && !filtered.is_empty() {
        let term = criteria.search_term.to_lowercase();
        filtered.retain(|listing| matches_term(listing, &term));
    }

    filtered
}

fn matches_term(listing: &Listing, folded_term: &str) -> bool {
    listing.title.to_lowercase().contains(folded_term)
        || listing.description.to_lowercase().contains(folded_term)
        || listing
            .interests
            .iter()
            .any(|interest| interest.to_lowercase().contains(folded_term))
}
