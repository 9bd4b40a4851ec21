use crate::core::price_mask;
use crate::domain::model::{Category, Listing};
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// 匯出 CSV 時的一列
#[derive(Debug, Serialize)]
struct ListingRecord<'a> {
    id: &'a str,
    title: &'a str,
    category: &'a str,
    status: &'a str,
    price: String,
    interests: String,
    opportunities: String,
    images: usize,
    created_at: String,
}

impl<'a> From<&'a Listing> for ListingRecord<'a> {
    fn from(listing: &'a Listing) -> Self {
        Self {
            id: &listing.id,
            title: &listing.title,
            category: listing.category_name.as_deref().unwrap_or(&listing.category_id),
            status: listing.status.code(),
            price: price_mask::format_major_units(listing.price),
            interests: listing.interests.join("; "),
            opportunities: listing.opportunities.join("; "),
            images: listing.display_images().len(),
            created_at: listing.created_at.to_rfc3339(),
        }
    }
}

pub fn write_listings<W: Write>(out: &mut W, listings: &[Listing], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, listings)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut *out);
            for listing in listings {
                writer.serialize(ListingRecord::from(listing))?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            writeln!(
                out,
                "{:<38} {:<32} {:<16} {:<8} {:>16}",
                "ID", "TITLE", "CATEGORY", "STATUS", "PRICE"
            )?;
            for listing in listings {
                let record = ListingRecord::from(listing);
                writeln!(
                    out,
                    "{:<38} {:<32} {:<16} {:<8} {:>16}",
                    record.id,
                    truncate(record.title, 32),
                    truncate(record.category, 16),
                    listing.status.label(),
                    record.price
                )?;
                if !listing.interests.is_empty() {
                    writeln!(out, "{:<38} interests: {}", "", record.interests)?;
                }
            }
        }
    }
    Ok(())
}

pub fn write_categories<W: Write>(out: &mut W, categories: &[Category]) -> Result<()> {
    for category in categories {
        writeln!(out, "{:<38} {}", category.id, category.name)?;
    }
    Ok(())
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let cut: String = value.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
