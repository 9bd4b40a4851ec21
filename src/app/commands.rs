use crate::adapters::{BackendClient, SupabaseAuth, SupabaseCategories, SupabaseListings, SupabaseStorage};
use crate::app::render::{self, OutputFormat};
use crate::config::cli::LocalStorage;
use crate::config::toml_config::AppConfig;
use crate::config::{Command, CreateArgs, FeedArgs};
use crate::core::auth_flow::{AuthFlow, Redirect, RouteGuard};
use crate::core::marketplace::{ListingDraft, Marketplace};
use crate::core::media::{MediaFile, MediaUploader, UploadPolicy};
use crate::core::price_mask::{self, PriceMask};
use crate::core::session::{SessionGateway, Subscription};
use crate::domain::model::{FilterCriteria, Session};
use crate::domain::ports::{ConfigProvider, SignUpOutcome};
use crate::utils::error::{MarketError, Result};
use std::io::{BufRead, Write};

/// 一次 CLI 執行的上下文：啟動時建立，結束時丟棄（同時取消訂閱）
pub struct App {
    config: AppConfig,
    backend: BackendClient,
    gateway: SessionGateway<SupabaseAuth, LocalStorage>,
    _session_log: Subscription,
}

impl App {
    pub async fn start(config: AppConfig) -> Result<Self> {
        let backend = BackendClient::from_config(&config)?;
        let gateway = SessionGateway::new(
            SupabaseAuth::new(backend.clone()),
            LocalStorage::new(config.session_dir().to_string()),
        );

        let session_log = gateway.on_session_change(|session| match session {
            Some(session) => tracing::debug!(user = %session.user.id, "session: signed in"),
            None => tracing::debug!("session: signed out"),
        });
        gateway.restore().await?;

        Ok(Self {
            config,
            backend,
            gateway,
            _session_log: session_log,
        })
    }

    pub fn gateway(&self) -> &SessionGateway<SupabaseAuth, LocalStorage> {
        &self.gateway
    }

    pub async fn run<W: Write>(&self, command: Command, out: &mut W) -> Result<()> {
        let session = self.gateway.get_session().await?;

        let mut flow = AuthFlow::new(guard_for(&command));
        if let Some(transition) = flow.apply(session.as_ref()) {
            match transition.redirect {
                Some(Redirect::ToLogin) => return Err(MarketError::NotSignedIn),
                Some(Redirect::ToDashboard) => {
                    if let Some(user) = transition.to.user() {
                        writeln!(
                            out,
                            "Already signed in as {}. Run `troca logout` to switch accounts.",
                            user.email.as_deref().unwrap_or(&user.id)
                        )?;
                    }
                    return self.mine(session.as_ref(), OutputFormat::Table, out).await;
                }
                None => {}
            }
        }

        match command {
            Command::Login(credentials) => {
                let session = self
                    .gateway
                    .sign_in(&credentials.email, &credentials.password)
                    .await?;
                writeln!(out, "✅ Signed in as {}", display_user(&session))?;
            }
            Command::Signup(credentials) => {
                match self
                    .gateway
                    .sign_up(&credentials.email, &credentials.password)
                    .await?
                {
                    SignUpOutcome::SignedIn(session) => {
                        writeln!(out, "✅ Account created, signed in as {}", display_user(&session))?;
                    }
                    SignUpOutcome::ConfirmationRequired { email } => {
                        writeln!(out, "📧 Check {} to confirm your account, then log in.", email)?;
                    }
                }
            }
            Command::Logout => {
                self.gateway.sign_out().await?;
                writeln!(out, "👋 Signed out")?;
            }
            Command::ResetPassword { email } => {
                self.gateway.reset_password(&email).await?;
                writeln!(out, "📧 If {} has an account, a recovery email is on its way.", email)?;
            }
            Command::UpdatePassword(args) => {
                self.gateway.update_password(&args.password).await?;
                writeln!(out, "✅ Password updated")?;
            }
            Command::Whoami => {
                let session = self.gateway.require_session().await?;
                writeln!(out, "{} ({})", display_user(&session), session.user.id)?;
                if let Some(expires_at) = session.expires_at {
                    writeln!(out, "session expires at {}", expires_at.to_rfc3339())?;
                }
            }
            Command::Categories => {
                let categories = self.marketplace(session.as_ref()).categories().await?;
                render::write_categories(out, &categories)?;
            }
            Command::Feed(args) => self.feed(session.as_ref(), args, out).await?,
            Command::Mine { format } => self.mine(session.as_ref(), format, out).await?,
            Command::Create(args) => {
                let session = self.gateway.require_session().await?;
                self.create(&session, args, out).await?;
            }
            Command::Toggle { id } => {
                let listing = self
                    .marketplace(session.as_ref())
                    .toggle_status_by_id(&id)
                    .await?;
                writeln!(out, "🔁 {} is now {}", listing.title, listing.status)?;
            }
            Command::Delete { id, yes } => {
                if !yes && !confirm(&format!("Delete listing {}?", id))? {
                    writeln!(out, "Cancelled")?;
                    return Ok(());
                }
                self.marketplace(session.as_ref()).delete_listing(&id).await?;
                writeln!(out, "🗑️ Listing {} deleted", id)?;
            }
            Command::Price { input } => {
                let mask = PriceMask::new(&input);
                if mask.is_empty() {
                    return Err(MarketError::InvalidPrice { input });
                }
                writeln!(out, "{}", mask.formatted_value())?;
                writeln!(out, "cents: {}  value: {:.2}", mask.value(), mask.major_units())?;
            }
        }

        Ok(())
    }

    fn marketplace(&self, session: Option<&Session>) -> Marketplace<SupabaseListings, SupabaseCategories> {
        let mut listings = SupabaseListings::new(self.backend.clone());
        let mut categories = SupabaseCategories::new(self.backend.clone());
        if let Some(session) = session {
            listings = listings.with_access_token(&session.access_token);
            categories = categories.with_access_token(&session.access_token);
        }
        Marketplace::new(listings, categories, self.config.max_images())
    }

    fn uploader(&self, session: &Session) -> MediaUploader<SupabaseStorage> {
        let store = SupabaseStorage::new(self.backend.clone(), self.config.bucket())
            .with_access_token(&session.access_token);
        MediaUploader::new(store, UploadPolicy::from_config(&self.config))
    }

    async fn feed<W: Write>(&self, session: Option<&Session>, args: FeedArgs, out: &mut W) -> Result<()> {
        let criteria = FilterCriteria {
            search_term: args.search,
            category_id: args.category,
            status: args.status.parse()?,
        };

        let page = self.marketplace(session).feed(&criteria).await?;
        if page.listings.is_empty() && args.format == OutputFormat::Table {
            if page.has_active_filters {
                writeln!(out, "🔍 No listings match these filters.")?;
            } else {
                writeln!(out, "🔍 No listings yet.")?;
            }
            return Ok(());
        }

        render::write_listings(out, &page.listings, args.format)?;
        if args.format == OutputFormat::Table {
            writeln!(out, "\n{} of {} listings", page.listings.len(), page.total)?;
        }
        Ok(())
    }

    async fn mine<W: Write>(&self, session: Option<&Session>, format: OutputFormat, out: &mut W) -> Result<()> {
        let session = session.ok_or(MarketError::NotSignedIn)?;
        let listings = self
            .marketplace(Some(session))
            .my_listings(&session.user)
            .await?;
        render::write_listings(out, &listings, format)
    }

    async fn create<W: Write>(&self, session: &Session, args: CreateArgs, out: &mut W) -> Result<()> {
        // 圖片先在本機檢查再上傳，失敗的檔案略過
        let mut files = Vec::with_capacity(args.images.len());
        for path in &args.images {
            files.push(MediaFile::from_path(path).await?);
        }

        let images = if files.is_empty() {
            Vec::new()
        } else {
            let batch = self.uploader(session).upload_batch(&[], files).await?;
            for (name, err) in &batch.rejected {
                writeln!(out, "⚠️ {} skipped: {}", name, err.user_friendly_message())?;
            }
            batch.images
        };

        let draft = ListingDraft {
            title: args.title,
            description: args.description,
            images,
            interests: args.interests,
            opportunities: args.opportunities,
            price: args.price,
            category_id: args.category,
        };

        let listing = self
            .marketplace(Some(session))
            .create_listing(&session.user, draft)
            .await?;
        writeln!(
            out,
            "✅ Listed \"{}\" for {} ({})",
            listing.title,
            price_mask::format_major_units(listing.price),
            listing.id
        )?;
        Ok(())
    }
}

pub fn guard_for(command: &Command) -> RouteGuard {
    match command {
        Command::Login(_) | Command::Signup(_) => RouteGuard::RequireSignedOut,
        Command::Mine { .. }
        | Command::Create(_)
        | Command::Toggle { .. }
        | Command::Delete { .. }
        | Command::UpdatePassword(_)
        | Command::Whoami => RouteGuard::RequireSignedIn,
        Command::Logout
        | Command::ResetPassword { .. }
        | Command::Categories
        | Command::Feed(_)
        | Command::Price { .. } => RouteGuard::Public,
    }
}

fn display_user(session: &Session) -> &str {
    session.user.email.as_deref().unwrap_or(&session.user.id)
}

fn confirm(question: &str) -> Result<bool> {
    eprint!("{} [y/N] ", question);
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes" | "s" | "sim"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    #[test]
    fn test_guards() {
        let login = Command::Login(Credentials {
            email: "a@b.co".to_string(),
            password: "secret".to_string(),
        });
        assert_eq!(guard_for(&login), RouteGuard::RequireSignedOut);
        assert_eq!(
            guard_for(&Command::Toggle { id: "x".to_string() }),
            RouteGuard::RequireSignedIn
        );
        assert_eq!(guard_for(&Command::Categories), RouteGuard::Public);
    }
}
