pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "cli")]
pub use crate::app::render::OutputFormat;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "troca")]
#[command(about = "Barter marketplace client: list, browse and manage items for trade")]
pub struct CliConfig {
    #[arg(long, global = true, default_value = toml_config::DEFAULT_CONFIG_FILE)]
    pub config: String,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Sign in with email and password
    Login(Credentials),
    /// Create an account
    Signup(Credentials),
    /// Sign out and forget the stored session
    Logout,
    /// Send a password recovery email
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Change the password of the signed-in user
    UpdatePassword(NewPassword),
    /// Show the signed-in user
    Whoami,
    /// List categories
    Categories,
    /// Browse every listing with optional filters
    Feed(FeedArgs),
    /// List the signed-in user's listings
    Mine {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Publish a new listing
    Create(CreateArgs),
    /// Switch a listing between active and inactive
    Toggle { id: String },
    /// Delete a listing
    Delete {
        id: String,
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
    /// Format a price the way the listing form does
    Price { input: String },
}

#[cfg(feature = "cli")]
#[derive(Clone, Args)]
pub struct Credentials {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
}

#[cfg(feature = "cli")]
#[derive(Clone, Args)]
pub struct NewPassword {
    #[arg(long)]
    pub password: String,
}

// `--verbose` 會印出指令參數，密碼一律遮蔽
#[cfg(feature = "cli")]
const REDACTED: &str = "***";

#[cfg(feature = "cli")]
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &REDACTED)
            .finish()
    }
}

#[cfg(feature = "cli")]
impl std::fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewPassword")
            .field("password", &REDACTED)
            .finish()
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct FeedArgs {
    #[arg(long, short, default_value = "")]
    pub search: String,

    #[arg(long, help = "Category id")]
    pub category: Option<String>,

    #[arg(long, default_value = "all", help = "all, active or inactive")]
    pub status: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, help = "Price as typed, e.g. \"R$ 1.250,00\" or 125000 (cents)")]
    pub price: String,

    #[arg(long, help = "Category id")]
    pub category: String,

    #[arg(long, default_value = "", help = "Comma-separated")]
    pub interests: String,

    #[arg(long, default_value = "", help = "Comma-separated")]
    pub opportunities: String,

    #[arg(long = "image", help = "Image file to upload; repeatable")]
    pub images: Vec<String>,
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_hides_passwords() {
        let login = Command::Login(Credentials {
            email: "ana@example.com".to_string(),
            password: "hunter22".to_string(),
        });
        let logged = format!("CLI args: {:?}", login);
        assert!(logged.contains("ana@example.com"));
        assert!(!logged.contains("hunter22"));

        let update = Command::UpdatePassword(NewPassword {
            password: "hunter22".to_string(),
        });
        assert!(!format!("{:?}", update).contains("hunter22"));
    }

    #[test]
    fn test_parses_update_password() {
        let cli = CliConfig::try_parse_from(["troca", "update-password", "--password", "new-secret"])
            .unwrap();
        match cli.command {
            Command::UpdatePassword(args) => assert_eq!(args.password, "new-secret"),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
