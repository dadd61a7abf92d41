//! CLI commands

mod account;
mod admin;
mod characters;
mod health;
mod play;
mod subscription;

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use questscribe_core::{FileTokenStore, SessionContext, SubscriptionTier};
use questscribe_http::{ApiClient, ClientError};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::config::Settings;

pub use admin::AdminCommands;
pub use characters::CharacterCommands;
pub use subscription::SubscriptionCommands;

/// File in the data directory holding the session token and user flags
const SESSION_FILE_NAME: &str = "session.json";

/// Everything a command needs: the configured client and settings
pub struct App {
    pub client: ApiClient,
    pub settings: Settings,
    pub data_dir: PathBuf,
}

impl App {
    pub fn new(settings: Settings, data_dir: PathBuf) -> Result<Self> {
        let store = FileTokenStore::new(data_dir.join(SESSION_FILE_NAME));
        let mut builder = ApiClient::builder()
            .base_url(&settings.api.base_url)
            .session(SessionContext::new(store))
            .refresh_lookahead(settings.refresh_lookahead());
        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(agent) = &settings.api.user_agent {
            builder = builder.user_agent(agent);
        }
        let client = builder.build().context("Failed to create API client")?;

        Ok(Self {
            client,
            settings,
            data_dir,
        })
    }

    /// Fail early when no token is stored
    fn require_login(&self) -> Result<()> {
        if self.client.session().token().is_some() {
            Ok(())
        } else {
            Err(ClientError::Unauthenticated {
                status: None,
                message: "You are not logged in.".to_string(),
            }
            .into())
        }
    }

    /// Fail early unless the stored token carries the Administrator role
    fn require_administrator(&self) -> Result<()> {
        self.require_login()?;
        if self.client.session().is_administrator() {
            Ok(())
        } else {
            bail!("This command needs the Administrator role")
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session token
    Login {
        /// Google ID token obtained from the sign-in flow
        #[arg(long, conflicts_with = "dev", required_unless_present = "dev")]
        google_id_token: Option<String>,

        /// Development login by email (non-production backends only)
        #[arg(long, value_name = "EMAIL")]
        dev: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show who the stored token belongs to
    Whoami,

    /// Manage characters
    Characters {
        #[command(subcommand)]
        command: CharacterCommands,
    },

    /// Create a character by talking it through with the AI
    Create,

    /// Play a character's narrative session
    Play {
        /// Character to play
        character_id: i64,
    },

    /// Subscription and billing
    Subscription {
        #[command(subcommand)]
        command: SubscriptionCommands,
    },

    /// Administrator operations
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Check the deployment's services
    Health,
}

impl Commands {
    pub async fn execute(self, app: &App) -> Result<()> {
        match self {
            Commands::Login {
                google_id_token,
                dev,
            } => account::login(app, google_id_token, dev).await,
            Commands::Logout => account::logout(app),
            Commands::Whoami => account::whoami(app),
            Commands::Characters { command } => command.execute(app).await,
            Commands::Create => characters::create(app).await,
            Commands::Play { character_id } => play::play(app, character_id).await,
            Commands::Subscription { command } => command.execute(app).await,
            Commands::Admin { command } => command.execute(app).await,
            Commands::Health => health::health(app).await,
        }
    }
}

/// Line reader over stdin shared by the interactive commands
pub struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

impl Input {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print a prompt and read one trimmed line; `None` at end of input
    pub async fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{prompt}");
        std::io::stdout().flush()?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    /// Ask a yes/no question; anything but `y`/`yes` is no
    pub async fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.prompt(&format!("{question} [y/N] ")).await?;
        Ok(matches!(
            answer.as_deref().map(str::to_lowercase).as_deref(),
            Some("y" | "yes")
        ))
    }
}

/// Parse a tier name as typed on the command line
pub fn parse_tier(value: &str) -> Result<SubscriptionTier, String> {
    SubscriptionTier::ALL
        .into_iter()
        .find(|tier| tier.as_str().eq_ignore_ascii_case(value))
        .ok_or_else(|| {
            let known: Vec<_> = SubscriptionTier::ALL.iter().map(|t| t.as_str()).collect();
            format!("unknown tier '{value}', expected one of {}", known.join(", "))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Commands,
    }

    #[test]
    fn test_parse_tier_is_case_insensitive() {
        assert_eq!(parse_tier("premium"), Ok(SubscriptionTier::Premium));
        assert_eq!(parse_tier("AdminGranted"), Ok(SubscriptionTier::AdminGranted));
        assert!(parse_tier("gold").unwrap_err().contains("Free, Premium"));
    }

    #[test]
    fn test_login_requires_a_method() {
        assert!(TestCli::try_parse_from(["questscribe", "login"]).is_err());
        assert!(
            TestCli::try_parse_from([
                "questscribe",
                "login",
                "--dev",
                "a@example.com",
                "--google-id-token",
                "t"
            ])
            .is_err()
        );

        let cli = TestCli::try_parse_from(["questscribe", "login", "--dev", "a@example.com"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Login { dev: Some(_), google_id_token: None }
        ));
    }

    #[test]
    fn test_nested_subcommands_parse() {
        let cli = TestCli::try_parse_from(["questscribe", "admin", "provider", "set", "1"]).unwrap();
        assert!(matches!(cli.command, Commands::Admin { .. }));

        let cli =
            TestCli::try_parse_from(["questscribe", "subscription", "upgrade", "premium"]).unwrap();
        assert!(matches!(cli.command, Commands::Subscription { .. }));
    }

    #[test]
    fn test_app_uses_file_session() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::load(dir.path(), None).unwrap();
        let app = App::new(settings, dir.path().to_path_buf()).unwrap();

        assert!(app.require_login().is_err());
        app.client.session().login("opaque-token").unwrap();
        assert!(dir.path().join(SESSION_FILE_NAME).exists());
        assert!(app.require_login().is_ok());
    }

    #[test]
    fn test_administrator_commands_need_role_claim() {
        use questscribe_core::auth::{ROLE_CLAIM, encode_unsigned};
        use serde_json::json;

        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::load(dir.path(), None).unwrap();
        let app = App::new(settings, dir.path().to_path_buf()).unwrap();
        let exp = chrono::Utc::now().timestamp() + 3600;

        let error = app.require_administrator().unwrap_err();
        assert!(error.downcast_ref::<ClientError>().is_some());

        let player = encode_unsigned(&json!({ "sub": "1", "exp": exp }));
        app.client.session().login(&player).unwrap();
        let error = app.require_administrator().unwrap_err();
        assert!(error.to_string().contains("Administrator role"));

        let admin = encode_unsigned(&json!({ "sub": "2", "exp": exp, ROLE_CLAIM: "Administrator" }));
        app.client.session().login(&admin).unwrap();
        assert!(app.require_administrator().is_ok());
    }
}
