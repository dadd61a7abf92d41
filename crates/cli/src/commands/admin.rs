//! Administrator commands
//!
//! The local role check only decides whether to try; the server authorizes
//! every call.

use anyhow::{Result, bail};
use clap::Subcommand;
use questscribe_core::subscription::{status_display_name, tier_display_name};

use super::App;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Call the administrator test endpoint
    Test,

    /// List players and their subscriptions
    Users,

    /// Grant a player free premium access
    Grant {
        player_id: i64,
        #[arg(long)]
        reason: String,
    },

    /// Revoke free access granted earlier
    Revoke {
        player_id: i64,
        #[arg(long)]
        reason: String,
    },

    /// Suspend a player
    Suspend {
        player_id: i64,
        #[arg(long)]
        reason: String,
    },

    /// Lift a suspension
    Reactivate { player_id: i64 },

    /// Show or switch the AI provider
    Provider {
        #[command(subcommand)]
        command: Option<ProviderCommands>,
    },
}

#[derive(Subcommand)]
pub enum ProviderCommands {
    /// Show the current provider and the available ones
    Get,

    /// Switch to a provider by number
    Set { provider: i32 },
}

impl AdminCommands {
    pub async fn execute(self, app: &App) -> Result<()> {
        if matches!(self, AdminCommands::Test) {
            app.require_login()?;
        } else {
            app.require_administrator()?;
        }
        let client = &app.client;

        match self {
            AdminCommands::Test => match client.admin_test().await {
                Ok(response) => println!("{}", serde_json::to_string_pretty(&response)?),
                Err(e) if e.status() == Some(403) => bail!("Administrator access denied: {e}"),
                Err(e) => return Err(e.into()),
            },
            AdminCommands::Users => {
                for user in client.list_users().await? {
                    let plan = match &user.subscription {
                        Some(s) => {
                            let granted = if s.is_admin_granted { ", granted" } else { "" };
                            format!(
                                "{} ({}{granted})",
                                tier_display_name(&s.tier),
                                status_display_name(&s.status)
                            )
                        }
                        None => "no subscription".to_string(),
                    };
                    println!("{:>6}  {:<32} {plan}", user.player_id, user.label());
                }
            }
            AdminCommands::Grant { player_id, reason } => {
                client.grant_free_access(player_id, reason).await?;
                println!("Free access granted to player {player_id}");
            }
            AdminCommands::Revoke { player_id, reason } => {
                client.revoke_free_access(player_id, reason).await?;
                println!("Free access revoked for player {player_id}");
            }
            AdminCommands::Suspend { player_id, reason } => {
                client.suspend_user(player_id, reason).await?;
                println!("Player {player_id} suspended");
            }
            AdminCommands::Reactivate { player_id } => {
                client.reactivate_user(player_id).await?;
                println!("Player {player_id} reactivated");
            }
            AdminCommands::Provider { command } => match command.unwrap_or(ProviderCommands::Get) {
                ProviderCommands::Get => {
                    let providers = client.get_api_provider().await?;
                    for provider in &providers.available_providers {
                        let marker = if provider.provider == providers.current_provider {
                            '*'
                        } else {
                            ' '
                        };
                        println!("{marker} {}  {}", provider.provider, provider.display_name);
                    }
                }
                ProviderCommands::Set { provider } => {
                    client.set_api_provider(provider).await?;
                    println!("AI provider switched to {provider}");
                }
            },
        }
        Ok(())
    }
}
