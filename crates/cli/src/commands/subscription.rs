//! Subscription commands

use anyhow::Result;
use clap::Subcommand;
use questscribe_core::SubscriptionTier;
use questscribe_core::subscription::{
    can_access_premium_features, format_date, status_display_name, tier_display_name,
};

use super::{App, Input, parse_tier};
use crate::render;

#[derive(Subcommand)]
pub enum SubscriptionCommands {
    /// Show your current plan
    Status,

    /// Start a subscription
    Create {
        #[arg(value_parser = parse_tier)]
        tier: SubscriptionTier,
    },

    /// Move to another tier
    Upgrade {
        #[arg(value_parser = parse_tier)]
        tier: SubscriptionTier,
    },

    /// Cancel at the end of the billing period
    Cancel {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List billing transactions
    Transactions,

    /// Ask the server whether you may use a tier's features
    Validate {
        #[arg(value_parser = parse_tier)]
        tier: SubscriptionTier,
    },
}

impl SubscriptionCommands {
    pub async fn execute(self, app: &App) -> Result<()> {
        app.require_login()?;
        let client = &app.client;

        match self {
            SubscriptionCommands::Status => {
                let subscription = client.subscription_status().await?;
                if !subscription.has_subscription && subscription.tier.is_empty() {
                    println!("Plan:    {}", SubscriptionTier::Free.display_name());
                } else {
                    println!("Plan:    {}", tier_display_name(&subscription.tier));
                    println!("Status:  {}", status_display_name(&subscription.status));
                }
                if subscription.is_admin_granted {
                    println!("Granted by an administrator");
                }
                if let Some(end) = &subscription.current_period_end {
                    let label = if subscription.cancelled_at.is_some() {
                        "Ends:   "
                    } else {
                        "Renews: "
                    };
                    println!("{label} {}", format_date(end));
                }
                println!(
                    "Premium features: {}",
                    if can_access_premium_features(Some(&subscription)) {
                        "available"
                    } else {
                        "not available"
                    }
                );
                Ok(())
            }
            SubscriptionCommands::Create { tier } => {
                client.create_subscription(tier).await?;
                println!("Subscribed to {}", tier.display_name());
                Ok(())
            }
            SubscriptionCommands::Upgrade { tier } => {
                client.upgrade_subscription(tier).await?;
                println!("Plan changed to {}", tier.display_name());
                Ok(())
            }
            SubscriptionCommands::Cancel { yes } => {
                if !yes
                    && !Input::new()
                        .confirm("Cancel your subscription?")
                        .await?
                {
                    println!("Subscription kept");
                    return Ok(());
                }
                client.cancel_subscription().await?;
                println!("Subscription cancelled");
                Ok(())
            }
            SubscriptionCommands::Transactions => {
                let transactions = client.transactions().await?;
                if transactions.is_empty() {
                    println!("No transactions");
                }
                for transaction in &transactions {
                    println!("{}", render::transaction_line(transaction));
                }
                Ok(())
            }
            SubscriptionCommands::Validate { tier } => {
                let allowed = client.validate_access(tier).await?;
                println!(
                    "{} features: {}",
                    tier.display_name(),
                    if allowed { "allowed" } else { "not allowed" }
                );
                Ok(())
            }
        }
    }
}
