//! Subscription lifecycle client methods

use super::{ApiClient, ClientError};
use questscribe_core::subscription::{
    CreateSubscriptionRequest, Subscription, SubscriptionTier, Transaction, TransactionsResponse,
    UpgradeSubscriptionRequest, ValidateAccessRequest, ValidateAccessResponse,
};
use serde_json::Value;

impl ApiClient {
    /// Subscription of the logged-in player
    pub async fn subscription_status(&self) -> Result<Subscription, ClientError> {
        self.get("subscription/status").await
    }

    /// Start a subscription at `tier`
    pub async fn create_subscription(&self, tier: SubscriptionTier) -> Result<Value, ClientError> {
        self.post(
            "subscription/create",
            &CreateSubscriptionRequest {
                tier: tier.as_str().to_string(),
            },
        )
        .await
    }

    /// Move the current subscription to `new_tier`
    pub async fn upgrade_subscription(
        &self,
        new_tier: SubscriptionTier,
    ) -> Result<Value, ClientError> {
        self.put(
            "subscription/upgrade",
            &UpgradeSubscriptionRequest {
                new_tier: new_tier.as_str().to_string(),
            },
        )
        .await
    }

    /// Cancel at the end of the billing period
    pub async fn cancel_subscription(&self) -> Result<Value, ClientError> {
        self.post_empty("subscription/cancel").await
    }

    /// Billing transactions, newest first as the server orders them
    pub async fn transactions(&self) -> Result<Vec<Transaction>, ClientError> {
        let response: Option<TransactionsResponse> = self.get("subscription/transactions").await?;
        Ok(response.map(|r| r.transactions).unwrap_or_default())
    }

    /// Ask the server whether the player may use features of `required_tier`
    pub async fn validate_access(&self, required_tier: SubscriptionTier) -> Result<bool, ClientError> {
        let response: ValidateAccessResponse = self
            .post(
                "subscription/validate-access",
                &ValidateAccessRequest {
                    required_tier: required_tier.as_str().to_string(),
                },
            )
            .await?;
        Ok(response.has_access)
    }
}
