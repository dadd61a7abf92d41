//! Administrator API client methods
//!
//! The server authorizes each of these calls; local role checks only decide
//! whether to offer them.

use super::{ApiClient, ClientError};
use questscribe_core::types::{
    AdminActionRequest, AdminUser, AdminUsersResponse, ApiProviderResponse, SetApiProviderRequest,
};
use serde_json::Value;

impl ApiClient {
    /// Current AI provider and the selectable ones
    pub async fn get_api_provider(&self) -> Result<ApiProviderResponse, ClientError> {
        self.get("admin/api-provider").await
    }

    /// Switch the active AI provider
    pub async fn set_api_provider(&self, provider: i32) -> Result<(), ClientError> {
        let _: Value = self
            .post(
                "admin/api-provider/set",
                &SetApiProviderRequest { provider },
            )
            .await?;
        Ok(())
    }

    /// All players with their subscription
    pub async fn list_users(&self) -> Result<Vec<AdminUser>, ClientError> {
        let response: AdminUsersResponse = self.get("admin/subscription/users").await?;
        Ok(response.users)
    }

    /// Give a player premium access without billing
    pub async fn grant_free_access(
        &self,
        player_id: i64,
        reason: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.admin_action("grant-free-access", player_id, Some(reason.into()))
            .await
    }

    /// Take back access granted with [`Self::grant_free_access`]
    pub async fn revoke_free_access(
        &self,
        player_id: i64,
        reason: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.admin_action("revoke-free-access", player_id, Some(reason.into()))
            .await
    }

    /// Suspend a player's account
    pub async fn suspend_user(
        &self,
        player_id: i64,
        reason: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.admin_action("suspend", player_id, Some(reason.into()))
            .await
    }

    /// Lift a suspension
    pub async fn reactivate_user(&self, player_id: i64) -> Result<(), ClientError> {
        self.admin_action("reactivate", player_id, None).await
    }

    async fn admin_action(
        &self,
        action: &str,
        player_id: i64,
        reason: Option<String>,
    ) -> Result<(), ClientError> {
        let _: Value = self
            .post(
                &format!("admin/subscription/{action}"),
                &AdminActionRequest { player_id, reason },
            )
            .await?;
        Ok(())
    }
}
