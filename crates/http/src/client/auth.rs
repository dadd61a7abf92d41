//! Authentication API client methods

use super::{ApiClient, ClientError};
use questscribe_core::types::{DevLoginRequest, GoogleLoginRequest, LoginResponse};
use reqwest::Method;
use serde_json::Value;

impl ApiClient {
    /// Exchange a Google ID token for a session token and store it
    pub async fn login_google(&self, id_token: impl Into<String>) -> Result<String, ClientError> {
        let response: LoginResponse = self
            .post_public(
                "auth/google",
                &GoogleLoginRequest {
                    id_token: id_token.into(),
                },
            )
            .await?;
        self.store_login(response)
    }

    /// Development login by email, available on non-production backends
    pub async fn dev_login(&self, email: impl Into<String>) -> Result<String, ClientError> {
        let response: LoginResponse = self
            .post_public(
                "auth/dev-login",
                &DevLoginRequest {
                    email: email.into(),
                },
            )
            .await?;
        self.store_login(response)
    }

    fn store_login(&self, response: LoginResponse) -> Result<String, ClientError> {
        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Unauthenticated {
                status: None,
                message: "Token not provided by backend.".to_string(),
            })?;
        self.session().login(&token)?;
        if let Some(email) = questscribe_core::auth::user_email(&token) {
            self.session().set_user(&email)?;
        }
        if let Some(player) = self.session().claims().and_then(|c| c.player_id()) {
            self.session().set_player(&player)?;
        }
        Ok(token)
    }

    /// Refresh the session token now, regardless of its expiry.
    ///
    /// Shares the in-flight refresh with any concurrent caller.
    pub async fn refresh_token(&self) -> Result<String, ClientError> {
        self.pending_refresh(true)
            .await
            .map_err(|message| ClientError::Unauthenticated {
                status: None,
                message,
            })
    }

    /// Call the administrator-only test endpoint.
    ///
    /// A 403 here only means the role is missing, so the session is kept. A 401
    /// still invalidates it.
    pub async fn admin_test(&self) -> Result<Value, ClientError> {
        let request = self
            .authorized_request(Method::GET, "auth/admin/test")
            .await?;
        match self.execute(request).await {
            Err(error) if error.status() == Some(401) => {
                self.invalidate_on_auth_failure(Err(error))
            }
            result => result,
        }
    }

    /// Forget the session locally
    pub fn logout(&self) -> Result<(), ClientError> {
        Ok(self.session().logout()?)
    }
}
