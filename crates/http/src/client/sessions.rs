//! Narrative session API client methods

use super::{ApiClient, ClientError};
use bytes::Bytes;
use questscribe_core::types::{HistoryPage, NarrativeResponse, PlayerActionRequest, Session};
use reqwest::Method;
use serde_json::json;

impl ApiClient {
    /// Get or create the narrative session of a character
    pub async fn get_or_create_session(&self, character_id: i64) -> Result<Session, ClientError> {
        self.post(&format!("session/character/{character_id}"), &json!({}))
            .await
    }

    /// Begin the session; returns the opening narrative and DM notes
    pub async fn start_session(&self, session_id: &str) -> Result<NarrativeResponse, ClientError> {
        self.post(&format!("dm/session/{session_id}/start"), &json!({}))
            .await
    }

    /// Submit a player action; returns the resulting narrative and DM notes
    pub async fn submit_action(
        &self,
        session_id: &str,
        action: impl Into<String>,
        session_summary: Option<String>,
    ) -> Result<NarrativeResponse, ClientError> {
        self.post(
            &format!("dm/session/{session_id}/action"),
            &PlayerActionRequest {
                action: action.into(),
                session_summary,
            },
        )
        .await
    }

    /// Page of recent submissions, newest page first
    pub async fn session_history(
        &self,
        session_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<HistoryPage, ClientError> {
        let request = self
            .authorized_request(Method::GET, &format!("sessions/{session_id}/history"))
            .await?
            .query(&[("page", page), ("pageSize", page_size)]);
        self.execute_authenticated(request).await
    }

    /// Render the session as a downloadable document
    pub async fn finalize_session(&self, session_id: &str) -> Result<Bytes, ClientError> {
        let request = self
            .authorized_request(Method::POST, &format!("sessions/{session_id}/finalize"))
            .await?
            .json(&json!({}));
        let response = self.send_authenticated(request).await?;
        Ok(response.bytes().await?)
    }
}
