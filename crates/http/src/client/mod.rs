//! Questscribe API client
//!
//! Every network call goes through [`ApiClient`]. Authenticated calls attach
//! the session's bearer token, refreshing it first when it is about to expire.
//! Concurrent callers that need a refresh share a single in-flight request.

pub mod admin;
pub mod auth;
pub mod characters;
pub mod error;
pub mod health;
pub mod sessions;
pub mod subscription;

use chrono::Utc;
use error::{ClientError, message_from_body, status_message};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use questscribe_core::SessionContext;
use questscribe_core::auth as token;
use questscribe_core::types::{LoginResponse, RefreshRequest};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long before expiry a token is refreshed
pub const DEFAULT_REFRESH_LOOKAHEAD: Duration = Duration::from_secs(30 * 60);

/// Endpoint exchanging a near-expiry token for a fresh one
pub const REFRESH_ENDPOINT: &str = "auth/refresh";

const DEFAULT_USER_AGENT: &str = concat!("questscribe/", env!("CARGO_PKG_VERSION"));

/// Outcome of one refresh, shared by every caller waiting on it
type PendingRefresh = Shared<BoxFuture<'static, Result<String, String>>>;

/// Questscribe API client
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    client: Client,
    base_url: String,
    session: SessionContext,
    refresh_lookahead: chrono::Duration,
    pending_refresh: Mutex<Option<PendingRefresh>>,
}

impl ApiClient {
    /// Create a new client with default configuration and an in-memory session
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Session this client reads and writes tokens through
    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.inner.base_url,
            endpoint.trim_start_matches('/')
        )
    }

    /// Create a request builder without authentication
    pub fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.inner.client.request(method, self.url(endpoint))
    }

    /// Create a request builder carrying the current bearer token, refreshing it
    /// first when it expires within the lookahead window
    pub async fn authorized_request(
        &self,
        method: Method,
        endpoint: &str,
    ) -> Result<RequestBuilder, ClientError> {
        let request = self.request(method, endpoint);
        Ok(match self.current_token().await? {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        })
    }

    /// Execute a request and handle common errors.
    ///
    /// An empty success body is read as JSON `null`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let body = response.bytes().await?;
        if body.is_empty() {
            Ok(serde_json::from_slice(b"null")?)
        } else {
            Ok(serde_json::from_slice(&body)?)
        }
    }

    /// Send a request, converting non-success responses into errors
    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Response received");

        if status.is_success() {
            Ok(response)
        } else {
            let message = match response.text().await {
                Ok(body) => message_from_body(&body).unwrap_or_else(|| status_message(status)),
                Err(_) => status_message(status),
            };
            Err(ClientError::from_status(status, message))
        }
    }

    /// Send an authenticated request and return the raw response.
    ///
    /// An authentication failure invalidates the session.
    async fn send_authenticated(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        self.invalidate_on_auth_failure(self.send(request).await)
    }

    /// Execute an authenticated request.
    ///
    /// An authentication failure invalidates the session.
    async fn execute_authenticated<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        self.invalidate_on_auth_failure(self.execute(request).await)
    }

    fn invalidate_on_auth_failure<T>(
        &self,
        result: Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        if let Err(error) = &result
            && error.is_unauthenticated()
        {
            self.inner.session.invalidate(error.to_string());
        }
        result
    }

    async fn call<B, T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.authorized_request(method, endpoint).await?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute_authenticated(request).await
    }

    /// Authenticated GET
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        self.call::<(), T>(Method::GET, endpoint, None).await
    }

    /// Authenticated POST with a JSON body
    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::POST, endpoint, Some(body)).await
    }

    /// Authenticated POST without a body
    pub async fn post_empty<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        self.call::<(), T>(Method::POST, endpoint, None).await
    }

    /// Authenticated PUT with a JSON body
    pub async fn put<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::PUT, endpoint, Some(body)).await
    }

    /// Authenticated DELETE
    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        self.call::<(), T>(Method::DELETE, endpoint, None).await
    }

    /// POST without an Authorization header, for login endpoints
    pub async fn post_public<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, endpoint).json(body);
        self.execute(request).await
    }

    /// Token to attach to the next authenticated call
    async fn current_token(&self) -> Result<Option<String>, ClientError> {
        let Some(token) = self.inner.session.token() else {
            return Ok(None);
        };
        if !token::expires_within(&token, self.inner.refresh_lookahead, Utc::now()) {
            return Ok(Some(token));
        }

        self.pending_refresh(false)
            .await
            .map(Some)
            .map_err(|message| ClientError::Unauthenticated {
                status: None,
                message,
            })
    }

    /// Join the in-flight refresh, or start one.
    ///
    /// Unless `force` is set, a token that is no longer near expiry is returned
    /// without contacting the server.
    fn pending_refresh(&self, force: bool) -> PendingRefresh {
        let mut slot = self
            .inner
            .pending_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(pending) = slot.as_ref() {
            debug!("Joining in-flight token refresh");
            return pending.clone();
        }

        // A refresh may have settled since the token was read
        let Some(token) = self.inner.session.token() else {
            return futures::future::ready(Err("Session expired. Please log in again.".to_string()))
                .boxed()
                .shared();
        };
        if !force && !token::expires_within(&token, self.inner.refresh_lookahead, Utc::now()) {
            return futures::future::ready(Ok(token)).boxed().shared();
        }

        let client = self.clone();
        let pending = async move { client.run_refresh(token).await }
            .boxed()
            .shared();
        *slot = Some(pending.clone());
        pending
    }

    async fn run_refresh(self, token: String) -> Result<String, String> {
        info!("Refreshing session token");
        let result = match self.request_refresh(&token).await {
            Ok(fresh) => self
                .inner
                .session
                .replace_token(&fresh)
                .map(|()| fresh)
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        if let Err(reason) = &result {
            warn!("Token refresh failed: {reason}");
            self.inner
                .session
                .invalidate(format!("Token refresh failed: {reason}"));
        }

        self.inner
            .pending_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        result
    }

    async fn request_refresh(&self, token: &str) -> Result<String, ClientError> {
        let request = self
            .request(Method::POST, REFRESH_ENDPOINT)
            .json(&RefreshRequest {
                token: token.to_string(),
            });
        let response: LoginResponse = self.execute(request).await?;
        response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Unauthenticated {
                status: None,
                message: "Token not provided by backend.".to_string(),
            })
    }
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    session: Option<SessionContext>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    refresh_lookahead: Option<Duration>,
}

impl ApiClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the session the client reads tokens from
    pub fn session(mut self, session: SessionContext) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set how long before expiry tokens are refreshed
    pub fn refresh_lookahead(mut self, lookahead: Duration) -> Self {
        self.refresh_lookahead = Some(lookahead);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url {base_url}: {e}")))?;

        let refresh_lookahead = self.refresh_lookahead.unwrap_or(DEFAULT_REFRESH_LOOKAHEAD);
        let refresh_lookahead = chrono::Duration::from_std(refresh_lookahead).map_err(|e| {
            ClientError::Configuration(format!("refresh lookahead out of range: {e}"))
        })?;

        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder = client_builder
            .user_agent(self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));

        let client = client_builder.build()?;

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                client,
                base_url,
                session: self.session.unwrap_or_else(SessionContext::in_memory),
                refresh_lookahead,
                pending_refresh: Mutex::new(None),
            }),
        })
    }
}
