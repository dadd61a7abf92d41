//! Deployment health checks

use super::{ApiClient, ClientError};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of probing one service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Error,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub service: String,
    pub status: HealthStatus,
    pub url: String,
    pub last_checked: DateTime<Utc>,
    pub version: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DatabaseHealthBody {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiClient {
    /// Probe a web service with a HEAD request.
    ///
    /// Only success and redirection statuses count as healthy; transport
    /// failures and every other status are reported as errors.
    pub async fn check_service(&self, name: &str, url: &str) -> ServiceHealth {
        let last_checked = Utc::now();
        let result = self.inner.client.request(Method::HEAD, url).send().await;

        let (status, version, error) = match result {
            Ok(response) => {
                let code = response.status();
                let version = response
                    .headers()
                    .get("x-version")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                if code.is_success() || code.is_redirection() {
                    (HealthStatus::Healthy, version, None)
                } else {
                    (
                        HealthStatus::Error,
                        version,
                        Some(super::error::status_message(code)),
                    )
                }
            }
            Err(e) => (HealthStatus::Error, None, Some(e.to_string())),
        };

        debug!(service = name, ?status, "Service checked");
        ServiceHealth {
            service: name.to_string(),
            status,
            url: url.to_string(),
            last_checked,
            version,
            error,
        }
    }

    /// Check the database through the API's health endpoint
    pub async fn check_database(&self) -> ServiceHealth {
        let last_checked = Utc::now();
        let request = self.request(Method::GET, "health/database");

        let (status, version, error) = match request.send().await {
            Ok(response) => {
                let ok = response.status().is_success();
                let code = response.status();
                match response.json::<DatabaseHealthBody>().await {
                    Ok(body) if ok => (HealthStatus::Healthy, body.version, None),
                    Ok(body) => (
                        HealthStatus::Error,
                        body.version,
                        Some(body.error.unwrap_or_else(|| super::error::status_message(code))),
                    ),
                    Err(e) if ok => (HealthStatus::Unknown, None, Some(e.to_string())),
                    Err(_) => (
                        HealthStatus::Error,
                        None,
                        Some(super::error::status_message(code)),
                    ),
                }
            }
            Err(e) => (HealthStatus::Error, None, Some(ClientError::from(e).to_string())),
        };

        ServiceHealth {
            service: "Database".to_string(),
            status,
            url: String::new(),
            last_checked,
            version,
            error,
        }
    }

    /// Check every named service and the database concurrently
    pub async fn check_deployment(&self, services: &[(String, String)]) -> Vec<ServiceHealth> {
        let web = join_all(
            services
                .iter()
                .map(|(name, url)| self.check_service(name, url)),
        );
        let (mut results, database) = futures::join!(web, self.check_database());
        results.push(database);
        results
    }
}
