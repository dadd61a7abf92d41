use anyhow::Result;
use questscribe_http::client::health::HealthStatus;

use super::App;

/// Probe the configured services and the database; administrators only
pub async fn health(app: &App) -> Result<()> {
    app.require_administrator()?;
    let services = app.settings.health_services();
    let results = app.client.check_deployment(&services).await;

    for result in &results {
        let status = match result.status {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Error => "error",
            HealthStatus::Unknown => "unknown",
        };
        let mut line = format!("{:<16} {status:<8}", result.service);
        if let Some(version) = &result.version {
            line.push_str(&format!(" v{version}"));
        }
        if let Some(error) = &result.error {
            line.push_str(&format!(" ({error})"));
        }
        println!("{line}");
    }
    println!("Checked at {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));

    if results.iter().any(|r| r.status == HealthStatus::Error) {
        anyhow::bail!("One or more services are unhealthy");
    }
    Ok(())
}
