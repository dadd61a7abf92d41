//! Login, logout and local identity

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::info;

use super::App;

pub async fn login(app: &App, google_id_token: Option<String>, dev: Option<String>) -> Result<()> {
    let client = &app.client;
    match (google_id_token, dev) {
        (Some(id_token), _) => {
            client.login_google(id_token).await?;
        }
        (None, Some(email)) => {
            client.dev_login(email).await?;
        }
        (None, None) => bail!("Pass --google-id-token or --dev <email>"),
    }

    let user = client.session().user()?;
    info!(user = user.as_deref().unwrap_or("unknown"), "Logged in");
    match user {
        Some(email) => println!("Logged in as {email}"),
        None => println!("Logged in"),
    }
    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    app.client.logout()?;
    println!("Logged out");
    Ok(())
}

/// Local view of the stored token; the server is not consulted
pub fn whoami(app: &App) -> Result<()> {
    let session = app.client.session();
    let Some(token) = session.token() else {
        println!("Not logged in");
        return Ok(());
    };

    println!("Session file: {}", app.data_dir.join(super::SESSION_FILE_NAME).display());
    let Some(claims) = session.claims() else {
        println!("A token is stored but it cannot be decoded locally");
        return Ok(());
    };

    let email = session
        .user()?
        .or_else(|| questscribe_core::auth::user_email(&token));
    println!("Email:         {}", email.as_deref().unwrap_or("unknown"));
    if let Some(player) = claims.player_id() {
        println!("Player:        {player}");
    }
    println!(
        "Administrator: {}",
        if claims.is_administrator() { "yes" } else { "no" }
    );
    match claims.expires_at() {
        Some(expires) => {
            let state = if claims.is_valid_at(Utc::now()) {
                "valid"
            } else {
                "expired"
            };
            println!("Expires:       {} ({state})", expires.to_rfc3339());
        }
        None => println!("Expires:       never stated (treated as expired)"),
    }
    Ok(())
}
