//! Local bearer token introspection
//!
//! Tokens are decoded without signature verification. Everything here is a
//! display convenience: the backend re-authorizes every request, so none of
//! these answers may be used to grant access.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Claim key carrying the user's role
pub const ROLE_CLAIM: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

/// Role value granting the administrator surface
pub const ADMINISTRATOR_ROLE: &str = "Administrator";

/// Payload claims of a session token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    #[serde(default)]
    pub sub: Option<String>,
    /// Player ID, sent as either a string or a number
    #[serde(default, rename = "playerId")]
    pub player_id: Option<JsonValue>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub jti: Option<String>,
    /// Role claim; only a plain string counts
    #[serde(default, rename = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role")]
    pub role: Option<JsonValue>,
    /// Expiration time (seconds since epoch)
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iss: Option<String>,
    /// Audience, a string or a list of strings
    #[serde(default)]
    pub aud: Option<JsonValue>,
}

impl TokenClaims {
    /// Expiration as a timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Player ID rendered as a string
    pub fn player_id(&self) -> Option<String> {
        match self.player_id.as_ref()? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn is_administrator(&self) -> bool {
        matches!(&self.role, Some(JsonValue::String(role)) if role == ADMINISTRATOR_ROLE)
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_some_and(|exp| exp > now.timestamp())
    }
}

/// Decode the payload segment of a JWT.
///
/// Returns `None` for anything that is not a three-segment token with a
/// base64url-encoded JSON object payload.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        tracing::debug!("Token does not have three segments");
        return None;
    };

    // Some encoders keep the padding
    let bytes = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Failed to decode token payload: {e}");
            return None;
        }
    };

    match serde_json::from_slice::<TokenClaims>(&bytes) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!("Failed to parse token claims: {e}");
            None
        }
    }
}

/// Check whether the token is unexpired right now
pub fn is_token_valid(token: &str) -> bool {
    is_token_valid_at(token, Utc::now())
}

/// Check whether the token is unexpired at `now`
pub fn is_token_valid_at(token: &str, now: DateTime<Utc>) -> bool {
    decode_claims(token).is_some_and(|claims| claims.is_valid_at(now))
}

/// Check for the administrator role claim
pub fn has_administrator_role(token: &str) -> bool {
    decode_claims(token).is_some_and(|claims| claims.is_administrator())
}

/// Email claim of the token, if any
pub fn user_email(token: &str) -> Option<String> {
    decode_claims(token)?.email.filter(|email| !email.is_empty())
}

/// Check whether the token expires within `window` of `now`.
///
/// Undecodable tokens and tokens without `exp` report `false`: there is no
/// expiry to act on, so they are sent unchanged and the server decides.
pub fn expires_within(token: &str, window: Duration, now: DateTime<Utc>) -> bool {
    decode_claims(token)
        .and_then(|claims| claims.exp)
        .is_some_and(|exp| exp - now.timestamp() <= window.num_seconds())
}

/// Build an unsigned token around the given claims.
///
/// Used by tests and the development tooling; the signature segment is a
/// placeholder and will not verify against any key.
pub fn encode_unsigned(claims: &JsonValue) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.unsigned")
}
