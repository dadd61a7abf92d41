//! Subscription model and display helpers

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription tier as sent by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionTier {
    Free,
    Premium,
    AdminGranted,
}

impl SubscriptionTier {
    pub const ALL: [Self; 3] = [Self::Free, Self::Premium, Self::AdminGranted];

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Premium => "Premium",
            Self::AdminGranted => "AdminGranted",
        }
    }

    pub fn from_wire(tier: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tier)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Premium => "Premium",
            Self::AdminGranted => "Complimentary",
        }
    }

    pub fn is_premium(self) -> bool {
        matches!(self, Self::Premium | Self::AdminGranted)
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription lifecycle status as sent by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Active,
    Suspended,
    Cancelled,
    PastDue,
    Trialing,
}

impl SubscriptionStatus {
    pub const ALL: [Self; 5] = [
        Self::Active,
        Self::Suspended,
        Self::Cancelled,
        Self::PastDue,
        Self::Trialing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Suspended => "Suspended",
            Self::Cancelled => "Cancelled",
            Self::PastDue => "PastDue",
            Self::Trialing => "Trialing",
        }
    }

    pub fn from_wire(status: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == status)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Suspended => "Suspended",
            Self::Cancelled => "Cancelled",
            Self::PastDue => "Payment Past Due",
            Self::Trialing => "Trial",
        }
    }

    /// Statuses under which premium features are usable
    pub fn grants_access(self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current subscription of the logged-in player.
///
/// Tier and status stay as raw strings so unknown values from a newer backend
/// still deserialize and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default)]
    pub has_subscription: bool,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub is_admin_granted: bool,
    #[serde(default)]
    pub current_period_start: Option<String>,
    #[serde(default)]
    pub current_period_end: Option<String>,
    #[serde(default)]
    pub cancelled_at: Option<String>,
}

impl Subscription {
    pub fn tier(&self) -> Option<SubscriptionTier> {
        SubscriptionTier::from_wire(&self.tier)
    }

    pub fn status(&self) -> Option<SubscriptionStatus> {
        SubscriptionStatus::from_wire(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub processed_at: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsResponse {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub tier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeSubscriptionRequest {
    pub new_tier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAccessRequest {
    pub required_tier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAccessResponse {
    #[serde(default)]
    pub has_access: bool,
}

/// Display name of a wire tier; unknown tiers show as "Unknown"
pub fn tier_display_name(tier: &str) -> &'static str {
    SubscriptionTier::from_wire(tier).map_or("Unknown", SubscriptionTier::display_name)
}

/// Display name of a wire status; unknown statuses show verbatim
pub fn status_display_name(status: &str) -> &str {
    SubscriptionStatus::from_wire(status).map_or(status, |s| s.display_name())
}

pub fn is_premium_tier(tier: &str) -> bool {
    SubscriptionTier::from_wire(tier).is_some_and(SubscriptionTier::is_premium)
}

/// Premium features need a premium tier in an active or trial status
pub fn can_access_premium_features(subscription: Option<&Subscription>) -> bool {
    let Some(subscription) = subscription.filter(|s| s.has_subscription) else {
        return false;
    };
    is_premium_tier(&subscription.tier)
        && subscription
            .status()
            .is_some_and(SubscriptionStatus::grants_access)
}

/// Format an amount the way en-US currency formatting does, e.g. `$1,234.50`
pub fn format_currency(amount: Decimal, currency: &str) -> String {
    let code = currency.trim().to_ascii_uppercase();
    let (symbol, decimals) = match code.as_str() {
        "USD" | "" => ("$".to_string(), 2),
        "EUR" => ("€".to_string(), 2),
        "GBP" => ("£".to_string(), 2),
        "JPY" => ("¥".to_string(), 0),
        "CAD" => ("CA$".to_string(), 2),
        "AUD" => ("A$".to_string(), 2),
        _ => (format!("{code} "), 2),
    };

    let rounded = amount
        .abs()
        .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.*}", decimals as usize, rounded);
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    match fraction {
        Some(fraction) => format!("{sign}{symbol}{grouped}.{fraction}"),
        None => format!("{sign}{symbol}{grouped}"),
    }
}

/// Format a backend timestamp as `Jan 5, 2025`; unparsable input gives `Invalid Date`
pub fn format_date(date: &str) -> String {
    const FORMAT: &str = "%b %-d, %Y";
    let date = date.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
        return parsed.format(FORMAT).to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format(FORMAT).to_string();
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return parsed.format(FORMAT).to_string();
    }
    "Invalid Date".to_string()
}
