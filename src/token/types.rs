use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::GhtknError;

/// A GitHub App user access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Id of the app the token was issued for. Filled in after minting.
    pub app_id: String,
    pub token: String,
    /// Absolute expiry, second precision.
    pub expiration_date: DateTime<Utc>,
    /// Login of the user the token acts as. Empty until resolved.
    pub login: String,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expiration_date: DateTime<Utc>) -> Self {
        Self {
            app_id: String::new(),
            token: token.into(),
            expiration_date: truncate_to_seconds(expiration_date),
            login: String::new(),
        }
    }

    /// Time left before the token expires, negative once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> chrono::TimeDelta {
        self.expiration_date - now
    }
}

fn truncate_to_seconds(t: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(t.timestamp(), 0).unwrap_or(t)
}

/// RFC3339 with second precision and a `Z` suffix.
pub fn format_date(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_date(s: &str) -> Result<DateTime<Utc>, GhtknError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| GhtknError::CacheError(format!("invalid expiration date '{s}': {e}")))
}
