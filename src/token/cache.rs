use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AppIdentity;
use crate::error::GhtknError;
use crate::secret_store::{SecretStore, SecretStoreError};
use crate::token::types::{format_date, parse_date, AccessToken};

/// Service namespace under which tokens are stored.
pub const DEFAULT_SERVICE: &str = "ghtkn";

/// Persisted form of an [`AccessToken`].
#[derive(Debug, Serialize, Deserialize)]
struct CachedToken {
    app: String,
    access_token: String,
    expiration_date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    login: String,
}

/// Expiration-aware token cache, one entry per app keyed by its client id.
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn SecretStore>,
    service: String,
}

impl TokenCache {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self::with_service(store, DEFAULT_SERVICE)
    }

    pub fn with_service(store: Arc<dyn SecretStore>, service: impl Into<String>) -> Self {
        Self {
            store,
            service: service.into(),
        }
    }

    /// Return the cached token for `app` if it stays valid for longer than
    /// `min_expiration` after `now`.
    ///
    /// A missing or soon-expiring entry is `Ok(None)`. Unreadable entries
    /// (corrupt JSON, bad dates, store failures) are errors.
    pub fn lookup(
        &self,
        app: &AppIdentity,
        min_expiration: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<AccessToken>, GhtknError> {
        let raw = match self.store.get(&self.service, &app.client_id) {
            Ok(raw) => raw,
            Err(SecretStoreError::NotFound) => {
                tracing::debug!(app = %app.id, "no cached token");
                return Ok(None);
            }
            Err(e) => return Err(GhtknError::CacheError(format!("read cached token: {e}"))),
        };
        let cached: CachedToken = serde_json::from_str(&raw)
            .map_err(|e| GhtknError::CacheError(format!("decode cached token: {e}")))?;
        let expiration_date = parse_date(&cached.expiration_date)?;

        let token = AccessToken {
            app_id: app.id.clone(),
            token: cached.access_token,
            expiration_date,
            login: cached.login,
        };
        let buffer = TimeDelta::from_std(min_expiration).unwrap_or(TimeDelta::MAX);
        let remaining = token.remaining(now);
        if remaining <= buffer {
            tracing::debug!(
                app = %app.id,
                expiration_date = %cached.expiration_date,
                remaining_secs = remaining.num_seconds(),
                "cached token expires too soon"
            );
            return Ok(None);
        }
        Ok(Some(token))
    }

    /// Write `token` as the cache entry for `app`, replacing any previous one.
    pub fn store(&self, app: &AppIdentity, token: &AccessToken) -> Result<(), GhtknError> {
        let cached = CachedToken {
            app: app.id.clone(),
            access_token: token.token.clone(),
            expiration_date: format_date(token.expiration_date),
            login: token.login.clone(),
        };
        let data = serde_json::to_string(&cached)
            .map_err(|e| GhtknError::CacheError(format!("encode token: {e}")))?;
        self.store
            .set(&self.service, &app.client_id, &data)
            .map_err(|e| GhtknError::CacheError(format!("write cached token: {e}")))
    }

    /// Delete the cache entry for `app`. A missing entry only logs a warning.
    pub fn remove(&self, app: &AppIdentity) -> Result<(), GhtknError> {
        match self.store.delete(&self.service, &app.client_id) {
            Ok(()) => Ok(()),
            Err(SecretStoreError::NotFound) => {
                tracing::warn!(app = %app.id, "tried to remove a cached token, but none was found");
                Ok(())
            }
            Err(e) => Err(GhtknError::CacheError(format!("remove cached token: {e}"))),
        }
    }
}
