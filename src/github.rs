use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::error::GhtknError;

pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Resolves the GitHub login a token acts as.
#[async_trait]
pub trait UserResolver: Send + Sync {
    async fn resolve_login(
        &self,
        cancel: &CancellationToken,
        token: &str,
    ) -> Result<String, GhtknError>;
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

pub struct GitHubUserResolver {
    http: reqwest::Client,
    api_url: String,
}

impl Default for GitHubUserResolver {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), GITHUB_API_URL)
    }
}

impl GitHubUserResolver {
    pub fn new(http: reqwest::Client, api_url: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl UserResolver for GitHubUserResolver {
    async fn resolve_login(
        &self,
        cancel: &CancellationToken,
        token: &str,
    ) -> Result<String, GhtknError> {
        let request = self
            .http
            .get(format!("{}/user", self.api_url))
            .header(ACCEPT, "application/vnd.github+json")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(USER_AGENT, concat!("ghtkn/", env!("CARGO_PKG_VERSION")))
            .send();
        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GhtknError::Cancelled),
            resp = request => resp?,
        };
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(GhtknError::ProviderError {
                status: status.as_u16(),
                body,
            });
        }
        let user: User = serde_json::from_str(&body)
            .map_err(|e| {
                GhtknError::MalformedResponse(format!("authenticated user ({e}): {body}"))
            })?;
        Ok(user.login)
    }
}
