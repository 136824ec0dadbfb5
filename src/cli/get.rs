use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;

use crate::cli::git_credential::read_credential_request;
use crate::cli::output::{GitCredentialAdapter, OutputAdapter, OutputFormat, PlainTextAdapter};
use crate::config::{default_config_path, load_config, AppIdentity, ConfigEnv};
use crate::error::GhtknError;
use crate::manager::{TokenManager, TokenRequest};
use crate::token::AccessToken;

/// Options shared by `get` and `git-credential`.
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    pub config: Option<PathBuf>,
    pub app: Option<String>,
    pub min_expiration: Duration,
}

/// Parse a human duration such as `1h`, `30m` or `90s`. Empty means zero.
pub fn parse_min_expiration(s: &str) -> Result<Duration, GhtknError> {
    if s.is_empty() {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(s)
        .map_err(|e| GhtknError::InvalidArgument(format!("invalid min expiration '{s}': {e}")))
}

pub fn resolve_config_path(config: Option<PathBuf>) -> Result<PathBuf, GhtknError> {
    match config {
        Some(path) => Ok(path),
        None => default_config_path(&ConfigEnv::from_env()),
    }
}

async fn token_for(
    manager: &TokenManager,
    cancel: &CancellationToken,
    opts: &GetOptions,
    app: Option<String>,
) -> Result<(AccessToken, AppIdentity, bool), GhtknError> {
    let path = resolve_config_path(opts.config.clone())?;
    let config = load_config(&path)?;
    let request = TokenRequest {
        app,
        min_expiration: opts.min_expiration,
        caching_enabled: config.persist,
    };
    let (token, app) = manager.get_token(cancel, &config.apps, &request).await?;
    Ok((token, app, config.persist))
}

/// `ghtkn get [APP]`
pub async fn run_get(
    manager: &TokenManager,
    cancel: &CancellationToken,
    opts: &GetOptions,
    format: OutputFormat,
    out: &mut (dyn Write + Send),
) -> Result<(), GhtknError> {
    let (token, app, _) = token_for(manager, cancel, opts, opts.app.clone()).await?;
    PlainTextAdapter { format }.write(out, &token, &app)
}

/// `ghtkn git-credential <operation>`
///
/// Only `get` produces output; `store` and `erase` are accepted and ignored.
pub async fn run_git_credential<R>(
    manager: &TokenManager,
    cancel: &CancellationToken,
    opts: &GetOptions,
    operation: &str,
    input: R,
    out: &mut (dyn Write + Send),
) -> Result<(), GhtknError>
where
    R: AsyncBufRead + Unpin,
{
    if operation != "get" {
        tracing::debug!(operation, "ignoring git credential operation");
        return Ok(());
    }
    let request = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(GhtknError::Cancelled),
        request = read_credential_request(input) => request?,
    };
    let app = request.owner().map(str::to_string).or_else(|| opts.app.clone());

    let (mut token, app, persist) = token_for(manager, cancel, opts, app).await?;
    manager.ensure_login(cancel, &app, &mut token, persist).await?;
    GitCredentialAdapter.write(out, &token, &app)
}
