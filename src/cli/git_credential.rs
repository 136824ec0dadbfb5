use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::GhtknError;

/// Attributes git passes to a credential helper on stdin.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CredentialRequest {
    pub protocol: Option<String>,
    pub host: Option<String>,
    pub username: Option<String>,
    pub path: Option<String>,
    pub password: Option<String>,
}

impl CredentialRequest {
    /// First segment of `path`, which selects the app to use.
    ///
    /// git only sends `path` with `credential.useHttpPath=true`.
    pub fn owner(&self) -> Option<&str> {
        let path = self.path.as_deref()?;
        let (owner, _) = path.split_once('/')?;
        Some(owner).filter(|o| !o.is_empty())
    }
}

/// Read `key=value` lines until a blank line or EOF.
///
/// Lines without `=` and unknown keys are ignored.
pub async fn read_credential_request<R>(reader: R) -> Result<CredentialRequest, GhtknError>
where
    R: AsyncBufRead + Unpin,
{
    let mut request = CredentialRequest::default();
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            break;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key != "password" {
            tracing::debug!(key, value, "read a git credential attribute");
        }
        if key == "path" && !value.contains('/') {
            tracing::warn!(path = value, "unexpected path from git credential input");
        }
        let value = Some(value.to_string());
        match key {
            "protocol" => request.protocol = value,
            "host" => request.host = value,
            "username" => request.username = value,
            "path" => request.path = value,
            "password" => request.password = value,
            _ => {}
        }
    }
    Ok(request)
}
