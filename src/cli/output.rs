use std::io::Write;
use std::str::FromStr;

use serde::Serialize;

use crate::config::AppIdentity;
use crate::error::GhtknError;
use crate::token::{format_date, AccessToken};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = GhtknError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(GhtknError::InvalidArgument(format!(
                "output format must be empty or 'json', got '{other}'"
            ))),
        }
    }
}

/// Renders a token for a consumer on stdout.
pub trait OutputAdapter {
    fn write(
        &self,
        out: &mut dyn Write,
        token: &AccessToken,
        app: &AppIdentity,
    ) -> Result<(), GhtknError>;
}

#[derive(Debug, Serialize)]
struct JsonOutputToken<'a> {
    expiration_date: String,
    access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    login: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_name: Option<&'a str>,
}

/// `ghtkn get`: the bare token, or a JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextAdapter {
    pub format: OutputFormat,
}

impl OutputAdapter for PlainTextAdapter {
    fn write(
        &self,
        out: &mut dyn Write,
        token: &AccessToken,
        app: &AppIdentity,
    ) -> Result<(), GhtknError> {
        match self.format {
            OutputFormat::Text => writeln!(out, "{}", token.token)?,
            OutputFormat::Json => {
                let json = JsonOutputToken {
                    expiration_date: format_date(token.expiration_date),
                    access_token: &token.token,
                    login: Some(token.login.as_str()).filter(|l| !l.is_empty()),
                    app_name: Some(app.id.as_str()).filter(|n| !n.is_empty()),
                };
                serde_json::to_writer_pretty(&mut *out, &json)
                    .map_err(|e| GhtknError::IoError(e.into()))?;
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

/// `ghtkn git-credential get`: git credential helper attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCredentialAdapter;

impl OutputAdapter for GitCredentialAdapter {
    fn write(
        &self,
        out: &mut dyn Write,
        token: &AccessToken,
        _app: &AppIdentity,
    ) -> Result<(), GhtknError> {
        write!(out, "username={}\npassword={}\n\n", token.login, token.token)?;
        Ok(())
    }
}
