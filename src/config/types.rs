use serde::{Deserialize, Serialize};

use crate::error::GhtknError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Cache minted tokens in the secret store.
    #[serde(default)]
    pub persist: bool,
    #[serde(default)]
    pub apps: Vec<AppIdentity>,
}

/// A configured GitHub App the user can authenticate as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    pub id: String,
    pub client_id: String,
    #[serde(default, rename = "default")]
    pub is_default: bool,
}

impl AppIdentity {
    pub fn new(id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            client_id: client_id.into(),
            is_default: false,
        }
    }

    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("id is required".into());
        }
        if self.client_id.is_empty() {
            return Err(format!("client_id is required (app '{}')", self.id));
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), GhtknError> {
        if self.apps.is_empty() {
            return Err(GhtknError::config("apps is required"));
        }
        for app in &self.apps {
            app.validate()
                .map_err(|detail| GhtknError::config(format!("app is invalid: {detail}")))?;
        }
        Ok(())
    }
}

/// Template written by `ghtkn init`.
pub const DEFAULT_CONFIG: &str = r#"# ghtkn configuration
# Tokens are cached in the OS keychain when persist is true.
persist: true
apps:
  - id: my-org/write # The name to identify the app
    client_id: <Your GitHub App Client ID>
    default: true
"#;
