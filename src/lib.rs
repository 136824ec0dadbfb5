pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod logging;
pub mod manager;
pub mod oauth;
pub mod secret_store;
pub mod token;

pub use config::{load_config, select_app, AppIdentity, Config};
pub use error::GhtknError;
pub use github::{GitHubUserResolver, UserResolver};
pub use manager::{TokenManager, TokenRequest};
pub use oauth::{Authorizer, DeviceFlowClient, DeviceFlowEndpoints, PollTiming};
pub use secret_store::{KeyringStore, MemoryStore, SecretStore, SecretStoreError};
pub use token::{AccessToken, TokenCache};
