pub mod loader;
pub mod select;
pub mod types;

pub use loader::{default_config_path, load_config, ConfigEnv};
pub use select::select_app;
pub use types::{AppIdentity, Config, DEFAULT_CONFIG};
