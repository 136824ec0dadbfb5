//! Opaque key/value secret storage addressed by a service namespace and an
//! entry key.

pub mod backend;
pub mod memory;

pub use backend::KeyringStore;
pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum SecretStoreError {
    #[error("secret not found")]
    NotFound,

    #[error("secret store failure: {0}")]
    Backend(String),
}

pub trait SecretStore: Send + Sync {
    fn get(&self, service: &str, key: &str) -> Result<String, SecretStoreError>;
    fn set(&self, service: &str, key: &str, secret: &str) -> Result<(), SecretStoreError>;
    fn delete(&self, service: &str, key: &str) -> Result<(), SecretStoreError>;
}
