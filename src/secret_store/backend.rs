use keyring::Entry;

use super::{SecretStore, SecretStoreError};

/// OS keychain (macOS Keychain, Windows Credential Manager, Secret Service on Linux).
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }
}

fn entry(service: &str, key: &str) -> Result<Entry, SecretStoreError> {
    Entry::new(service, key).map_err(map_err)
}

fn map_err(err: keyring::Error) -> SecretStoreError {
    match err {
        keyring::Error::NoEntry => SecretStoreError::NotFound,
        other => SecretStoreError::Backend(other.to_string()),
    }
}

impl SecretStore for KeyringStore {
    fn get(&self, service: &str, key: &str) -> Result<String, SecretStoreError> {
        entry(service, key)?.get_password().map_err(map_err)
    }

    fn set(&self, service: &str, key: &str, secret: &str) -> Result<(), SecretStoreError> {
        entry(service, key)?.set_password(secret).map_err(map_err)
    }

    fn delete(&self, service: &str, key: &str) -> Result<(), SecretStoreError> {
        entry(service, key)?.delete_credential().map_err(map_err)
    }
}
