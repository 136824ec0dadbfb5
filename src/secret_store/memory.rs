use std::collections::HashMap;
use std::sync::Mutex;

use super::{SecretStore, SecretStoreError};

/// In-process secret store. Entries are keyed by `service:key`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    secrets: Mutex<HashMap<String, String>>,
}

fn store_key(service: &str, key: &str) -> String {
    format!("{service}:{key}")
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, SecretStoreError> {
        self.secrets
            .lock()
            .map_err(|_| SecretStoreError::Backend("memory store lock poisoned".into()))
    }
}

impl SecretStore for MemoryStore {
    fn get(&self, service: &str, key: &str) -> Result<String, SecretStoreError> {
        self.lock()?
            .get(&store_key(service, key))
            .cloned()
            .ok_or(SecretStoreError::NotFound)
    }

    fn set(&self, service: &str, key: &str, secret: &str) -> Result<(), SecretStoreError> {
        self.lock()?.insert(store_key(service, key), secret.to_string());
        Ok(())
    }

    fn delete(&self, service: &str, key: &str) -> Result<(), SecretStoreError> {
        self.lock()?
            .remove(&store_key(service, key))
            .map(|_| ())
            .ok_or(SecretStoreError::NotFound)
    }
}
