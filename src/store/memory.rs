use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::CredentialStore;
use crate::error::StoreError;

type BindingKey = (String, String);

/// Process-local credential store
///
/// Useful for tests and single-node embedding. The mutex makes
/// `update_hash` a real compare-and-swap.
#[derive(Default)]
pub struct MemoryCredentialStore {
    bindings: Mutex<HashMap<BindingKey, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bindings currently stored
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<BindingKey, String>>, StoreError> {
        self.bindings
            .lock()
            .map_err(|_| StoreError::Unavailable("credential map lock poisoned".to_string()))
    }
}

fn key(user_id: &str, device_id: &str) -> BindingKey {
    (user_id.to_string(), device_id.to_string())
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn lookup_hash(
        &self,
        user_id: &str,
        device_id: &str,
    ) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(&key(user_id, device_id)).cloned())
    }

    async fn update_hash(
        &self,
        user_id: &str,
        device_id: &str,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut bindings = self.lock()?;
        match bindings.get_mut(&key(user_id, device_id)) {
            Some(current) if current == expected_hash => {
                *current = new_hash.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_hash(
        &self,
        user_id: &str,
        device_id: &str,
        hash: &str,
    ) -> Result<(), StoreError> {
        self.lock()?.insert(key(user_id, device_id), hash.to_string());
        Ok(())
    }

    async fn remove(&self, user_id: &str, device_id: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.remove(&key(user_id, device_id)).is_some())
    }

    async fn remove_all(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut bindings = self.lock()?;
        let before = bindings.len();
        bindings.retain(|(owner, _), _| owner != user_id);
        Ok((before - bindings.len()) as u64)
    }
}
