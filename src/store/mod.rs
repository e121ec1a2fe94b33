/// Credential store
///
/// Persists one refresh-token hash per (user, device). The rotation engine
/// talks to persistence only through `CredentialStore`.

mod memory;
mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

use async_trait::async_trait;

use crate::error::StoreError;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the stored hash for a binding; `None` means the device is unknown.
    async fn lookup_hash(&self, user_id: &str, device_id: &str)
        -> Result<Option<String>, StoreError>;

    /// Replace the hash for a binding only if it still holds `expected_hash`.
    ///
    /// Returns `false` when the binding is gone or was changed concurrently.
    async fn update_hash(
        &self,
        user_id: &str,
        device_id: &str,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool, StoreError>;

    /// Create the binding, overwriting any previous hash for the device.
    async fn insert_hash(&self, user_id: &str, device_id: &str, hash: &str)
        -> Result<(), StoreError>;

    /// Drop a single binding. Returns whether one existed.
    async fn remove(&self, user_id: &str, device_id: &str) -> Result<bool, StoreError>;

    /// Drop every binding of a user. Returns how many were removed.
    async fn remove_all(&self, user_id: &str) -> Result<u64, StoreError>;
}
