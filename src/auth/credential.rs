/// Refresh Token Credential Hashing
///
/// The store never sees a raw refresh token. Tokens are digested with
/// SHA-256 first (bcrypt only reads the first 72 bytes of its input and a
/// JWT is far longer), then hashed with salted bcrypt.
///
/// bcrypt is CPU-bound. The `*_blocking` variants are for synchronous
/// callers; async code goes through the runtime's blocking pool.

use bcrypt::{hash, verify};
use sha2::{Digest, Sha256};

use crate::error::AppError;

fn digest_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hash a raw refresh token for storage
///
/// # Errors
/// Returns an internal error if bcrypt rejects the cost
pub fn hash_refresh_token_blocking(token: &str, cost: u32) -> Result<String, AppError> {
    hash(digest_token(token), cost)
        .map_err(|e| AppError::Internal(format!("Refresh token hashing failed: {}", e)))
}

/// Check a raw refresh token against a stored hash
///
/// A stored value that is not a bcrypt hash never verifies.
pub fn verify_refresh_token_blocking(token: &str, stored_hash: &str) -> bool {
    match verify(digest_token(token), stored_hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "Stored refresh token hash is unreadable");
            false
        }
    }
}

/// Hash a raw refresh token on the blocking pool
///
/// # Errors
/// Returns an internal error if bcrypt rejects the cost or the task dies
pub async fn hash_refresh_token(token: &str, cost: u32) -> Result<String, AppError> {
    let token = token.to_string();
    tokio::task::spawn_blocking(move || hash_refresh_token_blocking(&token, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Refresh token hashing task failed: {}", e)))?
}

/// Check a raw refresh token against a stored hash on the blocking pool
pub async fn verify_refresh_token(token: &str, stored_hash: &str) -> bool {
    let token = token.to_string();
    let stored_hash = stored_hash.to_string();

    match tokio::task::spawn_blocking(move || verify_refresh_token_blocking(&token, &stored_hash))
        .await
    {
        Ok(matches) => matches,
        Err(e) => {
            tracing::error!(error = %e, "Refresh token verification task failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_is_salted_bcrypt() {
        let token = "header.payload.signature";
        let first = hash_refresh_token_blocking(token, TEST_COST).expect("Failed to hash token");
        let second = hash_refresh_token_blocking(token, TEST_COST).expect("Failed to hash token");

        assert!(first.starts_with("$2"));
        assert_ne!(first, second);
        assert!(verify_refresh_token_blocking(token, &first));
        assert!(verify_refresh_token_blocking(token, &second));
    }

    #[test]
    fn test_wrong_token_does_not_verify() {
        let stored = hash_refresh_token_blocking("token-a", TEST_COST).expect("Failed to hash token");
        assert!(!verify_refresh_token_blocking("token-b", &stored));
    }

    #[test]
    fn test_difference_past_72_bytes_is_detected() {
        let prefix = "x".repeat(100);
        let stored = hash_refresh_token_blocking(&format!("{}a", prefix), TEST_COST)
            .expect("Failed to hash token");

        assert!(!verify_refresh_token_blocking(&format!("{}b", prefix), &stored));
    }

    #[test]
    fn test_corrupt_stored_hash_does_not_verify() {
        assert!(!verify_refresh_token_blocking("token", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_invalid_cost_is_an_error() {
        assert!(hash_refresh_token_blocking("token", 3).is_err());
    }

    #[tokio::test]
    async fn test_hashing_off_the_executor() {
        let token = "header.payload.signature";
        let stored = hash_refresh_token(token, TEST_COST)
            .await
            .expect("Failed to hash token");

        assert!(verify_refresh_token(token, &stored).await);
        assert!(!verify_refresh_token("other", &stored).await);
        assert!(verify_refresh_token_blocking(token, &stored));
    }

    #[tokio::test]
    async fn test_async_hash_reports_invalid_cost() {
        assert!(hash_refresh_token("token", 3).await.is_err());
    }
}
