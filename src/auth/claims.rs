/// JWT Claims structures
///
/// Access tokens carry nothing but an expiry. Refresh tokens bind the
/// holder to one (user, device) pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims for access tokens. Deliberately identity-free.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl AccessClaims {
    pub fn new(issued_at: DateTime<Utc>, expiry_seconds: i64) -> Self {
        Self {
            exp: issued_at.timestamp() + expiry_seconds,
        }
    }
}

/// Claims for refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    pub user_id: String,
    pub device_id: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl RefreshClaims {
    /// # Arguments
    /// * `user_id` - Owner of the refresh token
    /// * `device_id` - Device the token is bound to
    /// * `issued_at` - Issuance instant
    /// * `expiry_seconds` - Token lifetime in seconds
    pub fn new(
        user_id: impl Into<String>,
        device_id: impl Into<String>,
        issued_at: DateTime<Utc>,
        expiry_seconds: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            device_id: device_id.into(),
            exp: issued_at.timestamp() + expiry_seconds,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.exp < Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_access_claims_have_only_expiry() {
        let claims = AccessClaims::new(Utc::now(), 600);
        let json = serde_json::to_value(&claims).expect("Failed to serialize claims");

        let object = json.as_object().expect("claims serialize to an object");
        assert_eq!(object.len(), 1);
        assert!(object.contains_key("exp"));
    }

    #[test]
    fn test_refresh_claims_creation() {
        let now = Utc::now();
        let claims = RefreshClaims::new("u1", "d1", now, 2_592_000);

        assert_eq!(claims.user_id, "u1");
        assert_eq!(claims.device_id, "d1");
        assert_eq!(claims.exp, now.timestamp() + 2_592_000);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_refresh_claims_expired() {
        let claims = RefreshClaims::new("u1", "d1", Utc::now() - Duration::days(31), 2_592_000);
        assert!(claims.is_expired());
    }
}
