/// Token Validation
///
/// Checks access and refresh tokens against the shared secret. Verification
/// failures are folded into a `valid` flag plus a `TokenRejection`; only
/// credential store faults are returned as errors.

use std::sync::Arc;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::auth::credential::verify_refresh_token;
use crate::configuration::TokenSettings;
use crate::error::{ConfigError, StoreError, TokenRejection};
use crate::store::CredentialStore;

/// Result of an access token check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCheck {
    pub valid: bool,
    /// The presented token when valid, empty otherwise
    pub token: String,
    pub rejection: Option<TokenRejection>,
}

impl AccessCheck {
    fn accepted(token: &str) -> Self {
        Self {
            valid: true,
            token: token.to_string(),
            rejection: None,
        }
    }

    fn rejected(reason: TokenRejection) -> Self {
        Self {
            valid: false,
            token: String::new(),
            rejection: Some(reason),
        }
    }
}

/// Result of a refresh token check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshCheck {
    pub valid: bool,
    /// Owner of the refresh token when valid, empty otherwise
    pub user_id: String,
    pub rejection: Option<TokenRejection>,
    pub(crate) stored_hash: Option<String>,
}

impl RefreshCheck {
    fn accepted(user_id: String, stored_hash: String) -> Self {
        Self {
            valid: true,
            user_id,
            rejection: None,
            stored_hash: Some(stored_hash),
        }
    }

    fn rejected(reason: TokenRejection) -> Self {
        Self {
            valid: false,
            user_id: String::new(),
            rejection: Some(reason),
            stored_hash: None,
        }
    }
}

pub struct TokenValidator<S> {
    decoding_key: DecodingKey,
    access_validation: Validation,
    refresh_validation: Validation,
    store: Arc<S>,
}

impl<S: CredentialStore> TokenValidator<S> {
    /// # Errors
    /// Returns a configuration error if the settings are unusable
    pub fn new(settings: &TokenSettings, store: Arc<S>) -> Result<Self, ConfigError> {
        settings.validate()?;

        let mut access_validation = Validation::new(Algorithm::HS256);
        access_validation.leeway = settings.access_token_leeway;

        // A refresh token is honoured for one extra lifetime past its expiry.
        let mut refresh_validation = Validation::new(Algorithm::HS256);
        refresh_validation.leeway = settings.refresh_token_expiry as u64;

        Ok(Self {
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            access_validation,
            refresh_validation,
            store,
        })
    }

    /// Verify signature and expiry of an access token
    pub fn validate_access(&self, token: &str) -> AccessCheck {
        match decode::<AccessClaims>(token, &self.decoding_key, &self.access_validation) {
            Ok(_) => AccessCheck::accepted(token),
            Err(e) => {
                let reason = TokenRejection::from(&e);
                tracing::warn!(reason = reason.as_str(), error = %e, "Access token rejected");
                AccessCheck::rejected(reason)
            }
        }
    }

    /// Verify a refresh token and its device binding
    ///
    /// Checks, in order:
    /// 1. Signature and expiry (with the refresh leeway)
    /// 2. The token's device claim matches `device_id`
    /// 3. A credential is stored for (user, device)
    /// 4. The raw token matches the stored hash
    ///
    /// # Errors
    /// Returns error only if the credential store fails
    pub async fn validate_refresh(
        &self,
        token: &str,
        device_id: &str,
    ) -> Result<RefreshCheck, StoreError> {
        let claims =
            match decode::<RefreshClaims>(token, &self.decoding_key, &self.refresh_validation) {
                Ok(data) => data.claims,
                Err(e) => {
                    let reason = TokenRejection::from(&e);
                    tracing::warn!(reason = reason.as_str(), error = %e, "Refresh token rejected");
                    return Ok(RefreshCheck::rejected(reason));
                }
            };

        if claims.device_id != device_id {
            tracing::warn!(
                user_id = %claims.user_id,
                device_id = %device_id,
                "Refresh token presented from another device"
            );
            return Ok(RefreshCheck::rejected(TokenRejection::DeviceMismatch));
        }

        let stored_hash = match self.store.lookup_hash(&claims.user_id, device_id).await? {
            Some(hash) => hash,
            None => {
                tracing::warn!(
                    user_id = %claims.user_id,
                    device_id = %device_id,
                    "No credential bound to device"
                );
                return Ok(RefreshCheck::rejected(TokenRejection::UnknownDeviceBinding));
            }
        };

        if !verify_refresh_token(token, &stored_hash).await {
            tracing::warn!(
                user_id = %claims.user_id,
                device_id = %device_id,
                "Refresh token does not match stored credential"
            );
            return Ok(RefreshCheck::rejected(TokenRejection::HashMismatch));
        }

        Ok(RefreshCheck::accepted(claims.user_id, stored_hash))
    }
}
