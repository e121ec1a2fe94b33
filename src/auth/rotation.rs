/// Token Rotation
///
/// Decides, per request, whether a presented (access, refresh) pair is
/// passed through, rotated into a fresh access token, or rejected.
///
/// | access | refresh | outcome   |
/// |--------|---------|-----------|
/// | valid  | any     | Unchanged |
/// | bad    | valid   | Rotated   |
/// | bad    | bad     | Rejected  |
///
/// Rotation keeps the raw refresh token and only re-hashes it in the store.

use std::sync::Arc;

use crate::auth::credential::{hash_refresh_token, verify_refresh_token};
use crate::auth::jwt::Signer;
use crate::auth::token_pair::TokenPair;
use crate::auth::validator::TokenValidator;
use crate::configuration::TokenSettings;
use crate::error::{AppError, ConfigError, ErrorContext};
use crate::store::CredentialStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Access token still valid; pair returned as presented
    Unchanged,
    /// New access token minted from a valid refresh token
    Rotated,
    /// Neither token valid; caller must re-authenticate
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationOutcome {
    pub rotation: Rotation,
    pub tokens: TokenPair,
    /// Empty when the refresh token did not resolve to a user
    pub user_id: String,
}

impl RotationOutcome {
    fn rejected() -> Self {
        Self {
            rotation: Rotation::Rejected,
            tokens: TokenPair::empty(),
            user_id: String::new(),
        }
    }
}

/// Rotation, issue and revocation over a `CredentialStore`
///
/// bcrypt hashing and verification run on tokio's blocking pool, so the
/// engine must be driven from inside a tokio runtime.
pub struct RotationEngine<S> {
    signer: Signer,
    validator: TokenValidator<S>,
    store: Arc<S>,
    hash_cost: u32,
}

impl<S: CredentialStore> RotationEngine<S> {
    /// # Errors
    /// Returns a configuration error if the settings are unusable. This is
    /// the only place a bad secret is reported.
    pub fn new(settings: &TokenSettings, store: Arc<S>) -> Result<Self, ConfigError> {
        Ok(Self {
            signer: Signer::new(settings)?,
            validator: TokenValidator::new(settings, store.clone())?,
            store,
            hash_cost: settings.hash_cost,
        })
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn validator(&self) -> &TokenValidator<S> {
        &self.validator
    }

    /// Decide validity of a presented pair and rotate when needed
    ///
    /// # Errors
    /// Returns `AppError::Store` if the credential store fails; token
    /// problems are reported through `Rotation::Rejected` instead.
    pub async fn rotate(
        &self,
        access_token: &str,
        refresh_token: &str,
        device_id: &str,
    ) -> Result<RotationOutcome, AppError> {
        let context = ErrorContext::new("token_rotation").with_device_id(device_id);

        let access = self.validator.validate_access(access_token);
        let refresh = self
            .validator
            .validate_refresh(refresh_token, device_id)
            .await
            .map_err(|e| log_failure(&context, e.into()))?;

        if access.valid {
            return Ok(RotationOutcome {
                rotation: Rotation::Unchanged,
                tokens: TokenPair::new(access_token, refresh_token),
                user_id: refresh.user_id,
            });
        }

        let expected_hash = match (refresh.valid, refresh.stored_hash) {
            (true, Some(hash)) => hash,
            _ => {
                tracing::info!(
                    request_id = %context.request_id,
                    device_id = %device_id,
                    "Token rotation rejected"
                );
                return Ok(RotationOutcome::rejected());
            }
        };

        let user_id = refresh.user_id;
        let context = context.with_user_id(user_id.as_str());

        let new_access = self.signer.create_access_token()?;
        let new_hash = hash_refresh_token(refresh_token, self.hash_cost).await?;

        let swapped = self
            .store
            .update_hash(&user_id, device_id, &expected_hash, &new_hash)
            .await
            .map_err(|e| log_failure(&context, e.into()))?;

        if !swapped && !self.still_bound(&context, &user_id, device_id, refresh_token).await? {
            tracing::warn!(
                request_id = %context.request_id,
                user_id = %user_id,
                device_id = %device_id,
                "Device binding changed during rotation"
            );
            return Ok(RotationOutcome::rejected());
        }

        tracing::info!(
            request_id = %context.request_id,
            user_id = %user_id,
            device_id = %device_id,
            "Access token rotated"
        );

        Ok(RotationOutcome {
            rotation: Rotation::Rotated,
            tokens: TokenPair::new(new_access, refresh_token),
            user_id,
        })
    }

    /// Mint a fresh pair for a newly authenticated device and bind it,
    /// replacing any previous credential of that device.
    pub async fn issue(&self, user_id: &str, device_id: &str) -> Result<TokenPair, AppError> {
        let context = ErrorContext::new("token_issue")
            .with_user_id(user_id)
            .with_device_id(device_id);

        let access_token = self.signer.create_access_token()?;
        let refresh_token = self.signer.create_refresh_token(user_id, device_id)?;
        let hash = hash_refresh_token(&refresh_token, self.hash_cost).await?;

        self.store
            .insert_hash(user_id, device_id, &hash)
            .await
            .map_err(|e| log_failure(&context, e.into()))?;

        tracing::info!(
            request_id = %context.request_id,
            user_id = %user_id,
            device_id = %device_id,
            "Token pair issued"
        );

        Ok(TokenPair::new(access_token, refresh_token))
    }

    /// Log a single device out. Returns whether a binding existed.
    pub async fn revoke(&self, user_id: &str, device_id: &str) -> Result<bool, AppError> {
        let context = ErrorContext::new("token_revoke")
            .with_user_id(user_id)
            .with_device_id(device_id);

        let removed = self
            .store
            .remove(user_id, device_id)
            .await
            .map_err(|e| log_failure(&context, e.into()))?;

        tracing::info!(user_id = %user_id, device_id = %device_id, removed, "Device binding revoked");
        Ok(removed)
    }

    /// Log a user out of every device. Returns the number of bindings dropped.
    pub async fn revoke_all(&self, user_id: &str) -> Result<u64, AppError> {
        let context = ErrorContext::new("token_revoke_all").with_user_id(user_id);

        let removed = self
            .store
            .remove_all(user_id)
            .await
            .map_err(|e| log_failure(&context, e.into()))?;

        tracing::info!(user_id = %user_id, removed, "All device bindings revoked for user");
        Ok(removed)
    }

    // A lost compare-and-swap is harmless when a concurrent rotation of the
    // same raw token won; anything else means the binding moved on.
    async fn still_bound(
        &self,
        context: &ErrorContext,
        user_id: &str,
        device_id: &str,
        refresh_token: &str,
    ) -> Result<bool, AppError> {
        let current = self
            .store
            .lookup_hash(user_id, device_id)
            .await
            .map_err(|e| log_failure(context, e.into()))?;

        match current {
            Some(hash) => Ok(verify_refresh_token(refresh_token, &hash).await),
            None => Ok(false),
        }
    }
}

fn log_failure(context: &ErrorContext, error: AppError) -> AppError {
    context.log_error(&error);
    error
}
