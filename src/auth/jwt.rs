/// JWT Token Generation
///
/// Mints HS256 compact tokens with a `JWS` type header. Access tokens carry
/// only an expiry; refresh tokens embed the user and device they are bound to.

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::configuration::TokenSettings;
use crate::error::{AppError, ConfigError};

/// Value of the `typ` header on every token
pub const TOKEN_TYPE: &str = "JWS";

/// Signs access and refresh tokens with the shared secret
#[derive(Clone)]
pub struct Signer {
    encoding_key: EncodingKey,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

impl Signer {
    /// # Errors
    /// Returns a configuration error if the settings are unusable
    /// (empty secret, non-positive lifetimes).
    pub fn new(settings: &TokenSettings) -> Result<Self, ConfigError> {
        settings.validate()?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            access_token_expiry: settings.access_token_expiry,
            refresh_token_expiry: settings.refresh_token_expiry,
        })
    }

    /// Mint an identity-free access token valid for the access lifetime
    pub fn create_access_token(&self) -> Result<String, AppError> {
        self.create_access_token_at(Utc::now())
    }

    pub fn create_access_token_at(&self, issued_at: DateTime<Utc>) -> Result<String, AppError> {
        let claims = AccessClaims::new(issued_at, self.access_token_expiry);
        self.sign(&claims)
    }

    /// Mint a refresh token bound to `user_id` and `device_id`
    pub fn create_refresh_token(&self, user_id: &str, device_id: &str) -> Result<String, AppError> {
        self.create_refresh_token_at(user_id, device_id, Utc::now())
    }

    pub fn create_refresh_token_at(
        &self,
        user_id: &str,
        device_id: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = RefreshClaims::new(user_id, device_id, issued_at, self.refresh_token_expiry);
        self.sign(&claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AppError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some(TOKEN_TYPE.to_string());

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}
