/// Error Handling Module
///
/// Token validation failures never leave the validator as errors: they are
/// normalized into a `TokenRejection` carried next to a `valid` flag.
/// Only infrastructure faults (store, configuration, runtime) are surfaced
/// to callers through `AppError`.

use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. TOKEN REJECTION REASONS
/// ============================================================================

/// Why a presented token was not trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// Not a decodable three-segment token
    Malformed,
    /// Signature or algorithm does not match the configured secret
    SignatureInvalid,
    /// Expired past the allowed leeway
    Expired,
    /// Refresh token was minted for another device
    DeviceMismatch,
    /// No stored credential for (user, device)
    UnknownDeviceBinding,
    /// Presented refresh token does not match the stored hash
    HashMismatch,
}

impl TokenRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenRejection::Malformed => "malformed",
            TokenRejection::SignatureInvalid => "signature_invalid",
            TokenRejection::Expired => "expired",
            TokenRejection::DeviceMismatch => "device_mismatch",
            TokenRejection::UnknownDeviceBinding => "unknown_device_binding",
            TokenRejection::HashMismatch => "hash_mismatch",
        }
    }
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenRejection::Malformed => write!(f, "token is malformed"),
            TokenRejection::SignatureInvalid => write!(f, "token signature is invalid"),
            TokenRejection::Expired => write!(f, "token has expired"),
            TokenRejection::DeviceMismatch => write!(f, "token was issued for another device"),
            TokenRejection::UnknownDeviceBinding => {
                write!(f, "no credential is bound to this user and device")
            }
            TokenRejection::HashMismatch => write!(f, "token does not match stored credential"),
        }
    }
}

impl From<&jsonwebtoken::errors::Error> for TokenRejection {
    fn from(err: &jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::MissingRequiredClaim(_) => TokenRejection::Malformed,
            ErrorKind::ExpiredSignature => TokenRejection::Expired,
            _ => TokenRejection::SignatureInvalid,
        }
    }
}

/// ============================================================================
/// 2. INFRASTRUCTURE ERRORS
/// ============================================================================

/// Credential store failures
#[derive(Debug)]
pub enum StoreError {
    /// Store cannot be reached (pool exhausted, connection refused, lock poisoned)
    Unavailable(String),
    /// Statement failed or returned a corrupt row
    Query(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Credential store unavailable: {}", msg),
            StoreError::Query(msg) => write!(f, "Credential store query error: {}", msg),
        }
    }
}

impl StdError for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
    ParseError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => ConfigError::MissingRequired(key),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}

/// ============================================================================
/// 3. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Errors surfaced to the caller of the rotation engine
#[derive(Debug)]
pub enum AppError {
    Store(StoreError),
    Config(ConfigError),
    Internal(String),
}

impl AppError {
    /// Infrastructure faults the caller should answer with a retryable
    /// server error instead of an authentication denial.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Store(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AppError::Store(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Internal(_) => None,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(err.into())
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Error context for structured logging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub device_id: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            device_id: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn log_error(&self, error: &AppError) {
        let context = serde_json::json!({
            "request_id": self.request_id,
            "operation": self.operation,
            "user_id": self.user_id,
            "device_id": self.device_id,
            "timestamp": self.timestamp.to_rfc3339(),
        });

        match error {
            AppError::Store(_) => {
                tracing::error!(
                    error = %error,
                    retryable = true,
                    context = ?context,
                    "Credential store error"
                );
            }
            AppError::Config(_) => {
                tracing::error!(
                    error = %error,
                    context = ?context,
                    "Configuration error"
                );
            }
            AppError::Internal(_) => {
                tracing::error!(
                    error = %error,
                    context = ?context,
                    "Internal error"
                );
            }
        }
    }
}
