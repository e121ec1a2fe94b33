/// Authentication module
///
/// Token signing and validation, refresh credential hashing, and the
/// rotation decision built on top of them.

mod claims;
mod credential;
mod jwt;
mod rotation;
mod token_pair;
mod validator;

pub use claims::AccessClaims;
pub use claims::RefreshClaims;
pub use credential::hash_refresh_token;
pub use credential::hash_refresh_token_blocking;
pub use credential::verify_refresh_token;
pub use credential::verify_refresh_token_blocking;
pub use jwt::Signer;
pub use jwt::TOKEN_TYPE;
pub use rotation::Rotation;
pub use rotation::RotationEngine;
pub use rotation::RotationOutcome;
pub use token_pair::TokenPair;
pub use validator::AccessCheck;
pub use validator::RefreshCheck;
pub use validator::TokenValidator;
