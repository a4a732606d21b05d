//! JWT bearer tokens for farmer and admin sessions
//!
//! Tokens are HS256-signed and carry the user id, username and role so that
//! request handlers never need a database round trip to authorize.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::Role;
use crate::types::{CropchainError, User};

/// Minimum secret length outside dev mode
pub const MIN_SECRET_LEN: usize = 32;

/// Payload stored in JWT token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// JWT validator and generator
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    expiry_seconds: u64,
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, CropchainError> {
        if secret.is_empty() {
            return Err(CropchainError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(CropchainError::Config(format!(
                "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
            )));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Create a validator for dev mode (allows empty secret)
    pub fn new_dev() -> Self {
        Self {
            secret: "dev-mode-secret-not-for-production-use-123456".into(),
            expiry_seconds: 3600,
        }
    }

    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }

    /// Generate a JWT token for an authenticated user
    pub fn generate_token(&self, user: &User) -> Result<String, CropchainError> {
        let now = unix_now()?;

        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| CropchainError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verify and decode a JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, CropchainError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            let reason = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidToken => "Invalid token",
                ErrorKind::InvalidSignature => "Invalid signature",
                _ => "Token validation failed",
            };
            CropchainError::Unauthorized(reason.into())
        })
    }
}

fn unix_now() -> Result<u64, CropchainError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| CropchainError::Internal(format!("System time error: {}", e)))
}

/// Extract token from Authorization header.
/// Supports "Bearer <token>" format only.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let token = auth_header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> JwtValidator {
        JwtValidator::new(
            "test-secret-that-is-at-least-32-characters-long".into(),
            3600,
        )
        .unwrap()
    }

    fn farmer() -> User {
        User {
            id: "65f0c0ffee0000000000abcd".into(),
            email: "ana@farm.io".into(),
            username: "ana".into(),
            password_hash: String::new(),
            role: Role::Farmer,
            wallet_address: None,
            token_balance: 0,
            last_login: None,
            created_at: None,
        }
    }

    #[test]
    fn test_generate_and_verify_token() {
        let validator = test_validator();
        let token = validator.generate_token(&farmer()).unwrap();

        let claims = validator.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "65f0c0ffee0000000000abcd");
        assert_eq!(claims.username, "ana");
        assert_eq!(claims.role, Role::Farmer);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = test_validator().generate_token(&farmer()).unwrap();
        let other = JwtValidator::new(
            "another-secret-that-is-at-least-32-chars!!".into(),
            3600,
        )
        .unwrap();

        let err = other.verify_token(&token).unwrap_err();
        assert!(matches!(err, CropchainError::Unauthorized(_)));
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(JwtValidator::new("short".into(), 3600).is_err());
        assert!(JwtValidator::new(String::new(), 3600).is_err());
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header(Some("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_token_from_header(Some("Bearer   ")), None);
        assert_eq!(extract_token_from_header(Some("Basic dXNlcg==")), None);
        assert_eq!(extract_token_from_header(None), None);
    }
}
