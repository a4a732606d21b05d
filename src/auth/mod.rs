//! Authentication and authorization for cropchain
//!
//! Provides:
//! - JWT token generation and validation
//! - Account roles and route capabilities
//! - Password hashing with Argon2

pub mod jwt;
pub mod password;
pub mod permissions;

pub use jwt::{extract_token_from_header, Claims, JwtValidator};
pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
pub use permissions::{is_allowed, require, Capability, Role};
