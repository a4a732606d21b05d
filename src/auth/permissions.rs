//! Account roles and route authorization

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::CropchainError;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
#[derive(Default)]
pub enum Role {
    /// Registers crops and earns tokens
    #[default]
    Farmer = 0,
    /// Operator access (holder listings)
    Admin = 1,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Farmer => write!(f, "farmer"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = CropchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "farmer" => Ok(Role::Farmer),
            "admin" => Ok(Role::Admin),
            other => Err(CropchainError::Validation(format!("Unknown role: {other}"))),
        }
    }
}

/// Route capability checked against the caller's role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Any signed-in account
    ReadOwn,
    /// Crop registration; only farmers register crops
    RegisterCrop,
    /// Operator views
    ViewHolders,
}

/// Check whether a role may use a capability
pub fn is_allowed(role: Role, capability: Capability) -> bool {
    match capability {
        Capability::ReadOwn => true,
        Capability::RegisterCrop => role == Role::Farmer,
        Capability::ViewHolders => role == Role::Admin,
    }
}

/// Like [`is_allowed`], as a `Forbidden` error
pub fn require(role: Role, capability: Capability) -> Result<(), CropchainError> {
    if is_allowed(role, capability) {
        Ok(())
    } else {
        Err(CropchainError::Forbidden(format!(
            "User role {role} is not authorized to access this route"
        )))
    }
}
