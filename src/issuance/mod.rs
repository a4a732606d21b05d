//! Token issuance
//!
//! Minting happens on an external ledger. The service only knows how to ask
//! an issuer to credit `amount` whole tokens to an address; key custody and
//! transaction signing live behind the [`TokenIssuer`] seam.
//!
//! - [`HttpIssuer`]: posts mint requests to an issuance gateway
//! - [`DisabledIssuer`]: used when no gateway is configured; every mint fails

mod http;

pub use http::{base_units, HttpIssuer, HttpIssuerConfig, MintRequest, MintResponse, MAX_DECIMALS};

use serde::Serialize;

/// Why a mint did not happen
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MintError {
    #[error("token issuance is not configured")]
    NotConfigured,

    #[error("issuer rejected mint: {0}")]
    Rejected(String),

    #[error("issuer unreachable: {0}")]
    Transport(String),

    #[error("invalid mint amount: {0}")]
    InvalidAmount(String),
}

/// Proof that a mint went through
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintReceipt {
    /// Ledger transaction signature
    pub signature: String,
    pub amount: u64,
}

/// Trait for the external issuance collaborator - allows swapping
/// implementations (gateway in production, fakes in tests)
#[async_trait::async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Mint `amount` whole tokens to `address`. Called at most once per
    /// registration; implementations must not retry internally.
    async fn mint(&self, address: &str, amount: u64) -> Result<MintReceipt, MintError>;

    /// Whether mints can succeed at all (reported by /health)
    fn is_configured(&self) -> bool {
        true
    }
}

/// Issuer used when no gateway URL is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledIssuer;

#[async_trait::async_trait]
impl TokenIssuer for DisabledIssuer {
    async fn mint(&self, _address: &str, _amount: u64) -> Result<MintReceipt, MintError> {
        Err(MintError::NotConfigured)
    }

    fn is_configured(&self) -> bool {
        false
    }
}
