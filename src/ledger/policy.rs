//! Crop weight to reward token conversion

use crate::types::CropchainError;

/// Default conversion rate: one token per kilogram
pub const DEFAULT_KG_PER_TOKEN: u32 = 1;

/// Heaviest single batch accepted for registration (one million tonnes)
pub const MAX_CROP_WEIGHT_KG: f64 = 1_000_000_000.0;

/// Token amounts are stored as signed 64-bit integers
const MAX_TOKEN_AMOUNT: f64 = i64::MAX as f64;

/// Fixed conversion rate from crop weight to whole reward tokens.
///
/// `tokens_for(w) == floor(w / kg_per_token)` for every finite `w >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    kg_per_token: u32,
}

impl TokenPolicy {
    pub fn new(kg_per_token: u32) -> Result<Self, CropchainError> {
        if kg_per_token == 0 {
            return Err(CropchainError::Config(
                "KG_PER_TOKEN must be at least 1".into(),
            ));
        }
        Ok(Self { kg_per_token })
    }

    pub fn kg_per_token(&self) -> u32 {
        self.kg_per_token
    }

    /// Whole tokens earned for `weight` kilograms.
    ///
    /// Amounts that would not fit a stored `i64` are rejected rather than
    /// clamped.
    pub fn tokens_for(&self, weight: f64) -> Result<u64, CropchainError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(CropchainError::InvalidWeight(weight));
        }

        let tokens = (weight / f64::from(self.kg_per_token)).floor();
        if tokens >= MAX_TOKEN_AMOUNT {
            return Err(CropchainError::InvalidWeight(weight));
        }
        Ok(tokens as u64)
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            kg_per_token: DEFAULT_KG_PER_TOKEN,
        }
    }
}
