//! Token accounting rules: weight conversion, wallet addresses, tiers

pub mod address;
pub mod policy;
pub mod tier;

pub use address::parse_wallet_address;
pub use policy::{TokenPolicy, DEFAULT_KG_PER_TOKEN, MAX_CROP_WEIGHT_KG};
pub use tier::Tier;
