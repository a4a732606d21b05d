//! Cropchain - crop registration backend with ledger token rewards
//!
//! Farmers register harvested crop batches by weight. Each registration is
//! stored, converted into reward tokens by the configured rate, minted to
//! the farmer's wallet through an issuance gateway, and credited to the
//! farmer's balance.
//!
//! ## Services
//!
//! - **Registration**: validate, persist, mint, credit
//! - **Query**: crop listings, token sums, farmer summary
//! - **Accounts**: sign-up, login, wallet address, profile
//! - **Readings**: field sensor samples
//! - **Storage**: MongoDB in production, in-memory for dev mode and tests

pub mod auth;
pub mod config;
pub mod db;
pub mod issuance;
pub mod ledger;
pub mod routes;
pub mod server;
pub mod services;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{CropchainError, Result};
