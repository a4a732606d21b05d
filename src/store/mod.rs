//! Storage seams for users, crops and sensor readings
//!
//! Workflows depend on these traits, never on a concrete backend:
//! - [`MongoStore`]: production, MongoDB-backed
//! - [`MemoryStore`]: dev mode without MongoDB, and tests
//!
//! Balance changes go through [`UserStore::increment_balance`], which both
//! backends implement as a single atomic operation. Callers never
//! read-modify-write a balance.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use crate::types::{
    CropPage, CropQuery, CropRecord, NewCrop, NewReading, NewUser, PageRequest, ReadingPage,
    Result, SensorReading, User,
};

/// Aggregate figures over one farmer's crops
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CropTotals {
    pub crop_count: u64,
    pub total_weight: f64,
    pub total_tokens: u64,
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Duplicate email or username is a `Conflict`.
    async fn create_user(&self, input: NewUser) -> Result<User>;

    /// Look up by id. Unknown or malformed ids yield `None`.
    async fn find_user(&self, id: &str) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Whether any user already holds this email or username
    async fn user_exists(&self, email: &str, username: &str) -> Result<bool>;

    /// Persist a wallet address. Returns false when the user is unknown.
    async fn set_wallet_address(&self, id: &str, address: &str) -> Result<bool>;

    async fn record_login(&self, id: &str) -> Result<()>;

    /// Atomically add `amount` to the balance and return the new balance.
    /// `None` when the user is unknown.
    async fn increment_balance(&self, id: &str, amount: u64) -> Result<Option<u64>>;

    /// Users with a positive balance, largest first
    async fn list_holders(&self, limit: u64) -> Result<Vec<User>>;
}

#[async_trait::async_trait]
pub trait CropStore: Send + Sync {
    /// Persist a crop; storage assigns `id` and `registered_at`
    async fn insert_crop(&self, input: NewCrop) -> Result<CropRecord>;

    async fn find_crop(&self, id: &str) -> Result<Option<CropRecord>>;

    /// A farmer's crops, newest first, sliced by the query's paging
    async fn list_crops(&self, farmer_id: &str, query: &CropQuery) -> Result<CropPage>;

    /// Sum of `token_amount` over all of a farmer's crops
    async fn sum_tokens(&self, farmer_id: &str) -> Result<u64>;

    async fn crop_totals(&self, farmer_id: &str) -> Result<CropTotals>;
}

#[async_trait::async_trait]
pub trait ReadingStore: Send + Sync {
    async fn insert_reading(&self, input: NewReading) -> Result<SensorReading>;

    /// Readings, newest first
    async fn list_readings(&self, paging: PageRequest) -> Result<ReadingPage>;

    async fn latest_reading(&self) -> Result<Option<SensorReading>>;
}
