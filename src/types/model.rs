//! Domain types shared by stores, services and routes
//!
//! These are storage-agnostic: the MongoDB documents in `db::schemas` convert
//! into them, and the in-memory store holds them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::types::{CropchainError, Result};

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Upper bound on page size for list endpoints
pub const MAX_PAGE_SIZE: u64 = 100;

// =============================================================================
// Users
// =============================================================================

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    /// Argon2 PHC string, never sent to clients
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub token_balance: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

// =============================================================================
// Crops
// =============================================================================

/// A registered crop batch. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CropRecord {
    pub id: String,
    pub name: String,
    /// Kilograms, always > 0
    pub weight: f64,
    pub location: String,
    pub farmer_id: String,
    pub registered_at: DateTime<Utc>,
    /// Tokens earned at registration time; never recomputed
    pub token_amount: u64,
}

/// Input for persisting a crop. `id` and `registered_at` come from storage.
#[derive(Debug, Clone)]
pub struct NewCrop {
    pub farmer_id: String,
    pub name: String,
    pub weight: f64,
    pub location: String,
    pub token_amount: u64,
}

/// Inclusive timestamp window. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(CropchainError::Validation(
                    "Date range start must not be after its end".into(),
                ));
            }
        }
        Ok(Self { from, to })
    }

    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.to.map_or(true, |to| at <= to)
    }
}

/// 1-based page request with clamped size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn new(page: Option<u64>, page_size: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Number of records to skip before this page
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Listing parameters for a farmer's crops
#[derive(Debug, Clone, Copy, Default)]
pub struct CropQuery {
    pub paging: PageRequest,
    pub range: DateRange,
}

/// One page of results plus the unpaged total
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, paging: PageRequest) -> Self {
        Self {
            items,
            total_count,
            page: paging.page,
            page_size: paging.page_size,
        }
    }
}

pub type CropPage = Page<CropRecord>;

// =============================================================================
// Sensor readings
// =============================================================================

/// A field sensor sample
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub id: String,
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: f64,
    /// Soil moisture, percent
    pub moisture: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Input for storing a sensor reading
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NewReading {
    pub temperature: f64,
    pub humidity: f64,
    pub moisture: f64,
}

pub type ReadingPage = Page<SensorReading>;
