//! Bookkeeping fields embedded in every document

use bson::DateTime;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Creation and update timestamps. Records are never deleted.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    pub fn new() -> Self {
        let now = DateTime::now();
        Self {
            updated_at: Some(now),
            created_at: Some(now),
        }
    }

    pub fn created_at_utc(&self) -> Option<chrono::DateTime<Utc>> {
        self.created_at.map(|dt| dt.to_chrono())
    }
}
