//! Crop record document schema

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::types::{CropRecord, CropchainError, NewCrop, Result};

/// Collection name for crops
pub const CROP_COLLECTION: &str = "crops";

/// Crop document stored in MongoDB. Written once, never updated.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CropDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub name: String,

    /// Kilograms
    pub weight: f64,

    pub location: String,

    /// Hex id of the owning user
    pub farmer_id: String,

    pub registered_at: DateTime,

    /// Tokens earned when registered
    pub token_amount: i64,
}

impl CropDoc {
    pub fn new(input: NewCrop) -> Result<Self> {
        let token_amount = i64::try_from(input.token_amount).map_err(|_| {
            CropchainError::Validation(format!(
                "Token amount {} is too large to store",
                input.token_amount
            ))
        })?;
        Ok(Self {
            _id: None,
            metadata: Metadata::new(),
            name: input.name,
            weight: input.weight,
            location: input.location,
            farmer_id: input.farmer_id,
            registered_at: DateTime::now(),
            token_amount,
        })
    }

    pub fn into_record(self) -> CropRecord {
        CropRecord {
            id: self._id.map(|id| id.to_hex()).unwrap_or_default(),
            name: self.name,
            weight: self.weight,
            location: self.location,
            farmer_id: self.farmer_id,
            registered_at: self.registered_at.to_chrono(),
            token_amount: u64::try_from(self.token_amount).unwrap_or(0),
        }
    }
}

impl IntoIndexes for CropDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Serves "my crops, newest first"
            (
                doc! { "farmer_id": 1, "registered_at": -1, "_id": -1 },
                Some(
                    IndexOptions::builder()
                        .name("farmer_registered_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for CropDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
