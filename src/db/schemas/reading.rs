//! Sensor reading document schema

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::types::{NewReading, SensorReading};

/// Collection name for sensor readings
pub const READING_COLLECTION: &str = "sensor_readings";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReadingDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub temperature: f64,
    pub humidity: f64,
    pub moisture: f64,
    pub recorded_at: DateTime,
}

impl ReadingDoc {
    pub fn new(input: NewReading) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            temperature: input.temperature,
            humidity: input.humidity,
            moisture: input.moisture,
            recorded_at: DateTime::now(),
        }
    }

    pub fn into_reading(self) -> SensorReading {
        SensorReading {
            id: self._id.map(|id| id.to_hex()).unwrap_or_default(),
            temperature: self.temperature,
            humidity: self.humidity,
            moisture: self.moisture,
            recorded_at: self.recorded_at.to_chrono(),
        }
    }
}

impl IntoIndexes for ReadingDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "recorded_at": -1 },
            Some(
                IndexOptions::builder()
                    .name("recorded_at_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for ReadingDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
