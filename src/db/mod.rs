//! Database layer for cropchain
//!
//! Provides MongoDB storage for users, crop records and sensor readings.

pub mod mongo;
pub mod schemas;

pub use mongo::{MongoClient, MongoCollection};
pub use schemas::{CropDoc, Metadata, ReadingDoc, UserDoc};
