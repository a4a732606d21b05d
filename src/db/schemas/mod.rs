//! Database schemas for cropchain
//!
//! Defines MongoDB document structures for users, crops and sensor readings.

mod crop;
mod metadata;
mod reading;
mod user;

pub use crop::{CropDoc, CROP_COLLECTION};
pub use metadata::Metadata;
pub use reading::{ReadingDoc, READING_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};
