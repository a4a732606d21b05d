//! Shared types for cropchain

pub mod error;
pub mod model;

pub use error::{CropchainError, Result};
pub use model::{
    CropPage, CropQuery, CropRecord, DateRange, NewCrop, NewReading, NewUser, Page, PageRequest,
    ReadingPage, SensorReading, User, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
