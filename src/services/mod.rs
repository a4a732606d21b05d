//! Application services
//!
//! - **Registration**: crop registration and reward minting
//! - **Query**: crop listings, token sums, farmer summary
//! - **Accounts**: sign-up, login, wallet address, profile
//! - **Readings**: field sensor samples

pub mod accounts;
pub mod query;
pub mod readings;
pub mod registration;

pub use accounts::{AccountService, AuthSession, LoginRequest, Profile, SignUpRequest};
pub use query::{CropQueryService, FarmerSummary};
pub use readings::ReadingService;
pub use registration::{RegisterCropRequest, RegistrationResult, RegistrationService};
