//! HTTP server and shared application state

pub mod http;

pub use http::{dispatch, run};

use std::sync::Arc;
use std::time::Instant;

use crate::config::Args;
use crate::issuance::TokenIssuer;
use crate::services::{AccountService, CropQueryService, ReadingService, RegistrationService};
use crate::store::{CropStore, ReadingStore, UserStore};
use crate::types::Result;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub accounts: AccountService,
    pub registration: RegistrationService,
    pub queries: CropQueryService,
    pub readings: ReadingService,
    /// Active storage backend name, reported by /health
    pub storage: &'static str,
    pub issuer_configured: bool,
    pub started_at: Instant,
}

impl AppState {
    /// Wire every service onto one storage backend and issuer
    pub fn new<S>(
        args: Args,
        store: Arc<S>,
        storage: &'static str,
        issuer: Arc<dyn TokenIssuer>,
    ) -> Result<Self>
    where
        S: UserStore + CropStore + ReadingStore + 'static,
    {
        let jwt = args.jwt_validator()?;
        let policy = args.token_policy()?;
        let issuer_configured = issuer.is_configured();

        Ok(Self {
            accounts: AccountService::new(store.clone(), jwt),
            registration: RegistrationService::new(store.clone(), store.clone(), issuer, policy),
            queries: CropQueryService::new(store.clone(), store.clone()),
            readings: ReadingService::new(store),
            storage,
            issuer_configured,
            started_at: Instant::now(),
            args,
        })
    }
}
