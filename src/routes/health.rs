//! Liveness endpoint
//!
//! Reports which storage backend is active and whether minting is wired up.
//! Always 200 while the process serves requests.

use serde::Serialize;

use super::response::{ok, RouteResult};
use crate::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    /// `mongodb` or `memory`
    pub storage: &'static str,
    pub issuance_configured: bool,
    pub kg_per_token: u32,
    pub mode: &'static str,
    pub timestamp: String,
}

/// GET /health
pub fn health_check(state: &AppState) -> RouteResult {
    ok(&HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        storage: state.storage,
        issuance_configured: state.issuer_configured,
        kg_per_token: state.registration.policy().kg_per_token(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
