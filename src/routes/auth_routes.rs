//! HTTP routes for accounts
//!
//! - POST /api/auth/register - Create a farmer account and get a JWT
//! - POST /api/auth/login    - Authenticate and get a JWT
//! - GET  /api/auth/me       - Current account with tier
//! - PUT  /api/wallet        - Set the wallet address that receives rewards

use hyper::header::AUTHORIZATION;
use hyper::Request;
use serde::Deserialize;
use tracing::debug;

use super::response::{created, ok, parse_json_body, RouteResult};
use crate::auth::{extract_token_from_header, Claims};
use crate::server::AppState;
use crate::services::{LoginRequest, SignUpRequest};
use crate::types::{CropchainError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletRequest {
    #[serde(default)]
    wallet_address: String,
}

/// Verify the bearer token on a request
pub fn authenticate<B>(req: &Request<B>, state: &AppState) -> Result<Claims> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = extract_token_from_header(header)
        .ok_or_else(|| CropchainError::Unauthorized("No token provided".into()))?;

    let claims = state.accounts.jwt().verify_token(token)?;
    debug!(user_id = %claims.sub, role = %claims.role, "Authenticated request");
    Ok(claims)
}

/// POST /api/auth/register
pub async fn handle_register<B>(req: Request<B>, state: &AppState) -> RouteResult
where
    B: hyper::body::Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let body: SignUpRequest = parse_json_body(req, state.args.max_body_bytes).await?;
    let session = state.accounts.sign_up(body).await?;
    created(&session)
}

/// POST /api/auth/login
pub async fn handle_login<B>(req: Request<B>, state: &AppState) -> RouteResult
where
    B: hyper::body::Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let body: LoginRequest = parse_json_body(req, state.args.max_body_bytes).await?;
    let session = state.accounts.login(body).await?;
    ok(&session)
}

/// GET /api/auth/me
pub async fn handle_me<B>(req: Request<B>, state: &AppState) -> RouteResult {
    let claims = authenticate(&req, state)?;
    let profile = state.accounts.profile(&claims.sub).await?;
    ok(&profile)
}

/// PUT /api/wallet
pub async fn handle_set_wallet<B>(req: Request<B>, state: &AppState) -> RouteResult
where
    B: hyper::body::Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let claims = authenticate(&req, state)?;
    let body: WalletRequest = parse_json_body(req, state.args.max_body_bytes).await?;
    let user = state
        .accounts
        .set_wallet(&claims.sub, &body.wallet_address)
        .await?;
    ok(&user)
}
