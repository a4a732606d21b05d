//! Operator routes
//!
//! - GET /api/admin/holders?limit - Accounts holding tokens, largest balance first

use hyper::Request;
use serde::{Deserialize, Serialize};

use super::auth_routes::authenticate;
use super::response::{ok, parse_query, RouteResult};
use crate::auth::{require, Capability};
use crate::server::AppState;
use crate::types::MAX_PAGE_SIZE;

const DEFAULT_HOLDER_LIMIT: u64 = 20;

#[derive(Debug, Default, Deserialize)]
struct HolderParams {
    limit: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Holder {
    user_id: String,
    username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    wallet_address: Option<String>,
    token_balance: u64,
}

/// GET /api/admin/holders
pub async fn handle_holders<B>(req: Request<B>, state: &AppState) -> RouteResult {
    let claims = authenticate(&req, state)?;
    require(claims.role, Capability::ViewHolders)?;

    let params: HolderParams = parse_query(&req)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HOLDER_LIMIT)
        .clamp(1, MAX_PAGE_SIZE);

    let holders: Vec<Holder> = state
        .accounts
        .holders(limit)
        .await?
        .into_iter()
        .map(|u| Holder {
            user_id: u.id,
            username: u.username,
            wallet_address: u.wallet_address,
            token_balance: u.token_balance,
        })
        .collect();

    ok(&holders)
}
