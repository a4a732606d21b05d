//! HTTP routes for crops
//!
//! - POST /api/crops          - Register a crop (farmers only)
//! - GET  /api/crops          - Caller's crops, newest first (`page`, `pageSize`, `from`, `to`)
//! - GET  /api/crops/summary  - Caller's balance, totals and tier
//! - GET  /api/crops/{id}     - One of the caller's crops

use chrono::{DateTime, Utc};
use hyper::Request;
use serde::Deserialize;

use super::auth_routes::authenticate;
use super::response::{created, ok, parse_json_body, parse_query, RouteResult};
use crate::auth::{require, Capability};
use crate::server::AppState;
use crate::services::RegisterCropRequest;
use crate::types::{CropQuery, CropchainError, DateRange, PageRequest};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    page: Option<u64>,
    page_size: Option<u64>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

impl ListParams {
    fn into_query(self) -> crate::types::Result<CropQuery> {
        Ok(CropQuery {
            paging: PageRequest::new(self.page, self.page_size),
            range: DateRange::new(self.from, self.to)?,
        })
    }
}

/// POST /api/crops
pub async fn handle_register_crop<B>(req: Request<B>, state: &AppState) -> RouteResult
where
    B: hyper::body::Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let claims = authenticate(&req, state)?;
    require(claims.role, Capability::RegisterCrop)?;

    let body: RegisterCropRequest = parse_json_body(req, state.args.max_body_bytes).await?;
    let result = state.registration.register_crop(&claims.sub, body).await?;
    created(&result)
}

/// GET /api/crops
pub async fn handle_list_crops<B>(req: Request<B>, state: &AppState) -> RouteResult {
    let claims = authenticate(&req, state)?;
    let params: ListParams = parse_query(&req)?;
    let page = state
        .queries
        .list_my_crops(&claims.sub, params.into_query()?)
        .await?;
    ok(&page)
}

/// GET /api/crops/summary
pub async fn handle_summary<B>(req: Request<B>, state: &AppState) -> RouteResult {
    let claims = authenticate(&req, state)?;
    let summary = state.queries.summary(&claims.sub).await?;
    ok(&summary)
}

/// GET /api/crops/{id}
pub async fn handle_get_crop<B>(req: Request<B>, state: &AppState, crop_id: &str) -> RouteResult {
    let claims = authenticate(&req, state)?;
    if crop_id.is_empty() || crop_id.contains('/') {
        return Err(CropchainError::NotFound("Crop not found".into()));
    }
    let crop = state.queries.get_crop(&claims.sub, crop_id).await?;
    ok(&crop)
}
