//! HTTP routes for sensor readings
//!
//! - POST /api/readings         - Store a reading
//! - GET  /api/readings         - Readings, newest first (`page`, `limit`)
//! - GET  /api/readings/latest  - Most recent reading

use hyper::Request;
use serde::Deserialize;

use super::auth_routes::authenticate;
use super::response::{created, ok, parse_json_body, parse_query, RouteResult};
use crate::server::AppState;
use crate::types::{NewReading, PageRequest};

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    page: Option<u64>,
    limit: Option<u64>,
}

/// POST /api/readings
pub async fn handle_record<B>(req: Request<B>, state: &AppState) -> RouteResult
where
    B: hyper::body::Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    authenticate(&req, state)?;
    let body: NewReading = parse_json_body(req, state.args.max_body_bytes).await?;
    let reading = state.readings.record(body).await?;
    created(&reading)
}

/// GET /api/readings
pub async fn handle_list<B>(req: Request<B>, state: &AppState) -> RouteResult {
    authenticate(&req, state)?;
    let params: ListParams = parse_query(&req)?;
    let page = state
        .readings
        .list(PageRequest::new(params.page, params.limit))
        .await?;
    ok(&page)
}

/// GET /api/readings/latest
pub async fn handle_latest<B>(req: Request<B>, state: &AppState) -> RouteResult {
    authenticate(&req, state)?;
    ok(&state.readings.latest().await?)
}
