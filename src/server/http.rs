//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. One task per
//! connection; each request is routed by [`dispatch`].

use hyper::body::Incoming;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::AppState;
use crate::routes::{self, cors_preflight, error_response, error_with_status, BoxBody, RouteResult};
use crate::types::CropchainError;

const CROP_PREFIX: &str = "/api/crops/";

/// Paths the router knows, for 405 versus 404
const KNOWN_PATHS: &[&str] = &[
    "/health",
    "/api/auth/register",
    "/api/auth/login",
    "/api/auth/me",
    "/api/wallet",
    "/api/crops",
    "/api/crops/summary",
    "/api/readings",
    "/api/readings/latest",
    "/api/admin/holders",
];

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), CropchainError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        listen = %state.args.listen,
        storage = state.storage,
        "Cropchain listening"
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - dev JWT secret in use unless JWT_SECRET is set");
    }
    if !state.issuer_configured {
        warn!("MINT_SERVICE_URL not set - registrations will record crops without minting");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        debug!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let started = Instant::now();
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = dispatch(req, &state).await;
    apply_cors(&mut response, &state.args.cors_origin);
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert("x-request-id", value);
    }

    info!(
        request_id = %request_id,
        peer = %addr,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request"
    );

    Ok(response)
}

/// Route a request to its handler and render any error
pub async fn dispatch<B>(req: Request<B>, state: &AppState) -> Response<BoxBody>
where
    B: hyper::body::Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let result: RouteResult = match (&method, path.as_str()) {
        (&Method::OPTIONS, _) => Ok(cors_preflight()),

        (&Method::GET, "/health") => routes::health_check(state),

        (&Method::POST, "/api/auth/register") => routes::handle_register(req, state).await,
        (&Method::POST, "/api/auth/login") => routes::handle_login(req, state).await,
        (&Method::GET, "/api/auth/me") => routes::handle_me(req, state).await,
        (&Method::PUT, "/api/wallet") => routes::handle_set_wallet(req, state).await,

        (&Method::POST, "/api/crops") => routes::handle_register_crop(req, state).await,
        (&Method::GET, "/api/crops") => routes::handle_list_crops(req, state).await,
        (&Method::GET, "/api/crops/summary") => routes::handle_summary(req, state).await,
        (&Method::GET, p) if p.starts_with(CROP_PREFIX) => {
            routes::handle_get_crop(req, state, &p[CROP_PREFIX.len()..]).await
        }

        (&Method::POST, "/api/readings") => routes::readings::handle_record(req, state).await,
        (&Method::GET, "/api/readings") => routes::readings::handle_list(req, state).await,
        (&Method::GET, "/api/readings/latest") => {
            routes::readings::handle_latest(req, state).await
        }

        (&Method::GET, "/api/admin/holders") => routes::handle_holders(req, state).await,

        (_, p) if KNOWN_PATHS.contains(&p) || p.starts_with(CROP_PREFIX) => Ok(
            error_with_status(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
        ),

        _ => Ok(error_with_status(
            StatusCode::NOT_FOUND,
            format!("No route for {method} {path}"),
        )),
    };

    match result {
        Ok(response) => response,
        Err(err) => {
            if err.is_client_fault() {
                debug!(method = %method, path = %path, error = %err, "Request rejected");
            } else {
                error!(method = %method, path = %path, error = %err, "Request failed");
            }
            error_response(&err)
        }
    }
}

fn apply_cors(response: &mut Response<BoxBody>, origin: &str) {
    let origin = HeaderValue::from_str(origin).unwrap_or(HeaderValue::from_static("*"));
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}
