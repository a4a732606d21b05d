//! Response and request helpers shared by the route handlers

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{CropchainError, Result};

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Handler outcome; errors are rendered by [`error_response`]
pub type RouteResult = Result<Response<BoxBody>>;

/// Success envelope: `{ "success": true, "data": ... }`
#[derive(Serialize)]
struct Envelope<'a, T> {
    success: bool,
    data: &'a T,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

fn json_with_status(status: StatusCode, json: String) -> Response<BoxBody> {
    let mut response = Response::new(full_body(json));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Wrap `data` in the success envelope
pub fn json_response<T: Serialize>(status: StatusCode, data: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(&Envelope {
        success: true,
        data,
    })
    .unwrap_or_else(|_| r#"{"success":false,"error":"Serialization failed"}"#.to_string());
    json_with_status(status, json)
}

pub fn ok<T: Serialize>(data: &T) -> RouteResult {
    Ok(json_response(StatusCode::OK, data))
}

pub fn created<T: Serialize>(data: &T) -> RouteResult {
    Ok(json_response(StatusCode::CREATED, data))
}

/// Render an error as `{ "success": false, "error": "..." }`
pub fn error_response(err: &CropchainError) -> Response<BoxBody> {
    error_with_status(err.status_code(), err.public_message())
}

pub fn error_with_status(status: StatusCode, message: impl Into<String>) -> Response<BoxBody> {
    let json = serde_json::to_string(&ErrorBody {
        success: false,
        error: message.into(),
    })
    .unwrap_or_else(|_| r#"{"success":false,"error":"Internal server error"}"#.to_string());
    json_with_status(status, json)
}

pub fn cors_preflight() -> Response<BoxBody> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
        .headers_mut()
        .insert("Access-Control-Max-Age", HeaderValue::from_static("86400"));
    response
}

/// Read and deserialize a JSON body of at most `max_bytes`
pub async fn parse_json_body<T, B>(req: Request<B>, max_bytes: usize) -> Result<T>
where
    T: DeserializeOwned,
    B: hyper::body::Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let body = Limited::new(req.into_body(), max_bytes)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<http_body_util::LengthLimitError>() {
                CropchainError::BadRequest("Request body too large".into())
            } else {
                CropchainError::BadRequest(format!("Failed to read body: {e}"))
            }
        })?;

    let bytes = body.to_bytes();
    if bytes.is_empty() {
        return Err(CropchainError::BadRequest("Request body is required".into()));
    }

    serde_json::from_slice(&bytes).map_err(|e| CropchainError::BadRequest(format!("Invalid JSON: {e}")))
}

/// Deserialize the query string, treating a missing one as empty
pub fn parse_query<T: DeserializeOwned, B>(req: &Request<B>) -> Result<T> {
    serde_urlencoded::from_str(req.uri().query().unwrap_or(""))
        .map_err(|e| CropchainError::BadRequest(format!("Invalid query string: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    async fn body_json(response: Response<BoxBody>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = error_response(&CropchainError::NotFound("Crop not found".into()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Not found: Crop not found");
    }

    #[tokio::test]
    async fn test_storage_errors_are_masked() {
        let response = error_response(&CropchainError::Database("connection reset".into()));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["error"], "Storage unavailable");
    }

    #[tokio::test]
    async fn test_json_body_limit() {
        #[derive(Debug, Deserialize)]
        struct Payload {
            name: String,
        }

        let req = Request::new(Full::new(Bytes::from(r#"{"name":"maize"}"#)));
        let payload: Payload = parse_json_body(req, 1024).await.unwrap();
        assert_eq!(payload.name, "maize");

        let req = Request::new(Full::new(Bytes::from(vec![b' '; 64])));
        let err = parse_json_body::<Payload, _>(req, 16).await.unwrap_err();
        assert!(matches!(err, CropchainError::BadRequest(msg) if msg.contains("too large")));

        let req = Request::new(Full::new(Bytes::from("not json")));
        assert!(parse_json_body::<Payload, _>(req, 1024).await.is_err());
    }

    #[test]
    fn test_query_parsing() {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Params {
            page: Option<u64>,
            page_size: Option<u64>,
        }

        let req = Request::get("/api/crops?page=2&pageSize=5").body(()).unwrap();
        let params: Params = parse_query(&req).unwrap();
        assert_eq!((params.page, params.page_size), (Some(2), Some(5)));

        let req = Request::get("/api/crops").body(()).unwrap();
        let params: Params = parse_query(&req).unwrap();
        assert_eq!((params.page, params.page_size), (None, None));

        let req = Request::get("/api/crops?page=abc").body(()).unwrap();
        assert!(parse_query::<Params, _>(&req).is_err());
    }
}
