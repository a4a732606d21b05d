//! Error types for cropchain

use hyper::StatusCode;

/// Main error type for cropchain operations
#[derive(Debug, thiserror::Error)]
pub enum CropchainError {
    /// Bad input on a workflow operation (empty name, non-positive weight, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Weight handed to the token policy was negative or not finite
    #[error("Invalid weight: {0}")]
    InvalidWeight(f64),

    /// Malformed HTTP request (unreadable body, bad JSON, oversized payload)
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CropchainError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidWeight(_) => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller is at fault (4xx)
    pub fn is_client_fault(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Message safe to return to clients.
    ///
    /// Server-side failures are logged in full but surfaced generically.
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) => "Storage unavailable".to_string(),
            Self::Config(_) | Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for CropchainError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for CropchainError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<mongodb::error::Error> for CropchainError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::oid::Error> for CropchainError {
    fn from(err: bson::oid::Error) -> Self {
        Self::Validation(format!("Invalid id: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for CropchainError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

/// Result type alias for cropchain operations
pub type Result<T> = std::result::Result<T, CropchainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_faults_map_to_4xx() {
        assert_eq!(
            CropchainError::Validation("empty name".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CropchainError::InvalidWeight(-1.0).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CropchainError::NotFound("farmer".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CropchainError::Conflict("user exists".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert!(CropchainError::Forbidden("not yours".into()).is_client_fault());
    }

    #[test]
    fn test_storage_errors_are_server_faults() {
        let err = CropchainError::Database("connection reset".into());
        assert!(err.status_code().is_server_error());
        assert!(!err.is_client_fault());
        // Driver details never reach clients
        assert_eq!(err.public_message(), "Storage unavailable");
    }

    #[test]
    fn test_public_message_keeps_client_detail() {
        let err = CropchainError::Validation("Crop name is required".into());
        assert_eq!(err.public_message(), "Validation error: Crop name is required");
    }
}
