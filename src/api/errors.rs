use warp::http::StatusCode;

use crate::Error;

/// Failures surfaced to HTTP callers
///
/// A watch timeout is not an error; it is answered with 204 by the handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Read of an absent key
    #[error("Key not found")]
    KeyNotFound,

    /// Request body or query could not be read
    #[error("Failed to read request: {0}")]
    BadRequest(String),

    /// Body larger than `server.max_body_bytes`
    #[error("Payload too large")]
    PayloadTooLarge,

    /// Missing or wrong bearer token
    #[error("Forbidden")]
    Forbidden,

    /// Storage engine failure; never retried here
    #[error("{0}")]
    Storage(String),
}

impl warp::reject::Reject for ApiError {}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::KeyNotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a storage-layer error for operation `op` ("read", "store", "delete").
    pub fn from_storage(
        op: &str,
        e: Error,
    ) -> Self {
        if e.is_not_found() {
            ApiError::KeyNotFound
        } else {
            ApiError::Storage(format!("Failed to {op} key: {e}"))
        }
    }
}
