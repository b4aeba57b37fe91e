//! Request error types
//!
//! Every failure is local to one request and maps onto a status code.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use thiserror::Error;

use crate::http;
use crate::store::StoreError;

/// Error type of request bodies once wrapped in a length limit
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while serving a book request
#[derive(Error, Debug)]
pub enum ApiError {
    /// Id path segment is not an integer
    #[error("invalid book id '{0}'")]
    InvalidId(String),

    /// Update addressed the collection instead of a record
    #[error("update requires a book id in the path")]
    MissingId,

    /// Body is not a valid book document
    #[error("invalid book body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// Body carries an id different from the one in the path
    #[error("body id {body} does not match path id {path}")]
    IdMismatch { path: i64, body: i64 },

    #[error(transparent)]
    NotFound(#[from] StoreError),

    /// Request body grew past `http.max_body_size` while being read
    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(u64),

    /// Request body could not be read from the connection
    #[error("failed to read request body: {0}")]
    BodyRead(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidId(_) | Self::MissingId | Self::InvalidBody(_) | Self::IdMismatch { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::BodyRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        match self {
            Self::NotFound(_) => http::build_404_response(),
            Self::PayloadTooLarge(_) => http::build_413_response(),
            other => http::build_empty_response(other.status()),
        }
    }
}
