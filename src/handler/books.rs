//! Book handlers
//!
//! One function per routed operation. Bodies are read and decoded before the
//! store lock is taken, so a failed read or decode never mutates the store.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Response, StatusCode};
use super::error::{ApiError, BoxError};
use crate::config::AppState;
use crate::http;
use crate::logger;
use crate::store::{BookPayload, StoreError};

type HandlerResult = Result<Response<Full<Bytes>>, ApiError>;

/// GET collection: every book in insertion order
///
/// Answers 201 Created, not 200.
pub async fn list(state: &AppState) -> HandlerResult {
    let books = state.books.read().await;
    Ok(http::build_json_response(StatusCode::CREATED, books.list()))
}

/// POST collection: store a new book under the next id
pub async fn create<B>(state: &AppState, body: B) -> HandlerResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let payload = read_payload(body, state.config.http.max_body_size).await?;
    let book = state.books.write().await.insert(payload);
    logger::log_debug(&format!("[Create] book {} stored", book.id));
    Ok(http::build_json_response(StatusCode::CREATED, &book))
}

/// GET record
pub async fn get(state: &AppState, id_segment: &str) -> HandlerResult {
    let id = parse_id(id_segment)?;
    logger::log_debug(&format!("[Lookup] /livros/{id_segment}"));

    let books = state.books.read().await;
    let book = books.find_by_id(id).ok_or(StoreError::NotFound(id))?;
    Ok(http::build_json_response(StatusCode::OK, book))
}

/// DELETE record
pub async fn delete(state: &AppState, id_segment: &str) -> HandlerResult {
    let id = parse_id(id_segment)?;
    let removed = state.books.write().await.delete_by_id(id)?;
    logger::log_debug(&format!("[Delete] book {} removed", removed.id));
    Ok(http::build_empty_response(StatusCode::OK))
}

/// PUT record: replace the whole book addressed by the path
///
/// A body id, when present, must equal the path id.
pub async fn update<B>(state: &AppState, id_segment: &str, body: B) -> HandlerResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let id = parse_id(id_segment)?;
    let payload = read_payload(body, state.config.http.max_body_size).await?;
    if let Some(body_id) = payload.id.filter(|body_id| *body_id != id) {
        return Err(ApiError::IdMismatch { path: id, body: body_id });
    }

    let mut books = state.books.write().await;
    let stored = books.replace_by_id(id, payload)?;
    Ok(http::build_json_response(StatusCode::OK, stored))
}

/// PUT collection: no id to update
pub const fn update_without_id() -> HandlerResult {
    Err(ApiError::MissingId)
}

fn parse_id(segment: &str) -> Result<i64, ApiError> {
    segment
        .parse()
        .map_err(|_| ApiError::InvalidId(segment.to_string()))
}

/// Read the whole body, capped at `max_body_size` bytes, and decode it
///
/// The cap holds for bodies without a Content-Length header too.
async fn read_payload<B>(body: B, max_body_size: u64) -> Result<BookPayload, ApiError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let bytes = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                ApiError::PayloadTooLarge(max_body_size)
            } else {
                ApiError::BodyRead(e.to_string())
            }
        })?
        .to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}
