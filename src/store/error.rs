//! Store error types

use thiserror::Error;

/// Errors returned by collection operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No live record carries the requested id
    #[error("book {0} not found")]
    NotFound(i64),
}
