//! Request handler module
//!
//! Responsible for request routing dispatch and the book operations behind it.

mod books;
mod error;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
