//! HTTP protocol layer module
//!
//! Provides HTTP response helpers, decoupled from the book handlers.

pub mod response;

// Re-export commonly used builders
pub use response::{
    build_404_response, build_413_response, build_empty_response, build_json_response,
    build_text_response,
};
