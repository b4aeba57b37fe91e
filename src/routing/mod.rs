//! Routing module
//!
//! Provides the request routing used by the book handlers:
//! - Path classification (root, collection, record, unknown)
//! - Method x path-shape routing table

mod path;
mod table;

pub use path::classify;
pub use table::{resolve, Route};
