//! Path classification
//!
//! Splits a request path on `/` and decides which part of the book resource
//! it addresses. Splitting keeps the leading empty segment, so `/livros`
//! yields `["", "livros"]` and `/livros/3/` yields `["", "livros", "3", ""]`.

/// Collection prefix served by the book routes
pub const COLLECTION_PATH: &str = "/livros";

/// Shape of a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathShape<'a> {
    /// `/` and everything outside the collection subtree
    Root,
    /// `/livros` or `/livros/`
    Collection,
    /// `/livros/{id}` or `/livros/{id}/`, carrying the raw id segment
    Record(&'a str),
    /// Deeper paths inside the collection subtree
    Unknown,
}

/// Classify a request path
pub fn classify(path: &str) -> PathShape<'_> {
    if !in_collection_subtree(path) {
        return PathShape::Root;
    }

    let segments: Vec<&str> = path.split('/').collect();
    let count = segments.len();

    if count == 2 || (count == 3 && segments[2].is_empty()) {
        PathShape::Collection
    } else if count == 3 || (count == 4 && segments[3].is_empty()) {
        PathShape::Record(segments[2])
    } else {
        PathShape::Unknown
    }
}

fn in_collection_subtree(path: &str) -> bool {
    path == COLLECTION_PATH
        || path
            .strip_prefix(COLLECTION_PATH)
            .is_some_and(|rest| rest.starts_with('/'))
}
