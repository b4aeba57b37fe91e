//! Routing table
//!
//! Maps `(method, path shape)` to the operation that serves it.

use hyper::Method;

use super::path::PathShape;

/// Resolved operation for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Welcome,
    ListBooks,
    CreateBook,
    /// PUT on the collection: there is no id to update
    UpdateWithoutId,
    GetBook(&'a str),
    DeleteBook(&'a str),
    UpdateBook(&'a str),
    /// Unhandled method on a record path; answered with an empty 200
    NoOp,
    NotFound,
}

/// Resolve the route for a request
pub fn resolve<'a>(method: &Method, shape: PathShape<'a>) -> Route<'a> {
    match (method, shape) {
        (_, PathShape::Root) => Route::Welcome,

        (&Method::GET, PathShape::Collection) => Route::ListBooks,
        (&Method::POST, PathShape::Collection) => Route::CreateBook,
        (&Method::PUT, PathShape::Collection) => Route::UpdateWithoutId,

        (&Method::GET, PathShape::Record(id)) => Route::GetBook(id),
        (&Method::DELETE, PathShape::Record(id)) => Route::DeleteBook(id),
        (&Method::PUT, PathShape::Record(id)) => Route::UpdateBook(id),
        (_, PathShape::Record(_)) => Route::NoOp,

        (_, PathShape::Collection | PathShape::Unknown) => Route::NotFound,
    }
}
