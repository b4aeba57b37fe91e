//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for request guards,
//! route resolution, dispatching to the book handlers and access logging.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, SERVER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::books;
use super::error::{ApiError, BoxError};
use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::{self, Route};

const WELCOME_MESSAGE: &str = "Bem-vindo!";

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    // 1. Check body size, then resolve and dispatch
    let mut response = match check_body_size(&parts.headers, state.config.http.max_body_size) {
        Some(resp) => resp,
        None => {
            let shape = routing::classify(parts.uri.path());
            let route = routing::resolve(&parts.method, shape);
            dispatch(route, body, &state).await
        }
    };

    // 2. Identify the server
    if let Ok(value) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, value);
    }

    // 3. Access log
    if state.cached_access_log {
        let entry = build_access_entry(&parts, &response, remote_addr, started);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Run the handler for a resolved route and turn errors into responses
async fn dispatch<B>(route: Route<'_>, body: B, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let result = match route {
        Route::Welcome => Ok(http::build_text_response(StatusCode::OK, WELCOME_MESSAGE)),
        Route::ListBooks => books::list(state).await,
        Route::CreateBook => books::create(state, body).await,
        Route::UpdateWithoutId => books::update_without_id(),
        Route::GetBook(id) => books::get(state, id).await,
        Route::DeleteBook(id) => books::delete(state, id).await,
        Route::UpdateBook(id) => books::update(state, id, body).await,
        Route::NoOp => Ok(http::build_empty_response(StatusCode::OK)),
        Route::NotFound => Ok(http::build_404_response()),
    };

    result.unwrap_or_else(|err| {
        log_api_error(&err);
        err.into_response()
    })
}

fn log_api_error(err: &ApiError) {
    if err.status().is_server_error() {
        logger::log_error(&err.to_string());
    } else {
        logger::log_debug(&format!("[{}] {err}", err.status().as_u16()));
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn build_access_entry(
    parts: &Parts,
    response: &Response<Full<Bytes>>,
    remote_addr: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = format!("{:?}", parts.version)
        .trim_start_matches("HTTP/")
        .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.user_agent = parts
        .headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry.set_elapsed(started.elapsed());
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use hyper::body::Frame;
    use hyper::Method;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Body whose first read fails, as a dropped connection would
    struct FailingBody;

    impl Body for FailingBody {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
            Poll::Ready(Some(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))))
        }
    }

    /// Body delivered in chunks with no known length, as chunked transfer
    /// encoding arrives
    struct ChunkedBody(VecDeque<Bytes>);

    impl Body for ChunkedBody {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
            Poll::Ready(self.0.pop_front().map(|chunk| Ok(Frame::data(chunk))))
        }
    }

    fn chunked(body: &str, chunk_size: usize) -> ChunkedBody {
        ChunkedBody(
            body.as_bytes()
                .chunks(chunk_size)
                .map(Bytes::copy_from_slice)
                .collect(),
        )
    }

    fn test_state() -> Arc<AppState> {
        let mut config = Config::default();
        config.logging.access_log = false;
        Arc::new(AppState::new(config))
    }

    fn remote() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 40_000))
    }

    async fn send_request<B>(state: &Arc<AppState>, req: Request<B>) -> (StatusCode, Bytes)
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let response = handle_request(req, Arc::clone(state), remote())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    async fn send(
        state: &Arc<AppState>,
        method: Method,
        path: &str,
        body: &str,
    ) -> (StatusCode, Bytes) {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap();
        send_request(state, req).await
    }

    fn parse(body: &Bytes) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    async fn list_ids(state: &Arc<AppState>) -> Vec<i64> {
        let (status, body) = send(state, Method::GET, "/livros", "").await;
        assert_eq!(status, StatusCode::CREATED);
        parse(&body)
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_welcome() {
        let state = test_state();
        for (method, path) in [(Method::GET, "/"), (Method::DELETE, "/"), (Method::GET, "/sobre")] {
            let (status, body) = send(&state, method, path, "").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, Bytes::from_static(b"Bem-vindo!"));
        }
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let state = test_state();
        let (status, body) =
            send(&state, Method::POST, "/livros", r#"{"titulo":"X","autor":"Y"}"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(parse(&body), json!({"id": 6, "titulo": "X", "autor": "Y"}));

        let (status, body) = send(&state, Method::GET, "/livros", "").await;
        assert_eq!(status, StatusCode::CREATED);
        let books = parse(&body);
        let books = books.as_array().unwrap();
        assert_eq!(books.len(), 6);
        assert_eq!(books[5], json!({"id": 6, "titulo": "X", "autor": "Y"}));
    }

    #[tokio::test]
    async fn test_create_ignores_client_id() {
        let state = test_state();
        let (status, body) = send(
            &state,
            Method::POST,
            "/livros/",
            r#"{"id":1,"titulo":"Senhora","autor":"José de Alencar"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(parse(&body)["id"], 6);
    }

    #[tokio::test]
    async fn test_create_malformed_body() {
        let state = test_state();
        let (status, body) = send(&state, Method::POST, "/livros", r#"{"titulo":"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
        assert_eq!(list_ids(&state).await, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let state = test_state();
        let (status, body) = send(&state, Method::GET, "/livros/3", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            parse(&body),
            json!({"id": 3, "titulo": "Dom Casmurro", "autor": "Machado de Assis"})
        );

        let (status, _) = send(&state, Method::GET, "/livros/3/", "").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let state = test_state();
        let (status, _) = send(&state, Method::GET, "/livros/999", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_invalid_id() {
        let state = test_state();
        let (status, body) = send(&state, Method::GET, "/livros/abc", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());

        let (status, _) = send(&state, Method::GET, "/livros//", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // id segments are matched as sent, without percent-decoding
        let (status, _) = send(&state, Method::GET, "/livros/%33", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete() {
        let state = test_state();
        let (status, body) = send(&state, Method::DELETE, "/livros/1", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_eq!(list_ids(&state).await, vec![2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let state = test_state();
        let (status, _) = send(&state, Method::DELETE, "/livros/42", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(list_ids(&state).await.len(), 5);

        let (status, _) = send(&state, Method::DELETE, "/livros/x", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_then_create_does_not_reuse_id() {
        let state = test_state();
        send(&state, Method::DELETE, "/livros/5", "").await;
        let (_, body) = send(&state, Method::POST, "/livros", r#"{"titulo":"A","autor":"B"}"#).await;
        assert_eq!(parse(&body)["id"], 6);
        assert_eq!(list_ids(&state).await, vec![1, 2, 3, 4, 6]);
    }

    #[tokio::test]
    async fn test_update() {
        let state = test_state();
        let payload = r#"{"id":2,"titulo":"Iracema (rev)","autor":"José de Alencar"}"#;
        let (status, body) = send(&state, Method::PUT, "/livros/2", payload).await;
        assert_eq!(status, StatusCode::OK);
        let expected = json!({"id": 2, "titulo": "Iracema (rev)", "autor": "José de Alencar"});
        assert_eq!(parse(&body), expected);

        let (status, body) = send(&state, Method::GET, "/livros/2", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse(&body), expected);
    }

    #[tokio::test]
    async fn test_update_without_body_id_keeps_path_id() {
        let state = test_state();
        let (status, body) = send(
            &state,
            Method::PUT,
            "/livros/4/",
            r#"{"titulo":"A Hora da Estrela","autor":"C. Lispector"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse(&body)["id"], 4);
        assert_eq!(list_ids(&state).await, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_update_id_mismatch() {
        let state = test_state();
        let (status, _) = send(
            &state,
            Method::PUT,
            "/livros/2",
            r#"{"id":3,"titulo":"Outro","autor":"Alguém"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&state, Method::GET, "/livros/2", "").await;
        assert_eq!(parse(&body)["titulo"], "Iracema");
    }

    #[tokio::test]
    async fn test_update_errors() {
        let state = test_state();
        let payload = r#"{"titulo":"T","autor":"A"}"#;

        let (status, _) = send(&state, Method::PUT, "/livros/999", payload).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, Method::PUT, "/livros/dois", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&state, Method::PUT, "/livros/2", "titulo=T").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_on_collection_requires_id() {
        let state = test_state();
        let payload = r#"{"id":1,"titulo":"T","autor":"A"}"#;
        for path in ["/livros", "/livros/"] {
            let (status, _) = send(&state, Method::PUT, path, payload).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
        let (_, body) = send(&state, Method::GET, "/livros/1", "").await;
        assert_eq!(parse(&body)["titulo"], "O Guarani");
    }

    #[tokio::test]
    async fn test_body_read_failure() {
        let state = test_state();
        for (method, path) in [(Method::POST, "/livros"), (Method::PUT, "/livros/1")] {
            let req = Request::builder()
                .method(method)
                .uri(path)
                .body(FailingBody)
                .unwrap();
            let (status, body) = send_request(&state, req).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body.is_empty());
        }
        assert_eq!(list_ids(&state).await, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_unrouted_methods_and_shapes() {
        let state = test_state();

        let (status, _) = send(&state, Method::DELETE, "/livros", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, Method::GET, "/livros/1/capa", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // record-level methods without a handler answer an empty 200
        let (status, body) = send(&state, Method::POST, "/livros/1", r#"{"titulo":"x"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_eq!(list_ids(&state).await.len(), 5);
    }

    #[tokio::test]
    async fn test_body_too_large() {
        let state = test_state();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/livros")
            .header(CONTENT_LENGTH, "2000000")
            .body(Full::new(Bytes::from_static(b"{}")))
            .unwrap();
        let (status, _) = send_request(&state, req).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(list_ids(&state).await.len(), 5);
    }

    #[tokio::test]
    async fn test_body_too_large_without_content_length() {
        let mut config = Config::default();
        config.logging.access_log = false;
        config.http.max_body_size = 16;
        let state = Arc::new(AppState::new(config));
        let oversized = format!(r#"{{"titulo":"{}","autor":"Y"}}"#, "x".repeat(4096));

        let req = Request::builder()
            .method(Method::POST)
            .uri("/livros")
            .body(chunked(&oversized, 512))
            .unwrap();
        assert!(req.headers().get(CONTENT_LENGTH).is_none());
        let (status, _) = send_request(&state, req).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let req = Request::builder()
            .method(Method::PUT)
            .uri("/livros/2")
            .body(Full::new(Bytes::from(oversized)))
            .unwrap();
        let (status, _) = send_request(&state, req).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        assert_eq!(list_ids(&state).await, vec![1, 2, 3, 4, 5]);
        let (_, body) = send(&state, Method::GET, "/livros/2", "").await;
        assert_eq!(parse(&body)["titulo"], "Iracema");

        // a small body sent the same way still goes through
        let req = Request::builder()
            .method(Method::POST)
            .uri("/livros")
            .body(chunked(r#"{"titulo":"A"}"#, 4))
            .unwrap();
        let (status, _) = send_request(&state, req).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_server_header() {
        let state = test_state();
        let req = Request::builder()
            .uri("/livros/1")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = handle_request(req, Arc::clone(&state), remote())
            .await
            .unwrap();
        assert_eq!(response.headers()[SERVER], "livros/0.1");
        assert_eq!(response.headers()["content-type"], "application/json");
    }

    #[test]
    fn test_access_entry() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/livros?x=1")
            .header(USER_AGENT, "curl/8.5.0")
            .body(())
            .unwrap();
        let (parts, ()) = req.into_parts();
        let response = http::build_json_response(StatusCode::CREATED, &json!({"id": 6}));
        let entry = build_access_entry(&parts, &response, remote(), Instant::now());
        assert_eq!(entry.remote_addr, "127.0.0.1");
        assert_eq!(entry.method, "POST");
        assert_eq!(entry.path, "/livros");
        assert_eq!(entry.query.as_deref(), Some("x=1"));
        assert_eq!(entry.http_version, "1.1");
        assert_eq!(entry.status, 201);
        assert_eq!(entry.body_bytes, 8);
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8.5.0"));
    }
}
