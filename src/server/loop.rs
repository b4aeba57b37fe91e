// Server loop module
// Accepts connections until shutdown is requested

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::drain::drain_connections;
use super::signal::SignalHandler;
use crate::config;
use crate::logger;

/// Accept loop of the book server
///
/// Returns once shutdown has been requested and in-flight connections have
/// drained (or the drain deadline has passed).
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
    signals: Arc<SignalHandler>,
) {
    while !signals.shutdown_requested.load(Ordering::SeqCst) {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = signals.shutdown.notified() => break,
        }
    }

    // Stop accepting before waiting on the remaining connections
    drop(listener);
    let deadline = Duration::from_secs(state.config.performance.write_timeout);
    let remaining = drain_connections(&active_connections, deadline).await;
    logger::log_shutdown_complete(remaining);
}
