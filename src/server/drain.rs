// Shutdown drain module
// Waits for in-flight connections to finish after the listener is closed

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Wait until no connection is active or `deadline` elapses.
///
/// Returns the number of connections still open when it gave up (0 when all
/// finished). Connections left open are not aborted; they end with the
/// runtime.
pub async fn drain_connections(conn_counter: &AtomicUsize, deadline: Duration) -> usize {
    let drain_deadline = tokio::time::Instant::now() + deadline;

    loop {
        let active = conn_counter.load(Ordering::SeqCst);
        if active == 0 || tokio::time::Instant::now() >= drain_deadline {
            return active;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
