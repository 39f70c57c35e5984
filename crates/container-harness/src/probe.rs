//! One-shot TCP readiness probe.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

/// Cap on the single connection attempt.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Check whether something is listening on `host:port`.
///
/// A single connection attempt, no retries. The connection is closed as
/// soon as it is established. Any failure mode (refused, timed out,
/// unresolvable host) reads as "not reachable"; this is a binary decision
/// gate, not a health check.
pub async fn is_reachable(host: &str, port: u16) -> bool {
    matches!(
        timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}
