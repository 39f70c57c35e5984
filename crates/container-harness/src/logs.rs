//! Forwarding of container log output into the tracing stream.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

fn forward_stream(stream: impl AsyncRead + Unpin + Send + 'static, container: String) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(container = %container, "{line}");
        }
    });
}

/// Follow `docker logs -f` for a container and re-emit each line through
/// the logger, tagged with the container name.
///
/// The returned task runs until the container stops or the handle aborts
/// it; losing the log follower never fails a test.
pub(crate) fn forward_logs(container_id: String, name: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        let child = Command::new("docker")
            .args(["logs", "-f", &container_id])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(err) => {
                warn!(container = %name, error = %err, "could not follow container logs");
                return;
            }
        };

        if let Some(stdout) = child.stdout.take() {
            forward_stream(stdout, name.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_stream(stderr, name.clone());
        }

        if let Err(err) = child.wait().await {
            debug!(container = %name, error = %err, "log follower exited abnormally");
        }
    })
}
