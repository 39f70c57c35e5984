//! Readiness conditions for started containers.
//!
//! Each wait is a polling loop with a deadline: evaluate the condition,
//! sleep, repeat. On timeout the error carries the last observed state so
//! a failed startup is diagnosable from the test output alone.

use std::time::{Duration, Instant};

use regex::Regex;
use tracing::debug;

use crate::docker::docker_logs;
use crate::probe::is_reachable;
use crate::{Error, Result};

/// How often a readiness condition is re-evaluated.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Condition that marks a container as ready to receive traffic.
#[derive(Debug, Clone)]
pub enum WaitFor {
    /// A line matching a pattern appears in the container log stream.
    LogMessage {
        /// Regular expression matched against each log line
        pattern: String,
    },
    /// An HTTP request returns a success status.
    Http {
        /// Request path, including the leading slash
        path: String,
        /// Internal container port the request targets (via its host mapping)
        port: u16,
    },
    /// The host mapping of an internal port accepts a TCP connection.
    Port {
        /// Internal container port
        port: u16,
    },
}

impl WaitFor {
    /// Wait until a log line matches `pattern`.
    pub fn log_message(pattern: impl Into<String>) -> Self {
        WaitFor::LogMessage {
            pattern: pattern.into(),
        }
    }

    /// Wait until a GET on `path` against internal `port` succeeds.
    pub fn http(path: impl Into<String>, port: u16) -> Self {
        WaitFor::Http {
            path: path.into(),
            port,
        }
    }

    /// Wait until the host mapping of internal `port` accepts connections.
    pub fn port(port: u16) -> Self {
        WaitFor::Port { port }
    }
}

/// True when any line of `logs` matches `pattern`.
fn any_line_matches(pattern: &Regex, logs: &str) -> bool {
    logs.lines().any(|line| pattern.is_match(line))
}

/// Poll the container log stream until a line matches `pattern`.
pub(crate) async fn await_log_message(
    container_id: &str,
    name: &str,
    pattern: &str,
    deadline: Duration,
) -> Result<()> {
    let pattern = Regex::new(pattern)?;
    let started = Instant::now();
    let mut last_state = String::from("no log output yet");

    loop {
        match docker_logs(container_id).await {
            Ok(logs) => {
                if any_line_matches(&pattern, &logs) {
                    debug!(container = name, "readiness marker found in logs");
                    return Ok(());
                }
                if let Some(line) = logs.lines().last() {
                    last_state = format!("last log line: {line}");
                }
            }
            Err(err) => last_state = format!("log fetch failed: {err}"),
        }

        if started.elapsed() >= deadline {
            return Err(Error::StartupTimeout {
                container: name.to_string(),
                elapsed: started.elapsed(),
                last_state,
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Poll `url` until a GET returns a success status.
pub(crate) async fn await_http_ok(url: &str, name: &str, deadline: Duration) -> Result<()> {
    let client = reqwest::Client::new();
    let started = Instant::now();
    let mut last_state = String::from("no response yet");

    loop {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(container = name, url, "readiness endpoint responded");
                return Ok(());
            }
            Ok(response) => last_state = format!("HTTP {}", response.status()),
            Err(err) => last_state = format!("connection failed: {err}"),
        }

        if started.elapsed() >= deadline {
            return Err(Error::StartupTimeout {
                container: name.to_string(),
                elapsed: started.elapsed(),
                last_state,
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Poll until `host:port` accepts a TCP connection.
pub(crate) async fn await_port_open(
    host: &str,
    port: u16,
    name: &str,
    deadline: Duration,
) -> Result<()> {
    let started = Instant::now();

    loop {
        if is_reachable(host, port).await {
            debug!(container = name, port, "mapped port accepts connections");
            return Ok(());
        }

        if started.elapsed() >= deadline {
            return Err(Error::StartupTimeout {
                container: name.to_string(),
                elapsed: started.elapsed(),
                last_state: format!("{host}:{port} not accepting connections"),
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn log_marker_matches_like_the_runtime_prints_it() {
        let pattern = Regex::new("^.*CWWKF0011I.*$").unwrap();
        let logs = "Launching defaultServer...\n\
                    [AUDIT   ] CWWKF0011I: The defaultServer server is ready to run a smarter planet.\n";
        assert!(any_line_matches(&pattern, logs));

        let unfinished = "Launching defaultServer...\n[AUDIT   ] CWWKZ0001I: Application started.\n";
        assert!(!any_line_matches(&pattern, unfinished));
    }

    #[test]
    fn log_marker_does_not_match_across_lines() {
        let pattern = Regex::new("^ready$").unwrap();
        assert!(any_line_matches(&pattern, "starting\nready\n"));
        assert!(!any_line_matches(&pattern, "not ready\n"));
    }

    #[tokio::test]
    async fn http_wait_reports_last_connection_state_on_timeout() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = await_http_ok(
            &format!("http://127.0.0.1:{port}/health"),
            "service",
            Duration::ZERO,
        )
        .await
        .unwrap_err();

        match err {
            Error::StartupTimeout {
                container,
                last_state,
                ..
            } => {
                assert_eq!(container, "service");
                assert!(last_state.starts_with("connection failed"), "{last_state}");
            }
            other => panic!("expected StartupTimeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_wait_succeeds_on_first_200() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            stream.read(&mut buf).ok();
            stream
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
                .unwrap();
        });

        await_http_ok(
            &format!("http://127.0.0.1:{port}/health"),
            "service",
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        server.join().unwrap();
    }

    #[tokio::test]
    async fn port_wait_times_out_against_a_closed_port() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = await_port_open("127.0.0.1", port, "postgres", Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StartupTimeout { .. }));
    }
}
