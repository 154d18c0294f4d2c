//! HTTP plumbing for lookup requests.
//!
//! Clients are built per partition so each partition owns its own
//! connection pool. All partitions share one tokio runtime and drive it
//! from rayon workers through `block_on`.

use std::sync::LazyLock;
use std::time::Duration;

/// Connect timeout, separate from the per-request budget
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a single lookup produced no result
#[derive(Debug)]
pub enum FetchError {
    /// Transport failure or non-2xx status
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Request exceeded its time budget and was abandoned
    Timeout(Duration),
    /// Body did not decode into the expected records
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Timeout(d) => write!(f, "timed out after {:.1}s", d.as_secs_f64()),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Create from a reqwest error, keeping the status when there is one
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            _ => None,
        }
    }

    /// Short tag for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http { .. } => "http",
            Self::Timeout(_) => "timeout",
            Self::Decode(_) => "decode",
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Build an async client for one partition.
///
/// `max_per_host` caps pooled connections to the lookup host. The request
/// budget itself is enforced by the caller with `tokio::time::timeout`;
/// here it only bounds connection setup.
pub fn build_client(
    max_per_host: usize,
    request_timeout: Duration,
) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(request_timeout))
        .pool_max_idle_per_host(max_per_host)
        .build()
        .map_err(|e| FetchError::from_reqwest(&e))
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("hamlog-io")
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

#[cfg(test)]
mod tests {
    use super::*;

    fn http_err(status: u16) -> FetchError {
        FetchError::Http {
            status: Some(status),
            message: "test".to_string(),
        }
    }

    #[test]
    fn display_http_with_status() {
        assert_eq!(format!("{}", http_err(404)), "HTTP 404: test");
    }

    #[test]
    fn display_http_without_status() {
        let err = FetchError::Http {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP error: connection refused");
    }

    #[test]
    fn display_timeout() {
        let err = FetchError::Timeout(Duration::from_millis(1500));
        assert_eq!(format!("{err}"), "timed out after 1.5s");
    }

    #[test]
    fn status_only_for_http() {
        assert_eq!(http_err(503).status(), Some(503));
        assert_eq!(FetchError::Timeout(Duration::from_secs(1)).status(), None);
        assert_eq!(FetchError::Decode("x".into()).status(), None);
    }

    #[test]
    fn serde_error_becomes_decode() {
        let err: FetchError = serde_json::from_str::<Vec<u32>>("{").unwrap_err().into();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn build_client_succeeds() {
        assert!(build_client(10, Duration::from_secs(30)).is_ok());
    }
}
