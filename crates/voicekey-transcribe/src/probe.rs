//! Endpoint reachability probe.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::trace;

/// Check whether the endpoint host accepts a TCP connection within `timeout`.
///
/// This is a liveness hint for the overlay, not a guarantee that requests
/// will succeed; an unparsable endpoint counts as unreachable.
pub async fn endpoint_reachable(endpoint: &str, timeout: Duration) -> bool {
    let Ok(url) = reqwest::Url::parse(endpoint) else {
        trace!(endpoint, "probe skipped: endpoint is not a valid URL");
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    let Some(port) = url.port_or_known_default() else {
        return false;
    };

    matches!(
        tokio::time::timeout(timeout, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

    #[tokio::test]
    async fn local_listener_is_reachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://127.0.0.1:{}/v1/foo", listener.local_addr().unwrap().port());
        assert!(endpoint_reachable(&endpoint, PROBE_TIMEOUT).await);
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        // Bind then drop to find a port that is very likely closed.
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint = format!("http://127.0.0.1:{port}");
        assert!(!endpoint_reachable(&endpoint, PROBE_TIMEOUT).await);
    }

    #[tokio::test]
    async fn garbage_endpoint_is_unreachable() {
        assert!(!endpoint_reachable("not a url", PROBE_TIMEOUT).await);
        assert!(!endpoint_reachable("", PROBE_TIMEOUT).await);
    }
}
