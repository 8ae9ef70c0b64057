//! Fire-and-forget telemetry to the external overlay renderer.
//!
//! The renderer is a separate process listening on a loopback UDP port. Each
//! patch is one self-contained JSON datagram; delivery is best-effort and
//! nothing here may block or fail loudly, because patches are sent from the
//! audio-callback context among others. The renderer treats its state as
//! eventually consistent and tolerates dropped or duplicated messages.

use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::trace;
use voicekey_core::StatusPatch;

/// Where the overlay renderer listens.
pub const OVERLAY_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), 38485);

/// Sender half of the overlay protocol.
///
/// Cloning is cheap; all clones share the socket and the delayed-hide timer
/// epoch, so a `show` on one clone cancels a `hide_after` armed on another.
#[derive(Clone)]
pub struct OverlayBridge {
    socket: Option<Arc<UdpSocket>>,
    target: SocketAddr,
    hide_epoch: Arc<AtomicU64>,
    runtime: Handle,
}

impl OverlayBridge {
    pub fn new(runtime: Handle) -> Self {
        Self::with_target(runtime, OVERLAY_ADDR)
    }

    /// Bridge sending to a specific address (tests point this at a local
    /// receiver standing in for the renderer).
    pub fn with_target(runtime: Handle, target: SocketAddr) -> Self {
        // No socket means every send becomes a no-op, which is exactly the
        // contract: telemetry failures never reach the caller.
        let socket = UdpSocket::bind("127.0.0.1:0").ok().map(Arc::new);
        if socket.is_none() {
            trace!("overlay bridge disabled: could not bind a local socket");
        }
        Self {
            socket,
            target,
            hide_epoch: Arc::new(AtomicU64::new(0)),
            runtime,
        }
    }

    /// Merge-update the renderer state. Only the fields present in `patch`
    /// are transmitted; empty patches are dropped here.
    pub fn update(&self, patch: &StatusPatch) {
        if patch.is_empty() {
            return;
        }
        self.send(patch);
    }

    /// Make the overlay visible, cancelling any pending delayed hide.
    pub fn show(&self) {
        self.cancel_hide();
        self.send(&StatusPatch::new().visible(true));
    }

    /// Hide the overlay now, cancelling any pending delayed hide.
    pub fn hide(&self) {
        self.cancel_hide();
        self.send(&StatusPatch::new().visible(false));
    }

    /// Hide the overlay after `delay` unless a later `show`, `hide` or
    /// `hide_after` supersedes this one. Last write wins.
    pub fn hide_after(&self, delay: Duration) {
        let armed = self.hide_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let bridge = self.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if bridge.hide_epoch.load(Ordering::SeqCst) == armed {
                bridge.send(&StatusPatch::new().visible(false));
            }
        });
    }

    /// Cancel timers and send a final hide. The socket is released when the
    /// last clone drops.
    pub fn stop(&self) {
        self.cancel_hide();
        self.send(&StatusPatch::new().visible(false));
    }

    fn cancel_hide(&self) {
        self.hide_epoch.fetch_add(1, Ordering::SeqCst);
    }

    fn send(&self, patch: &StatusPatch) {
        let Some(socket) = &self.socket else {
            return;
        };
        match serde_json::to_vec(patch) {
            Ok(body) => {
                if let Err(e) = socket.send_to(&body, self.target) {
                    trace!("overlay send failed: {}", e);
                }
            }
            Err(e) => trace!("overlay patch serialization failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::time::Instant;

    use serde_json::Value;

    use super::*;

    fn test_bridge() -> (OverlayBridge, UdpSocket) {
        let rx = UdpSocket::bind("127.0.0.1:0").unwrap();
        rx.set_read_timeout(Some(Duration::from_millis(50))).unwrap();
        let bridge = OverlayBridge::with_target(Handle::current(), rx.local_addr().unwrap());
        (bridge, rx)
    }

    fn recv_all(rx: &UdpSocket, window: Duration) -> Vec<Value> {
        let deadline = Instant::now() + window;
        let mut messages = Vec::new();
        let mut buf = [0u8; 2048];
        loop {
            match rx.recv(&mut buf) {
                Ok(n) => messages.push(serde_json::from_slice(&buf[..n]).unwrap()),
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    if Instant::now() >= deadline {
                        return messages;
                    }
                }
                Err(e) => panic!("recv failed: {e}"),
            }
        }
    }

    fn hides(messages: &[Value]) -> usize {
        messages
            .iter()
            .filter(|m| m.get("visible") == Some(&Value::Bool(false)))
            .count()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_sends_only_present_fields() {
        let (bridge, rx) = test_bridge();
        bridge.update(&StatusPatch::new().level(0.25));
        let messages = recv_all(&rx, Duration::from_millis(100));
        assert_eq!(messages.len(), 1);
        let object = messages[0].as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object["level"], 0.25);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_patch_is_not_transmitted() {
        let (bridge, rx) = test_bridge();
        bridge.update(&StatusPatch::new());
        assert!(recv_all(&rx, Duration::from_millis(100)).is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn show_cancels_pending_hide() {
        let (bridge, rx) = test_bridge();
        bridge.hide_after(Duration::from_millis(50));
        bridge.show();
        let messages = recv_all(&rx, Duration::from_millis(300));
        assert_eq!(hides(&messages), 0, "cancelled hide must not fire");
        assert!(
            messages
                .iter()
                .any(|m| m.get("visible") == Some(&Value::Bool(true)))
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rearmed_hide_fires_once() {
        let (bridge, rx) = test_bridge();
        bridge.hide_after(Duration::from_millis(40));
        bridge.hide_after(Duration::from_millis(40));
        bridge.hide_after(Duration::from_millis(40));
        let messages = recv_all(&rx, Duration::from_millis(400));
        assert_eq!(hides(&messages), 1, "only the last armed hide may fire");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_sends_final_hide_and_cancels_timer() {
        let (bridge, rx) = test_bridge();
        bridge.hide_after(Duration::from_millis(40));
        bridge.stop();
        let messages = recv_all(&rx, Duration::from_millis(300));
        assert_eq!(hides(&messages), 1);
    }
}
