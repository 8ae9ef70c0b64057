//! Background reachability monitor for the transcription endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, info};
use voicekey_core::{Config, ConnectivityState, StatusPatch};
use voicekey_transcribe::endpoint_reachable;

use crate::overlay::OverlayBridge;

const CHECK_INTERVAL: Duration = Duration::from_secs(12);
const PROBE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Periodically probes the configured endpoint and mirrors the result to the
/// overlay. Clones share state, so any clone can be queried or kicked.
///
/// The endpoint is re-read from config on every cycle, which means a settings
/// change takes effect on the next probe without restarting the loop.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    state: Arc<RwLock<ConnectivityState>>,
    wake: Arc<Notify>,
    stopped: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    overlay: OverlayBridge,
    interval: Duration,
}

impl ConnectivityMonitor {
    pub fn new(overlay: OverlayBridge) -> Self {
        Self {
            state: Arc::new(RwLock::new(ConnectivityState::Checking)),
            wake: Arc::new(Notify::new()),
            stopped: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            overlay,
            interval: CHECK_INTERVAL,
        }
    }

    #[cfg(test)]
    fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Last probe verdict. `Checking` until the first probe completes.
    pub fn state(&self) -> ConnectivityState {
        *self.state.read()
    }

    /// Spawn the probe loop. Subsequent calls on any clone are no-ops.
    pub fn start(&self, runtime: &Handle, config: Arc<RwLock<Config>>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let monitor = self.clone();
        runtime.spawn(async move { monitor.run(config).await });
    }

    /// Request an immediate re-probe, skipping the rest of the current wait.
    pub fn kick(&self) {
        self.wake.notify_one();
    }

    /// Stop the probe loop. Idempotent; safe to call on a never-started
    /// monitor.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    /// Force the offline verdict without waiting for a probe. Used when a
    /// transcription request has just demonstrated the network is down.
    pub fn set_offline(&self) {
        self.publish(ConnectivityState::Offline);
    }

    async fn run(self, config: Arc<RwLock<Config>>) {
        while !self.stopped.load(Ordering::SeqCst) {
            let endpoint = config.read().endpoint.clone();
            let online = endpoint_reachable(&endpoint, PROBE_TIMEOUT).await;
            if self.stopped.load(Ordering::SeqCst) {
                break;
            }
            self.publish(if online {
                ConnectivityState::Online
            } else {
                ConnectivityState::Offline
            });

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.wake.notified() => {}
            }
        }
        debug!("connectivity monitor stopped");
    }

    fn publish(&self, next: ConnectivityState) {
        let changed = {
            let mut state = self.state.write();
            let changed = *state != next;
            *state = next;
            changed
        };
        if changed {
            info!(state = ?next, "connectivity changed");
        }
        // resend even when unchanged; the overlay may have restarted
        self.overlay.update(&StatusPatch::new().connection(next));
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    fn test_overlay() -> (OverlayBridge, std::net::UdpSocket) {
        let rx = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let bridge = OverlayBridge::with_target(Handle::current(), rx.local_addr().unwrap());
        (bridge, rx)
    }

    async fn wait_for(monitor: &ConnectivityMonitor, want: ConnectivityState) {
        for _ in 0..100 {
            if monitor.state() == want {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("monitor never reached {want:?}, still {:?}", monitor.state());
    }

    async fn live_endpoint() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
        (listener, endpoint)
    }

    fn dead_endpoint() -> String {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        format!("http://127.0.0.1:{port}")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reports_online_for_reachable_endpoint() {
        let (overlay, _rx) = test_overlay();
        let (_listener, endpoint) = live_endpoint().await;
        let config = Arc::new(RwLock::new(Config {
            endpoint,
            ..Default::default()
        }));

        let monitor = ConnectivityMonitor::new(overlay).with_interval(Duration::from_secs(60));
        monitor.start(&Handle::current(), config);
        wait_for(&monitor, ConnectivityState::Online).await;
        monitor.stop();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn kick_triggers_immediate_reprobe() {
        let (overlay, _rx) = test_overlay();
        let config = Arc::new(RwLock::new(Config {
            endpoint: dead_endpoint(),
            ..Default::default()
        }));

        // Long interval so only a kick can explain a second probe.
        let monitor =
            ConnectivityMonitor::new(overlay).with_interval(Duration::from_secs(600));
        monitor.start(&Handle::current(), config.clone());
        wait_for(&monitor, ConnectivityState::Offline).await;

        let (_listener, endpoint) = live_endpoint().await;
        config.write().endpoint = endpoint;
        monitor.kick();
        wait_for(&monitor, ConnectivityState::Online).await;
        monitor.stop();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_is_idempotent_and_ends_probing() {
        let (overlay, _rx) = test_overlay();
        let config = Arc::new(RwLock::new(Config {
            endpoint: dead_endpoint(),
            ..Default::default()
        }));

        let monitor = ConnectivityMonitor::new(overlay).with_interval(Duration::from_millis(50));
        monitor.start(&Handle::current(), config.clone());
        wait_for(&monitor, ConnectivityState::Offline).await;

        monitor.stop();
        monitor.stop();

        // A now-reachable endpoint must no longer be noticed.
        let (_listener, endpoint) = live_endpoint().await;
        config.write().endpoint = endpoint;
        monitor.kick();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(monitor.state(), ConnectivityState::Offline);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn set_offline_forces_verdict() {
        let (overlay, _rx) = test_overlay();
        let monitor = ConnectivityMonitor::new(overlay);
        assert_eq!(monitor.state(), ConnectivityState::Checking);
        monitor.set_offline();
        assert_eq!(monitor.state(), ConnectivityState::Offline);
    }
}
