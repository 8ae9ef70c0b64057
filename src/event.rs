//! Application events for the tao event loop.

use parking_lot::Mutex;
use tao::event_loop::EventLoopProxy;
use voicekey_core::SessionState;

use crate::session::{StatusSink, TextInjector};

/// Events delivered to the event-loop thread.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The session state changed (drives the tray icon and tooltip)
    StateChanged(SessionState),
    /// A transcript is ready to be delivered at the cursor
    TranscriptReady(String),
}

/// Hands session results from background tasks back to the event-loop
/// thread, where the tray handle and the input-synthesis handles live.
pub struct EventLoopBridge {
    proxy: Mutex<EventLoopProxy<AppEvent>>,
}

impl EventLoopBridge {
    pub fn new(proxy: EventLoopProxy<AppEvent>) -> Self {
        Self {
            proxy: Mutex::new(proxy),
        }
    }

    fn send(&self, event: AppEvent) {
        // fails only once the event loop is gone, at which point nobody cares
        self.proxy.lock().send_event(event).ok();
    }
}

impl StatusSink for EventLoopBridge {
    fn state_changed(&self, state: SessionState) {
        self.send(AppEvent::StateChanged(state));
    }
}

impl TextInjector for EventLoopBridge {
    fn type_text(&self, text: &str) {
        self.send(AppEvent::TranscriptReady(text.to_string()));
    }
}
