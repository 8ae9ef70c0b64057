//! The push-to-talk session state machine.
//!
//! One session exists process-wide and moves Idle -> Recording -> Processing
//! -> Idle. Key events arrive on the event-loop thread; audio chunks arrive
//! from the device callback; the transcription finishes on the async runtime.
//! A single lock over the state machine keeps those three contexts honest.

use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tracing::{debug, info};
use voicekey_audio::{AudioCapture, CaptureStream, ChunkSink, LevelMeter, encode_wav_mono16};
use voicekey_core::{
    Config, FocusTarget, HotkeyBinding, Listening, Processing, SessionState, StatusPatch,
};
use voicekey_transcribe::{TranscribeError, TranscribeRequest, Transcriber};

use crate::connectivity::ConnectivityMonitor;
use crate::overlay::OverlayBridge;

/// Recordings that encode to fewer bytes than this are accidental taps and
/// are discarded without an upload.
const MIN_AUDIO_BYTES: usize = 8000;
/// How long a silent recording runs before the overlay says so.
const NO_AUDIO_MESSAGE_DELAY: Duration = Duration::from_secs(5);
/// Minimum spacing between level patches to the overlay.
const LEVEL_PUSH_INTERVAL: Duration = Duration::from_millis(20);
/// Overlay linger after a clean session.
const IDLE_HIDE_DELAY: Duration = Duration::from_millis(1500);
/// Overlay linger after a failed session, long enough to read the error.
const ERROR_HIDE_DELAY: Duration = Duration::from_millis(2800);

/// Delivers transcribed text at the cursor position.
pub trait TextInjector: Send + Sync {
    fn type_text(&self, text: &str);
}

/// Best-effort probe for whether a text input is focused.
pub trait FocusProbe: Send + Sync {
    fn text_input_focused(&self) -> FocusTarget;
}

/// User-facing failure notifications. Every failed session produces exactly
/// one of these.
pub trait Notifier: Send + Sync {
    fn notify_error(&self, message: &str);
}

/// Observer for session state transitions (drives the tray icon).
pub trait StatusSink: Send + Sync {
    fn state_changed(&self, state: SessionState);
}

/// The pluggable edges of the session controller.
pub struct Collaborators {
    pub transcriber: Arc<dyn Transcriber>,
    pub injector: Arc<dyn TextInjector>,
    pub focus: Arc<dyn FocusProbe>,
    pub notifier: Arc<dyn Notifier>,
    pub status: Arc<dyn StatusSink>,
}

/// Owns the capture device and the shared session state.
///
/// Lives on the event-loop thread; the capture stream handle is not `Send`,
/// so it stays here while [`SessionShared`] travels into async tasks.
pub struct SessionController {
    shared: Arc<SessionShared>,
    capture: Box<dyn AudioCapture>,
    active: Option<Box<dyn CaptureStream>>,
}

struct SessionShared {
    config: Arc<RwLock<Config>>,
    inner: Mutex<Inner>,
    /// Buffered chunks for the session in flight. Separate from `inner` so
    /// the drain at key-up never contends with a level push. Lock order is
    /// always `inner` before `frames`.
    frames: Mutex<Vec<Vec<i16>>>,
    overlay: OverlayBridge,
    connectivity: ConnectivityMonitor,
    collab: Collaborators,
    runtime: Handle,
}

struct Inner {
    state: SessionState,
    /// Debounce latch: set when the binding goes down, cleared only when it
    /// comes back up. OS key repeat arrives as extra key-downs in between.
    key_down: bool,
    binding: HotkeyBinding,
    /// Snapshot of the binding the current hold started with, so a rebind
    /// during a held session cannot orphan the physical release.
    held: HotkeyBinding,
    meter: LevelMeter,
    started_at: Option<Instant>,
    heard_audio: bool,
    no_audio_shown: bool,
    last_level_push: Option<Instant>,
    no_audio_delay: Duration,
    level_push_interval: Duration,
}

impl SessionController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<RwLock<Config>>,
        capture: Box<dyn AudioCapture>,
        overlay: OverlayBridge,
        connectivity: ConnectivityMonitor,
        collab: Collaborators,
        runtime: Handle,
        binding: HotkeyBinding,
    ) -> Self {
        Self {
            shared: Arc::new(SessionShared {
                config,
                inner: Mutex::new(Inner {
                    state: SessionState::Idle,
                    key_down: false,
                    binding,
                    held: HotkeyBinding::default(),
                    meter: LevelMeter::new(),
                    started_at: None,
                    heard_audio: false,
                    no_audio_shown: false,
                    last_level_push: None,
                    no_audio_delay: NO_AUDIO_MESSAGE_DELAY,
                    level_push_interval: LEVEL_PUSH_INTERVAL,
                }),
                frames: Mutex::new(Vec::new()),
                overlay,
                connectivity,
                collab,
                runtime,
            }),
            capture,
            active: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.inner.lock().state
    }

    /// Swap the logical hotkey, e.g. after a settings change. Takes effect
    /// for the next key-down; a held session releases on its original
    /// binding because key-up matches the snapshot taken at key-down.
    pub fn rebind(&self, binding: HotkeyBinding) {
        self.shared.inner.lock().binding = binding;
    }

    #[cfg(test)]
    fn set_timing(&self, no_audio_delay: Duration, level_push_interval: Duration) {
        let mut inner = self.shared.inner.lock();
        inner.no_audio_delay = no_audio_delay;
        inner.level_push_interval = level_push_interval;
    }

    /// Hotkey pressed. Starts a recording session when the controller is
    /// idle; repeats and presses during a running session are ignored.
    pub fn key_down(&mut self, key_id: u32) {
        {
            let mut inner = self.shared.inner.lock();
            if !inner.binding.matches(key_id) || inner.key_down {
                return;
            }
            if inner.state != SessionState::Idle {
                // a previous session is still winding down
                return;
            }
            // claim the session before releasing the lock so a second
            // key-down can never race past this point
            inner.key_down = true;
            inner.held = inner.binding.clone();
            inner.state = SessionState::Recording;
            inner.meter.reset();
            inner.started_at = Some(Instant::now());
            inner.heard_audio = false;
            inner.no_audio_shown = false;
            inner.last_level_push = None;
        }
        self.shared.frames.lock().clear();

        let sample_rate = self.shared.config.read().sample_rate;
        let sink: ChunkSink = {
            let shared = Arc::clone(&self.shared);
            Arc::new(move |chunk: &[i16]| shared.feed_chunk(chunk))
        };

        match self.capture.start(sample_rate, sink) {
            Ok(stream) => {
                self.active = Some(stream);
                info!("recording session started");
                self.shared.publish_recording();
            }
            Err(e) => {
                // roll back to Idle; the latch stays set until the physical
                // release so key repeat cannot retrigger the broken device
                self.shared.inner.lock().state = SessionState::Idle;
                debug!("failed to open input device: {}", e);
                self.shared.collab.status.state_changed(SessionState::Idle);
                self.shared.overlay.update(
                    &StatusPatch::new()
                        .listening(Listening::Error)
                        .processing(Processing::Error)
                        .message(""),
                );
                self.shared.overlay.hide_after(ERROR_HIDE_DELAY);
                self.shared
                    .collab
                    .notifier
                    .notify_error(&format!("Microphone error: {e}"));
            }
        }
    }

    /// Hotkey released. Ends the recording session (if one is running),
    /// closes the stream and hands the buffered audio to the async runtime.
    pub fn key_up(&mut self, key_id: u32) {
        {
            let mut inner = self.shared.inner.lock();
            // match against the hold's snapshot, not the live binding
            if !inner.key_down || !inner.held.matches(key_id) {
                return;
            }
            inner.key_down = false;
            if inner.state != SessionState::Recording {
                return;
            }
            inner.state = SessionState::Processing;
        }
        if let Some(mut stream) = self.active.take() {
            stream.stop();
        }
        // chunks the device delivers after the state flip above are dropped
        // by feed_chunk, so this drain is the complete recording
        let frames = mem::take(&mut *self.shared.frames.lock());
        debug!(chunks = frames.len(), "recording session ended");
        self.shared.publish_processing();

        let shared = Arc::clone(&self.shared);
        self.shared.runtime.spawn(async move {
            finish_session(shared, frames).await;
        });
    }

    /// Tear down for process exit: stop any open stream and hide the
    /// overlay. In-flight transcriptions are abandoned with the runtime.
    pub fn shutdown(&mut self) {
        if let Some(mut stream) = self.active.take() {
            stream.stop();
        }
        let mut inner = self.shared.inner.lock();
        inner.state = SessionState::Idle;
        inner.key_down = false;
    }
}

impl SessionShared {
    /// Audio-callback entry point. Must stay cheap: buffer the chunk, update
    /// the meter, and emit at most one throttled overlay patch.
    fn feed_chunk(self: &Arc<Self>, chunk: &[i16]) {
        let mut patch = StatusPatch::new();
        {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Recording {
                return;
            }
            self.frames.lock().push(chunk.to_vec());
            let frame = inner.meter.update(chunk);

            let no_audio_delay = inner.no_audio_delay;
            if !inner.heard_audio {
                if frame.is_active() {
                    inner.heard_audio = true;
                    if inner.no_audio_shown {
                        inner.no_audio_shown = false;
                        patch = patch.message("Listening...");
                    }
                } else if !inner.no_audio_shown
                    && inner
                        .started_at
                        .is_some_and(|t| t.elapsed() >= no_audio_delay)
                {
                    inner.no_audio_shown = true;
                    patch = patch.message("No audio detected");
                }
            }

            let now = Instant::now();
            let level_push_interval = inner.level_push_interval;
            if inner
                .last_level_push
                .is_none_or(|t| now.duration_since(t) >= level_push_interval)
            {
                inner.last_level_push = Some(now);
                patch = patch.level(frame.smoothed);
            }
        }
        // send outside the lock
        self.overlay.update(&patch);
    }

    fn publish_recording(&self) {
        self.collab.status.state_changed(SessionState::Recording);
        self.overlay.show();
        self.overlay.update(
            &StatusPatch::new()
                .connection(self.connectivity.state())
                .listening(Listening::Listening)
                .processing(Processing::Idle)
                .target(self.collab.focus.text_input_focused())
                .level(0.0)
                .message("Listening..."),
        );
    }

    fn publish_processing(&self) {
        self.collab.status.state_changed(SessionState::Processing);
        self.overlay.show();
        self.overlay.update(
            &StatusPatch::new()
                .connection(self.connectivity.state())
                .listening(Listening::Ready)
                .processing(Processing::Processing)
                .level(0.0)
                .message("Processing..."),
        );
    }
}

enum SessionEnd {
    Clean,
    Errored,
}

/// Processing tail of a session. Always returns the controller to Idle, no
/// matter how transcription went.
async fn finish_session(shared: Arc<SessionShared>, frames: Vec<Vec<i16>>) {
    let end = run_transcription(&shared, frames).await;

    shared.inner.lock().state = SessionState::Idle;
    shared.collab.status.state_changed(SessionState::Idle);
    shared
        .overlay
        .update(&StatusPatch::new().listening(Listening::Ready).message(""));
    shared.overlay.hide_after(match end {
        SessionEnd::Clean => IDLE_HIDE_DELAY,
        SessionEnd::Errored => ERROR_HIDE_DELAY,
    });
}

async fn run_transcription(shared: &Arc<SessionShared>, frames: Vec<Vec<i16>>) -> SessionEnd {
    let config = shared.config.read().clone();
    let samples: Vec<i16> = frames.into_iter().flatten().collect();

    let wav = match encode_wav_mono16(&samples, config.sample_rate) {
        Ok(wav) => wav,
        Err(e) => {
            debug!("failed to encode recording: {}", e);
            shared
                .overlay
                .update(&StatusPatch::new().processing(Processing::Error));
            shared
                .collab
                .notifier
                .notify_error(&format!("Transcription failed: {e}"));
            return SessionEnd::Errored;
        }
    };

    if wav.len() < MIN_AUDIO_BYTES {
        debug!(bytes = wav.len(), "discarding short recording");
        shared
            .overlay
            .update(&StatusPatch::new().processing(Processing::Done));
        return SessionEnd::Clean;
    }

    if config.api_key().is_none() {
        shared.collab.notifier.notify_error(
            "No API key set. Copy the config path from the tray menu and add your API key.",
        );
        shared
            .overlay
            .update(&StatusPatch::new().processing(Processing::Error));
        return SessionEnd::Errored;
    }

    let request = TranscribeRequest::from_config(&config);
    let backend = shared.collab.transcriber.name();
    debug!(backend, bytes = wav.len(), "submitting transcription");

    match shared.collab.transcriber.transcribe(wav, &request).await {
        Ok(text) => {
            if !text.is_empty() {
                let target = shared.collab.focus.text_input_focused();
                shared.overlay.update(&StatusPatch::new().target(target));
                if target == FocusTarget::NotSelected {
                    shared
                        .collab
                        .notifier
                        .notify_error("No text box selected. Click a text field and try again.");
                }
                info!(chars = text.len(), "delivering transcript");
                shared.collab.injector.type_text(&text);
            }
            shared
                .overlay
                .update(&StatusPatch::new().processing(Processing::Done));
            SessionEnd::Clean
        }
        Err(TranscribeError::Http { status, body }) => {
            debug!(status, "transcription rejected");
            shared
                .overlay
                .update(&StatusPatch::new().processing(Processing::Error));
            let body: String = body.chars().take(120).collect();
            shared
                .collab
                .notifier
                .notify_error(&format!("API error {status}: {body}"));
            SessionEnd::Errored
        }
        Err(TranscribeError::Network(e)) => {
            debug!("transcription network failure: {}", e);
            shared.connectivity.set_offline();
            shared
                .overlay
                .update(&StatusPatch::new().processing(Processing::Error));
            shared
                .collab
                .notifier
                .notify_error("Network error - check internet connection.");
            // re-probe now so recovery is noticed quickly
            shared.connectivity.kick();
            SessionEnd::Errored
        }
        Err(e) => {
            debug!("transcription failed: {}", e);
            shared
                .overlay
                .update(&StatusPatch::new().processing(Processing::Error));
            shared.collab.notifier.notify_error(&e.to_string());
            SessionEnd::Errored
        }
    }
}
