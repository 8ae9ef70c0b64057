// Re-export from sub-crates
pub use voicekey_audio::{
    AudioCapture, CaptureError, CaptureStream, ChunkSink, LevelMeter, MicCapture,
};
pub use voicekey_core::{
    APP_NAME, APP_NAME_PRETTY, Config, ConfigManager, Connection, ConnectivityState,
    DEFAULT_LOG_LEVEL, FocusTarget, HotkeyBinding, Listening, Processing, SessionState,
    StatusPatch, Target,
};
pub use voicekey_transcribe::{
    TranscribeError, TranscribeRequest, Transcriber, VoxtralClient,
};

// App-specific modules
pub mod config_ext;
pub mod connectivity;
pub mod event;
pub mod focus;
pub mod icon;
pub mod inject;
pub mod notify;
pub mod overlay;
pub mod session;

/// Version from this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
