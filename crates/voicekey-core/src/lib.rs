//! Core types and configuration for voicekey.
//!
//! This crate provides platform-agnostic types shared by the capture,
//! transcription and application crates: the session state machine tokens,
//! the overlay status wire record, hotkey bindings and configuration.

mod config;
mod hotkey;
mod state;
mod status;

pub use config::{Config, ConfigManager, HOTKEY_NAMES, LANGUAGE_CODES};
pub use hotkey::HotkeyBinding;
pub use state::{ConnectivityState, FocusTarget, SessionState};
pub use status::{Connection, Listening, Processing, StatusPatch, Target};

/// Application name
pub const APP_NAME: &str = "voicekey";

/// Pretty application name for display
pub const APP_NAME_PRETTY: &str = "VoiceKey";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";
