//! Session and connectivity state types.

/// The current state of the recording session. Exactly one session exists
/// process-wide; transitions go through the session controller only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Waiting for the hotkey
    #[default]
    Idle,
    /// Hotkey held, microphone stream open
    Recording,
    /// Hotkey released, transcription in flight
    Processing,
}

impl SessionState {
    /// Human-readable label for the tray tooltip.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Recording => "Recording...",
            SessionState::Processing => "Processing...",
        }
    }
}

/// Reachability of the transcription endpoint. Written by the connectivity
/// monitor (and forced to `Offline` on a network-classified transcription
/// failure), read by everyone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityState {
    #[default]
    Checking,
    Online,
    Offline,
}

/// Best-effort answer to "is a text input focused right now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Selected,
    NotSelected,
    Unknown,
}
