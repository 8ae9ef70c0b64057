//! Overlay status wire records.
//!
//! The overlay renderer is a separate process fed by small JSON patches.
//! Every field of a patch is optional; an absent field means "unchanged",
//! never "cleared". Only present fields are serialized, so the renderer can
//! merge patches into its last-known state.

use serde::Serialize;

use crate::{ConnectivityState, FocusTarget};

/// `connection` token: endpoint reachability as shown by the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connection {
    Checking,
    Online,
    Offline,
}

impl From<ConnectivityState> for Connection {
    fn from(state: ConnectivityState) -> Self {
        match state {
            ConnectivityState::Checking => Connection::Checking,
            ConnectivityState::Online => Connection::Online,
            ConnectivityState::Offline => Connection::Offline,
        }
    }
}

/// `listening` token: microphone side of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Listening {
    Ready,
    Listening,
    Error,
}

/// `processing` token: transcription side of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Processing {
    Idle,
    Processing,
    Done,
    Error,
}

/// `target` token: whether a text input appears to be focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Unknown,
    Selected,
    NotSelected,
}

impl From<FocusTarget> for Target {
    fn from(target: FocusTarget) -> Self {
        match target {
            FocusTarget::Selected => Target::Selected,
            FocusTarget::NotSelected => Target::NotSelected,
            FocusTarget::Unknown => Target::Unknown,
        }
    }
}

/// A sparse status update for the overlay renderer.
///
/// `message` follows the wire contract for strings: absent means no change,
/// an empty string clears the bubble text.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<Connection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listening: Option<Listening>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing: Option<Processing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(mut self, connection: impl Into<Connection>) -> Self {
        self.connection = Some(connection.into());
        self
    }

    pub fn listening(mut self, listening: Listening) -> Self {
        self.listening = Some(listening);
        self
    }

    pub fn processing(mut self, processing: Processing) -> Self {
        self.processing = Some(processing);
        self
    }

    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn level(mut self, level: f32) -> Self {
        self.level = Some(level.clamp(0.0, 1.0));
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// True when no field is set; empty patches are never transmitted.
    pub fn is_empty(&self) -> bool {
        self.connection.is_none()
            && self.listening.is_none()
            && self.processing.is_none()
            && self.target.is_none()
            && self.level.is_none()
            && self.visible.is_none()
            && self.message.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_present_fields_serialize() {
        let patch = StatusPatch::new().level(0.5);
        let value: serde_json::Value = serde_json::to_value(&patch).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object["level"], 0.5);
    }

    #[test]
    fn tokens_are_snake_case() {
        let patch = StatusPatch::new()
            .connection(Connection::Checking)
            .target(FocusTarget::NotSelected)
            .processing(Processing::Done);
        let json = serde_json::to_string(&patch).unwrap();
        assert!(json.contains("\"connection\":\"checking\""));
        assert!(json.contains("\"target\":\"not_selected\""));
        assert!(json.contains("\"processing\":\"done\""));
    }

    #[test]
    fn empty_message_clears_rather_than_omits() {
        let patch = StatusPatch::new().message("");
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, "{\"message\":\"\"}");
    }

    #[test]
    fn level_is_clamped() {
        assert_eq!(StatusPatch::new().level(1.5).level, Some(1.0));
        assert_eq!(StatusPatch::new().level(-0.2).level, Some(0.0));
    }

    #[test]
    fn default_patch_is_empty() {
        assert!(StatusPatch::new().is_empty());
        assert!(!StatusPatch::new().visible(false).is_empty());
    }
}
