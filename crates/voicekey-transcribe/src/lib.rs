//! Transcription backend library for voicekey.
//!
//! This crate provides a trait-based abstraction for audio transcription
//! with a client for Voxtral-compatible HTTP endpoints, plus the endpoint
//! reachability probe used by the connectivity monitor.

mod probe;
mod voxtral;

use async_trait::async_trait;
pub use probe::endpoint_reachable;
use thiserror::Error;
use voicekey_core::Config;
pub use voxtral::VoxtralClient;

/// Errors that can occur during transcription. The session controller
/// branches on this classification: `Http` surfaces the status code,
/// `Network` additionally flips connectivity to offline.
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("API error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("transcription failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TranscribeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            TranscribeError::Network(err.to_string())
        } else {
            TranscribeError::Other(err.to_string())
        }
    }
}

/// Result type for transcription operations.
pub type Result<T> = std::result::Result<T, TranscribeError>;

/// Everything one request needs, snapshotted from config at session end so a
/// concurrent settings save cannot tear a request in half.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub language: Option<String>,
}

impl TranscribeRequest {
    pub fn from_config(config: &Config) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key().unwrap_or_default().to_string(),
            model: config.model.clone(),
            language: config.language_param().map(str::to_string),
        }
    }
}

/// Trait for transcription backends.
///
/// One attempt per call; retry policy (if any) belongs to the caller.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe WAV audio to text.
    async fn transcribe(&self, audio: Vec<u8>, request: &TranscribeRequest) -> Result<String>;

    /// Returns the name of this transcriber for logging/debugging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_snapshots_config() {
        let config = Config {
            api_key: " sk-abc ".to_string(),
            language: "nl".to_string(),
            ..Default::default()
        };
        let request = TranscribeRequest::from_config(&config);
        assert_eq!(request.api_key, "sk-abc");
        assert_eq!(request.language.as_deref(), Some("nl"));
        assert_eq!(request.model, "voxtral-mini-latest");
    }

    #[test]
    fn auto_language_is_omitted() {
        let request = TranscribeRequest::from_config(&Config::default());
        assert!(request.language.is_none());
        assert!(request.api_key.is_empty());
    }
}
