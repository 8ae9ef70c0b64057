//! Voxtral (Mistral audio transcription) HTTP backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::{Result, TranscribeError, TranscribeRequest, Transcriber};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for Voxtral-compatible transcription endpoints.
#[derive(Debug, Clone)]
pub struct VoxtralClient {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl VoxtralClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TranscribeError::Other(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transcriber for VoxtralClient {
    async fn transcribe(&self, audio: Vec<u8>, request: &TranscribeRequest) -> Result<String> {
        debug!(
            endpoint = %request.endpoint,
            model = %request.model,
            language = ?request.language,
            audio_bytes = audio.len(),
            "Sending transcription request"
        );

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| TranscribeError::Other(e.to_string()))?,
            )
            .part(
                "model",
                reqwest::multipart::Part::text(request.model.clone()),
            );

        if let Some(language) = &request.language {
            form = form.part(
                "language",
                reqwest::multipart::Part::text(language.clone()),
            );
        }

        let response = self
            .client
            .post(&request.endpoint)
            .header("Authorization", format!("Bearer {}", request.api_key))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::Http { status, body });
        }

        let transcription: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| TranscribeError::Other(e.to_string()))?;

        Ok(transcription.text.trim().to_string())
    }

    fn name(&self) -> &str {
        "voxtral"
    }
}
