//! The microphone device boundary.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleRate, StreamConfig};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum CaptureError {
    /// No recording device available
    #[error("no input device available")]
    NoInputDevice,
    /// Sample format not supported
    #[error("sample format not supported: {0}")]
    SampleFormatNotSupported(String),
    /// Build stream error
    #[error(transparent)]
    BuildStream(#[from] cpal::BuildStreamError),
    /// Stream refused to start
    #[error("failed to start input stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}

type Result<T> = std::result::Result<T, CaptureError>;

/// Receives raw mono i16 chunks from the device callback context. The sink
/// must never block on network or file I/O.
pub type ChunkSink = Arc<dyn Fn(&[i16]) + Send + Sync>;

/// Handle to an open capture stream. Stopped explicitly on key release;
/// dropping it also ends the stream.
pub trait CaptureStream {
    fn stop(&mut self);
}

/// Boundary around the microphone. Started and stopped exactly once per
/// session, always from the event-loop thread (the underlying stream handle
/// is not `Send` on every platform).
pub trait AudioCapture {
    fn start(&self, sample_rate: u32, sink: ChunkSink) -> Result<Box<dyn CaptureStream>>;
}

/// cpal-backed capture from the default input device.
pub struct MicCapture;

impl MicCapture {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MicCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCapture for MicCapture {
    fn start(&self, sample_rate: u32, sink: ChunkSink) -> Result<Box<dyn CaptureStream>> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)?;
        let default_config = device
            .default_input_config()
            .map_err(|_| CaptureError::NoInputDevice)?;

        info!(
            device_name = %device.name().unwrap_or_else(|_| "<unnamed>".to_string()),
            sample_rate,
            "Recording from device"
        );

        let stream_config = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_fn = move |err| {
            error!("an error occurred on stream: {}", err);
        };

        let stream = match default_config.sample_format() {
            cpal::SampleFormat::I16 => device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &_| sink(data),
                err_fn,
                None,
            )?,
            cpal::SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &_| {
                    let converted: Vec<i16> =
                        data.iter().map(|&s| i16::from_sample(s)).collect();
                    sink(&converted);
                },
                err_fn,
                None,
            )?,
            sample_format => {
                return Err(CaptureError::SampleFormatNotSupported(format!(
                    "{:?}",
                    sample_format
                )));
            }
        };

        stream.play()?;

        Ok(Box::new(MicStream {
            stream: Some(stream),
        }))
    }
}

struct MicStream {
    stream: Option<cpal::Stream>,
}

impl CaptureStream for MicStream {
    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            // pause before drop so the device callback quiesces first
            stream.pause().ok();
        }
    }
}

impl Drop for MicStream {
    fn drop(&mut self) {
        self.stop();
    }
}
