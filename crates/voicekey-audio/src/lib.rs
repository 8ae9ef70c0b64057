//! Microphone capture for voicekey.
//!
//! There can only be one active capture at a time; session lifecycle and
//! buffering are not managed by this crate. The session controller receives
//! raw mono i16 chunks through a [`ChunkSink`] callback and owns the returned
//! [`CaptureStream`] for the duration of the hold.

mod capture;
mod meter;
mod wav;

pub use capture::{AudioCapture, CaptureError, CaptureStream, ChunkSink, MicCapture};
pub use meter::{ACTIVITY_THRESHOLD, LevelFrame, LevelMeter};
pub use wav::encode_wav_mono16;
