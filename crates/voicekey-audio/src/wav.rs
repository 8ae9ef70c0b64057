//! In-memory WAV encoding for the transcription upload.

use std::io::{self, Cursor, Seek, SeekFrom, Write};
use std::sync::Arc;

use anyhow::anyhow;
use hound::{SampleFormat, WavSpec, WavWriter};
use parking_lot::Mutex;

/// `WavWriter::finalize` does not hand back its sink, so the writer targets a
/// cheaply cloneable cursor we can unwrap afterwards to recover the bytes.
#[derive(Clone)]
struct SharedCursor {
    inner: Arc<Mutex<Cursor<Vec<u8>>>>,
}

impl SharedCursor {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Cursor::new(Vec::with_capacity(capacity)))),
        }
    }

    fn try_into_inner(self) -> anyhow::Result<Vec<u8>> {
        let owned = Arc::try_unwrap(self.inner)
            .map_err(|_| anyhow!("wav sink still shared after finalize"))?;
        Ok(owned.into_inner().into_inner())
    }
}

impl Seek for SharedCursor {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.lock().seek(pos)
    }
}

impl Write for SharedCursor {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// Encode mono 16-bit PCM samples as a complete WAV file in memory.
pub fn encode_wav_mono16(samples: &[i16], sample_rate: u32) -> anyhow::Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let sink = SharedCursor::with_capacity(44 + samples.len() * 2);
    let mut writer = WavWriter::new(sink.clone(), spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    // write the framing information before we take the buffer back
    writer.finalize()?;

    sink.try_into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_plus_two_bytes_per_sample() {
        let bytes = encode_wav_mono16(&[0i16; 2000], 16_000).unwrap();
        assert_eq!(bytes.len(), 44 + 4000);
    }

    #[test]
    fn round_trips_through_hound() {
        let samples: Vec<i16> = (0..1000).map(|i| (i % 321) as i16).collect();
        let bytes = encode_wav_mono16(&samples, 16_000).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn empty_input_is_header_only() {
        let bytes = encode_wav_mono16(&[], 16_000).unwrap();
        assert_eq!(bytes.len(), 44);
    }
}
