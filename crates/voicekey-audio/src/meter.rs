//! Audio level metering for the overlay waveform.
//!
//! Raw RMS jumps around far too much to animate directly. The meter
//! normalizes against a fixed reference amplitude, gates a noise floor,
//! applies a perceptual curve to keep quiet speech visible, then smooths
//! asymmetrically: a fast attack so the meter jumps on speech onset and a
//! slower release so it falls away without flicker.

/// Reference amplitude mapping RMS to 1.0.
const LEVEL_NORMALIZATION: f32 = 6800.0;
/// Normalized levels below this are treated as silence.
const LEVEL_NOISE_FLOOR: f32 = 0.012;
/// Blend factor while the level is rising.
const LEVEL_ATTACK: f32 = 0.40;
/// Blend factor while the level is falling.
const LEVEL_RELEASE: f32 = 0.18;
/// Perceptual exponent (< 1 boosts low-level signal).
const LEVEL_CURVE: f32 = 0.85;

/// Raw level above which a chunk counts as heard speech.
pub const ACTIVITY_THRESHOLD: f32 = 0.02;

/// One meter update: the gated raw level and the new smoothed level, both
/// in [0, 1]. Copies of these values cross threads, never the meter itself.
#[derive(Debug, Clone, Copy)]
pub struct LevelFrame {
    pub raw: f32,
    pub smoothed: f32,
}

impl LevelFrame {
    /// Whether this chunk crossed the speech activity threshold.
    pub fn is_active(&self) -> bool {
        self.raw > ACTIVITY_THRESHOLD
    }
}

/// Smoothed activity meter. Mutated only from the audio-callback context.
#[derive(Debug, Clone, Default)]
pub struct LevelMeter {
    smoothed: f32,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.smoothed = 0.0;
    }

    pub fn level(&self) -> f32 {
        self.smoothed
    }

    /// Fold one chunk of samples into the meter.
    pub fn update(&mut self, samples: &[i16]) -> LevelFrame {
        let rms = rms(samples);
        let mut raw = (rms / LEVEL_NORMALIZATION).clamp(0.0, 1.0);
        if raw < LEVEL_NOISE_FLOOR {
            raw = 0.0;
        }

        let target = raw.powf(LEVEL_CURVE);
        let blend = if target > self.smoothed {
            LEVEL_ATTACK
        } else {
            LEVEL_RELEASE
        };
        self.smoothed = (self.smoothed + (target - self.smoothed) * blend).clamp(0.0, 1.0);

        LevelFrame {
            raw,
            smoothed: self.smoothed,
        }
    }
}

fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples
        .iter()
        .map(|&s| {
            let v = s as f32;
            v * v
        })
        .sum();
    (sum_sq / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(amplitude: i16, len: usize) -> Vec<i16> {
        vec![amplitude; len]
    }

    #[test]
    fn silence_stays_at_zero() {
        let mut meter = LevelMeter::new();
        for _ in 0..10 {
            let frame = meter.update(&tone(0, 256));
            assert_eq!(frame.raw, 0.0);
            assert_eq!(frame.smoothed, 0.0);
        }
    }

    #[test]
    fn noise_floor_gates_faint_signal() {
        let mut meter = LevelMeter::new();
        // rms 40 / 6800 ~ 0.006, below the floor
        let frame = meter.update(&tone(40, 256));
        assert_eq!(frame.raw, 0.0);
        assert_eq!(frame.smoothed, 0.0);
    }

    #[test]
    fn attack_rises_strictly_on_step_input() {
        let mut meter = LevelMeter::new();
        let chunk = tone(6000, 256);
        let mut previous = 0.0;
        for _ in 0..6 {
            let frame = meter.update(&chunk);
            assert!(frame.smoothed > previous, "meter must rise during attack");
            assert!(frame.smoothed <= 1.0);
            previous = frame.smoothed;
        }
    }

    #[test]
    fn release_falls_strictly_after_tone_stops() {
        let mut meter = LevelMeter::new();
        let chunk = tone(6000, 256);
        for _ in 0..10 {
            meter.update(&chunk);
        }
        let mut previous = meter.level();
        assert!(previous > 0.5);
        for _ in 0..6 {
            let frame = meter.update(&tone(0, 256));
            assert!(frame.smoothed < previous, "meter must fall during release");
            assert!(frame.smoothed >= 0.0);
            previous = frame.smoothed;
        }
    }

    #[test]
    fn never_overshoots_unit_range() {
        let mut meter = LevelMeter::new();
        let chunk = tone(i16::MAX, 256);
        for _ in 0..50 {
            let frame = meter.update(&chunk);
            assert!(frame.smoothed <= 1.0);
            assert!(frame.raw <= 1.0);
        }
    }

    #[test]
    fn activity_threshold_marks_speech() {
        let mut meter = LevelMeter::new();
        assert!(!meter.update(&tone(60, 256)).is_active());
        assert!(meter.update(&tone(400, 256)).is_active());
    }

    #[test]
    fn empty_chunk_is_silence() {
        let mut meter = LevelMeter::new();
        let frame = meter.update(&[]);
        assert_eq!(frame.raw, 0.0);
    }
}
