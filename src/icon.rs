//! Tray icon rendering, one colored dot per session state.

use std::sync::LazyLock;

use image::{Rgba, RgbaImage};
use voicekey_core::{APP_NAME_PRETTY, SessionState};

const ICON_SIZE: u32 = 64;
const COLOR_IDLE: (u8, u8, u8) = (80, 80, 80);
const COLOR_RECORDING: (u8, u8, u8) = (220, 40, 40);
const COLOR_PROCESSING: (u8, u8, u8) = (220, 140, 0);

static ICON_IDLE: LazyLock<tray_icon::Icon> = LazyLock::new(|| render_dot(COLOR_IDLE));
static ICON_RECORDING: LazyLock<tray_icon::Icon> = LazyLock::new(|| render_dot(COLOR_RECORDING));
static ICON_PROCESSING: LazyLock<tray_icon::Icon> = LazyLock::new(|| render_dot(COLOR_PROCESSING));

pub fn state_icon(state: SessionState) -> tray_icon::Icon {
    match state {
        SessionState::Idle => ICON_IDLE.clone(),
        SessionState::Recording => ICON_RECORDING.clone(),
        SessionState::Processing => ICON_PROCESSING.clone(),
    }
}

pub fn state_tooltip(state: SessionState) -> String {
    format!("{} - {}", APP_NAME_PRETTY, state.label())
}

fn render_dot(color: (u8, u8, u8)) -> tray_icon::Icon {
    let mut image = RgbaImage::new(ICON_SIZE, ICON_SIZE);
    let center = (ICON_SIZE as f32 - 1.0) / 2.0;
    let radius = ICON_SIZE as f32 / 2.0 - 4.0;

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        if (dx * dx + dy * dy).sqrt() <= radius {
            *pixel = Rgba([color.0, color.1, color.2, 255]);
        }
    }

    tray_icon::Icon::from_rgba(image.into_raw(), ICON_SIZE, ICON_SIZE)
        .expect("Failed to build icon")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_state_has_a_tooltip() {
        assert_eq!(state_tooltip(SessionState::Idle), "VoiceKey - Idle");
        assert!(state_tooltip(SessionState::Recording).contains("Recording"));
        assert!(state_tooltip(SessionState::Processing).contains("Processing"));
    }
}
