//! App-specific configuration extensions.

use global_hotkey::hotkey::{Code, HotKey};
use voicekey_core::Config;

/// Resolve a logical hotkey name to the physical key codes to register.
/// Some logical keys need more than one code; international layouts report
/// Right Alt as AltGr on some platforms. Unknown names fall back to the
/// default binding.
pub fn resolve_hotkeys(name: &str) -> Vec<HotKey> {
    let codes: &[Code] = match name {
        "right alt" => &[Code::AltRight],
        "right ctrl" => &[Code::ControlRight],
        "right shift" => &[Code::ShiftRight],
        "f13" => &[Code::F13],
        "f14" => &[Code::F14],
        "f15" => &[Code::F15],
        "pause" => &[Code::Pause],
        "scroll lock" => &[Code::ScrollLock],
        _ => &[Code::AltRight],
    };
    codes.iter().map(|&code| HotKey::new(None, code)).collect()
}

/// Extension trait for [`Config`] to handle hotkeys.
pub trait ConfigExt {
    /// Physical hotkeys for the configured logical key.
    fn hotkeys(&self) -> Vec<HotKey>;
}

impl ConfigExt for Config {
    fn hotkeys(&self) -> Vec<HotKey> {
        resolve_hotkeys(&self.hotkey)
    }
}
