//! Focus-target probing.
//!
//! Platform caret inspection is not wired up yet; the shipped probe answers
//! `Unknown`, which the overlay renders without a target warning and which
//! never blocks delivery.

use voicekey_core::FocusTarget;

use crate::session::FocusProbe;

pub struct UnknownFocusProbe;

impl FocusProbe for UnknownFocusProbe {
    fn text_input_focused(&self) -> FocusTarget {
        FocusTarget::Unknown
    }
}
