//! Text delivery at the cursor position.
//!
//! Runs on the event-loop thread only; enigo and the clipboard are not
//! shareable across threads on every platform.

use std::thread::sleep;
use std::time::Duration;

use anyhow::Result;
use arboard::Clipboard;
use enigo::{Enigo, Keyboard};

/// Time for the clipboard owner to settle before the paste chord.
const CLIPBOARD_SETTLE: Duration = Duration::from_millis(50);
const CHORD_STEP: Duration = Duration::from_millis(10);

/// Deliver text into the focused application, either by pasting through the
/// clipboard or by simulated typing.
pub fn deliver(
    enigo: &mut Enigo,
    clipboard: &mut Clipboard,
    text: &str,
    paste_mode: bool,
) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    if paste_mode {
        clipboard.set_text(text)?;
        sleep(CLIPBOARD_SETTLE);
        paste_chord(enigo)?;
    } else {
        enigo.text(text)?;
    }
    Ok(())
}

fn paste_chord(enigo: &mut Enigo) -> Result<()> {
    use enigo::Direction::{Click, Press, Release};
    use enigo::Key;

    #[cfg(target_os = "macos")]
    let paste_modifier = Key::Meta;
    #[cfg(not(target_os = "macos"))]
    let paste_modifier = Key::Control;

    enigo.key(paste_modifier, Press)?;
    sleep(CHORD_STEP);
    enigo.key(Key::Unicode('v'), Click)?;
    sleep(CHORD_STEP);
    enigo.key(paste_modifier, Release)?;

    Ok(())
}
