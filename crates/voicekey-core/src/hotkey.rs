//! Logical hotkey bindings.
//!
//! One logical hotkey may resolve to several equivalent physical key codes;
//! many international layouts report Right Alt as AltGr, for example. The
//! binding treats any of its ids as the same key: the first id down starts a
//! session and any id up releases it, with a single debounce latch shared by
//! the whole set (the latch itself lives in the session controller, guarded
//! by the same lock as the state machine).

/// The resolved physical ids for one logical hotkey.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotkeyBinding {
    ids: Vec<u32>,
}

impl HotkeyBinding {
    pub fn new(ids: Vec<u32>) -> Self {
        Self { ids }
    }

    /// Whether `id` is one of this binding's physical codes.
    pub fn matches(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_any_equivalent_id() {
        let binding = HotkeyBinding::new(vec![3, 7]);
        assert!(binding.matches(3));
        assert!(binding.matches(7));
        assert!(!binding.matches(4));
    }

    #[test]
    fn empty_binding_matches_nothing() {
        let binding = HotkeyBinding::default();
        assert!(binding.is_empty());
        assert!(!binding.matches(0));
    }
}
