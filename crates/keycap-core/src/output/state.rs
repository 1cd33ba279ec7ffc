// Keycap Pressed Key State
// Keys held on the virtual output device, and the modifier state they imply

use std::collections::HashSet;

use crate::{ModifierFlags, VirtualKey};

/// Tracks keys pressed on an output device with O(1) lookup
#[derive(Debug, Clone, Default)]
pub struct PressedKeyState {
    pressed: HashSet<VirtualKey>,
}

impl PressedKeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key edge
    pub fn set(&mut self, key: VirtualKey, down: bool) {
        if down {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    pub fn is_pressed(&self, key: VirtualKey) -> bool {
        self.pressed.contains(&key)
    }

    /// Modifiers implied by the held keys
    pub fn modifiers(&self) -> ModifierFlags {
        self.pressed
            .iter()
            .filter_map(|key| ModifierFlags::for_key(*key))
            .fold(ModifierFlags::empty(), |acc, flag| acc | flag)
    }

    /// Pressed keys that drive any of `modifiers`, either side, in code order
    pub fn held_for(&self, modifiers: ModifierFlags) -> Vec<VirtualKey> {
        let mut keys: Vec<_> = self
            .pressed
            .iter()
            .copied()
            .filter(|key| ModifierFlags::for_key(*key).is_some_and(|flag| modifiers.contains(flag)))
            .collect();
        keys.sort_unstable();
        keys
    }

    /// All pressed keys, in code order
    pub fn get_all(&self) -> Vec<VirtualKey> {
        let mut keys: Vec<_> = self.pressed.iter().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn clear(&mut self) {
        self.pressed.clear();
    }

    pub fn len(&self) -> usize {
        self.pressed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::vk;

    #[test]
    fn test_state_set() {
        let mut state = PressedKeyState::new();
        let key = VirtualKey(0x41);

        assert!(!state.is_pressed(key));
        state.set(key, true);
        state.set(key, true);
        assert!(state.is_pressed(key));
        assert_eq!(state.len(), 1);
        state.set(key, false);
        assert!(state.is_empty());

        // Releasing a key that was never pressed is fine
        state.set(key, false);
        assert!(state.is_empty());
    }

    #[test]
    fn test_modifiers_from_sided_keys() {
        let mut state = PressedKeyState::new();
        assert_eq!(state.modifiers(), ModifierFlags::empty());

        state.set(vk::LSHIFT, true);
        state.set(vk::RMENU, true);
        state.set(VirtualKey(0x41), true);
        assert_eq!(state.modifiers(), ModifierFlags::SHIFT | ModifierFlags::ALT);

        state.set(vk::LSHIFT, false);
        assert_eq!(state.modifiers(), ModifierFlags::ALT);
    }

    #[test]
    fn test_held_for_reports_right_side_keys() {
        use crate::input::{evdev_to_vk, vk_to_evdev};

        let mut state = PressedKeyState::new();
        // Physical Right Ctrl (KEY_RIGHTCTRL) plus Left Shift
        let right_ctrl = evdev_to_vk(97).unwrap();
        state.set(right_ctrl, true);
        state.set(vk::LSHIFT, true);
        state.set(VirtualKey(0x41), true);

        assert_eq!(state.held_for(ModifierFlags::CONTROL), vec![vk::RCONTROL]);
        assert_eq!(
            state.held_for(ModifierFlags::CONTROL | ModifierFlags::SHIFT),
            vec![vk::LSHIFT, vk::RCONTROL]
        );
        assert!(state.held_for(ModifierFlags::ALT).is_empty());

        // Releasing what held_for reports, through the Linux code table,
        // drops the modifier entirely
        for key in state.held_for(ModifierFlags::CONTROL) {
            let code = vk_to_evdev(key).unwrap();
            assert_eq!(code, 97);
            state.set(evdev_to_vk(code).unwrap(), false);
        }
        assert_eq!(state.modifiers(), ModifierFlags::SHIFT);
        assert!(state.is_pressed(VirtualKey(0x41)));
    }

    #[test]
    fn test_get_all_and_clear() {
        let mut state = PressedKeyState::new();
        state.set(VirtualKey(0x42), true);
        state.set(VirtualKey(0x41), true);
        assert_eq!(state.get_all(), vec![VirtualKey(0x41), VirtualKey(0x42)]);
        state.clear();
        assert!(state.is_empty());
    }
}
