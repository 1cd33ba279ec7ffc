// Keycap Toggle Store
// Lock-free per-record toggle flags plus key and mouse-button histories

use std::sync::atomic::{AtomicBool, Ordering};

use strum::IntoEnumIterator;

use crate::record::{MouseButton, RecordId};
use crate::VirtualKey;

const KEY_SLOTS: usize = 0x100;

fn flags(len: usize) -> Box<[AtomicBool]> {
    (0..len).map(|_| AtomicBool::new(false)).collect()
}

/// Mutable state attached to one loaded configuration.
///
/// Shared between the hook thread (physical key history) and synthesis
/// threads (toggle flags, held outputs). Every slot is an independent
/// atomic; a fresh store is built on every load, which is how toggle state
/// resets.
#[derive(Debug)]
pub struct ToggleStore {
    /// One flag per record, false = untoggled ("up")
    toggled: Box<[AtomicBool]>,
    /// Output keys the synthesizer has pressed and not yet released
    held_keys: Box<[AtomicBool]>,
    /// Mouse buttons the synthesizer has pressed and not yet released
    held_buttons: Box<[AtomicBool]>,
    /// Physical trigger keys currently down
    physical: Box<[AtomicBool]>,
}

impl ToggleStore {
    /// Create a store for `record_count` records, everything untoggled
    pub fn new(record_count: usize) -> Self {
        Self {
            toggled: flags(record_count),
            held_keys: flags(KEY_SLOTS),
            held_buttons: flags(MouseButton::COUNT),
            physical: flags(KEY_SLOTS),
        }
    }

    pub fn is_toggled(&self, id: RecordId) -> bool {
        self.toggled
            .get(id.index())
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    /// Flip a record's toggle and return the value it had before.
    ///
    /// Unknown ids read as untoggled and stay that way.
    pub fn flip(&self, id: RecordId) -> bool {
        self.toggled
            .get(id.index())
            .is_some_and(|flag| flag.fetch_xor(true, Ordering::AcqRel))
    }

    /// Record that the synthesizer pressed (`down`) or released an output key
    pub fn mark_key(&self, key: VirtualKey, down: bool) {
        self.held_keys[key.code() as usize].store(down, Ordering::Release);
    }

    pub fn key_held(&self, key: VirtualKey) -> bool {
        self.held_keys[key.code() as usize].load(Ordering::Acquire)
    }

    /// Record that the synthesizer pressed (`down`) or released a mouse button
    pub fn mark_mouse(&self, button: MouseButton, down: bool) {
        self.held_buttons[button.slot()].store(down, Ordering::Release);
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.held_buttons[button.slot()].load(Ordering::Acquire)
    }

    /// Output keys still held down, in code order
    pub fn held_keys(&self) -> Vec<VirtualKey> {
        self.held_keys
            .iter()
            .enumerate()
            .filter(|(_, flag)| flag.load(Ordering::Acquire))
            .map(|(code, _)| VirtualKey(code as u8))
            .collect()
    }

    /// Mouse buttons still held down
    pub fn held_buttons(&self) -> Vec<MouseButton> {
        MouseButton::iter()
            .filter(|button| self.mouse_held(*button))
            .collect()
    }

    /// Record a physical trigger key edge and return whether it was already down
    pub fn mark_physical(&self, key: VirtualKey, down: bool) -> bool {
        self.physical[key.code() as usize].swap(down, Ordering::AcqRel)
    }

    pub fn physical_down(&self, key: VirtualKey) -> bool {
        self.physical[key.code() as usize].load(Ordering::Acquire)
    }

    /// Number of records this store tracks
    pub fn len(&self) -> usize {
        self.toggled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toggled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_store_is_untoggled() {
        let store = ToggleStore::new(3);
        assert_eq!(store.len(), 3);
        for i in 0..3 {
            assert!(!store.is_toggled(RecordId(i)));
        }
        assert!(store.held_keys().is_empty());
        assert!(store.held_buttons().is_empty());
    }

    #[test]
    fn test_flip_returns_previous() {
        let store = ToggleStore::new(2);
        assert!(!store.flip(RecordId(1)));
        assert!(store.is_toggled(RecordId(1)));
        assert!(!store.is_toggled(RecordId(0)));
        assert!(store.flip(RecordId(1)));
        assert!(!store.is_toggled(RecordId(1)));
    }

    #[test]
    fn test_flip_unknown_id() {
        let store = ToggleStore::new(1);
        assert!(!store.flip(RecordId(5)));
        assert!(!store.is_toggled(RecordId(5)));
    }

    #[test]
    fn test_held_histories() {
        let store = ToggleStore::new(0);
        store.mark_key(VirtualKey(0x42), true);
        store.mark_key(VirtualKey(0x10), true);
        store.mark_mouse(MouseButton::Right, true);
        assert_eq!(store.held_keys(), vec![VirtualKey(0x10), VirtualKey(0x42)]);
        assert_eq!(store.held_buttons(), vec![MouseButton::Right]);

        store.mark_key(VirtualKey(0x10), false);
        store.mark_mouse(MouseButton::Right, false);
        assert_eq!(store.held_keys(), vec![VirtualKey(0x42)]);
        assert!(!store.mouse_held(MouseButton::Right));
    }

    #[test]
    fn test_physical_history() {
        let store = ToggleStore::new(0);
        let key = VirtualKey(0x41);
        assert!(!store.mark_physical(key, true));
        assert!(store.physical_down(key));
        assert!(store.mark_physical(key, true));
        assert!(store.mark_physical(key, false));
        assert!(!store.physical_down(key));
    }

    #[test]
    fn test_concurrent_flips_balance() {
        let store = Arc::new(ToggleStore::new(1));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        store.flip(RecordId(0));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        // 1000 flips: back where it started
        assert!(!store.is_toggled(RecordId(0)));
    }
}
