// Keycap Modifier Flags
// The three modifiers a trigger chord can require (Alt, Control, Shift)

use std::fmt;

use bitflags::bitflags;

use crate::key::vk;
use crate::VirtualKey;

bitflags! {
    /// Modifier state of a chord or a live snapshot.
    ///
    /// The bit values are the low three bits of the flags word in the
    /// translation file, so they can be read straight off the wire.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModifierFlags: u8 {
        const ALT = 0x01;
        const CONTROL = 0x02;
        const SHIFT = 0x04;
    }
}

impl Default for ModifierFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Press order for modifier keys; releases walk it backwards
const PRESS_ORDER: [(ModifierFlags, VirtualKey); 3] = [
    (ModifierFlags::CONTROL, vk::CONTROL),
    (ModifierFlags::ALT, vk::MENU),
    (ModifierFlags::SHIFT, vk::SHIFT),
];

impl ModifierFlags {
    /// Build flags from individual booleans
    pub fn from_bools(alt: bool, control: bool, shift: bool) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::ALT, alt);
        flags.set(Self::CONTROL, control);
        flags.set(Self::SHIFT, shift);
        flags
    }

    /// Which modifier a virtual key drives, if any.
    ///
    /// Both the generic (`VK_SHIFT`) and sided (`VK_LSHIFT`/`VK_RSHIFT`)
    /// codes count.
    pub fn for_key(key: VirtualKey) -> Option<Self> {
        match key {
            vk::MENU | vk::LMENU | vk::RMENU => Some(Self::ALT),
            vk::CONTROL | vk::LCONTROL | vk::RCONTROL => Some(Self::CONTROL),
            vk::SHIFT | vk::LSHIFT | vk::RSHIFT => Some(Self::SHIFT),
            _ => None,
        }
    }

    /// Generic virtual keys for the set modifiers, in press order
    pub fn press_keys(self) -> impl Iterator<Item = VirtualKey> {
        PRESS_ORDER
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, key)| key)
    }

    /// Generic virtual keys for the set modifiers, in release order
    pub fn release_keys(self) -> impl Iterator<Item = VirtualKey> {
        PRESS_ORDER
            .into_iter()
            .rev()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, key)| key)
    }
}

impl fmt::Display for ModifierFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, name) in [
            (Self::CONTROL, "Ctrl"),
            (Self::ALT, "Alt"),
            (Self::SHIFT, "Shift"),
        ] {
            if self.contains(flag) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bools() {
        assert_eq!(ModifierFlags::from_bools(false, false, false), ModifierFlags::empty());
        assert_eq!(
            ModifierFlags::from_bools(true, false, true),
            ModifierFlags::ALT | ModifierFlags::SHIFT
        );
    }

    #[test]
    fn test_for_key() {
        assert_eq!(ModifierFlags::for_key(vk::LSHIFT), Some(ModifierFlags::SHIFT));
        assert_eq!(ModifierFlags::for_key(vk::RMENU), Some(ModifierFlags::ALT));
        assert_eq!(ModifierFlags::for_key(vk::CONTROL), Some(ModifierFlags::CONTROL));
        assert_eq!(ModifierFlags::for_key(VirtualKey(0x41)), None);
    }

    #[test]
    fn test_press_and_release_order() {
        let all = ModifierFlags::all();
        let pressed: Vec<_> = all.press_keys().collect();
        assert_eq!(pressed, vec![vk::CONTROL, vk::MENU, vk::SHIFT]);
        let released: Vec<_> = all.release_keys().collect();
        assert_eq!(released, vec![vk::SHIFT, vk::MENU, vk::CONTROL]);

        let shift_only: Vec<_> = ModifierFlags::SHIFT.press_keys().collect();
        assert_eq!(shift_only, vec![vk::SHIFT]);
    }

    #[test]
    fn test_display() {
        assert_eq!(ModifierFlags::empty().to_string(), "none");
        assert_eq!(
            (ModifierFlags::ALT | ModifierFlags::CONTROL).to_string(),
            "Ctrl+Alt"
        );
    }
}
