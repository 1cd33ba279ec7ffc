// Keycap Key Code Translation
// Virtual-key codes to Linux input event codes and back

use std::sync::OnceLock;

use crate::record::MouseButton;
use crate::VirtualKey;

/// Linux `BTN_LEFT`; the other buttons follow it
pub const BTN_LEFT: u16 = 0x110;
pub const BTN_RIGHT: u16 = 0x111;
pub const BTN_MIDDLE: u16 = 0x112;
pub const BTN_SIDE: u16 = 0x113;
pub const BTN_EXTRA: u16 = 0x114;

/// Highest Linux key code we translate (exclusive)
const EVDEV_SLOTS: usize = 0x100;

/// (virtual key, Linux key code) pairs.
///
/// Forward lookups take the first pair for a virtual key; reverse lookups
/// take the last pair for a Linux code, so sided modifier codes win over the
/// generic ones and the trailing keypad aliases are reverse-only.
const PAIRS: &[(u8, u16)] = &[
    (0x08, 14),  // BACK
    (0x09, 15),  // TAB
    (0x0D, 28),  // RETURN
    (0x10, 42),  // SHIFT
    (0x11, 29),  // CONTROL
    (0x12, 56),  // MENU
    (0x13, 119), // PAUSE
    (0x14, 58),  // CAPITAL
    (0x1B, 1),   // ESCAPE
    (0x20, 57),  // SPACE
    (0x21, 104), // PRIOR
    (0x22, 109), // NEXT
    (0x23, 107), // END
    (0x24, 102), // HOME
    (0x25, 105), // LEFT
    (0x26, 103), // UP
    (0x27, 106), // RIGHT
    (0x28, 108), // DOWN
    (0x2C, 99),  // SNAPSHOT
    (0x2D, 110), // INSERT
    (0x2E, 111), // DELETE
    (0x30, 11),
    (0x31, 2),
    (0x32, 3),
    (0x33, 4),
    (0x34, 5),
    (0x35, 6),
    (0x36, 7),
    (0x37, 8),
    (0x38, 9),
    (0x39, 10),
    (0x41, 30),
    (0x42, 48),
    (0x43, 46),
    (0x44, 32),
    (0x45, 18),
    (0x46, 33),
    (0x47, 34),
    (0x48, 35),
    (0x49, 23),
    (0x4A, 36),
    (0x4B, 37),
    (0x4C, 38),
    (0x4D, 50),
    (0x4E, 49),
    (0x4F, 24),
    (0x50, 25),
    (0x51, 16),
    (0x52, 19),
    (0x53, 31),
    (0x54, 20),
    (0x55, 22),
    (0x56, 47),
    (0x57, 17),
    (0x58, 45),
    (0x59, 21),
    (0x5A, 44),
    (0x5B, 125), // LWIN
    (0x5C, 126), // RWIN
    (0x5D, 127), // APPS
    (0x5F, 142), // SLEEP
    (0x60, 82),
    (0x61, 79),
    (0x62, 80),
    (0x63, 81),
    (0x64, 75),
    (0x65, 76),
    (0x66, 77),
    (0x67, 71),
    (0x68, 72),
    (0x69, 73),
    (0x6A, 55), // MULTIPLY
    (0x6B, 78), // ADD
    (0x6D, 74), // SUBTRACT
    (0x6E, 83), // DECIMAL
    (0x6F, 98), // DIVIDE
    (0x70, 59),
    (0x71, 60),
    (0x72, 61),
    (0x73, 62),
    (0x74, 63),
    (0x75, 64),
    (0x76, 65),
    (0x77, 66),
    (0x78, 67),
    (0x79, 68),
    (0x7A, 87),
    (0x7B, 88),
    (0x7C, 183),
    (0x7D, 184),
    (0x7E, 185),
    (0x7F, 186),
    (0x80, 187),
    (0x81, 188),
    (0x82, 189),
    (0x83, 190),
    (0x84, 191),
    (0x85, 192),
    (0x86, 193),
    (0x87, 194),
    (0x90, 69),  // NUMLOCK
    (0x91, 70),  // SCROLL
    (0xA0, 42),  // LSHIFT
    (0xA1, 54),  // RSHIFT
    (0xA2, 29),  // LCONTROL
    (0xA3, 97),  // RCONTROL
    (0xA4, 56),  // LMENU
    (0xA5, 100), // RMENU
    (0xA6, 158), // BROWSER_BACK
    (0xA7, 159), // BROWSER_FORWARD
    (0xA8, 173), // BROWSER_REFRESH
    (0xA9, 128), // BROWSER_STOP
    (0xAA, 217), // BROWSER_SEARCH
    (0xAB, 156), // BROWSER_FAVORITES
    (0xAC, 172), // BROWSER_HOME
    (0xAD, 113), // VOLUME_MUTE
    (0xAE, 114), // VOLUME_DOWN
    (0xAF, 115), // VOLUME_UP
    (0xB0, 163), // MEDIA_NEXT_TRACK
    (0xB1, 165), // MEDIA_PREV_TRACK
    (0xB2, 166), // MEDIA_STOP
    (0xB3, 164), // MEDIA_PLAY_PAUSE
    (0xB4, 155), // LAUNCH_MAIL
    (0xBA, 39),  // OEM_1
    (0xBB, 13),  // OEM_PLUS
    (0xBC, 51),  // OEM_COMMA
    (0xBD, 12),  // OEM_MINUS
    (0xBE, 52),  // OEM_PERIOD
    (0xBF, 53),  // OEM_2
    (0xC0, 41),  // OEM_3
    (0xDB, 26),  // OEM_4
    (0xDC, 43),  // OEM_5
    (0xDD, 27),  // OEM_6
    (0xDE, 40),  // OEM_7
    (0xE2, 86),  // OEM_102
    (0x0D, 96),  // keypad enter
];

struct Tables {
    to_evdev: [u16; 0x100],
    to_vk: [u8; EVDEV_SLOTS],
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut tables = Tables {
            to_evdev: [0; 0x100],
            to_vk: [0; EVDEV_SLOTS],
        };
        for &(vk, code) in PAIRS {
            if tables.to_evdev[vk as usize] == 0 {
                tables.to_evdev[vk as usize] = code;
            }
            tables.to_vk[code as usize] = vk;
        }
        tables
    })
}

/// Linux key code to emit for a virtual key
pub fn vk_to_evdev(key: VirtualKey) -> Option<u16> {
    match tables().to_evdev[key.code() as usize] {
        0 => None,
        code => Some(code),
    }
}

/// Virtual key reported for a Linux key code
pub fn evdev_to_vk(code: u16) -> Option<VirtualKey> {
    match tables().to_vk.get(code as usize) {
        Some(&vk) if vk != 0 => Some(VirtualKey(vk)),
        _ => None,
    }
}

/// Linux button code for a mouse button
pub fn mouse_button_code(button: MouseButton) -> u16 {
    match button {
        MouseButton::Left => BTN_LEFT,
        MouseButton::Right => BTN_RIGHT,
        MouseButton::Middle => BTN_MIDDLE,
        MouseButton::Back => BTN_SIDE,
        MouseButton::Forward => BTN_EXTRA,
    }
}
