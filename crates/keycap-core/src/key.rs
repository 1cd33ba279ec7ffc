// Keycap Virtual Key Type
// Represents a single Win32-style virtual-key code as stored in translation files

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

include!(concat!(env!("OUT_DIR"), "/virtual_key.rs"));

/// Error returned when a key name cannot be resolved
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown key: {0}")]
pub struct KeyParseError(pub String);

/// Well-known virtual keys used by the engine itself
pub mod vk {
    use super::VirtualKey;

    pub const BACK: VirtualKey = VirtualKey(0x08);
    pub const TAB: VirtualKey = VirtualKey(0x09);
    pub const RETURN: VirtualKey = VirtualKey(0x0D);
    pub const SHIFT: VirtualKey = VirtualKey(0x10);
    pub const CONTROL: VirtualKey = VirtualKey(0x11);
    pub const MENU: VirtualKey = VirtualKey(0x12);
    pub const PAUSE: VirtualKey = VirtualKey(0x13);
    pub const CAPITAL: VirtualKey = VirtualKey(0x14);
    pub const ESCAPE: VirtualKey = VirtualKey(0x1B);
    pub const SPACE: VirtualKey = VirtualKey(0x20);
    pub const LSHIFT: VirtualKey = VirtualKey(0xA0);
    pub const RSHIFT: VirtualKey = VirtualKey(0xA1);
    pub const LCONTROL: VirtualKey = VirtualKey(0xA2);
    pub const RCONTROL: VirtualKey = VirtualKey(0xA3);
    pub const LMENU: VirtualKey = VirtualKey(0xA4);
    pub const RMENU: VirtualKey = VirtualKey(0xA5);
}

const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

const LETTERS: [&str; 26] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R",
    "S", "T", "U", "V", "W", "X", "Y", "Z",
];

const NUMPADS: [&str; 10] = [
    "NUMPAD0", "NUMPAD1", "NUMPAD2", "NUMPAD3", "NUMPAD4", "NUMPAD5", "NUMPAD6", "NUMPAD7",
    "NUMPAD8", "NUMPAD9",
];

const FUNCTION_KEYS: [&str; 24] = [
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12", "F13", "F14",
    "F15", "F16", "F17", "F18", "F19", "F20", "F21", "F22", "F23", "F24",
];

/// Display name for a virtual-key code
pub fn key_name(code: u8) -> &'static str {
    static KEY_NAMES: OnceLock<Vec<&'static str>> = OnceLock::new();
    KEY_NAMES.get_or_init(|| {
        let mut names = vec!["UNKNOWN"; 0x100];
        names[0x01] = "LBUTTON";
        names[0x02] = "RBUTTON";
        names[0x03] = "CANCEL";
        names[0x04] = "MBUTTON";
        names[0x05] = "XBUTTON1";
        names[0x06] = "XBUTTON2";
        names[0x08] = "BACK";
        names[0x09] = "TAB";
        names[0x0C] = "CLEAR";
        names[0x0D] = "RETURN";
        names[0x10] = "SHIFT";
        names[0x11] = "CONTROL";
        names[0x12] = "MENU";
        names[0x13] = "PAUSE";
        names[0x14] = "CAPITAL";
        names[0x15] = "KANA";
        names[0x17] = "JUNJA";
        names[0x18] = "FINAL";
        names[0x19] = "KANJI";
        names[0x1B] = "ESCAPE";
        names[0x1C] = "CONVERT";
        names[0x1D] = "NONCONVERT";
        names[0x1E] = "ACCEPT";
        names[0x1F] = "MODECHANGE";
        names[0x20] = "SPACE";
        names[0x21] = "PRIOR";
        names[0x22] = "NEXT";
        names[0x23] = "END";
        names[0x24] = "HOME";
        names[0x25] = "LEFT";
        names[0x26] = "UP";
        names[0x27] = "RIGHT";
        names[0x28] = "DOWN";
        names[0x29] = "SELECT";
        names[0x2A] = "PRINT";
        names[0x2B] = "EXECUTE";
        names[0x2C] = "SNAPSHOT";
        names[0x2D] = "INSERT";
        names[0x2E] = "DELETE";
        names[0x2F] = "HELP";
        for (i, name) in DIGITS.into_iter().enumerate() {
            names[0x30 + i] = name;
        }
        for (i, name) in LETTERS.into_iter().enumerate() {
            names[0x41 + i] = name;
        }
        names[0x5B] = "LWIN";
        names[0x5C] = "RWIN";
        names[0x5D] = "APPS";
        names[0x5F] = "SLEEP";
        for (i, name) in NUMPADS.into_iter().enumerate() {
            names[0x60 + i] = name;
        }
        names[0x6A] = "MULTIPLY";
        names[0x6B] = "ADD";
        names[0x6C] = "SEPARATOR";
        names[0x6D] = "SUBTRACT";
        names[0x6E] = "DECIMAL";
        names[0x6F] = "DIVIDE";
        for (i, name) in FUNCTION_KEYS.into_iter().enumerate() {
            names[0x70 + i] = name;
        }
        names[0x90] = "NUMLOCK";
        names[0x91] = "SCROLL";
        names[0xA0] = "LSHIFT";
        names[0xA1] = "RSHIFT";
        names[0xA2] = "LCONTROL";
        names[0xA3] = "RCONTROL";
        names[0xA4] = "LMENU";
        names[0xA5] = "RMENU";
        names[0xA6] = "BROWSER_BACK";
        names[0xA7] = "BROWSER_FORWARD";
        names[0xA8] = "BROWSER_REFRESH";
        names[0xA9] = "BROWSER_STOP";
        names[0xAA] = "BROWSER_SEARCH";
        names[0xAB] = "BROWSER_FAVORITES";
        names[0xAC] = "BROWSER_HOME";
        names[0xAD] = "VOLUME_MUTE";
        names[0xAE] = "VOLUME_DOWN";
        names[0xAF] = "VOLUME_UP";
        names[0xB0] = "MEDIA_NEXT_TRACK";
        names[0xB1] = "MEDIA_PREV_TRACK";
        names[0xB2] = "MEDIA_STOP";
        names[0xB3] = "MEDIA_PLAY_PAUSE";
        names[0xB4] = "LAUNCH_MAIL";
        names[0xB5] = "LAUNCH_MEDIA_SELECT";
        names[0xB6] = "LAUNCH_APP1";
        names[0xB7] = "LAUNCH_APP2";
        names[0xBA] = "OEM_1";
        names[0xBB] = "OEM_PLUS";
        names[0xBC] = "OEM_COMMA";
        names[0xBD] = "OEM_MINUS";
        names[0xBE] = "OEM_PERIOD";
        names[0xBF] = "OEM_2";
        names[0xC0] = "OEM_3";
        names[0xDB] = "OEM_4";
        names[0xDC] = "OEM_5";
        names[0xDD] = "OEM_6";
        names[0xDE] = "OEM_7";
        names[0xDF] = "OEM_8";
        names[0xE2] = "OEM_102";
        names[0xE5] = "PROCESSKEY";
        names[0xE7] = "PACKET";
        names[0xF6] = "ATTN";
        names[0xF7] = "CRSEL";
        names[0xF8] = "EXSEL";
        names[0xF9] = "EREOF";
        names[0xFA] = "PLAY";
        names[0xFB] = "ZOOM";
        names[0xFD] = "PA1";
        names[0xFE] = "OEM_CLEAR";
        names
    })[code as usize]
}

/// Try to parse a key name to a virtual key
///
/// Accepts the canonical names from [`key_name`] (with or without a `VK_`
/// prefix), a handful of friendlier aliases, and raw `0x..` hex codes.
pub fn key_from_name(name: &str) -> Option<VirtualKey> {
    let name_upper = name.trim().to_uppercase();
    let name_upper = name_upper.strip_prefix("VK_").unwrap_or(&name_upper);

    if let Some(hex) = name_upper.strip_prefix("0X") {
        return u8::from_str_radix(hex, 16).ok().map(VirtualKey);
    }

    static ALIASES: OnceLock<Vec<(&'static str, u8)>> = OnceLock::new();
    let aliases = ALIASES.get_or_init(|| {
        vec![
            ("BACKSPACE", 0x08),
            ("ENTER", 0x0D),
            ("CTRL", 0x11),
            ("ALT", 0x12),
            ("CAPSLOCK", 0x14),
            ("ESC", 0x1B),
            ("PAGE_UP", 0x21),
            ("PAGEUP", 0x21),
            ("PAGE_DOWN", 0x22),
            ("PAGEDOWN", 0x22),
            ("PRINTSCREEN", 0x2C),
            ("DEL", 0x2E),
            ("INS", 0x2D),
            ("MENU_KEY", 0x5D),
            ("SCROLLLOCK", 0x91),
            ("LCTRL", 0xA2),
            ("RCTRL", 0xA3),
            ("LALT", 0xA4),
            ("RALT", 0xA5),
        ]
    });
    if let Some(&(_, code)) = aliases.iter().find(|(alias, _)| *alias == name_upper) {
        return Some(VirtualKey(code));
    }

    (1..=u8::MAX)
        .find(|&code| key_name(code) == name_upper)
        .map(VirtualKey)
}
