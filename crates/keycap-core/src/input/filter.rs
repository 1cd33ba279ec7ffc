// Keycap Input Layer - Device Filtering
// Which evdev devices the hook grabs

/// Prefix of our own uinput device name
pub const VIRTUAL_DEVICE_PREFIX: &str = "Keycap (virtual)";

// Q W E R T Y
const QWERTY_CODES: &[u16] = &[16, 17, 18, 19, 20, 21];

// SPACE A Z
const A_Z_SPACE_CODES: &[u16] = &[57, 30, 44];

/// Whether a device supporting the codes `has_key` accepts looks like a
/// full keyboard (QWERTY row, A, Z and SPACE all present).
pub fn looks_like_keyboard(has_key: impl Fn(u16) -> bool) -> bool {
    QWERTY_CODES.iter().chain(A_Z_SPACE_CODES).all(|code| has_key(*code))
}

/// Whether `name` belongs to a device we created
pub fn is_virtual_device(name: &str) -> bool {
    name.contains(VIRTUAL_DEVICE_PREFIX)
}

/// Check if a device should be grabbed.
///
/// With an explicit `filter_names` list, a device is used when its path or
/// name appears in the list. With an empty list, every non-virtual keyboard
/// is used.
pub fn matches_device_filter(
    device_name: &str,
    device_path: &str,
    filter_names: &[String],
    is_keyboard: bool,
    is_virtual: bool,
) -> bool {
    if !filter_names.is_empty() {
        return filter_names
            .iter()
            .any(|match_name| device_path == match_name || device_name == match_name);
    }

    !is_virtual && is_keyboard
}
