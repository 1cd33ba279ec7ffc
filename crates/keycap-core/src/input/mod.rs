// Keycap Input Layer
// Hook capabilities, key code translation and device filtering

mod filter;
mod hook;
pub mod keycode;

pub use filter::{is_virtual_device, looks_like_keyboard, matches_device_filter, VIRTUAL_DEVICE_PREFIX};
pub use hook::{
    Backend, HookDecision, HookError, HookId, InputInjector, KeyHandler, KeyHook, ModifierSource,
    RawKeyEvent,
};
pub use keycode::{evdev_to_vk, mouse_button_code, vk_to_evdev};
