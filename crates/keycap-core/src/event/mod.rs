// Keycap Event Handling
// Linux keyboard hook: evdev grab loop feeding the engine

mod hook;
pub mod r#loop;

pub use hook::EvdevHook;
pub use r#loop::{DeviceInfo, EventLoop, EventLoopError, EventLoopResult};
