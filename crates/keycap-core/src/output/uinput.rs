// Keycap uinput Output Layer
// Virtual keyboard/mouse device for injected and passed-through events

use std::thread;
use std::time::Duration;

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, RelativeAxisType};
use parking_lot::Mutex;
use strum::IntoEnumIterator;

use super::state::PressedKeyState;
use crate::input::{
    evdev_to_vk, mouse_button_code, vk_to_evdev, InputInjector, ModifierSource,
    VIRTUAL_DEVICE_PREFIX,
};
use crate::record::MouseButton;
use crate::{Action, ModifierFlags, VirtualKey};

/// Error types for uinput operations
#[derive(Debug, thiserror::Error)]
pub enum UInputError {
    #[error("Failed to create virtual device: {0}")]
    DeviceCreation(String),

    #[error("Failed to write event: {0}")]
    WriteError(String),

    #[error("No Linux key code for {0}")]
    Unmapped(VirtualKey),
}

struct Inner {
    device: VirtualDevice,
    pressed: PressedKeyState,
    buttons: [bool; MouseButton::COUNT],
}

impl Inner {
    fn write(&mut self, events: &[InputEvent]) -> Result<(), UInputError> {
        self.device
            .emit(events)
            .map_err(|e: std::io::Error| UInputError::WriteError(e.to_string()))
    }

    fn write_code(&mut self, code: u16, action: Action) -> Result<(), UInputError> {
        let key_event = InputEvent::new(EventType::KEY, code, i32::from(action));
        // SYN event is required for the kernel to process the key event
        let syn_event = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
        self.write(&[key_event, syn_event])?;

        if let Some(key) = evdev_to_vk(code) {
            match action {
                Action::Press => self.pressed.set(key, true),
                Action::Release => self.pressed.set(key, false),
                Action::Repeat => {}
            }
        }
        Ok(())
    }
}

/// The uinput device every event we let through or synthesize goes to.
///
/// Its pressed-key state is what the rest of the system sees, so it also
/// serves as the live modifier snapshot.
pub struct UinputOutput {
    inner: Mutex<Inner>,
    key_pre_delay_ms: u64,
    key_post_delay_ms: u64,
}

impl UinputOutput {
    /// Device name shown in /proc/bus/input/devices
    pub fn device_name() -> String {
        format!("{} Output", VIRTUAL_DEVICE_PREFIX)
    }

    /// Create the virtual device
    pub fn new() -> Result<Self, UInputError> {
        let mut keys = AttributeSet::new();
        for code in 0..256u16 {
            keys.insert(evdev::Key::new(code));
        }
        for button in MouseButton::iter() {
            keys.insert(evdev::Key::new(mouse_button_code(button)));
        }
        let mut axes = AttributeSet::new();
        axes.insert(RelativeAxisType::REL_X);
        axes.insert(RelativeAxisType::REL_Y);

        let name = Self::device_name();
        let device = VirtualDeviceBuilder::new()
            .map_err(|e: std::io::Error| UInputError::DeviceCreation(e.to_string()))?
            .name(&name)
            .with_keys(&keys)
            .map_err(|e: std::io::Error| UInputError::DeviceCreation(e.to_string()))?
            .with_relative_axes(&axes)
            .map_err(|e: std::io::Error| UInputError::DeviceCreation(e.to_string()))?
            .build()
            .map_err(|e: std::io::Error| UInputError::DeviceCreation(e.to_string()))?;

        Ok(Self {
            inner: Mutex::new(Inner {
                device,
                pressed: PressedKeyState::new(),
                buttons: [false; MouseButton::COUNT],
            }),
            key_pre_delay_ms: 0,
            key_post_delay_ms: 0,
        })
    }

    /// Configure output throttle delays in milliseconds.
    ///
    /// Applied around every synthesized key, never to passed-through events.
    pub fn with_throttle_delays(mut self, key_pre_delay_ms: u64, key_post_delay_ms: u64) -> Self {
        self.key_pre_delay_ms = key_pre_delay_ms;
        self.key_post_delay_ms = key_post_delay_ms;
        self
    }

    /// Re-emit a physical key event unchanged
    pub fn forward(&self, code: u16, action: Action) -> Result<(), UInputError> {
        self.inner.lock().write_code(code, action)
    }

    /// Send a synthesized key with the configured delays
    pub fn send_key_action(&self, key: VirtualKey, action: Action) -> Result<(), UInputError> {
        let code = vk_to_evdev(key).ok_or(UInputError::Unmapped(key))?;
        if self.key_pre_delay_ms > 0 {
            thread::sleep(Duration::from_millis(self.key_pre_delay_ms));
        }
        self.inner.lock().write_code(code, action)?;
        if self.key_post_delay_ms > 0 {
            thread::sleep(Duration::from_millis(self.key_post_delay_ms));
        }
        Ok(())
    }

    /// Press or release a mouse button
    pub fn send_button(&self, button: MouseButton, action: Action) -> Result<(), UInputError> {
        let mut inner = self.inner.lock();
        inner.write(&[
            InputEvent::new(EventType::KEY, mouse_button_code(button), i32::from(action)),
            InputEvent::new(EventType::SYNCHRONIZATION, 0, 0),
        ])?;
        inner.buttons[button.slot()] = action.is_down();
        Ok(())
    }

    /// Move the pointer by a relative amount
    pub fn send_motion(&self, dx: i16, dy: i16) -> Result<(), UInputError> {
        self.inner.lock().write(&[
            InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_X.0, i32::from(dx)),
            InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_Y.0, i32::from(dy)),
            InputEvent::new(EventType::SYNCHRONIZATION, 0, 0),
        ])
    }

    /// Release all pressed keys and buttons (for shutdown/eject)
    pub fn release_all(&self) -> Result<(), UInputError> {
        let mut inner = self.inner.lock();

        for button in MouseButton::iter() {
            if inner.buttons[button.slot()] {
                inner.write(&[
                    InputEvent::new(EventType::KEY, mouse_button_code(button), 0),
                    InputEvent::new(EventType::SYNCHRONIZATION, 0, 0),
                ])?;
                inner.buttons[button.slot()] = false;
            }
        }

        // Regular keys first, then modifiers
        let (modifiers, keys): (Vec<_>, Vec<_>) = inner
            .pressed
            .get_all()
            .into_iter()
            .partition(|key| ModifierFlags::for_key(*key).is_some());
        for key in keys.into_iter().chain(modifiers) {
            if let Some(code) = vk_to_evdev(key) {
                inner.write_code(code, Action::Release)?;
            }
        }
        inner.pressed.clear();
        Ok(())
    }

    /// Release the held keys for `modifiers`, whichever side they are on
    pub fn release_modifier_keys(&self, modifiers: ModifierFlags) -> Result<(), UInputError> {
        let held = self.inner.lock().pressed.held_for(modifiers);
        for key in held {
            self.send_key_action(key, Action::Release)?;
        }
        Ok(())
    }

    pub fn is_key_pressed(&self, key: VirtualKey) -> bool {
        self.inner.lock().pressed.is_pressed(key)
    }

    pub fn pressed_key_count(&self) -> usize {
        self.inner.lock().pressed.len()
    }
}

impl InputInjector for UinputOutput {
    fn inject_key(&self, key: VirtualKey, action: Action) {
        if let Err(e) = self.send_key_action(key, action) {
            log::debug!("inject {} {}: {}", key, action, e);
        }
    }

    fn inject_mouse_button(&self, button: MouseButton, action: Action) {
        if let Err(e) = self.send_button(button, action) {
            log::debug!("inject {:?} {}: {}", button, action, e);
        }
    }

    fn inject_mouse_motion(&self, dx: i16, dy: i16) {
        if let Err(e) = self.send_motion(dx, dy) {
            log::debug!("inject motion ({}, {}): {}", dx, dy, e);
        }
    }

    fn release_modifiers(&self, modifiers: ModifierFlags) {
        if let Err(e) = self.release_modifier_keys(modifiers) {
            log::debug!("release {}: {}", modifiers, e);
        }
    }
}

impl ModifierSource for UinputOutput {
    fn modifiers(&self) -> ModifierFlags {
        self.inner.lock().pressed.modifiers()
    }
}

impl Drop for UinputOutput {
    fn drop(&mut self) {
        if let Err(e) = self.release_all() {
            log::debug!("release on close: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_name_is_filtered() {
        assert!(crate::input::is_virtual_device(&UinputOutput::device_name()));
    }

    #[test]
    fn test_virtual_device_creation() {
        // Needs write access to /dev/uinput; skipped otherwise
        match UinputOutput::new() {
            Ok(output) => {
                assert_eq!(output.pressed_key_count(), 0);
                assert_eq!(output.modifiers(), ModifierFlags::empty());
            }
            Err(UInputError::DeviceCreation(e)) => {
                println!("Skipping test: {}", e);
            }
            Err(e) => panic!("Unexpected error: {}", e),
        }
    }
}
