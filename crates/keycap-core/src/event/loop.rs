// Keycap Event Loop
// Grabbed evdev keyboards polled with libc::poll

use std::os::unix::io::AsRawFd;

use evdev::{Device, EventType, InputEvent};

use crate::input::{is_virtual_device, looks_like_keyboard, matches_device_filter};

/// Result type for event loop operations
pub type EventLoopResult<T> = Result<T, EventLoopError>;

/// Errors that can occur in event loop
#[derive(Debug, thiserror::Error)]
pub enum EventLoopError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Device information for listing devices
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub path: Option<String>,
}

/// Direct access to the grabbed keyboards.
///
/// Devices are ungrabbed on drop, including during unwinding, so a crashed
/// hook thread never leaves the keyboard dead.
pub struct EventLoop {
    devices: Vec<Device>,
    poll_fds: Vec<libc::pollfd>,
    grabbed: bool,
}

impl EventLoop {
    /// Open and grab the keyboards matching `filter_names`
    /// (empty = every physical keyboard).
    pub fn new_with_grab(filter_names: &[String]) -> EventLoopResult<Self> {
        let mut devices = Self::find_keyboards(filter_names)?;

        // A previous instance that crashed may still hold the grab
        for device in &mut devices {
            let _ = device.ungrab();
        }

        let mut event_loop = Self {
            poll_fds: Vec::new(),
            devices: Vec::new(),
            grabbed: true,
        };
        for mut device in devices {
            device.grab()?;
            event_loop.devices.push(device);
        }
        event_loop.poll_fds = Self::create_poll_fds(&event_loop.devices);
        Ok(event_loop)
    }

    fn create_poll_fds(devices: &[Device]) -> Vec<libc::pollfd> {
        devices
            .iter()
            .map(|d| libc::pollfd {
                fd: d.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            })
            .collect()
    }

    /// Ungrab all devices
    pub fn ungrab_all(&mut self) {
        if self.grabbed {
            for device in &mut self.devices {
                let _ = device.ungrab();
            }
            self.grabbed = false;
        }
    }

    /// List all available keyboard devices (for --list-devices)
    pub fn list_devices() -> EventLoopResult<Vec<DeviceInfo>> {
        let devices_info: Vec<DeviceInfo> = evdev::enumerate()
            .filter(|(_, device)| Self::is_keyboard_device(device))
            .enumerate()
            .map(|(index, (path, device))| DeviceInfo {
                index,
                name: device.name().unwrap_or("Unknown").to_string(),
                path: path.to_str().map(|s| s.to_string()),
            })
            .collect();

        if devices_info.is_empty() {
            return Err(EventLoopError::DeviceNotFound(
                "No keyboard devices found".to_string(),
            ));
        }
        Ok(devices_info)
    }

    fn find_keyboards(filter_names: &[String]) -> EventLoopResult<Vec<Device>> {
        let keyboards: Vec<Device> = evdev::enumerate()
            .filter(|(path, device)| {
                let device_name = device.name().unwrap_or("Unknown");
                matches_device_filter(
                    device_name,
                    path.to_str().unwrap_or_default(),
                    filter_names,
                    Self::is_keyboard_device(device),
                    is_virtual_device(device_name),
                )
            })
            .map(|(_, device)| device)
            .collect();

        if keyboards.is_empty() {
            return Err(EventLoopError::DeviceNotFound(
                "No keyboard devices found".to_string(),
            ));
        }
        Ok(keyboards)
    }

    fn is_keyboard_device(device: &Device) -> bool {
        if !device.supported_events().contains(EventType::KEY) {
            return false;
        }
        // Our own output device must never be grabbed
        if is_virtual_device(device.name().unwrap_or("")) {
            return false;
        }
        match device.supported_keys() {
            Some(keys) => looks_like_keyboard(|code| keys.contains(evdev::Key::new(code))),
            None => false,
        }
    }

    /// Wait up to `timeout_ms` for events from any device.
    ///
    /// Returns an empty vector on timeout or EINTR; errors only on fatal I/O
    /// failures.
    pub fn poll_for_events(&mut self, timeout_ms: i32) -> EventLoopResult<Vec<InputEvent>> {
        let mut events = Vec::new();

        let poll_result = unsafe {
            libc::poll(
                self.poll_fds.as_mut_ptr(),
                self.poll_fds.len() as libc::nfds_t,
                timeout_ms,
            )
        };

        if poll_result < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                return Ok(events);
            }
            return Err(EventLoopError::Io(err));
        }
        if poll_result == 0 {
            return Ok(events);
        }

        for (i, device) in self.devices.iter_mut().enumerate() {
            if self.poll_fds[i].revents & libc::POLLIN != 0 {
                if let Ok(device_events) = device.fetch_events() {
                    events.extend(device_events);
                }
            }
        }
        Ok(events)
    }

    pub fn device_names(&self) -> Vec<String> {
        self.devices
            .iter()
            .map(|d| d.name().unwrap_or("Unknown").to_string())
            .collect()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.ungrab_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices() {
        match EventLoop::list_devices() {
            Ok(devices) => {
                for device in &devices {
                    assert!(!is_virtual_device(&device.name));
                }
            }
            Err(EventLoopError::DeviceNotFound(_)) => {
                println!("Skipping test: no keyboard devices found");
            }
            Err(e) => panic!("Unexpected error: {}", e),
        }
    }

    #[test]
    fn test_unknown_filter_finds_nothing() {
        let filter = vec!["/dev/input/does-not-exist".to_string()];
        assert!(matches!(
            EventLoop::new_with_grab(&filter),
            Err(EventLoopError::DeviceNotFound(_))
        ));
    }
}
