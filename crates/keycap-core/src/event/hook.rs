// Keycap evdev Hook
// KeyHook provider: grabs keyboards and runs the handler on a loop thread

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use evdev::EventType;
use parking_lot::Mutex;

use super::r#loop::EventLoop;
use crate::input::{evdev_to_vk, HookDecision, HookError, HookId, KeyHandler, KeyHook, RawKeyEvent};
use crate::output::UinputOutput;
use crate::{Action, VirtualKey};

const POLL_TIMEOUT_MS: i32 = 100;

struct Running {
    id: HookId,
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// System-wide keyboard hook on Linux.
///
/// Physical keyboards are grabbed exclusively; every event the handler
/// passes is re-emitted through the shared [`UinputOutput`].
pub struct EvdevHook {
    output: Arc<UinputOutput>,
    devices: Vec<String>,
    eject_key: Option<VirtualKey>,
    running: Mutex<Option<Running>>,
    next_id: AtomicU64,
}

impl EvdevHook {
    pub fn new(output: Arc<UinputOutput>) -> Self {
        Self {
            output,
            devices: Vec::new(),
            eject_key: None,
            running: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Only grab these device names or paths
    pub fn with_devices(mut self, devices: Vec<String>) -> Self {
        self.devices = devices;
        self
    }

    /// A key that ungrabs every keyboard when pressed
    pub fn with_eject_key(mut self, key: Option<VirtualKey>) -> Self {
        self.eject_key = key;
        self
    }
}

impl KeyHook for EvdevHook {
    fn install(&self, handler: KeyHandler) -> Result<HookId, HookError> {
        let mut slot = self.running.lock();
        if slot.is_some() {
            return Err(HookError::AlreadyInstalled);
        }

        let event_loop = EventLoop::new_with_grab(&self.devices)
            .map_err(|e| HookError::Install(e.to_string()))?;
        log::info!("Grabbed keyboards: {}", event_loop.device_names().join(", "));

        let stop = Arc::new(AtomicBool::new(false));
        let thread = thread::Builder::new().name("keycap-hook".to_string()).spawn({
            let stop = Arc::clone(&stop);
            let output = Arc::clone(&self.output);
            let eject_key = self.eject_key;
            move || run_loop(event_loop, handler, output, eject_key, stop)
        })?;

        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        *slot = Some(Running { id, stop, thread });
        Ok(id)
    }

    fn is_active(&self, id: HookId) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|running| running.id == id && !running.stop.load(Ordering::Acquire))
    }

    fn uninstall(&self, id: HookId) {
        let running = {
            let mut slot = self.running.lock();
            match slot.as_ref() {
                Some(running) if running.id == id => slot.take(),
                _ => None,
            }
        };
        if let Some(running) = running {
            running.stop.store(true, Ordering::Release);
            if running.thread.join().is_err() {
                log::warn!("Keyboard hook thread panicked");
            }
        }
    }
}

impl Drop for EvdevHook {
    fn drop(&mut self) {
        let id = self.running.lock().as_ref().map(|running| running.id);
        if let Some(id) = id {
            self.uninstall(id);
        }
    }
}

fn run_loop(
    mut event_loop: EventLoop,
    handler: KeyHandler,
    output: Arc<UinputOutput>,
    eject_key: Option<VirtualKey>,
    stop: Arc<AtomicBool>,
) {
    while !stop.load(Ordering::Acquire) {
        let events = match event_loop.poll_for_events(POLL_TIMEOUT_MS) {
            Ok(events) => events,
            Err(e) => {
                log::error!("Keyboard hook stopped: {}", e);
                stop.store(true, Ordering::Release);
                break;
            }
        };

        for event in events {
            if event.event_type() != EventType::KEY {
                continue;
            }
            let code = event.code();
            let Ok(action) = Action::try_from(event.value()) else {
                continue;
            };

            let decision = match evdev_to_vk(code) {
                Some(key) if eject_key == Some(key) && action == Action::Press => {
                    log::info!("Emergency eject key pressed, releasing keyboards");
                    if let Err(e) = output.release_all() {
                        log::debug!("release on eject: {}", e);
                    }
                    stop.store(true, Ordering::Release);
                    return;
                }
                Some(key) => handler(&RawKeyEvent::physical(key, action)),
                None => HookDecision::Pass,
            };

            if decision == HookDecision::Pass {
                if let Err(e) = output.forward(code, action) {
                    log::debug!("forward {} {}: {}", code, action, e);
                }
            }
        }
    }
}
