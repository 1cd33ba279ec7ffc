// Keycap Action Synthesizer
// Turns one matched record into injected key, mouse and delay actions

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::input::InputInjector;
use crate::record::{KeyOutput, MouseOutput, OutputAction, Stroke, TranslationRecord};
use crate::state::ToggleStore;
use crate::{Action, ModifierFlags};

/// Pause used for `Delay` outputs
pub type SleepFn = Arc<dyn Fn(Duration) + Send + Sync>;

/// Runs record outputs against an injector.
///
/// Cheap to clone; every synthesis job carries its own copy.
#[derive(Clone)]
pub struct Synthesizer {
    injector: Arc<dyn InputInjector>,
    sleep: SleepFn,
}

impl fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synthesizer").finish_non_exhaustive()
    }
}

/// Which edges a resolved stroke produces: (press, release)
fn edges(stroke: Stroke) -> (bool, bool) {
    match stroke {
        Stroke::Tap => (true, true),
        Stroke::Down => (true, false),
        Stroke::Up => (false, true),
        // Resolved before we get here; treat a stray one as a press
        Stroke::Toggle => (true, false),
    }
}

impl Synthesizer {
    pub fn new(injector: Arc<dyn InputInjector>) -> Self {
        Self {
            injector,
            sleep: Arc::new(thread::sleep),
        }
    }

    /// Replace the function used for `Delay` outputs
    pub fn with_sleep(mut self, sleep: SleepFn) -> Self {
        self.sleep = sleep;
        self
    }

    /// Execute one activation of `record`.
    ///
    /// A record whose first output is `Nothing` injects nothing. Otherwise the
    /// trigger's modifiers are released first so they do not leak into the
    /// synthesized keys, the record's toggle (if it has one) is flipped once,
    /// and the outputs run in file order.
    pub fn run(&self, record: &TranslationRecord, toggles: &ToggleStore) {
        if record.is_noop() {
            log::trace!("record #{} is a no-op", record.id.0);
            return;
        }

        self.injector.release_modifiers(record.trigger.modifiers);

        let was_toggled = record.owns_toggle() && toggles.flip(record.id);
        log::debug!("running {} (toggled before: {})", record, was_toggled);

        for output in &record.outputs {
            match output {
                OutputAction::Key(key) => self.key(key, key.stroke.resolve(was_toggled), toggles),
                OutputAction::Mouse(mouse) => {
                    self.mouse(mouse, mouse.stroke.resolve(was_toggled), toggles)
                }
                OutputAction::Delay { seconds } => {
                    (self.sleep)(Duration::from_secs(u64::from(*seconds)))
                }
                OutputAction::Nothing => {}
            }
        }
    }

    /// Release every key and mouse button `toggles` still shows held
    pub fn release_held(&self, toggles: &ToggleStore) {
        let (modifiers, keys): (Vec<_>, Vec<_>) = toggles
            .held_keys()
            .into_iter()
            .partition(|key| ModifierFlags::for_key(*key).is_some());

        for button in toggles.held_buttons() {
            self.injector.inject_mouse_button(button, Action::Release);
            toggles.mark_mouse(button, false);
        }
        for key in keys.into_iter().chain(modifiers) {
            self.injector.inject_key(key, Action::Release);
            toggles.mark_key(key, false);
        }
    }

    fn key(&self, output: &KeyOutput, stroke: Stroke, toggles: &ToggleStore) {
        let (press, release) = edges(stroke);
        if press {
            self.press_modifiers(output.modifiers, toggles);
            self.injector.inject_key(output.key, Action::Press);
            toggles.mark_key(output.key, true);
        }
        if release {
            self.injector.inject_key(output.key, Action::Release);
            toggles.mark_key(output.key, false);
            self.release_modifiers(output.modifiers, toggles);
        }
    }

    fn mouse(&self, output: &MouseOutput, stroke: Stroke, toggles: &ToggleStore) {
        let (press, release) = edges(stroke);
        if press {
            self.press_modifiers(output.modifiers, toggles);
        }
        if output.has_motion() {
            self.injector.inject_mouse_motion(output.dx, output.dy);
        }
        if let Some(button) = output.button {
            if press {
                self.injector.inject_mouse_button(button, Action::Press);
                toggles.mark_mouse(button, true);
            }
            if release {
                self.injector.inject_mouse_button(button, Action::Release);
                toggles.mark_mouse(button, false);
            }
        }
        if release {
            self.release_modifiers(output.modifiers, toggles);
        }
    }

    fn press_modifiers(&self, modifiers: ModifierFlags, toggles: &ToggleStore) {
        for key in modifiers.press_keys() {
            self.injector.inject_key(key, Action::Press);
            toggles.mark_key(key, true);
        }
    }

    fn release_modifiers(&self, modifiers: ModifierFlags, toggles: &ToggleStore) {
        for key in modifiers.release_keys() {
            self.injector.inject_key(key, Action::Release);
            toggles.mark_key(key, false);
        }
    }
}
