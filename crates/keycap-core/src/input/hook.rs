// Keycap Input Capabilities
// Traits the engine consumes: hook installation, injection, modifier state

use std::fmt;
use std::sync::Arc;

use crate::record::MouseButton;
use crate::{Action, ModifierFlags, VirtualKey};

/// A key event delivered by the system hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub key: VirtualKey,
    pub action: Action,
    /// Set by the backend for events it knows were synthesized
    pub injected: bool,
}

impl RawKeyEvent {
    /// An event from real hardware
    pub fn physical(key: VirtualKey, action: Action) -> Self {
        Self {
            key,
            action,
            injected: false,
        }
    }

    /// An event produced by this or another synthesizer
    pub fn injected(key: VirtualKey, action: Action) -> Self {
        Self {
            key,
            action,
            injected: true,
        }
    }
}

impl fmt::Display for RawKeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key, self.action)?;
        if self.injected {
            f.write_str(" (injected)")?;
        }
        Ok(())
    }
}

/// What the hook should do with the event it just reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    /// Deliver the event to the rest of the system unchanged
    Pass,
    /// Withhold the event
    Block,
}

/// Callback run by the hook for every key event.
///
/// Runs inline on the thread that gates keyboard delivery, so it must
/// return quickly and never block.
pub type KeyHandler = Arc<dyn Fn(&RawKeyEvent) -> HookDecision + Send + Sync>;

/// Handle for an installed hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(pub u64);

/// Errors raised while installing a hook
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("A hook is already installed")]
    AlreadyInstalled,

    #[error("Failed to install hook: {0}")]
    Install(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// System-wide low-level keyboard hook
pub trait KeyHook: Send + Sync {
    fn install(&self, handler: KeyHandler) -> Result<HookId, HookError>;

    /// Remove a hook; unknown ids are ignored
    fn uninstall(&self, id: HookId);

    /// Whether hook `id` still intercepts events. A hook can stop on its own
    /// (an emergency eject), in which case it still needs `uninstall`.
    fn is_active(&self, id: HookId) -> bool {
        let _ = id;
        true
    }
}

/// Synthetic input.
///
/// Best effort: implementations log failures and never report them.
pub trait InputInjector: Send + Sync {
    fn inject_key(&self, key: VirtualKey, action: Action);

    fn inject_mouse_button(&self, button: MouseButton, action: Action);

    fn inject_mouse_motion(&self, dx: i16, dy: i16);

    /// Release every key currently driving one of `modifiers`.
    ///
    /// The default releases the generic modifier keys. Backends that track
    /// sided keys release whichever side is actually down.
    fn release_modifiers(&self, modifiers: ModifierFlags) {
        for key in modifiers.release_keys() {
            self.inject_key(key, Action::Release);
        }
    }
}

/// Live Alt/Control/Shift state as the system currently sees it
pub trait ModifierSource: Send + Sync {
    fn modifiers(&self) -> ModifierFlags;
}

/// The three capabilities an [`Engine`](crate::Engine) runs against
#[derive(Clone)]
pub struct Backend {
    pub hook: Arc<dyn KeyHook>,
    pub injector: Arc<dyn InputInjector>,
    pub modifiers: Arc<dyn ModifierSource>,
}

impl Backend {
    pub fn new(
        hook: Arc<dyn KeyHook>,
        injector: Arc<dyn InputInjector>,
        modifiers: Arc<dyn ModifierSource>,
    ) -> Self {
        Self {
            hook,
            injector,
            modifiers,
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}
