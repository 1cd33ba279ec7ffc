// Keycap Translation Engine
// Owns the loaded configuration and the hook, and answers every hooked key event

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use strum_macros::{Display, IntoStaticStr};

use crate::config::{decode, DecodeError};
use crate::input::{
    Backend, HookDecision, HookError, HookId, KeyHandler, KeyHook, ModifierSource, RawKeyEvent,
};
use crate::output::{Dispatcher, SynthesisMode, Synthesizer};
use crate::record::RecordSet;
use crate::state::ToggleStore;
use crate::transform::index::DispatchIndex;
use crate::transform::matcher::{match_event, MatchOptions, MatchOutcome};

/// Result of [`Engine::load`], also the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[repr(i32)]
pub enum StatusCode {
    Success = 0,
    CreationFailure = 1,
    InputMissing = 2,
    InputEmpty = 3,
    InputInvalid = 4,
}

impl StatusCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }
}

/// Why a load was rejected
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Translation file not found: {path}")]
    Missing { path: PathBuf, source: io::Error },

    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Translation file is empty: {0}")]
    Empty(PathBuf),

    #[error("Invalid translation file: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to install keyboard hook: {0}")]
    Hook(#[from] HookError),
}

impl LoadError {
    pub fn status(&self) -> StatusCode {
        match self {
            LoadError::Missing { .. } => StatusCode::InputMissing,
            LoadError::Read { .. } => StatusCode::InputInvalid,
            LoadError::Empty(_) | LoadError::Decode(DecodeError::EmptyInput) => {
                StatusCode::InputEmpty
            }
            LoadError::Decode(_) => StatusCode::InputInvalid,
            LoadError::Hook(_) => StatusCode::CreationFailure,
        }
    }
}

/// Everything one successful load produced
#[derive(Debug)]
pub struct ActiveConfig {
    pub records: RecordSet,
    pub index: DispatchIndex,
    pub toggles: ToggleStore,
}

impl ActiveConfig {
    pub fn new(records: RecordSet) -> Self {
        let index = DispatchIndex::build(&records);
        let toggles = ToggleStore::new(records.len());
        Self {
            records,
            index,
            toggles,
        }
    }
}

/// Engine switches, usually read from settings.toml
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub dispatch_on_repeat: bool,
    pub synthesis: SynthesisMode,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            dispatch_on_repeat: MatchOptions::default().dispatch_on_repeat,
            synthesis: SynthesisMode::default(),
        }
    }
}

/// State the hook callback needs; shared with the installed handler
struct Shared {
    active: ArcSwapOption<ActiveConfig>,
    modifiers: Arc<dyn ModifierSource>,
    synthesizer: Synthesizer,
    dispatcher: Dispatcher,
    options: MatchOptions,
}

impl Shared {
    fn handle(&self, event: &RawKeyEvent) -> HookDecision {
        let Some(config) = self.active.load_full() else {
            return HookDecision::Pass;
        };

        let modifiers = self.modifiers.modifiers();
        match match_event(&config.index, &config.toggles, event, modifiers, self.options) {
            MatchOutcome::PassThrough => HookDecision::Pass,
            MatchOutcome::Swallow => HookDecision::Block,
            MatchOutcome::Dispatch(id) => {
                log::debug!("{} with {} dispatches record #{}", event.key, modifiers, id.0);
                let synthesizer = self.synthesizer.clone();
                self.dispatcher.submit(Box::new(move || {
                    if let Some(record) = config.records.get(id) {
                        synthesizer.run(record, &config.toggles);
                    }
                }));
                HookDecision::Block
            }
        }
    }

    /// Swap in a new configuration and release what the old one left held
    fn publish(&self, config: Option<Arc<ActiveConfig>>) -> bool {
        match self.active.swap(config) {
            Some(previous) => {
                self.synthesizer.release_held(&previous.toggles);
                true
            }
            None => false,
        }
    }
}

/// The key-translation engine.
///
/// One `Engine` owns at most one loaded configuration and at most one
/// installed hook. Loading again replaces the configuration atomically and
/// keeps the hook; events already being synthesized finish against the
/// configuration they matched.
pub struct Engine {
    shared: Arc<Shared>,
    hook: Arc<dyn KeyHook>,
    hook_id: Mutex<Option<HookId>>,
}

impl Engine {
    pub fn new(backend: Backend, options: EngineOptions) -> Self {
        let Backend {
            hook,
            injector,
            modifiers,
        } = backend;
        Self::with_synthesizer(hook, modifiers, Synthesizer::new(injector), options)
    }

    /// Build an engine around a preconfigured synthesizer
    pub fn with_synthesizer(
        hook: Arc<dyn KeyHook>,
        modifiers: Arc<dyn ModifierSource>,
        synthesizer: Synthesizer,
        options: EngineOptions,
    ) -> Self {
        let shared = Shared {
            active: ArcSwapOption::empty(),
            modifiers,
            synthesizer,
            dispatcher: Dispatcher::new(options.synthesis),
            options: MatchOptions {
                dispatch_on_repeat: options.dispatch_on_repeat,
            },
        };
        Self {
            shared: Arc::new(shared),
            hook,
            hook_id: Mutex::new(None),
        }
    }

    /// Load a translation file and start intercepting keys.
    ///
    /// Any failure leaves the engine fully shut down.
    pub fn load(&self, path: impl AsRef<Path>) -> StatusCode {
        let path = path.as_ref();
        match self.try_load(path) {
            Ok(count) => {
                log::info!("Loaded {} translation records from {}", count, path.display());
                StatusCode::Success
            }
            Err(e) => {
                log::warn!("{}", e);
                self.shutdown();
                e.status()
            }
        }
    }

    fn try_load(&self, path: &Path) -> Result<usize, LoadError> {
        let bytes = fs::read(path).map_err(|source| {
            let path = path.to_path_buf();
            if source.kind() == io::ErrorKind::NotFound {
                LoadError::Missing { path, source }
            } else {
                LoadError::Read { path, source }
            }
        })?;
        if bytes.is_empty() {
            return Err(LoadError::Empty(path.to_path_buf()));
        }

        let config = Arc::new(ActiveConfig::new(decode(bytes)?));
        let count = config.records.len();
        if self.shared.publish(Some(config)) {
            log::debug!("replaced previous configuration");
        }

        self.ensure_hooked()?;
        Ok(count)
    }

    fn ensure_hooked(&self) -> Result<(), HookError> {
        let mut slot = self.hook_id.lock();
        if let Some(id) = *slot {
            if !self.hook.is_active(id) {
                log::debug!("replacing stopped keyboard hook {:?}", id);
                self.hook.uninstall(id);
                *slot = None;
            }
        }
        if slot.is_none() {
            let shared = Arc::clone(&self.shared);
            let handler: KeyHandler = Arc::new(move |event| shared.handle(event));
            let id = self.hook.install(handler)?;
            log::debug!("installed keyboard hook {:?}", id);
            *slot = Some(id);
        }
        Ok(())
    }

    /// Stop intercepting and drop the loaded configuration.
    ///
    /// Safe to call at any time, any number of times.
    pub fn shutdown(&self) {
        let id = self.hook_id.lock().take();
        if let Some(id) = id {
            self.hook.uninstall(id);
            log::debug!("removed keyboard hook {:?}", id);
        }
        if self.shared.publish(None) {
            log::info!("Translation engine shut down");
        }
    }

    /// Hook callback body: decide the fate of one key event
    pub fn handle(&self, event: &RawKeyEvent) -> HookDecision {
        self.shared.handle(event)
    }

    pub fn is_loaded(&self) -> bool {
        self.shared.active.load().is_some()
    }

    /// Whether the installed hook is still intercepting events
    pub fn is_hooked(&self) -> bool {
        let id = *self.hook_id.lock();
        id.is_some_and(|id| self.hook.is_active(id))
    }

    /// Shut down if the hook stopped on its own since it was installed.
    ///
    /// Returns true when that happened and the engine is now unloaded.
    pub fn reap_stopped_hook(&self) -> bool {
        let id = *self.hook_id.lock();
        let stopped = id.is_some_and(|id| !self.hook.is_active(id));
        if stopped {
            log::info!("Keyboard hook stopped, unloading configuration");
            self.shutdown();
        }
        stopped
    }

    /// Number of records in the active configuration (0 when unloaded)
    pub fn active_records(&self) -> usize {
        self.shared
            .active
            .load()
            .as_ref()
            .map_or(0, |config| config.records.len())
    }

    /// The active configuration, if any
    pub fn active(&self) -> Option<Arc<ActiveConfig>> {
        self.shared.active.load_full()
    }

    pub fn synthesis_mode(&self) -> SynthesisMode {
        self.shared.dispatcher.mode()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(StatusCode::Success.code(), 0);
        assert_eq!(StatusCode::CreationFailure.code(), 1);
        assert_eq!(StatusCode::InputMissing.code(), 2);
        assert_eq!(StatusCode::InputEmpty.code(), 3);
        assert_eq!(StatusCode::InputInvalid.code(), 4);
        assert!(StatusCode::Success.is_success());
        assert!(!StatusCode::InputEmpty.is_success());
        assert_eq!(StatusCode::InputMissing.to_string(), "InputMissing");
    }

    #[test]
    fn test_load_error_status() {
        let missing = LoadError::Missing {
            path: PathBuf::from("x"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(missing.status(), StatusCode::InputMissing);

        let denied = LoadError::Read {
            path: PathBuf::from("x"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(denied.status(), StatusCode::InputInvalid);

        assert_eq!(LoadError::Empty(PathBuf::from("x")).status(), StatusCode::InputEmpty);
        assert_eq!(
            LoadError::Decode(DecodeError::EmptyInput).status(),
            StatusCode::InputEmpty
        );
        assert_eq!(
            LoadError::Decode(DecodeError::ZeroOutputCount { offset: 0 }).status(),
            StatusCode::InputInvalid
        );
        assert_eq!(
            LoadError::Hook(HookError::AlreadyInstalled).status(),
            StatusCode::CreationFailure
        );
    }

    #[test]
    fn test_active_config_builds_index_and_toggles() {
        use crate::config::encode_record;
        use crate::record::{OutputAction, TriggerChord};
        use crate::{ModifierFlags, VirtualKey};

        let mut bytes = Vec::new();
        for code in [0x41, 0x42, 0x41] {
            encode_record(
                &mut bytes,
                TriggerChord::new(VirtualKey(code), ModifierFlags::empty()),
                &[OutputAction::Nothing],
            );
        }
        let config = ActiveConfig::new(decode(bytes).unwrap());
        assert_eq!(config.records.len(), 3);
        assert_eq!(config.index.len(), 3);
        assert_eq!(config.toggles.len(), 3);
    }
}
