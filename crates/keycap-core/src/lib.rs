// Keycap Core Library
// Key-translation engine: binary config codec, dispatch index, matcher, synthesizer

pub mod action;
pub mod config;
pub mod input;
pub mod key;
pub mod modifier;
pub mod output;
pub mod record;
pub mod state;
pub mod transform;

#[cfg(feature = "pure-rust")]
pub mod settings;

#[cfg(feature = "pure-rust")]
pub mod event;

pub use action::Action;
pub use config::{decode, decode_slice, encode, encode_record, DecodeError};
pub use input::{
    Backend, HookDecision, HookError, HookId, InputInjector, KeyHandler, KeyHook, ModifierSource,
    RawKeyEvent,
};
pub use key::{key_from_name, key_name, KeyParseError, VirtualKey};
pub use modifier::ModifierFlags;
pub use output::{Dispatcher, SynthesisMode, Synthesizer};
pub use record::{
    KeyOutput, MouseButton, MouseOutput, OutputAction, RecordId, RecordSet, Stroke,
    TranslationRecord, TriggerChord,
};
pub use state::ToggleStore;
pub use transform::{
    match_event, ActiveConfig, DispatchIndex, Engine, EngineOptions, LoadError, MatchOptions,
    MatchOutcome, StatusCode,
};

#[cfg(feature = "pure-rust")]
pub use settings::{Settings, SettingsError};

#[cfg(feature = "pure-rust")]
pub use event::{EvdevHook, EventLoop, EventLoopError, EventLoopResult};

#[cfg(feature = "pure-rust")]
pub use output::{UInputError, UinputOutput};
