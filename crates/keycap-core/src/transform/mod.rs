// Keycap Transform Module
// Dispatch index, event matching and the engine that ties them to a hook

pub mod engine;
pub mod index;
pub mod matcher;

pub use engine::{ActiveConfig, Engine, EngineOptions, LoadError, StatusCode};
pub use index::{DispatchIndex, IndexEntry, BUCKET_COUNT};
pub use matcher::{match_event, MatchOptions, MatchOutcome};
