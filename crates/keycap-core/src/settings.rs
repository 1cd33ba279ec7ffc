// Keycap Settings Module
// Runtime switches for the engine, the synthesizer and the Linux backend

#![cfg(feature = "pure-rust")]

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::key::key_from_name;
use crate::output::SynthesisMode;
use crate::transform::EngineOptions;
use crate::VirtualKey;

/// Settings loaded from `~/.config/keycap/settings.toml`.
///
/// Every section and field is optional; a missing file means defaults.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    engine: EngineSettings,
    synthesis: SynthesisSettings,
    output: OutputSettings,
    devices: Vec<String>,
    emergency_eject_key: Option<VirtualKey>,
    source_path: Option<PathBuf>,
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid setting value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsToml {
    #[serde(default)]
    engine: EngineSettings,
    #[serde(default)]
    synthesis: SynthesisSettings,
    #[serde(default)]
    output: OutputSettings,
    #[serde(default)]
    devices: DeviceSettings,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct EngineSettings {
    #[serde(default = "default_dispatch_on_repeat")]
    dispatch_on_repeat: bool,
}

fn default_dispatch_on_repeat() -> bool {
    true
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            dispatch_on_repeat: default_dispatch_on_repeat(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SynthesisSettings {
    /// 0 = one thread per match
    #[serde(default)]
    workers: usize,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputSettings {
    #[serde(default)]
    key_pre_delay_ms: u64,
    #[serde(default)]
    key_post_delay_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeviceSettings {
    #[serde(default)]
    only: Vec<String>,
    #[serde(default)]
    emergency_eject_key: Option<String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(&path)?;
        let mut settings = Self::from_toml(&content)?;
        settings.source_path = Some(path.as_ref().to_path_buf());
        Ok(settings)
    }

    /// Load settings from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let parsed: SettingsToml =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;

        let emergency_eject_key = parsed
            .devices
            .emergency_eject_key
            .as_deref()
            .map(|name| {
                key_from_name(name).ok_or_else(|| {
                    SettingsError::InvalidValue(format!("Unknown emergency_eject_key '{}'", name))
                })
            })
            .transpose()?;

        Ok(Self {
            engine: parsed.engine,
            synthesis: parsed.synthesis,
            output: parsed.output,
            devices: parsed.devices.only,
            emergency_eject_key,
            source_path: None,
        })
    }

    /// Get the default settings path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("keycap").join("settings.toml"))
    }

    /// Load from the default location, falling back to defaults
    pub fn load_default() -> Result<Self, SettingsError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        Ok(Self::new())
    }

    /// Load from `path` if given, else from the default location
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::load_default(),
        }
    }

    /// Options for [`Engine::new`](crate::Engine::new)
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            dispatch_on_repeat: self.engine.dispatch_on_repeat,
            synthesis: SynthesisMode::from_workers(self.synthesis.workers),
        }
    }

    pub fn key_pre_delay_ms(&self) -> u64 {
        self.output.key_pre_delay_ms
    }

    pub fn key_post_delay_ms(&self) -> u64 {
        self.output.key_post_delay_ms
    }

    /// Device names or paths to grab (empty = autodetect)
    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    pub fn emergency_eject_key(&self) -> Option<VirtualKey> {
        self.emergency_eject_key
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}

/// Create default settings content for a new installation
pub fn default_settings_content() -> &'static str {
    r#"# Keycap Settings
# Place this file at: ~/.config/keycap/settings.toml

[engine]
# Run a record again on every auto-repeat of its held trigger key
# (false swallows repeats instead)
dispatch_on_repeat = true

[synthesis]
# 0 = one thread per match, N = fixed pool of N workers
workers = 0

[output]
# Pause around every synthesized key, in milliseconds
key_pre_delay_ms = 0
key_post_delay_ms = 0

[devices]
# Device names or /dev/input paths to grab; empty = every keyboard
only = []
# Key that releases all keyboards if keycap gets stuck
# emergency_eject_key = "PAUSE"
"#
}
