mod config;
pub mod kv;
pub mod settings;

pub use config::{Config, DefaultsConfig, TimingConfig, VoiceBackend, VoiceConfig};
pub use kv::KvStore;
pub use settings::{HiitSettings, SessionSettings};

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value;

/// Persisted session timing (`{rounds, roundSeconds, restSeconds}`).
pub const SETTINGS_KEY: &str = "roundbell.v1.settings";
/// Combo library (flat string array).
pub const COMBOS_KEY: &str = "roundbell.v1.combos";
/// HIIT exercise selection (flat string array).
pub const HIIT_EXERCISES_KEY: &str = "roundbell.v1.hiit";
/// HIIT timing (`{workSeconds, restSeconds}`).
pub const HIIT_SETTINGS_KEY: &str = "roundbell.v1.hiit.settings";

/// Best-effort JSON key-value persistence.
///
/// Implementations never fail towards the caller: problems are logged and
/// a load returns `None`.
pub trait SettingsStore: Send {
    fn load(&self, key: &str) -> Option<Value>;
    fn save(&mut self, key: &str, value: &Value);
}

/// Non-durable store, for tests and throwaway sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn save(&mut self, key: &str, value: &Value) {
        self.values.insert(key.to_string(), value.clone());
    }
}

impl SettingsStore for Box<dyn SettingsStore> {
    fn load(&self, key: &str) -> Option<Value> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: &Value) {
        (**self).save(key, value)
    }
}

/// Returns the roundbell data directory, creating it if needed.
///
/// `ROUNDBELL_DATA_DIR` wins when set. Otherwise `~/.config/roundbell`, or
/// `~/.config/roundbell-dev` with `ROUNDBELL_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("ROUNDBELL_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("ROUNDBELL_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("roundbell-dev")
            } else {
                base_dir.join("roundbell")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
