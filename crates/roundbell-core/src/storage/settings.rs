//! Persisted user settings.
//!
//! Loading is lenient: a missing, zero or non-numeric field falls back to
//! its default on its own, and numeric strings (`"60"`) are accepted.
//! Nothing here ever reports an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{SettingsStore, HIIT_SETTINGS_KEY, SETTINGS_KEY};
use crate::timer::{SessionConfig, WorkoutMode};

/// Round structure last applied to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    pub rounds: u32,
    pub round_seconds: u32,
    pub rest_seconds: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            rounds: 6,
            round_seconds: 180,
            rest_seconds: 60,
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            rounds: config.round_count,
            round_seconds: config.round_seconds,
            rest_seconds: config.rest_seconds,
        }
    }

    pub fn to_config(&self, mode: WorkoutMode) -> SessionConfig {
        SessionConfig::new(self.rounds, self.round_seconds, self.rest_seconds, mode)
    }

    pub fn from_value(value: Option<&Value>) -> Self {
        let d = Self::default();
        Self {
            rounds: positive_field(value, "rounds").unwrap_or(d.rounds),
            round_seconds: positive_field(value, "roundSeconds").unwrap_or(d.round_seconds),
            rest_seconds: positive_field(value, "restSeconds").unwrap_or(d.rest_seconds),
        }
    }

    pub fn load<S: SettingsStore + ?Sized>(store: &S) -> Self {
        Self::from_value(store.load(SETTINGS_KEY).as_ref())
    }

    pub fn save<S: SettingsStore + ?Sized>(&self, store: &mut S) {
        save_json(store, SETTINGS_KEY, self);
    }
}

/// HIIT work/rest timing chosen on the setup screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiitSettings {
    pub work_seconds: u32,
    pub rest_seconds: u32,
}

impl Default for HiitSettings {
    fn default() -> Self {
        Self {
            work_seconds: 30,
            rest_seconds: 15,
        }
    }
}

impl HiitSettings {
    pub fn from_value(value: Option<&Value>) -> Self {
        let d = Self::default();
        Self {
            work_seconds: positive_field(value, "workSeconds").unwrap_or(d.work_seconds),
            rest_seconds: positive_field(value, "restSeconds").unwrap_or(d.rest_seconds),
        }
    }

    pub fn load<S: SettingsStore + ?Sized>(store: &S) -> Self {
        Self::from_value(store.load(HIIT_SETTINGS_KEY).as_ref())
    }

    pub fn save<S: SettingsStore + ?Sized>(&self, store: &mut S) {
        save_json(store, HIIT_SETTINGS_KEY, self);
    }
}

/// Non-empty list of strings stored under `key`, if there is one.
pub fn load_string_list<S: SettingsStore + ?Sized>(store: &S, key: &str) -> Option<Vec<String>> {
    let items: Vec<String> = store
        .load(key)?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    (!items.is_empty()).then_some(items)
}

pub fn save_string_list<S: SettingsStore + ?Sized>(store: &mut S, key: &str, items: &[String]) {
    save_json(store, key, items);
}

fn save_json<S, T>(store: &mut S, key: &str, value: &T)
where
    S: SettingsStore + ?Sized,
    T: Serialize + ?Sized,
{
    match serde_json::to_value(value) {
        Ok(json) => store.save(key, &json),
        Err(e) => tracing::warn!(key, error = %e, "failed to serialize setting"),
    }
}

fn positive_field(value: Option<&Value>, field: &str) -> Option<u32> {
    let n = match value?.get(field)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 1.0).then(|| n.min(f64::from(u32::MAX)) as u32)
}
