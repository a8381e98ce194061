//! Read-only cue data and the editable combo library.
//!
//! Combos are sequences of strike numbers 1-6 joined by hyphens
//! (1 jab, 2 cross, 3 lead hook, 4 rear hook, 5 lead uppercut,
//! 6 rear uppercut).

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Built-in combo list, used when nothing valid is persisted.
pub const DEFAULT_COMBOS: &[&str] = &[
    "1-2",
    "1-1-2",
    "1-2-3",
    "1-2-3-2",
    "1-2-5-2",
    "1-6-3-2",
    "2-3-2",
    "3-2-3",
    "1-1-2-3",
    "1-2-3-4",
    "5-6",
    "5-2-3",
    "6-3-2",
    "1-2-1-2",
    "4-3-2",
];

/// Exercises grouped by category, in display order.
pub const HIIT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Upper Body",
        &["Push-ups", "Pull-ups", "Dips", "Pike Push-ups"],
    ),
    (
        "Lower Body",
        &["Jump Squats", "Lunges", "Single Leg Glute Bridge", "Calf Raises"],
    ),
    (
        "Core",
        &["Plank", "Russian Twists", "Mountain Climbers", "Dead Bug"],
    ),
    (
        "Cardio / Conditioning",
        &["Burpees", "High Knees", "Jumping Jacks", "Sprint"],
    ),
    (
        "Full Body",
        &["Bear Crawls", "Box Jumps", "Thrusters", "Turkish Get-ups"],
    ),
];

/// Exercise selection used when nothing valid is persisted.
pub const DEFAULT_EXERCISES: &[&str] = &["Burpees", "Push-ups", "Jump Squats"];

pub fn default_combos() -> Vec<String> {
    DEFAULT_COMBOS.iter().map(|c| c.to_string()).collect()
}

pub fn default_exercises() -> Vec<String> {
    DEFAULT_EXERCISES.iter().map(|e| e.to_string()).collect()
}

/// Every exercise in the catalog, flattened in display order.
pub fn all_exercises() -> impl Iterator<Item = &'static str> {
    HIIT_CATEGORIES
        .iter()
        .flat_map(|(_, exercises)| exercises.iter().copied())
}

/// Case-insensitive catalog lookup returning the canonical spelling.
pub fn find_exercise(name: &str) -> Option<&'static str> {
    let wanted = name.trim();
    all_exercises().find(|e| e.eq_ignore_ascii_case(wanted))
}

/// Validate free-text combo input and normalize it to hyphenated form.
///
/// Accepts digits 1-6 separated by spaces and/or hyphens: `"1 2 3"` and
/// `"1--2-3 "` both become `"1-2-3"`.
pub fn normalize_combo(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let allowed = |c: char| matches!(c, '1'..='6' | '-') || c.is_whitespace();
    if trimmed.is_empty() || !trimmed.chars().all(allowed) {
        return Err(ValidationError::InvalidCombo);
    }

    let normalized = trimmed
        .split(|c: char| c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if normalized.is_empty() {
        return Err(ValidationError::InvalidCombo);
    }
    Ok(normalized)
}

/// Turn a combo into something a speech engine reads as separate numbers.
pub fn speakable_combo(combo: &str) -> String {
    combo.replace('-', " ")
}

/// User-editable list of combos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComboLibrary {
    combos: Vec<String>,
}

impl ComboLibrary {
    pub fn new(combos: Vec<String>) -> Self {
        Self { combos }
    }

    pub fn combos(&self) -> &[String] {
        &self.combos
    }

    pub fn len(&self) -> usize {
        self.combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }

    pub fn contains(&self, combo: &str) -> bool {
        self.combos.iter().any(|c| c == combo)
    }

    /// Validate, normalize and append. Returns the stored form.
    ///
    /// # Errors
    ///
    /// `InvalidCombo` for anything but strike numbers, `DuplicateCombo` if
    /// the normalized combo is already present. The library is unchanged on
    /// error.
    pub fn add(&mut self, raw: &str) -> Result<String, ValidationError> {
        let combo = normalize_combo(raw)?;
        if self.contains(&combo) {
            return Err(ValidationError::DuplicateCombo);
        }
        self.combos.push(combo.clone());
        Ok(combo)
    }

    /// Remove by value. Input is normalized first so `"1 2"` removes `"1-2"`.
    pub fn remove(&mut self, combo: &str) -> bool {
        let key = normalize_combo(combo).unwrap_or_else(|_| combo.trim().to_string());
        let before = self.combos.len();
        self.combos.retain(|c| *c != key);
        self.combos.len() != before
    }

    pub fn remove_at(&mut self, index: usize) -> Option<String> {
        (index < self.combos.len()).then(|| self.combos.remove(index))
    }
}

impl Default for ComboLibrary {
    fn default() -> Self {
        Self::new(default_combos())
    }
}
