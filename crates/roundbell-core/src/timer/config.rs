use serde::{Deserialize, Serialize};

/// Workout style chosen on the mode-select screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutMode {
    /// Heavy bag: random combo callouts.
    #[default]
    Bag,
    /// Shadow boxing: random combo callouts, shorter rests.
    Shadow,
    /// Circuit: one exercise name per round from the selected list.
    Hiit,
}

impl WorkoutMode {
    /// Bag and shadow draw random combos on a fixed interval.
    pub fn is_freeform(self) -> bool {
        !matches!(self, WorkoutMode::Hiit)
    }

    pub fn label(self) -> &'static str {
        match self {
            WorkoutMode::Bag => "Heavy Bag",
            WorkoutMode::Shadow => "Shadow Boxing",
            WorkoutMode::Hiit => "HIIT",
        }
    }
}

impl std::str::FromStr for WorkoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bag" => Ok(WorkoutMode::Bag),
            "shadow" => Ok(WorkoutMode::Shadow),
            "hiit" => Ok(WorkoutMode::Hiit),
            other => Err(format!("unknown workout mode: {other}")),
        }
    }
}

/// Round structure of one session.
///
/// Replaced wholesale whenever a mode is selected or a duration is edited.
/// Constructors clamp `round_count` and `round_seconds` to at least 1, and
/// deserialization goes through the same clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSessionConfig")]
pub struct SessionConfig {
    pub round_count: u32,
    pub round_seconds: u32,
    pub rest_seconds: u32,
    pub mode: WorkoutMode,
}

#[derive(Deserialize)]
struct RawSessionConfig {
    round_count: u32,
    round_seconds: u32,
    rest_seconds: u32,
    mode: WorkoutMode,
}

impl From<RawSessionConfig> for SessionConfig {
    fn from(raw: RawSessionConfig) -> Self {
        Self::new(raw.round_count, raw.round_seconds, raw.rest_seconds, raw.mode)
    }
}

impl SessionConfig {
    pub fn new(round_count: u32, round_seconds: u32, rest_seconds: u32, mode: WorkoutMode) -> Self {
        Self {
            round_count: round_count.max(1),
            round_seconds: round_seconds.max(1),
            rest_seconds,
            mode,
        }
    }

    /// 8 x 3:00 with a minute of rest.
    pub fn bag() -> Self {
        Self::new(8, 180, 60, WorkoutMode::Bag)
    }

    /// 6 x 3:00 with 30 seconds of rest.
    pub fn shadow() -> Self {
        Self::new(6, 180, 30, WorkoutMode::Shadow)
    }

    pub fn hiit(round_count: u32, work_seconds: u32, rest_seconds: u32) -> Self {
        Self::new(round_count, work_seconds, rest_seconds, WorkoutMode::Hiit)
    }

    pub fn is_last_round(&self, round_index: u32) -> bool {
        round_index >= self.round_count
    }

    /// Upper bound for `time_left` under this config.
    pub fn max_phase_seconds(&self) -> u32 {
        self.round_seconds.max(self.rest_seconds)
    }

    /// Total wall time of a full session, rests included.
    pub fn total_seconds(&self) -> u64 {
        let rounds = u64::from(self.round_count);
        rounds * u64::from(self.round_seconds) + rounds.saturating_sub(1) * u64::from(self.rest_seconds)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::bag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_clamps_minimums() {
        let cfg = SessionConfig::new(0, 0, 0, WorkoutMode::Shadow);
        assert_eq!(cfg.round_count, 1);
        assert_eq!(cfg.round_seconds, 1);
        assert_eq!(cfg.rest_seconds, 0);
    }

    #[test]
    fn mode_defaults() {
        assert_eq!(SessionConfig::bag(), SessionConfig::new(8, 180, 60, WorkoutMode::Bag));
        assert_eq!(SessionConfig::shadow().rest_seconds, 30);
        assert_eq!(SessionConfig::hiit(10, 30, 15).mode, WorkoutMode::Hiit);
    }

    #[test]
    fn total_duration_excludes_trailing_rest() {
        let cfg = SessionConfig::new(3, 120, 30, WorkoutMode::Bag);
        assert_eq!(cfg.total_seconds(), 3 * 120 + 2 * 30);
    }

    #[test]
    fn deserialize_clamps_like_the_constructor() {
        let cfg: SessionConfig = serde_json::from_str(
            r#"{"round_count":0,"round_seconds":0,"rest_seconds":10,"mode":"bag"}"#,
        )
        .unwrap();
        assert_eq!(cfg, SessionConfig::new(1, 1, 10, WorkoutMode::Bag));
        assert_eq!(cfg.total_seconds(), 1);
    }

    #[test]
    fn total_duration_of_zero_rounds_does_not_underflow() {
        let mut cfg = SessionConfig::bag();
        cfg.round_count = 0;
        assert_eq!(cfg.total_seconds(), 0);
    }

    #[test]
    fn parse_mode() {
        assert_eq!("HIIT".parse::<WorkoutMode>(), Ok(WorkoutMode::Hiit));
        assert_eq!(" bag ".parse::<WorkoutMode>(), Ok(WorkoutMode::Bag));
        assert!("yoga".parse::<WorkoutMode>().is_err());
        assert!(WorkoutMode::Shadow.is_freeform());
        assert!(!WorkoutMode::Hiit.is_freeform());
    }
}
