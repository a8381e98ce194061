use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change of the timer engine produces an Event.
/// The session reacts to them (countdown voice, logging); front-ends may
/// render them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    CountdownStarted {
        seconds: u32,
        at: DateTime<Utc>,
    },
    CountdownTick {
        remaining: u32,
        at: DateTime<Utc>,
    },
    CountdownCancelled {
        at: DateTime<Utc>,
    },
    /// Countdown resolved; the first work second starts now.
    WorkoutStarted {
        round_index: u32,
        at: DateTime<Utc>,
    },
    Paused {
        phase: Phase,
        time_left: u32,
        at: DateTime<Utc>,
    },
    Resumed {
        phase: Phase,
        time_left: u32,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        phase: Phase,
        round_index: u32,
        time_left: u32,
        at: DateTime<Utc>,
    },
    Skipped {
        from_phase: Phase,
        to_phase: Phase,
        round_index: u32,
        at: DateTime<Utc>,
    },
    Finished {
        round_index: u32,
        at: DateTime<Utc>,
    },
    Reset {
        time_left: u32,
        at: DateTime<Utc>,
    },
    DurationResynced {
        phase: Phase,
        time_left: u32,
        at: DateTime<Utc>,
    },
    CalloutChanged {
        callout: Option<String>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::CountdownStarted { .. } => "countdown_started",
            Event::CountdownTick { .. } => "countdown_tick",
            Event::CountdownCancelled { .. } => "countdown_cancelled",
            Event::WorkoutStarted { .. } => "workout_started",
            Event::Paused { .. } => "paused",
            Event::Resumed { .. } => "resumed",
            Event::PhaseChanged { .. } => "phase_changed",
            Event::Skipped { .. } => "skipped",
            Event::Finished { .. } => "finished",
            Event::Reset { .. } => "reset",
            Event::DurationResynced { .. } => "duration_resynced",
            Event::CalloutChanged { .. } => "callout_changed",
        }
    }
}
