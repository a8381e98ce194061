use serde::{Deserialize, Serialize};

use super::config::SessionConfig;

/// Work or rest within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Round,
    Rest,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Round => "WORK",
            Phase::Rest => "REST",
        }
    }
}

/// Top-level machine state.
///
/// `running` and `counting_down` are projections of this enum, so they can
/// never both be true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Paused,
    CountingDown,
    Running,
    /// Last round exhausted. Only a reset leaves this state.
    Finished,
}

/// Mutable timer state. Owned and written only by [`super::TimerEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub status: Status,
    pub countdown_remaining: u32,
    pub phase: Phase,
    /// 1-based.
    pub round_index: u32,
    /// Seconds remaining in the current phase.
    pub time_left: u32,
    pub active_callout: Option<String>,
}

impl TimerState {
    /// Paused at the start of round 1.
    pub fn initial(config: &SessionConfig, countdown_seconds: u32) -> Self {
        Self {
            status: Status::Paused,
            countdown_remaining: countdown_seconds,
            phase: Phase::Round,
            round_index: 1,
            time_left: config.round_seconds,
            active_callout: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn is_counting_down(&self) -> bool {
        self.status == Status::CountingDown
    }

    pub fn is_paused(&self) -> bool {
        self.status == Status::Paused
    }

    pub fn is_finished(&self) -> bool {
        self.status == Status::Finished
    }

    /// Running in the work phase; the only state in which cues are due.
    pub fn is_working(&self) -> bool {
        self.is_running() && self.phase == Phase::Round
    }
}

/// Inputs to the phase state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start (with countdown before work), resume, or pause.
    StartPause,
    /// One second of the pre-round countdown elapsed.
    CountdownTick,
    /// One second of the running phase elapsed.
    Tick,
    /// Skip to the next phase and stay paused.
    Next,
    /// Back to round 1, paused. `None` uses the configured round duration.
    Reset { time_left: Option<u32> },
    SetCallout(Option<String>),
    /// Replace the session config.
    Reconfigure(SessionConfig),
}
