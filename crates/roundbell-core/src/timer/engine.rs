//! Phase state machine.
//!
//! The engine is a pure transition function wrapped around a single owned
//! [`TimerState`]. It has no clock of its own - the session feeds it
//! `Tick`/`CountdownTick` commands from its tickers.
//!
//! ## State Transitions
//!
//! ```text
//! Paused(Round) -> CountingDown -> Running(Round) -> Running(Rest) -> Running(Round) ... -> Finished
//!                                        |  ^
//!                                        v  |
//!                                   Paused(Round|Rest)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(SessionConfig::bag(), 5);
//! engine.apply(Command::StartPause); // countdown begins
//! // once per second:
//! engine.apply(Command::CountdownTick);
//! ```

use chrono::Utc;

use super::config::SessionConfig;
use super::state::{Command, Phase, Status, TimerState};
use crate::events::Event;

/// Core timer engine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    config: SessionConfig,
    countdown_seconds: u32,
    state: TimerState,
}

impl TimerEngine {
    /// Create an engine paused at the start of round 1.
    pub fn new(config: SessionConfig, countdown_seconds: u32) -> Self {
        Self {
            state: TimerState::initial(&config, countdown_seconds),
            config,
            countdown_seconds,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn countdown_seconds(&self) -> u32 {
        self.countdown_seconds
    }

    /// Configured length of the current phase.
    pub fn phase_seconds(&self) -> u32 {
        match self.state.phase {
            Phase::Round => self.config.round_seconds,
            Phase::Rest => self.config.rest_seconds,
        }
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self) -> f64 {
        let total = self.phase_seconds();
        if total == 0 {
            return 0.0;
        }
        (1.0 - f64::from(self.state.time_left) / f64::from(total)).clamp(0.0, 1.0)
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Compute the successor of `state` under `command` without touching the
    /// engine. Commands that are invalid in `state` return it unchanged.
    pub fn transition(&self, state: &TimerState, command: &Command) -> TimerState {
        let mut next = state.clone();
        match command {
            Command::StartPause => match state.status {
                Status::Paused if state.phase == Phase::Round => {
                    if self.countdown_seconds == 0 {
                        next.status = Status::Running;
                    } else {
                        next.status = Status::CountingDown;
                        next.countdown_remaining = self.countdown_seconds;
                    }
                }
                Status::Paused => next.status = Status::Running,
                Status::Running => {
                    next.status = Status::Paused;
                    next.active_callout = None;
                }
                Status::CountingDown => {
                    next.status = Status::Paused;
                    next.countdown_remaining = self.countdown_seconds;
                }
                Status::Finished => {}
            },
            Command::CountdownTick => {
                if state.is_counting_down() {
                    if state.countdown_remaining > 1 {
                        next.countdown_remaining -= 1;
                    } else {
                        next.countdown_remaining = 0;
                        next.status = Status::Running;
                    }
                }
            }
            Command::Tick => {
                if state.is_running() {
                    if state.time_left > 1 {
                        next.time_left -= 1;
                    } else {
                        next = self.exhaust(state);
                    }
                }
            }
            Command::Next => {
                if matches!(state.status, Status::Paused | Status::Running) {
                    next = self.exhaust(state);
                    if !next.is_finished() {
                        next.status = Status::Paused;
                    }
                    next.countdown_remaining = self.countdown_seconds;
                }
            }
            Command::Reset { time_left } => {
                next = TimerState::initial(&self.config, self.countdown_seconds);
                next.time_left = time_left.unwrap_or(self.config.round_seconds);
            }
            Command::SetCallout(callout) => {
                if callout.is_none() || state.is_working() {
                    next.active_callout = callout.clone();
                }
            }
            Command::Reconfigure(config) => {
                next.round_index = state.round_index.min(config.round_count).max(1);
                if next.phase == Phase::Rest && config.is_last_round(next.round_index) {
                    if config.round_count > 1 {
                        next.round_index = config.round_count - 1;
                    } else {
                        next.phase = Phase::Round;
                        if state.is_paused() {
                            next.time_left = config.round_seconds;
                        }
                    }
                }
                if state.is_paused() {
                    match next.phase {
                        Phase::Round if config.round_seconds != self.config.round_seconds => {
                            next.time_left = config.round_seconds;
                        }
                        Phase::Rest if config.rest_seconds != self.config.rest_seconds => {
                            next.time_left = config.rest_seconds;
                        }
                        _ => {}
                    }
                }
            }
        }
        next
    }

    /// Apply a command and report what changed.
    pub fn apply(&mut self, command: Command) -> Option<Event> {
        let next = self.transition(&self.state, &command);
        let event = describe(&self.state, &next, &command);
        self.state = next;
        if let Command::Reconfigure(config) = command {
            self.config = config;
        }
        if let Some(ref ev) = event {
            tracing::debug!(
                event = ev.kind(),
                round = self.state.round_index,
                phase = ?self.state.phase,
                time_left = self.state.time_left,
                "timer transition"
            );
        }
        event
    }

    pub fn start_pause(&mut self) -> Option<Event> {
        self.apply(Command::StartPause)
    }

    pub fn tick(&mut self) -> Option<Event> {
        self.apply(Command::Tick)
    }

    pub fn countdown_tick(&mut self) -> Option<Event> {
        self.apply(Command::CountdownTick)
    }

    pub fn next(&mut self) -> Option<Event> {
        self.apply(Command::Next)
    }

    pub fn reset(&mut self, time_left: Option<u32>) -> Option<Event> {
        self.apply(Command::Reset { time_left })
    }

    pub fn reconfigure(&mut self, config: SessionConfig) -> Option<Event> {
        self.apply(Command::Reconfigure(config))
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Target of the current phase running out. Keeps the status unless the
    /// session ends.
    fn exhaust(&self, state: &TimerState) -> TimerState {
        let mut next = state.clone();
        next.active_callout = None;
        match state.phase {
            Phase::Round if self.config.is_last_round(state.round_index) => {
                next.round_index = self.config.round_count;
                next.time_left = 0;
                next.status = Status::Finished;
            }
            Phase::Round if self.config.rest_seconds == 0 => {
                next.round_index = (state.round_index + 1).min(self.config.round_count);
                next.time_left = self.config.round_seconds;
            }
            Phase::Round => {
                next.phase = Phase::Rest;
                next.time_left = self.config.rest_seconds;
            }
            Phase::Rest => {
                next.round_index = (state.round_index + 1).min(self.config.round_count);
                next.phase = Phase::Round;
                next.time_left = self.config.round_seconds;
            }
        }
        next
    }
}

fn describe(old: &TimerState, new: &TimerState, command: &Command) -> Option<Event> {
    let at = Utc::now();
    match command {
        Command::StartPause => match (old.status, new.status) {
            (Status::Paused, Status::CountingDown) => Some(Event::CountdownStarted {
                seconds: new.countdown_remaining,
                at,
            }),
            (Status::Paused, Status::Running) if new.phase == Phase::Round => {
                Some(Event::WorkoutStarted {
                    round_index: new.round_index,
                    at,
                })
            }
            (Status::Paused, Status::Running) => Some(Event::Resumed {
                phase: new.phase,
                time_left: new.time_left,
                at,
            }),
            (Status::Running, Status::Paused) => Some(Event::Paused {
                phase: new.phase,
                time_left: new.time_left,
                at,
            }),
            (Status::CountingDown, Status::Paused) => Some(Event::CountdownCancelled { at }),
            _ => None,
        },
        Command::CountdownTick => match new.status {
            Status::Running if old.is_counting_down() => Some(Event::WorkoutStarted {
                round_index: new.round_index,
                at,
            }),
            Status::CountingDown if old.countdown_remaining != new.countdown_remaining => {
                Some(Event::CountdownTick {
                    remaining: new.countdown_remaining,
                    at,
                })
            }
            _ => None,
        },
        Command::Tick => {
            if new.is_finished() && !old.is_finished() {
                Some(Event::Finished {
                    round_index: new.round_index,
                    at,
                })
            } else if old.phase != new.phase || old.round_index != new.round_index {
                Some(Event::PhaseChanged {
                    phase: new.phase,
                    round_index: new.round_index,
                    time_left: new.time_left,
                    at,
                })
            } else {
                None
            }
        }
        Command::Next => {
            if old == new {
                None
            } else if new.is_finished() {
                Some(Event::Finished {
                    round_index: new.round_index,
                    at,
                })
            } else {
                Some(Event::Skipped {
                    from_phase: old.phase,
                    to_phase: new.phase,
                    round_index: new.round_index,
                    at,
                })
            }
        }
        Command::Reset { .. } => Some(Event::Reset {
            time_left: new.time_left,
            at,
        }),
        Command::SetCallout(_) => (old.active_callout != new.active_callout).then(|| {
            Event::CalloutChanged {
                callout: new.active_callout.clone(),
                at,
            }
        }),
        Command::Reconfigure(_) => (old.time_left != new.time_left).then_some(
            Event::DurationResynced {
                phase: new.phase,
                time_left: new.time_left,
                at,
            },
        ),
    }
}
