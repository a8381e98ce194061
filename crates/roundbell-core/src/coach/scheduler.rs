//! Callout scheduler.
//!
//! Re-evaluated after every state change on the key
//! `(running, phase, mode, round_index)`:
//!
//! - not working (paused, counting down, finished, resting): cancel the
//!   periodic source and clear the callout;
//! - HIIT: one exercise per distinct round, never repeated for a round;
//! - bag/shadow: a random combo right away, then one per interval until the
//!   key changes.
//!
//! The periodic source is always cancelled before a new one is armed, and an
//! unchanged key is a no-op, so at most one source is ever active.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::time::Instant;

use crate::catalog::speakable_combo;
use crate::clock::Ticker;
use crate::timer::{Phase, TimerState, WorkoutMode};

/// The part of the session state that decides whether a cue is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CueKey {
    pub running: bool,
    pub phase: Phase,
    pub mode: WorkoutMode,
    pub round_index: u32,
}

impl CueKey {
    pub fn of(state: &TimerState, mode: WorkoutMode) -> Self {
        Self {
            running: state.is_running(),
            phase: state.phase,
            mode,
            round_index: state.round_index,
        }
    }

    fn is_working(&self) -> bool {
        self.running && self.phase == Phase::Round
    }
}

/// A coaching cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    Combo(String),
    Exercise(String),
}

impl Cue {
    /// Text shown on screen.
    pub fn text(&self) -> &str {
        match self {
            Cue::Combo(c) | Cue::Exercise(c) => c,
        }
    }

    /// Text handed to the announcer.
    pub fn speech(&self) -> String {
        match self {
            Cue::Combo(c) => speakable_combo(c),
            Cue::Exercise(e) => e.clone(),
        }
    }
}

/// What the session should do with the active callout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Nothing to do.
    Unchanged,
    /// Drop the displayed callout.
    Clear,
    /// Show and announce this cue.
    Fire(Cue),
}

pub struct CalloutScheduler {
    rng: StdRng,
    periodic: Ticker,
    last_key: Option<CueKey>,
    /// HIIT dedupe: last round an exercise was called for.
    last_announced_round: Option<u32>,
    sources_armed: u64,
    sources_cancelled: u64,
}

impl CalloutScheduler {
    pub fn new(interval: Duration) -> Self {
        Self::with_rng(interval, StdRng::from_entropy())
    }

    pub fn with_rng(interval: Duration, rng: StdRng) -> Self {
        Self {
            rng,
            periodic: Ticker::new(interval),
            last_key: None,
            last_announced_round: None,
            sources_armed: 0,
            sources_cancelled: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.periodic.period()
    }

    /// Next periodic cue, if a source is armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.periodic.deadline()
    }

    pub fn periodic(&self) -> &Ticker {
        &self.periodic
    }

    /// 0 or 1.
    pub fn active_sources(&self) -> usize {
        usize::from(self.periodic.is_armed())
    }

    pub fn sources_armed(&self) -> u64 {
        self.sources_armed
    }

    pub fn sources_cancelled(&self) -> u64 {
        self.sources_cancelled
    }

    pub fn last_announced_round(&self) -> Option<u32> {
        self.last_announced_round
    }

    /// Forget everything about the current session.
    pub fn reset(&mut self) {
        self.cancel_periodic();
        self.last_key = None;
        self.last_announced_round = None;
    }

    /// Decide whether a cue is due after a state change.
    pub fn evaluate(&mut self, key: CueKey, combos: &[String], exercises: &[String]) -> Directive {
        if self.last_key == Some(key) {
            return Directive::Unchanged;
        }
        self.last_key = Some(key);
        self.cancel_periodic();

        if !key.is_working() {
            return Directive::Clear;
        }

        match key.mode {
            WorkoutMode::Hiit => {
                if exercises.is_empty() || self.last_announced_round == Some(key.round_index) {
                    return Directive::Unchanged;
                }
                self.last_announced_round = Some(key.round_index);
                let slot = (key.round_index.saturating_sub(1) as usize) % exercises.len();
                Directive::Fire(Cue::Exercise(exercises[slot].clone()))
            }
            WorkoutMode::Bag | WorkoutMode::Shadow => match self.pick_combo(combos) {
                Some(cue) => {
                    debug_assert_eq!(self.active_sources(), 0);
                    self.periodic.arm();
                    self.sources_armed += 1;
                    Directive::Fire(cue)
                }
                None => Directive::Unchanged,
            },
        }
    }

    /// The periodic source fired.
    pub fn on_interval(&mut self, combos: &[String]) -> Option<Cue> {
        if !self.periodic.is_armed() {
            return None;
        }
        self.periodic.advance();
        self.pick_combo(combos)
    }

    fn cancel_periodic(&mut self) {
        if self.periodic.disarm() {
            self.sources_cancelled += 1;
        }
    }

    fn pick_combo(&mut self, combos: &[String]) -> Option<Cue> {
        combos.choose(&mut self.rng).cloned().map(Cue::Combo)
    }
}
