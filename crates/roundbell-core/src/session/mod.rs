//! Session controller.
//!
//! [`Session`] is the command surface front-ends talk to. It owns the timer
//! engine, the three tickers and the callout scheduler, and after every
//! change it re-arms or cancels tickers and lets the scheduler decide whether
//! a cue is due. All operations are synchronous and total: a call that makes
//! no sense in the current state does nothing.
//!
//! Time only moves through [`Session::fire`]; [`driver::run_session`] calls it
//! when the earliest ticker deadline passes.

pub mod driver;

use std::time::Duration;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::catalog::{default_exercises, find_exercise, ComboLibrary};
use crate::clock::{earliest, Ticker, TimerSource};
use crate::coach::{Announcer, CalloutScheduler, Cue, CueKey, Directive};
use crate::error::ValidationError;
use crate::events::Event;
use crate::storage::settings::{load_string_list, save_string_list};
use crate::storage::{
    Config, HiitSettings, SessionSettings, SettingsStore, COMBOS_KEY, HIIT_EXERCISES_KEY,
};
use crate::timer::{Command, SessionConfig, TimerEngine, TimerState, WorkoutMode};

pub use driver::{run_session, Control};

/// Engine constants that come from configuration rather than user settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub countdown_seconds: u32,
    pub combo_interval: Duration,
    pub hiit_rounds: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            countdown_seconds: 5,
            combo_interval: Duration::from_secs(3),
            hiit_rounds: 10,
        }
    }
}

impl From<&Config> for Timing {
    fn from(config: &Config) -> Self {
        Self {
            countdown_seconds: config.timing.countdown_seconds,
            combo_interval: config.timing.combo_interval(),
            hiit_rounds: config.defaults.hiit_rounds.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    ModeSelect,
    HiitSetup,
    Workout,
}

/// Read-only view of the session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub screen: Screen,
    pub config: SessionConfig,
    pub state: TimerState,
    pub phase_progress: f64,
    pub hiit: HiitSettings,
    pub selected_exercises: Vec<String>,
    pub combo_count: usize,
    pub combo_interval_seconds: u64,
}

pub struct Session {
    timing: Timing,
    store: Box<dyn SettingsStore>,
    announcer: Box<dyn Announcer>,
    engine: TimerEngine,
    scheduler: CalloutScheduler,
    clock: Ticker,
    countdown: Ticker,
    screen: Screen,
    hiit: HiitSettings,
    exercises: Vec<String>,
    combos: ComboLibrary,
}

impl Session {
    /// Build a session from persisted settings, paused on the mode-select
    /// screen.
    pub fn new(
        timing: Timing,
        store: Box<dyn SettingsStore>,
        announcer: Box<dyn Announcer>,
    ) -> Self {
        let settings = SessionSettings::load(&*store);
        let hiit = HiitSettings::load(&*store);
        let combos = load_string_list(&*store, COMBOS_KEY)
            .map(ComboLibrary::new)
            .unwrap_or_default();
        let exercises =
            load_string_list(&*store, HIIT_EXERCISES_KEY).unwrap_or_else(default_exercises);
        let config = settings.to_config(WorkoutMode::default());

        Self {
            engine: TimerEngine::new(config, timing.countdown_seconds),
            scheduler: CalloutScheduler::new(timing.combo_interval),
            clock: Ticker::seconds(),
            countdown: Ticker::seconds(),
            screen: Screen::ModeSelect,
            timing,
            store,
            announcer,
            hiit,
            exercises,
            combos,
        }
    }

    /// Use a specific random source for combo picks.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.scheduler = CalloutScheduler::with_rng(self.timing.combo_interval, rng);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        self.engine.state()
    }

    pub fn config(&self) -> &SessionConfig {
        self.engine.config()
    }

    pub fn mode(&self) -> WorkoutMode {
        self.engine.config().mode
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn hiit_settings(&self) -> HiitSettings {
        self.hiit
    }

    pub fn selected_exercises(&self) -> &[String] {
        &self.exercises
    }

    pub fn combos(&self) -> &ComboLibrary {
        &self.combos
    }

    pub fn scheduler(&self) -> &CalloutScheduler {
        &self.scheduler
    }

    pub fn is_clock_armed(&self) -> bool {
        self.clock.is_armed()
    }

    pub fn is_countdown_armed(&self) -> bool {
        self.countdown.is_armed()
    }

    /// Earliest pending ticker deadline and the ticker it belongs to.
    pub fn next_deadline(&self) -> Option<(Instant, TimerSource)> {
        earliest([
            (TimerSource::Clock, &self.clock),
            (TimerSource::Countdown, &self.countdown),
            (TimerSource::Coach, self.scheduler.periodic()),
        ])
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            screen: self.screen,
            config: *self.engine.config(),
            state: self.engine.state().clone(),
            phase_progress: self.engine.phase_progress(),
            hiit: self.hiit,
            selected_exercises: self.exercises.clone(),
            combo_count: self.combos.len(),
            combo_interval_seconds: self.timing.combo_interval.as_secs(),
        }
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Apply the mode's defaults. Bag and shadow go straight to a fresh
    /// workout; HIIT goes to the setup screen first.
    pub fn select_mode(&mut self, mode: WorkoutMode) {
        self.scheduler.reset();
        let config = match mode {
            WorkoutMode::Bag => SessionConfig::bag(),
            WorkoutMode::Shadow => SessionConfig::shadow(),
            WorkoutMode::Hiit => self.hiit_config(),
        };
        // Session settings are shared by all modes: picking HIIT overwrites
        // them with {hiit rounds, work, rest}, and the next bag or shadow
        // pick writes that mode's defaults back.
        self.apply_config(config);
        let event = self.engine.reset(Some(config.round_seconds));
        self.screen = match mode {
            WorkoutMode::Hiit => Screen::HiitSetup,
            _ => Screen::Workout,
        };
        tracing::info!(mode = ?mode, rounds = config.round_count, "mode selected");
        self.settle(event);
    }

    /// Leave the HIIT setup screen with the chosen timing. Needs at least one
    /// exercise selected.
    pub fn start_hiit(&mut self) {
        if self.screen != Screen::HiitSetup || self.exercises.is_empty() {
            return;
        }
        let config = self.hiit_config();
        self.apply_config(config);
        self.scheduler.reset();
        let event = self.engine.reset(Some(self.hiit.work_seconds));
        self.screen = Screen::Workout;
        self.settle(event);
    }

    /// Back to mode selection with a full reset.
    pub fn back(&mut self) {
        self.screen = Screen::ModeSelect;
        self.scheduler.reset();
        let event = self.engine.reset(Some(self.engine.config().round_seconds));
        self.settle(event);
    }

    // ── Workout commands ─────────────────────────────────────────────

    pub fn start_pause(&mut self) {
        if self.screen != Screen::Workout {
            return;
        }
        let event = self.engine.start_pause();
        self.settle(event);
    }

    pub fn next(&mut self) {
        if self.screen != Screen::Workout {
            return;
        }
        let event = self.engine.next();
        self.settle(event);
    }

    pub fn reset(&mut self) {
        self.scheduler.reset();
        let seconds = match self.mode() {
            WorkoutMode::Hiit => self.hiit.work_seconds,
            _ => self.engine.config().round_seconds,
        };
        let event = self.engine.reset(Some(seconds));
        self.settle(event);
    }

    /// A ticker deadline passed.
    pub fn fire(&mut self, source: TimerSource) {
        match source {
            TimerSource::Clock => {
                if !self.clock.is_armed() {
                    return;
                }
                self.clock.advance();
                let event = self.engine.tick();
                self.settle(event);
            }
            TimerSource::Countdown => {
                if !self.countdown.is_armed() {
                    return;
                }
                self.countdown.advance();
                let event = self.engine.countdown_tick();
                self.settle(event);
            }
            TimerSource::Coach => {
                if let Some(cue) = self.scheduler.on_interval(self.combos.combos()) {
                    self.deliver(cue);
                }
            }
        }
    }

    pub fn on_clock_tick(&mut self) {
        self.fire(TimerSource::Clock);
    }

    pub fn on_countdown_tick(&mut self) {
        self.fire(TimerSource::Countdown);
    }

    pub fn on_coach_tick(&mut self) {
        self.fire(TimerSource::Coach);
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn set_hiit_work_seconds(&mut self, seconds: u32) {
        self.hiit.work_seconds = seconds.max(1);
        self.hiit_changed();
    }

    pub fn set_hiit_rest_seconds(&mut self, seconds: u32) {
        self.hiit.rest_seconds = seconds;
        self.hiit_changed();
    }

    /// Add or remove a catalog exercise from the selection. Returns whether
    /// it is selected afterwards.
    ///
    /// # Errors
    ///
    /// `UnknownExercise` if the name is not in the catalog.
    pub fn toggle_exercise(&mut self, name: &str) -> Result<bool, ValidationError> {
        let canonical =
            find_exercise(name).ok_or_else(|| ValidationError::UnknownExercise(name.to_string()))?;
        let selected = match self.exercises.iter().position(|e| e == canonical) {
            Some(i) => {
                self.exercises.remove(i);
                false
            }
            None => {
                self.exercises.push(canonical.to_string());
                true
            }
        };
        save_string_list(&mut *self.store, HIIT_EXERCISES_KEY, &self.exercises);
        Ok(selected)
    }

    /// Replace the selection, keeping the given order and dropping repeats.
    ///
    /// # Errors
    ///
    /// `UnknownExercise` for the first name not in the catalog; the selection
    /// is unchanged in that case.
    pub fn set_selected_exercises<S: AsRef<str>>(
        &mut self,
        names: &[S],
    ) -> Result<(), ValidationError> {
        let mut selection: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let canonical = find_exercise(name)
                .ok_or_else(|| ValidationError::UnknownExercise(name.to_string()))?;
            if !selection.iter().any(|e| e == canonical) {
                selection.push(canonical.to_string());
            }
        }
        self.exercises = selection;
        save_string_list(&mut *self.store, HIIT_EXERCISES_KEY, &self.exercises);
        Ok(())
    }

    /// Validate and append a combo to the library.
    ///
    /// # Errors
    ///
    /// See [`ComboLibrary::add`]. The library is unchanged on error.
    pub fn add_combo(&mut self, raw: &str) -> Result<String, ValidationError> {
        let combo = self.combos.add(raw)?;
        save_string_list(&mut *self.store, COMBOS_KEY, self.combos.combos());
        Ok(combo)
    }

    pub fn remove_combo(&mut self, combo: &str) -> bool {
        let removed = self.combos.remove(combo);
        if removed {
            save_string_list(&mut *self.store, COMBOS_KEY, self.combos.combos());
        }
        removed
    }

    /// Remove by 0-based position in the library.
    pub fn remove_combo_at(&mut self, index: usize) -> Option<String> {
        let removed = self.combos.remove_at(index)?;
        save_string_list(&mut *self.store, COMBOS_KEY, self.combos.combos());
        Some(removed)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn hiit_config(&self) -> SessionConfig {
        SessionConfig::hiit(
            self.timing.hiit_rounds,
            self.hiit.work_seconds,
            self.hiit.rest_seconds,
        )
    }

    fn hiit_changed(&mut self) {
        self.hiit.save(&mut *self.store);
        if self.mode() == WorkoutMode::Hiit {
            let event = self.apply_config(self.hiit_config());
            self.settle(event);
        }
    }

    /// Install a new config and persist its round structure if it changed.
    fn apply_config(&mut self, config: SessionConfig) -> Option<Event> {
        let before = SessionSettings::from_config(self.engine.config());
        let event = self.engine.reconfigure(config);
        let after = SessionSettings::from_config(&config);
        if before != after {
            after.save(&mut *self.store);
        }
        event
    }

    /// React to a state change: voice the countdown, re-arm or cancel
    /// tickers, then let the scheduler decide about cues.
    fn settle(&mut self, event: Option<Event>) {
        if let Some(ref event) = event {
            self.voice(event);
        }
        self.sync_tickers();
        self.coach();
    }

    fn voice(&mut self, event: &Event) {
        match event {
            Event::CountdownStarted { seconds, .. } => self.announcer.announce(&seconds.to_string()),
            Event::CountdownTick { remaining, .. } => {
                self.announcer.announce(&remaining.to_string())
            }
            Event::WorkoutStarted { .. } => self.announcer.announce("Go"),
            Event::Finished { .. } => self.announcer.announce("Workout complete"),
            _ => {}
        }
    }

    fn sync_tickers(&mut self) {
        let running = self.engine.state().is_running();
        let counting_down = self.engine.state().is_counting_down();
        if running {
            self.clock.ensure_armed();
        } else {
            self.clock.disarm();
        }
        if counting_down {
            self.countdown.ensure_armed();
        } else {
            self.countdown.disarm();
        }
    }

    fn coach(&mut self) {
        let key = CueKey::of(self.engine.state(), self.mode());
        match self
            .scheduler
            .evaluate(key, self.combos.combos(), &self.exercises)
        {
            Directive::Unchanged => {}
            Directive::Clear => {
                self.engine.apply(Command::SetCallout(None));
            }
            Directive::Fire(cue) => self.deliver(cue),
        }
    }

    fn deliver(&mut self, cue: Cue) {
        tracing::debug!(cue = cue.text(), round = self.engine.state().round_index, "callout");
        self.engine
            .apply(Command::SetCallout(Some(cue.text().to_string())));
        self.announcer.announce(&cue.speech());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::MemoryAnnouncer;
    use crate::storage::{MemoryStore, SETTINGS_KEY};
    use crate::timer::Phase;
    use rand::SeedableRng;
    use serde_json::json;

    fn session_with(store: MemoryStore) -> (Session, MemoryAnnouncer) {
        let spoken = MemoryAnnouncer::new();
        let session = Session::new(Timing::default(), Box::new(store), Box::new(spoken.clone()))
            .with_rng(StdRng::seed_from_u64(42));
        (session, spoken)
    }

    fn session() -> (Session, MemoryAnnouncer) {
        session_with(MemoryStore::new())
    }

    fn finish_countdown(s: &mut Session) {
        for _ in 0..s.timing().countdown_seconds {
            s.fire(TimerSource::Countdown);
        }
    }

    #[test]
    fn starts_on_mode_select_with_persisted_settings() {
        let store = MemoryStore::new()
            .with(SETTINGS_KEY, json!({"rounds": 4, "roundSeconds": 120, "restSeconds": 45}));
        let (s, _) = session_with(store);
        assert_eq!(s.screen(), Screen::ModeSelect);
        assert_eq!(s.config(), &SessionConfig::new(4, 120, 45, WorkoutMode::Bag));
        assert_eq!(s.state().time_left, 120);
    }

    #[test]
    fn commands_are_ignored_outside_workout_screen() {
        let (mut s, spoken) = session();
        s.start_pause();
        s.next();
        assert!(s.state().is_paused());
        assert_eq!(s.state().phase, Phase::Round);
        assert!(spoken.spoken().is_empty());
        assert!(s.next_deadline().is_none());
    }

    #[test]
    fn select_bag_applies_defaults_and_persists() {
        let (mut s, _) = session();
        s.select_mode(WorkoutMode::Bag);
        assert_eq!(s.screen(), Screen::Workout);
        assert_eq!(s.config(), &SessionConfig::bag());
        assert_eq!(s.state().time_left, 180);
        assert_eq!(
            s.store.load(SETTINGS_KEY),
            Some(json!({"rounds": 8, "roundSeconds": 180, "restSeconds": 60}))
        );
    }

    #[test]
    fn select_hiit_routes_through_setup() {
        let (mut s, _) = session();
        s.select_mode(WorkoutMode::Hiit);
        assert_eq!(s.screen(), Screen::HiitSetup);
        assert_eq!(s.config(), &SessionConfig::hiit(10, 30, 15));

        s.start_pause();
        assert!(s.state().is_paused());

        s.set_hiit_work_seconds(45);
        s.start_hiit();
        assert_eq!(s.screen(), Screen::Workout);
        assert_eq!(s.config().round_seconds, 45);
        assert_eq!(s.state().time_left, 45);
    }

    #[test]
    fn hiit_pick_overwrites_shared_session_settings() {
        let store = MemoryStore::new()
            .with(SETTINGS_KEY, json!({"rounds": 4, "roundSeconds": 120, "restSeconds": 45}));
        let (mut s, _) = session_with(store);
        s.select_mode(WorkoutMode::Hiit);
        assert_eq!(
            s.store.load(SETTINGS_KEY),
            Some(json!({"rounds": 10, "roundSeconds": 30, "restSeconds": 15}))
        );

        s.select_mode(WorkoutMode::Shadow);
        assert_eq!(
            s.store.load(SETTINGS_KEY),
            Some(json!({"rounds": 6, "roundSeconds": 180, "restSeconds": 30}))
        );
    }

    #[test]
    fn start_hiit_requires_an_exercise() {
        let (mut s, _) = session();
        s.set_selected_exercises::<&str>(&[]).unwrap();
        s.select_mode(WorkoutMode::Hiit);
        s.start_hiit();
        assert_eq!(s.screen(), Screen::HiitSetup);
    }

    #[test]
    fn countdown_is_voiced_then_go() {
        let (mut s, spoken) = session();
        s.set_selected_exercises(&["Plank"]).unwrap();
        s.select_mode(WorkoutMode::Hiit);
        s.start_hiit();
        s.start_pause();
        assert!(s.is_countdown_armed());
        assert!(!s.is_clock_armed());
        finish_countdown(&mut s);
        assert!(s.state().is_running());
        assert!(!s.is_countdown_armed());
        assert!(s.is_clock_armed());
        assert_eq!(spoken.spoken(), ["5", "4", "3", "2", "1", "Go", "Plank"]);
        assert_eq!(s.state().active_callout.as_deref(), Some("Plank"));
    }

    #[test]
    fn hiit_cue_not_repeated_after_pause_resume() {
        let (mut s, spoken) = session();
        s.set_selected_exercises(&["Plank", "Burpees"]).unwrap();
        s.select_mode(WorkoutMode::Hiit);
        s.start_hiit();
        s.start_pause();
        finish_countdown(&mut s);
        s.fire(TimerSource::Clock);
        s.start_pause();
        assert_eq!(s.state().active_callout, None);
        s.start_pause(); // from Paused(Round): countdown again
        finish_countdown(&mut s);
        let plank = spoken.spoken().iter().filter(|t| *t == "Plank").count();
        assert_eq!(plank, 1);
    }

    #[test]
    fn freeform_cue_fires_on_work_start_and_clears_on_rest() {
        let (mut s, spoken) = session();
        s.select_mode(WorkoutMode::Shadow);
        s.start_pause();
        finish_countdown(&mut s);
        let callout = s.state().active_callout.clone().expect("combo on round start");
        assert!(s.combos().contains(&callout));
        assert_eq!(s.scheduler().active_sources(), 1);
        assert_eq!(spoken.last(), Some(callout.replace('-', " ")));

        s.next();
        assert_eq!(s.state().phase, Phase::Rest);
        assert_eq!(s.state().active_callout, None);
        assert_eq!(s.scheduler().active_sources(), 0);
        assert!(s.next_deadline().is_none());
    }

    #[test]
    fn coach_tick_picks_a_new_combo() {
        let (mut s, spoken) = session();
        s.select_mode(WorkoutMode::Bag);
        s.start_pause();
        finish_countdown(&mut s);
        let before = spoken.spoken().len();
        s.fire(TimerSource::Coach);
        assert_eq!(spoken.spoken().len(), before + 1);
        assert!(s.state().active_callout.is_some());
    }

    #[test]
    fn stray_ticks_are_ignored() {
        let (mut s, _) = session();
        s.select_mode(WorkoutMode::Bag);
        s.fire(TimerSource::Clock);
        s.fire(TimerSource::Countdown);
        s.fire(TimerSource::Coach);
        assert_eq!(s.state().time_left, 180);
        assert!(s.state().is_paused());
    }

    #[test]
    fn back_resets_and_returns_to_mode_select() {
        let (mut s, _) = session();
        s.select_mode(WorkoutMode::Bag);
        s.start_pause();
        finish_countdown(&mut s);
        s.fire(TimerSource::Clock);
        s.back();
        assert_eq!(s.screen(), Screen::ModeSelect);
        assert!(s.state().is_paused());
        assert_eq!(s.state().round_index, 1);
        assert_eq!(s.state().time_left, 180);
        assert!(s.next_deadline().is_none());
    }

    #[test]
    fn hiit_timing_edits_resync_while_paused() {
        let (mut s, _) = session();
        s.select_mode(WorkoutMode::Hiit);
        s.start_hiit();
        s.set_hiit_work_seconds(45);
        assert_eq!(s.state().time_left, 45);

        s.start_pause();
        finish_countdown(&mut s);
        s.fire(TimerSource::Clock);
        s.set_hiit_work_seconds(30);
        assert_eq!(s.state().time_left, 44);
        assert_eq!(s.config().round_seconds, 30);
    }

    #[test]
    fn reset_in_hiit_uses_work_seconds() {
        let (mut s, _) = session();
        s.select_mode(WorkoutMode::Hiit);
        s.start_hiit();
        s.next();
        s.next();
        s.reset();
        assert_eq!(s.state().round_index, 1);
        assert_eq!(s.state().time_left, 30);
    }

    #[test]
    fn exercise_selection_is_validated_and_persisted() {
        let (mut s, _) = session();
        assert_eq!(s.selected_exercises(), ["Burpees", "Push-ups", "Jump Squats"]);
        assert_eq!(s.toggle_exercise("push-ups"), Ok(false));
        assert_eq!(s.toggle_exercise("Plank"), Ok(true));
        assert_eq!(
            s.toggle_exercise("Yoga"),
            Err(ValidationError::UnknownExercise("Yoga".into()))
        );
        assert_eq!(
            s.store.load(HIIT_EXERCISES_KEY),
            Some(json!(["Burpees", "Jump Squats", "Plank"]))
        );

        assert!(s.set_selected_exercises(&["Plank", "Nope"]).is_err());
        assert_eq!(s.selected_exercises().len(), 3);
        s.set_selected_exercises(&["Plank", "plank", "Sprint"]).unwrap();
        assert_eq!(s.selected_exercises(), ["Plank", "Sprint"]);
    }

    #[test]
    fn combo_edits_persist() {
        let (mut s, _) = session();
        let before = s.combos().len();
        assert_eq!(s.add_combo("7-8"), Err(ValidationError::InvalidCombo));
        assert_eq!(s.combos().len(), before);
        assert_eq!(s.add_combo("1 2 3 4 5 6").as_deref(), Ok("1-2-3-4-5-6"));
        assert!(s.remove_combo("1-2"));
        let stored = s.store.load(COMBOS_KEY).unwrap();
        let stored: Vec<String> = serde_json::from_value(stored).unwrap();
        assert_eq!(stored.len(), before);
        assert!(stored.contains(&"1-2-3-4-5-6".to_string()));
        assert!(!stored.contains(&"1-2".to_string()));
    }

    #[test]
    fn remove_combo_by_position_persists() {
        let store = MemoryStore::new().with(COMBOS_KEY, json!(["1-2", "3-4", "5-6"]));
        let (mut s, _) = session_with(store);
        assert_eq!(s.remove_combo_at(1).as_deref(), Some("3-4"));
        assert_eq!(s.remove_combo_at(2), None);
        assert_eq!(s.combos().combos(), ["1-2", "5-6"]);
        assert_eq!(s.store.load(COMBOS_KEY), Some(json!(["1-2", "5-6"])));
    }
}
