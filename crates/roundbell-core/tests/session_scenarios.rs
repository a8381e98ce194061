//! End-to-end scenarios for the session controller and its async driver.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use roundbell_core::storage::{COMBOS_KEY, HIIT_EXERCISES_KEY};
use roundbell_core::timer::{Command, Phase, SessionConfig, TimerEngine, WorkoutMode};
use roundbell_core::{
    run_session, Control, KvStore, MemoryAnnouncer, MemoryStore, Screen, Session, TimerSource,
    Timing, ValidationError,
};
use serde_json::json;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;

fn is_combo(text: &str) -> bool {
    text == "1 2" || text == "3 4"
}

fn combos_spoken(spoken: &MemoryAnnouncer) -> usize {
    spoken.spoken().iter().filter(|t| is_combo(t)).count()
}

#[test]
fn three_short_rounds_run_to_completion() {
    let mut engine = TimerEngine::new(SessionConfig::new(3, 2, 1, WorkoutMode::Bag), 0);
    engine.apply(Command::StartPause);
    assert!(engine.state().is_running());

    let mut trace = Vec::new();
    while !engine.state().is_finished() {
        engine.apply(Command::Tick);
        let s = engine.state();
        trace.push((s.phase, s.round_index, s.time_left));
    }

    assert_eq!(
        trace,
        vec![
            (Phase::Round, 1, 1),
            (Phase::Rest, 1, 1),
            (Phase::Round, 2, 2),
            (Phase::Round, 2, 1),
            (Phase::Rest, 2, 1),
            (Phase::Round, 3, 2),
            (Phase::Round, 3, 1),
            (Phase::Round, 3, 0),
        ]
    );
}

#[test]
fn combo_input_is_validated_before_saving() {
    let store = MemoryStore::new().with(COMBOS_KEY, json!(["1-2", "3-4"]));
    let mut session = Session::new(
        Timing::default(),
        Box::new(store),
        Box::new(MemoryAnnouncer::new()),
    );

    let err = session.add_combo("7-8").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Only numbers 1–6 allowed (use - or spaces). Example: 1-2-3"
    );
    assert_eq!(session.add_combo("jab cross"), Err(ValidationError::InvalidCombo));
    assert_eq!(session.add_combo(" 1 - 2 "), Err(ValidationError::DuplicateCombo));
    assert_eq!(session.combos().combos(), ["1-2", "3-4"]);

    assert_eq!(session.add_combo("1 2 3").as_deref(), Ok("1-2-3"));
    assert_eq!(session.combos().combos(), ["1-2", "3-4", "1-2-3"]);
}

#[test]
fn hiit_exercise_is_announced_once_per_round() {
    let spoken = MemoryAnnouncer::new();
    let store = MemoryStore::new().with(HIIT_EXERCISES_KEY, json!(["Plank", "Sprint"]));
    let timing = Timing {
        countdown_seconds: 0,
        ..Timing::default()
    };
    let mut session = Session::new(timing, Box::new(store), Box::new(spoken.clone()));
    session.select_mode(WorkoutMode::Hiit);
    session.set_hiit_work_seconds(2);
    session.set_hiit_rest_seconds(1);
    session.start_hiit();
    session.start_pause();

    // Pause and resume inside round 1, then run into round 2.
    session.fire(TimerSource::Clock);
    session.start_pause();
    session.start_pause();
    session.start_pause();
    session.start_pause();
    for _ in 0..3 {
        session.fire(TimerSource::Clock);
    }
    assert_eq!(session.state().round_index, 2);
    assert_eq!(session.state().phase, Phase::Round);

    let exercises: Vec<String> = spoken
        .spoken()
        .into_iter()
        .filter(|t| t != "Go")
        .collect();
    assert_eq!(exercises, ["Plank", "Sprint"]);
    assert_eq!(session.scheduler().last_announced_round(), Some(2));
    assert_eq!(session.scheduler().active_sources(), 0);
}

#[test]
fn settings_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roundbell.db");

    {
        let store = KvStore::open(&path).unwrap();
        let mut session =
            Session::new(Timing::default(), Box::new(store), Box::new(MemoryAnnouncer::new()));
        session.select_mode(WorkoutMode::Shadow);
        session.add_combo("1-1-1").unwrap();
        session.set_selected_exercises(&["Thrusters", "Dips"]).unwrap();
        session.set_hiit_rest_seconds(20);
    }

    let store = KvStore::open(&path).unwrap();
    let session =
        Session::new(Timing::default(), Box::new(store), Box::new(MemoryAnnouncer::new()));
    assert_eq!(session.screen(), Screen::ModeSelect);
    assert_eq!(session.config(), &SessionConfig::new(6, 180, 30, WorkoutMode::Bag));
    assert!(session.combos().contains("1-1-1"));
    assert_eq!(session.selected_exercises(), ["Thrusters", "Dips"]);
    assert_eq!(session.hiit_settings().rest_seconds, 20);
    assert_eq!(session.hiit_settings().work_seconds, 30);
}

fn freeform_session(spoken: &MemoryAnnouncer) -> Session {
    let store = MemoryStore::new().with(COMBOS_KEY, json!(["1-2", "3-4"]));
    let timing = Timing {
        countdown_seconds: 0,
        ..Timing::default()
    };
    Session::new(timing, Box::new(store), Box::new(spoken.clone()))
        .with_rng(StdRng::seed_from_u64(3))
}

#[tokio::test(start_paused = true)]
async fn combos_repeat_on_the_interval() {
    let spoken = MemoryAnnouncer::new();
    let session = freeform_session(&spoken);
    let (tx, rx) = mpsc::channel(8);
    let (updates, view) = watch::channel(session.snapshot());
    let handle = tokio::spawn(run_session(session, rx, updates));

    tx.send(Control::SelectMode(WorkoutMode::Bag)).await.unwrap();
    tx.send(Control::StartPause).await.unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(combos_spoken(&spoken), 1);

    sleep(Duration::from_secs(3)).await;
    assert_eq!(combos_spoken(&spoken), 2);
    sleep(Duration::from_secs(3)).await;
    assert_eq!(combos_spoken(&spoken), 3);
    assert_eq!(view.borrow().state.time_left, 180 - 6);

    tx.send(Control::Quit).await.unwrap();
    let session = handle.await.unwrap();
    assert_eq!(session.scheduler().active_sources(), 1);
}

#[tokio::test(start_paused = true)]
async fn pause_cancels_the_pending_combo() {
    let spoken = MemoryAnnouncer::new();
    let session = freeform_session(&spoken);
    let (tx, rx) = mpsc::channel(8);
    let (updates, view) = watch::channel(session.snapshot());
    let handle = tokio::spawn(run_session(session, rx, updates));

    tx.send(Control::SelectMode(WorkoutMode::Bag)).await.unwrap();
    tx.send(Control::StartPause).await.unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(combos_spoken(&spoken), 1);
    let shown = view.borrow().state.active_callout.clone();
    assert!(shown.is_some());

    sleep(Duration::from_millis(1490)).await;
    tx.send(Control::StartPause).await.unwrap();
    sleep(Duration::from_millis(10)).await;
    {
        let snapshot = view.borrow();
        assert!(snapshot.state.is_paused());
        assert_eq!(snapshot.state.time_left, 179);
        assert_eq!(snapshot.state.active_callout, None);
    }

    sleep(Duration::from_secs(5)).await;
    assert_eq!(combos_spoken(&spoken), 1);
    assert_eq!(view.borrow().state.time_left, 179);

    drop(tx);
    let session = handle.await.unwrap();
    assert_eq!(session.scheduler().active_sources(), 0);
    assert_eq!(
        session.scheduler().sources_armed(),
        session.scheduler().sources_cancelled()
    );
    assert!(session.next_deadline().is_none());
}

#[tokio::test(start_paused = true)]
async fn driver_counts_down_before_the_first_round() {
    let spoken = MemoryAnnouncer::new();
    let store = MemoryStore::new().with(COMBOS_KEY, json!(["1-2", "3-4"]));
    let session = Session::new(Timing::default(), Box::new(store), Box::new(spoken.clone()));
    let (tx, rx) = mpsc::channel(8);
    let (updates, view) = watch::channel(session.snapshot());
    let handle = tokio::spawn(run_session(session, rx, updates));

    tx.send(Control::SelectMode(WorkoutMode::Shadow)).await.unwrap();
    tx.send(Control::StartPause).await.unwrap();
    sleep(Duration::from_millis(2500)).await;
    assert!(view.borrow().state.is_counting_down());
    assert_eq!(view.borrow().state.countdown_remaining, 3);
    assert_eq!(combos_spoken(&spoken), 0);

    sleep(Duration::from_secs(3)).await;
    assert!(view.borrow().state.is_running());
    assert_eq!(view.borrow().state.time_left, 180);
    let voiced: Vec<String> = spoken.spoken().into_iter().take(6).collect();
    assert_eq!(voiced, ["5", "4", "3", "2", "1", "Go"]);
    assert_eq!(combos_spoken(&spoken), 1);

    tx.send(Control::Back).await.unwrap();
    tx.send(Control::Quit).await.unwrap();
    let session = handle.await.unwrap();
    assert_eq!(session.screen(), Screen::ModeSelect);
    assert!(session.next_deadline().is_none());
}
