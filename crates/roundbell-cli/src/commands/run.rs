//! Interactive workout session on the terminal.
//!
//! Keys (one per line on stdin): empty or `s` start/pause, `n` next phase,
//! `r` reset, `b` back to mode selection, `q` quit. On the mode selection
//! screen a mode name (`bag`, `shadow`, `hiit`) starts a new workout.

use std::io::Write;

use clap::Args;
use roundbell_core::timer::format_mmss;
use roundbell_core::{
    run_session, voice_announcer, Announcer, Config, ConsoleAnnouncer, Control, Phase, Screen,
    Session, SilentAnnouncer, Snapshot, Status, TimerState, WorkoutMode,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use super::open_session_with;

#[derive(Args)]
pub struct RunArgs {
    /// Workout mode: bag, shadow or hiit
    mode: WorkoutMode,
    /// Disable all announcements
    #[arg(long)]
    silent: bool,
    /// Print announcements to the terminal
    #[arg(long)]
    console: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Control(Control),
    Start(WorkoutMode),
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let input = match line.trim() {
        "" | "s" => Input::Control(Control::StartPause),
        "n" => Input::Control(Control::Next),
        "r" => Input::Control(Control::Reset),
        "b" => Input::Control(Control::Back),
        "q" => Input::Quit,
        other => Input::Start(other.parse().ok()?),
    };
    Some(input)
}

fn announcer(args: &RunArgs, config: &Config) -> Box<dyn Announcer> {
    if args.silent {
        return Box::new(SilentAnnouncer);
    }
    let speech = voice_announcer(config.voice.backend());
    match (speech, args.console) {
        (Some(speech), true) => Box::new((speech, ConsoleAnnouncer)),
        (Some(speech), false) => Box::new(speech),
        (None, true) => Box::new(ConsoleAnnouncer),
        (None, false) => Box::new(SilentAnnouncer),
    }
}

fn start_controls(mode: WorkoutMode) -> Vec<Control> {
    match mode {
        WorkoutMode::Hiit => vec![Control::SelectMode(mode), Control::StartHiit],
        _ => vec![Control::SelectMode(mode)],
    }
}

/// Exercise for the current HIIT round, cycling through the selection.
fn current_exercise(snapshot: &Snapshot) -> Option<&str> {
    if let Some(callout) = snapshot.state.active_callout.as_deref() {
        return Some(callout);
    }
    if snapshot.config.mode != WorkoutMode::Hiit || snapshot.selected_exercises.is_empty() {
        return None;
    }
    let round = snapshot.state.round_index.max(1) as usize - 1;
    let exercises = &snapshot.selected_exercises;
    Some(exercises[round % exercises.len()].as_str())
}

fn render(out: &mut impl Write, snapshot: &Snapshot) -> std::io::Result<()> {
    match snapshot.screen {
        Screen::ModeSelect => writeln!(out, "Choose a mode: bag, shadow, hiit (q to quit)")?,
        Screen::HiitSetup => writeln!(
            out,
            "No HIIT exercises selected. Use `roundbell hiit select` first (b to go back)."
        )?,
        Screen::Workout => {
            let state = &snapshot.state;
            match state.status {
                Status::CountingDown => writeln!(out, "Get ready... {}", state.countdown_remaining)?,
                Status::Finished => writeln!(
                    out,
                    "Workout complete: {} rounds. r to go again, q to quit.",
                    snapshot.config.round_count
                )?,
                Status::Running | Status::Paused => {
                    let paused = if state.is_paused() { "  (paused)" } else { "" };
                    match state.phase {
                        Phase::Rest => writeln!(
                            out,
                            "Rest - Next: {} / {}  {}{}",
                            state.round_index + 1,
                            snapshot.config.round_count,
                            format_mmss(state.time_left),
                            paused
                        )?,
                        Phase::Round => writeln!(
                            out,
                            "{:<4} {}/{}  {}  {}{}",
                            state.phase.label(),
                            state.round_index,
                            snapshot.config.round_count,
                            format_mmss(state.time_left),
                            current_exercise(snapshot).unwrap_or(""),
                            paused
                        )?,
                    }
                }
            }
        }
    }
    out.flush()
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let session = open_session_with(&config, announcer(&args, &config))?;
    if args.mode == WorkoutMode::Hiit && session.selected_exercises().is_empty() {
        return Err("no HIIT exercises selected; use `roundbell hiit select`".into());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(interact(session, args.mode));
    // The stdin reader may still be parked on a blocking read.
    runtime.shutdown_background();
    result
}

async fn interact(session: Session, mode: WorkoutMode) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = mpsc::channel(16);
    let (updates, mut view) = watch::channel(session.snapshot());
    let driver = tokio::spawn(run_session(session, rx, updates));

    for control in start_controls(mode) {
        tx.send(control).await?;
    }

    let mut out = std::io::stdout();
    let first = view
        .wait_for(|s| s.screen != Screen::ModeSelect)
        .await?
        .clone();
    render(&mut out, &first)?;
    let mut last_line: Option<(Screen, TimerState)> = Some((first.screen, first.state));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Some(Input::Control(control)) => tx.send(control).await?,
                    Some(Input::Start(mode)) => {
                        for control in start_controls(mode) {
                            tx.send(control).await?;
                        }
                    }
                    Some(Input::Quit) => break,
                    None => eprintln!("unknown input {line:?}: s, n, r, b, q"),
                }
            }
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = view.borrow_and_update().clone();
                let line = (snapshot.screen, snapshot.state.clone());
                if last_line.as_ref() == Some(&line) {
                    continue;
                }
                last_line = Some(line);
                if let Err(e) = render(&mut out, &snapshot) {
                    eprintln!("display failed ({e}); returning to mode selection");
                    tx.send(Control::Back).await?;
                }
            }
        }
    }

    // The driver may already have stopped if the channel closed.
    let _ = tx.send(Control::Quit).await;
    let session = driver.await?;
    let state = session.state();
    tracing::info!(
        round = state.round_index,
        finished = state.is_finished(),
        "session ended"
    );
    Ok(())
}
