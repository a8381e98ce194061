//! Async run loop for a [`Session`].
//!
//! One task owns the session. It waits on whichever comes first: a control
//! message from the front-end, or the earliest armed ticker deadline.
//! Controls win ties, so a pause that lands on a tick boundary stops the
//! clock before the tick is counted. After every step the current
//! [`Snapshot`] is published on a watch channel.

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};

use super::{Session, Snapshot};
use crate::clock::TimerSource;
use crate::timer::WorkoutMode;

/// User commands accepted by [`run_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    SelectMode(WorkoutMode),
    StartHiit,
    StartPause,
    Next,
    Reset,
    Back,
    SetHiitWork(u32),
    SetHiitRest(u32),
    Quit,
}

impl Session {
    /// Apply one control message. `Quit` is handled by the loop.
    pub fn handle(&mut self, control: Control) {
        match control {
            Control::SelectMode(mode) => self.select_mode(mode),
            Control::StartHiit => self.start_hiit(),
            Control::StartPause => self.start_pause(),
            Control::Next => self.next(),
            Control::Reset => self.reset(),
            Control::Back => self.back(),
            Control::SetHiitWork(seconds) => self.set_hiit_work_seconds(seconds),
            Control::SetHiitRest(seconds) => self.set_hiit_rest_seconds(seconds),
            Control::Quit => {}
        }
    }
}

/// Drive `session` until `Quit` arrives or every sender is dropped, then hand
/// it back.
pub async fn run_session(
    mut session: Session,
    mut controls: mpsc::Receiver<Control>,
    updates: watch::Sender<Snapshot>,
) -> Session {
    updates.send_replace(session.snapshot());
    loop {
        let deadline = session.next_deadline();
        tokio::select! {
            biased;
            control = controls.recv() => match control {
                None | Some(Control::Quit) => break,
                Some(control) => {
                    tracing::debug!(?control, "control");
                    session.handle(control);
                }
            },
            source = due(deadline) => session.fire(source),
        }
        updates.send_replace(session.snapshot());
    }
    tracing::debug!("session loop stopped");
    session
}

async fn due(deadline: Option<(Instant, TimerSource)>) -> TimerSource {
    match deadline {
        Some((at, source)) => {
            sleep_until(at).await;
            source
        }
        None => std::future::pending().await,
    }
}
