//! # Roundbell Core Library
//!
//! Timing engine for interval workouts: heavy-bag and shadow-boxing rounds
//! with spoken punch combos, and HIIT circuits with one exercise per round.
//! Front-ends (the `roundbell` CLI) are thin layers over [`Session`].
//!
//! ## Architecture
//!
//! - **Timer Engine**: pure phase state machine (countdown, work, rest,
//!   finished) driven by explicit tick commands
//! - **Clock**: owned one-shot tickers; the async driver sleeps until the
//!   earliest deadline
//! - **Coach**: callout scheduler and announcement sinks
//! - **Storage**: SQLite key-value settings and TOML configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: phase state machine
//! - [`Session`]: command surface tying engine, tickers and coach together
//! - [`run_session`]: single-task async driver
//! - [`Config`]: application configuration

pub mod catalog;
pub mod clock;
pub mod coach;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod timer;

pub use catalog::ComboLibrary;
pub use clock::{Ticker, TimerSource};
pub use coach::{
    voice_announcer, Announcer, CalloutScheduler, ConsoleAnnouncer, Cue, MemoryAnnouncer,
    SilentAnnouncer, SpeechAnnouncer,
};
#[cfg(not(target_os = "linux"))]
pub use coach::SystemAnnouncer;
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use session::{run_session, Control, Screen, Session, Snapshot, Timing};
pub use storage::{Config, KvStore, MemoryStore, SettingsStore, VoiceBackend};
pub use timer::{Phase, SessionConfig, Status, TimerEngine, TimerState, WorkoutMode};
