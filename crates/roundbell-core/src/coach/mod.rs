mod announcer;
mod scheduler;

pub use announcer::{
    voice_announcer, Announcer, ConsoleAnnouncer, MemoryAnnouncer, SilentAnnouncer,
    SpeechAnnouncer,
};
#[cfg(not(target_os = "linux"))]
pub use announcer::SystemAnnouncer;
pub use scheduler::{CalloutScheduler, Cue, CueKey, Directive};
