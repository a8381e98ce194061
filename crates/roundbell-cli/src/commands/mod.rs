pub mod combo;
pub mod config;
pub mod hiit;
pub mod run;
pub mod settings;

use roundbell_core::{Announcer, Config, KvStore, Session, SilentAnnouncer, Timing};

/// Session backed by the on-disk store, for commands that only edit settings.
pub fn open_session() -> Result<Session, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    open_session_with(&config, Box::new(SilentAnnouncer))
}

pub fn open_session_with(
    config: &Config,
    announcer: Box<dyn Announcer>,
) -> Result<Session, Box<dyn std::error::Error>> {
    let store = KvStore::open_default()?;
    Ok(Session::new(Timing::from(config), Box::new(store), announcer))
}
