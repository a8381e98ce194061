use clap::Subcommand;
use roundbell_core::storage::SessionSettings;

use super::open_session;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print everything the session restores on start
    Show,
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session()?;

    match action {
        SettingsAction::Show => {
            let value = serde_json::json!({
                "session": SessionSettings::from_config(session.config()),
                "hiit": session.hiit_settings(),
                "exercises": session.selected_exercises(),
                "combos": session.combos(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}
