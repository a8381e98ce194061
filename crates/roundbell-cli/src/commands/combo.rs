use clap::Subcommand;

use super::open_session;

#[derive(Subcommand)]
pub enum ComboAction {
    /// List the combo library
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a combo, e.g. `1-2-3` or `1 2 3`
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Remove a combo by value or by its position in `combo list`
    Remove {
        /// 1-based position as shown by `combo list`
        #[arg(long, conflicts_with = "combo")]
        index: Option<usize>,
        #[arg(num_args = 1.., required_unless_present = "index")]
        combo: Vec<String>,
    },
}

pub fn run(action: ComboAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;

    match action {
        ComboAction::List { json } => {
            let combos = session.combos().combos();
            if json {
                println!("{}", serde_json::to_string_pretty(combos)?);
            } else if combos.is_empty() {
                println!("No combos.");
            } else {
                for (i, combo) in combos.iter().enumerate() {
                    println!("{:>3}. {combo}", i + 1);
                }
            }
        }
        ComboAction::Add { text } => {
            let combo = session.add_combo(&text.join(" "))?;
            println!("Added: {combo}");
        }
        ComboAction::Remove {
            index: Some(index),
            ..
        } => {
            let removed = index
                .checked_sub(1)
                .and_then(|i| session.remove_combo_at(i))
                .ok_or_else(|| format!("no combo at position {index}"))?;
            println!("Removed: {removed}");
        }
        ComboAction::Remove { index: None, combo } => {
            let combo = combo.join(" ");
            if !session.remove_combo(&combo) {
                return Err(format!("combo not found: {combo}").into());
            }
            println!("Removed: {combo}");
        }
    }
    Ok(())
}
