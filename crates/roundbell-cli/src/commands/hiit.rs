use clap::Subcommand;
use roundbell_core::catalog::HIIT_CATEGORIES;
use roundbell_core::timer::format_mmss;

use super::open_session;

#[derive(Subcommand)]
pub enum HiitAction {
    /// Show the exercise catalog, marking the current selection
    Catalog,
    /// Replace the selection (quote names with spaces: "Jump Squats")
    Select {
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,
    },
    /// Add or remove one exercise from the selection
    Toggle {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Set work and/or rest seconds
    Timing {
        #[arg(long)]
        work: Option<u32>,
        #[arg(long)]
        rest: Option<u32>,
    },
    /// Print HIIT timing and selection
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: HiitAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;

    match action {
        HiitAction::Catalog => {
            let selected = session.selected_exercises();
            for (category, exercises) in HIIT_CATEGORIES {
                println!("{category}");
                for exercise in *exercises {
                    let mark = if selected.iter().any(|s| s == exercise) { "x" } else { " " };
                    println!("  [{mark}] {exercise}");
                }
            }
        }
        HiitAction::Select { names } => {
            session.set_selected_exercises(names.as_slice())?;
            println!("Selected: {}", session.selected_exercises().join(", "));
        }
        HiitAction::Toggle { name } => {
            let name = name.join(" ");
            let on = session.toggle_exercise(&name)?;
            println!("{name}: {}", if on { "selected" } else { "removed" });
        }
        HiitAction::Timing { work, rest } => {
            if work.is_none() && rest.is_none() {
                return Err("nothing to change: pass --work and/or --rest".into());
            }
            if let Some(work) = work {
                session.set_hiit_work_seconds(work);
            }
            if let Some(rest) = rest {
                session.set_hiit_rest_seconds(rest);
            }
            let hiit = session.hiit_settings();
            println!(
                "Work {} / Rest {}",
                format_mmss(hiit.work_seconds),
                format_mmss(hiit.rest_seconds)
            );
        }
        HiitAction::Show { json } => {
            let hiit = session.hiit_settings();
            let rounds = session.timing().hiit_rounds;
            let exercises = session.selected_exercises();
            if json {
                let value = serde_json::json!({
                    "rounds": rounds,
                    "workSeconds": hiit.work_seconds,
                    "restSeconds": hiit.rest_seconds,
                    "exercises": exercises,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("Rounds:    {rounds}");
                println!("Work:      {}", format_mmss(hiit.work_seconds));
                println!("Rest:      {}", format_mmss(hiit.rest_seconds));
                if exercises.is_empty() {
                    println!("Exercises: (none, select at least one to start)");
                } else {
                    println!("Exercises: {}", exercises.join(", "));
                }
            }
        }
    }
    Ok(())
}
