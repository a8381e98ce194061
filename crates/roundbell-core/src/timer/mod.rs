mod config;
mod engine;
mod state;

pub use config::{SessionConfig, WorkoutMode};
pub use engine::TimerEngine;
pub use state::{Command, Phase, Status, TimerState};

/// Render seconds as `MM:SS`.
pub fn format_mmss(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
