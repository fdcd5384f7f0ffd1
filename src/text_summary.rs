//! Text summary builder for CLI output.
//!
//! Formats human-readable lines for a finished (or interrupted) run in text mode.

use crate::model::{ExerciseStatus, RunSummary};
use crate::progress::{format_clock, run_totals};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a finished run.
pub(crate) fn build_text_summary(summary: &RunSummary) -> TextSummary {
    let run = &summary.run;
    let mut lines = Vec::new();

    lines.push(format!("Started:  {}", summary.started_at_utc));
    lines.push(format!("Finished: {}", summary.finished_at_utc));

    let name_width = run
        .valid_exercises()
        .map(|e| e.name.chars().count())
        .max()
        .unwrap_or(0);

    for (idx, ex) in run.valid_exercises().enumerate() {
        let mark = match ex.status {
            ExerciseStatus::Completed => "x",
            ExerciseStatus::Ready => "!",
            ExerciseStatus::Active => ">",
            ExerciseStatus::Waiting => " ",
        };
        lines.push(format!(
            "[{mark}] {:>2}. {:<width$}  {:>6}  {}",
            idx + 1,
            ex.name.trim(),
            format_clock(run.full_time(ex)),
            ex.status.label(),
            width = name_width,
        ));
    }

    let (done, valid, planned_secs) = run_totals(run);
    lines.push(format!(
        "Completed {done}/{valid} exercises, {} planned, {} elapsed",
        format_clock(u32::try_from(planned_secs).unwrap_or(u32::MAX)),
        humantime::format_duration(std::time::Duration::from_secs(summary.elapsed.as_secs())),
    ));

    TextSummary { lines }
}
