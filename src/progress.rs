use crate::model::{Exercise, ExerciseStatus, Run};

/// Format seconds as `m:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Fraction of the countdown already elapsed, clamped to `0.0..=1.0`.
/// Ready and completed exercises are always full; a zero-length exercise is empty.
pub fn progress_ratio(run: &Run, exercise: &Exercise) -> f64 {
    match exercise.status {
        ExerciseStatus::Ready | ExerciseStatus::Completed => return 1.0,
        ExerciseStatus::Waiting | ExerciseStatus::Active => {}
    }
    let total = run.full_time(exercise);
    if total == 0 {
        return 0.0;
    }
    let elapsed = total.saturating_sub(exercise.time_remaining);
    (elapsed as f64 / total as f64).clamp(0.0, 1.0)
}

/// Totals over the valid exercises of a run: (completed, valid, configured seconds).
pub fn run_totals(run: &Run) -> (usize, usize, u64) {
    run.valid_exercises().fold((0, 0, 0), |(done, valid, secs), e| {
        let done = done + usize::from(e.status == ExerciseStatus::Completed);
        (done, valid + 1, secs + u64::from(run.full_time(e)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DurationUnit, SequencePolicy};

    fn single(duration: u32, status: ExerciseStatus, time_remaining: u32) -> Run {
        Run::new(
            vec![Exercise {
                id: 1,
                name: "Plank".into(),
                duration,
                status,
                time_remaining,
            }],
            SequencePolicy::default(),
        )
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(45), "0:45");
        assert_eq!(format_clock(125), "2:05");
        assert_eq!(format_clock(3661), "61:01");
    }

    #[test]
    fn test_progress_ratio_active() {
        let run = single(60, ExerciseStatus::Active, 15);
        assert!((progress_ratio(&run, &run.exercises[0]) - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_ratio_edges() {
        let run = single(60, ExerciseStatus::Ready, 0);
        assert_eq!(progress_ratio(&run, &run.exercises[0]), 1.0);
        let run = single(60, ExerciseStatus::Completed, 60);
        assert_eq!(progress_ratio(&run, &run.exercises[0]), 1.0);
        let run = single(0, ExerciseStatus::Active, 0);
        assert_eq!(progress_ratio(&run, &run.exercises[0]), 0.0);
        let run = single(60, ExerciseStatus::Waiting, 60);
        assert_eq!(progress_ratio(&run, &run.exercises[0]), 0.0);
    }

    #[test]
    fn test_progress_ratio_uses_minutes() {
        let mut run = single(2, ExerciseStatus::Active, 60);
        run.policy.unit = DurationUnit::Minutes;
        assert!((progress_ratio(&run, &run.exercises[0]) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_run_totals_counts_valid_only() {
        let mut run = Run::with_placeholders(3, SequencePolicy::default());
        run.exercises[0].name = "Squats".into();
        run.exercises[0].duration = 45;
        run.exercises[0].status = ExerciseStatus::Completed;
        run.exercises[1].name = "Lunges".into();
        run.exercises[1].duration = 30;
        assert_eq!(run_totals(&run), (1, 2, 75));
    }
}
