use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseStatus {
    #[default]
    Waiting,
    Active,
    Ready,
    Completed,
}

impl ExerciseStatus {
    pub fn label(self) -> &'static str {
        match self {
            ExerciseStatus::Waiting => "waiting",
            ExerciseStatus::Active => "active",
            ExerciseStatus::Ready => "ready",
            ExerciseStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Setup,
    Running,
}

/// Unit the `duration` field of an exercise is expressed in.
/// `time_remaining` is always in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    #[default]
    Seconds,
    Minutes,
}

impl DurationUnit {
    pub fn to_seconds(self, duration: u32) -> u32 {
        match self {
            DurationUnit::Seconds => duration,
            DurationUnit::Minutes => duration.saturating_mul(60),
        }
    }

    /// Express a wall-clock duration in this unit. `None` unless it is a whole
    /// number of units that fits in a `u32`.
    pub fn from_duration(self, d: Duration) -> Option<u32> {
        if d.subsec_nanos() != 0 {
            return None;
        }
        let per_unit = self.to_seconds(1) as u64;
        let secs = d.as_secs();
        if secs % per_unit != 0 {
            return None;
        }
        u32::try_from(secs / per_unit).ok()
    }

    pub fn label(self) -> &'static str {
        match self {
            DurationUnit::Seconds => "seconds",
            DurationUnit::Minutes => "minutes",
        }
    }
}

/// Which valid exercises become active when a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StartPolicy {
    /// Only the first valid exercise; the rest follow one at a time.
    #[default]
    Sequential,
    /// Every valid exercise counts down at once.
    Simultaneous,
}

/// What acknowledging a ready exercise does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CompletionPolicy {
    /// Mark it completed and activate the next valid exercise.
    #[default]
    Advance,
    /// Restart the same exercise with its full duration.
    Repeat,
}

/// Policy knobs fixed for the lifetime of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SequencePolicy {
    pub unit: DurationUnit,
    pub start: StartPolicy,
    pub completion: CompletionPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: u32,
    pub name: String,
    /// Configured length in the run's [`DurationUnit`].
    pub duration: u32,
    pub status: ExerciseStatus,
    /// Seconds left on the countdown.
    pub time_remaining: u32,
}

impl Exercise {
    /// Empty setup slot, as shown before the user fills in the form.
    pub fn placeholder(id: u32) -> Self {
        Self {
            id,
            name: String::new(),
            duration: 0,
            status: ExerciseStatus::Waiting,
            time_remaining: 0,
        }
    }

    /// Eligible to take part in a run: non-blank name and positive duration.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.duration > 0
    }
}

/// Field of an exercise the setup form can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseField {
    Name,
    Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub exercises: Vec<Exercise>,
    pub mode: Mode,
    pub policy: SequencePolicy,
}

impl Run {
    pub fn new(exercises: Vec<Exercise>, policy: SequencePolicy) -> Self {
        Self {
            exercises,
            mode: Mode::Setup,
            policy,
        }
    }

    /// A run with `slots` empty placeholder exercises, ids starting at 1.
    pub fn with_placeholders(slots: u32, policy: SequencePolicy) -> Self {
        Self::new((1..=slots).map(Exercise::placeholder).collect(), policy)
    }

    pub fn get(&self, id: u32) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn valid_exercises(&self) -> impl Iterator<Item = &Exercise> {
        self.exercises.iter().filter(|e| e.is_valid())
    }

    pub fn active_count(&self) -> usize {
        self.exercises
            .iter()
            .filter(|e| e.status == ExerciseStatus::Active)
            .count()
    }

    /// Running, but nothing is left counting down or awaiting acknowledgement.
    pub fn is_finished(&self) -> bool {
        self.mode == Mode::Running
            && !self.exercises.iter().any(|e| {
                matches!(e.status, ExerciseStatus::Active | ExerciseStatus::Ready)
            })
    }

    /// Full countdown length of an exercise, in seconds.
    pub fn full_time(&self, exercise: &Exercise) -> u32 {
        self.policy.unit.to_seconds(exercise.duration)
    }
}

/// Payload for the toast/alert collaborator when an exercise is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub exercise_id: u32,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn ready(exercise: &Exercise) -> Self {
        Self {
            exercise_id: exercise.id,
            title: format!("{} is ready!", exercise.name),
            body: "Time to exercise! Click the button when done.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TimerEvent {
    /// Current state after a mutation (and once at startup).
    Snapshot(Box<Run>),
    Notification(Notification),
    /// Emitted once when every exercise of a running sequence is done.
    Finished(Box<RunSummary>),
    Info(InfoEvent),
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Started { active: Vec<String> },
    NothingToStart,
    Reset,
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Started { active } => format!("Workout started: {}", active.join(", ")),
            InfoEvent::NothingToStart => {
                "Add at least one exercise with a name and duration".to_string()
            }
            InfoEvent::Reset => "Workout reset".to_string(),
        }
    }
}

/// Result of a finished run, ready for presentation layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at_utc: String,
    pub finished_at_utc: String,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    pub run: Run,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_duration_requires_whole_units() {
        let secs = Duration::from_secs;
        assert_eq!(DurationUnit::Seconds.from_duration(secs(90)), Some(90));
        assert_eq!(DurationUnit::Minutes.from_duration(secs(120)), Some(2));
        assert_eq!(DurationUnit::Minutes.from_duration(secs(90)), None);
        assert_eq!(DurationUnit::Minutes.from_duration(secs(30)), None);
        assert_eq!(
            DurationUnit::Seconds.from_duration(Duration::from_millis(1500)),
            None
        );
        assert_eq!(DurationUnit::Seconds.from_duration(secs(u64::MAX)), None);
    }
}
