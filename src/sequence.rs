//! Exercise sequencing state machine.
//!
//! Every transition takes the current [`Run`] by reference and returns the next one.
//! Nothing here fails: bad input, unknown ids and empty setups leave the state as it was.

use crate::model::{
    CompletionPolicy, ExerciseField, ExerciseStatus, Mode, Notification, Run, StartPolicy,
};

/// State after one tick plus the notifications it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub run: Run,
    pub notifications: Vec<Notification>,
}

/// Coerce form input to a duration; anything that is not a non-negative integer becomes 0.
pub fn parse_duration_input(value: &str) -> u32 {
    value.trim().parse::<u32>().unwrap_or(0)
}

/// Update the name or duration of exercise `id`.
/// Changing the duration also resets its countdown to the new full length.
pub fn edit_exercise(run: &Run, id: u32, field: ExerciseField, value: &str) -> Run {
    let mut next = run.clone();
    let unit = next.policy.unit;
    let Some(ex) = next.exercises.iter_mut().find(|e| e.id == id) else {
        return next;
    };
    match field {
        ExerciseField::Name => ex.name = value.to_string(),
        ExerciseField::Duration => {
            ex.duration = parse_duration_input(value);
            ex.time_remaining = unit.to_seconds(ex.duration);
        }
    }
    next
}

/// Enter running mode. A setup without any valid exercise is returned unchanged.
pub fn start(run: &Run) -> Run {
    let Some(first_valid) = run.exercises.iter().position(|e| e.is_valid()) else {
        return run.clone();
    };

    let mut next = run.clone();
    next.mode = Mode::Running;
    let unit = next.policy.unit;
    let policy = next.policy.start;
    for (idx, ex) in next.exercises.iter_mut().enumerate() {
        ex.time_remaining = unit.to_seconds(ex.duration);
        let activate = match policy {
            StartPolicy::Sequential => idx == first_valid,
            StartPolicy::Simultaneous => ex.is_valid(),
        };
        ex.status = if activate {
            ExerciseStatus::Active
        } else {
            ExerciseStatus::Waiting
        };
    }
    next
}

/// Acknowledge exercise `id`.
///
/// With [`CompletionPolicy::Advance`] it is marked completed and the next valid waiting
/// exercise after it becomes active. With [`CompletionPolicy::Repeat`] the same exercise
/// restarts from its full duration. Only a ready exercise of a running workout can be
/// acknowledged; anything else returns the run unchanged.
pub fn complete_exercise(run: &Run, id: u32) -> Run {
    let mut next = run.clone();
    if next.mode != Mode::Running {
        return next;
    }
    let unit = next.policy.unit;
    let Some(idx) = next
        .exercises
        .iter()
        .position(|e| e.id == id && e.status == ExerciseStatus::Ready)
    else {
        return next;
    };

    match next.policy.completion {
        CompletionPolicy::Advance => {
            let ex = &mut next.exercises[idx];
            ex.status = ExerciseStatus::Completed;
            ex.time_remaining = unit.to_seconds(ex.duration);

            if let Some(following) = next.exercises[idx + 1..]
                .iter_mut()
                .find(|e| e.is_valid() && e.status == ExerciseStatus::Waiting)
            {
                following.status = ExerciseStatus::Active;
                following.time_remaining = unit.to_seconds(following.duration);
            }
        }
        CompletionPolicy::Repeat => {
            let ex = &mut next.exercises[idx];
            ex.status = ExerciseStatus::Active;
            ex.time_remaining = unit.to_seconds(ex.duration);
        }
    }
    next
}

/// Advance every active countdown by one second.
/// The tick that brings a countdown to zero also moves it to ready.
pub fn tick(run: &Run) -> TickOutcome {
    let mut next = run.clone();
    let mut notifications = Vec::new();
    if next.mode != Mode::Running {
        return TickOutcome {
            run: next,
            notifications,
        };
    }

    for ex in next
        .exercises
        .iter_mut()
        .filter(|e| e.status == ExerciseStatus::Active)
    {
        ex.time_remaining = ex.time_remaining.saturating_sub(1);
        if ex.time_remaining == 0 {
            ex.status = ExerciseStatus::Ready;
            notifications.push(Notification::ready(ex));
        }
    }

    TickOutcome {
        run: next,
        notifications,
    }
}

/// Back to setup with every exercise waiting at full length. Names and durations survive.
pub fn reset(run: &Run) -> Run {
    let mut next = run.clone();
    next.mode = Mode::Setup;
    let unit = next.policy.unit;
    for ex in next.exercises.iter_mut() {
        ex.status = ExerciseStatus::Waiting;
        ex.time_remaining = unit.to_seconds(ex.duration);
    }
    next
}
