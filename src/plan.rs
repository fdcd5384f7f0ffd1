//! Workout plan loading.
//!
//! The initial [`Run`] comes from `--exercise` flags, a JSON plan file, or empty
//! placeholder slots, in that order of preference.

use crate::model::{DurationUnit, Exercise, ExerciseStatus, Run, SequencePolicy};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Raw `NAME=DURATION` pair from the command line; the duration is resolved once the
/// unit is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseArg {
    pub name: String,
    pub duration: String,
}

/// clap value parser for `--exercise`.
pub fn parse_exercise_arg(s: &str) -> std::result::Result<ExerciseArg, String> {
    let (name, duration) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=DURATION, got `{s}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing exercise name in `{s}`"));
    }
    let duration = duration.trim();
    parse_duration_value(duration, DurationUnit::Seconds)?;
    Ok(ExerciseArg {
        name: name.to_string(),
        duration: duration.to_string(),
    })
}

/// A bare integer is taken in `unit`; anything else must be a humantime duration
/// such as `90s` or `2m` that is a whole number of `unit`.
pub fn parse_duration_value(s: &str, unit: DurationUnit) -> std::result::Result<u32, String> {
    if let Ok(n) = s.parse::<u32>() {
        return Ok(n);
    }
    let d = humantime::parse_duration(s).map_err(|e| format!("invalid duration `{s}`: {e}"))?;
    unit.from_duration(d)
        .ok_or_else(|| format!("duration `{s}` is not a whole number of {}", unit.label()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum PlanDuration {
    Units(u32),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
struct PlanEntry {
    name: String,
    #[serde(default)]
    duration: Option<PlanDuration>,
}

/// On-disk plan: `{ "unit": "seconds", "exercises": [{ "name": "Plank", "duration": 60 }] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanFile {
    #[serde(default)]
    pub unit: Option<DurationUnit>,
    #[serde(default)]
    exercises: Vec<PlanEntry>,
}

pub fn load_plan(path: &Path) -> Result<PlanFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read plan {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse plan {}", path.display()))
}

/// Inputs for [`build_run`], gathered from CLI flags.
pub struct PlanSource<'a> {
    pub exercises: &'a [ExerciseArg],
    pub plan: Option<PlanFile>,
    pub unit: Option<DurationUnit>,
    pub slots: u32,
    pub policy: SequencePolicy,
}

/// Assemble the initial setup. Entries are numbered from 1 and padded with empty
/// placeholders up to `slots`.
pub fn build_run(src: PlanSource<'_>) -> Result<Run> {
    let unit = src
        .unit
        .or_else(|| src.plan.as_ref().and_then(|p| p.unit))
        .unwrap_or_default();

    let entries: Vec<(String, u32)> = if !src.exercises.is_empty() {
        src.exercises
            .iter()
            .map(|a| {
                parse_duration_value(&a.duration, unit)
                    .map(|d| (a.name.clone(), d))
                    .map_err(anyhow::Error::msg)
                    .with_context(|| format!("exercise `{}`", a.name))
            })
            .collect::<Result<_>>()?
    } else if let Some(plan) = src.plan {
        plan.exercises
            .into_iter()
            .map(|e| {
                let duration = match e.duration {
                    None => 0,
                    Some(PlanDuration::Units(n)) => n,
                    Some(PlanDuration::Text(t)) => parse_duration_value(&t, unit)
                        .map_err(anyhow::Error::msg)
                        .with_context(|| format!("exercise `{}`", e.name))?,
                };
                Ok((e.name, duration))
            })
            .collect::<Result<_>>()?
    } else {
        let policy = SequencePolicy { unit, ..src.policy };
        return Ok(Run::with_placeholders(src.slots, policy));
    };

    let mut exercises: Vec<Exercise> = entries
        .into_iter()
        .zip(1u32..)
        .map(|((name, duration), id)| Exercise {
            id,
            name,
            duration,
            status: ExerciseStatus::Waiting,
            time_remaining: unit.to_seconds(duration),
        })
        .collect();
    let next_id = exercises.len() as u32 + 1;
    exercises.extend((next_id..=src.slots).map(Exercise::placeholder));

    Ok(Run::new(
        exercises,
        SequencePolicy {
            unit,
            ..src.policy
        },
    ))
}
