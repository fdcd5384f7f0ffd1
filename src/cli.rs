use crate::logging::{self, LogSink};
use crate::model::{
    CompletionPolicy, DurationUnit, Run, RunSummary, SequencePolicy, StartPolicy, TimerEvent,
};
use crate::orchestrator::{run_controller, UiCommand};
use crate::plan::{self, ExerciseArg, PlanSource};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "workout-timer",
    version,
    about = "Sequenced exercise countdown timer with optional TUI"
)]
pub struct Cli {
    /// Exercise as NAME=DURATION (repeatable). A bare number uses --unit; `90s`/`2m` also work
    #[arg(short, long = "exercise", value_name = "NAME=DURATION", value_parser = plan::parse_exercise_arg)]
    pub exercises: Vec<ExerciseArg>,

    /// JSON workout plan to load (ignored when --exercise is given)
    #[arg(long)]
    pub plan: Option<std::path::PathBuf>,

    /// Unit for bare duration numbers [default: seconds, or the plan's unit]
    #[arg(long, value_enum)]
    pub unit: Option<DurationUnit>,

    /// Whether exercises run one after another or all at once
    #[arg(long, value_enum, default_value_t = StartPolicy::Sequential)]
    pub start_policy: StartPolicy,

    /// What acknowledging a ready exercise does
    #[arg(long, value_enum, default_value_t = CompletionPolicy::Advance)]
    pub on_complete: CompletionPolicy,

    /// Minimum number of exercise slots shown in the setup form
    #[arg(long, default_value_t = 3)]
    pub slots: u32,

    /// Countdown tick period
    #[arg(long, default_value = "1s")]
    pub tick_interval: humantime::Duration,

    /// Run headless, print progress and a text summary (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Run headless and print the final state as JSON (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    pub fn is_headless(&self) -> bool {
        self.text || self.json || !cfg!(feature = "tui")
    }
}

/// Build the initial setup from CLI arguments.
pub fn build_run(args: &Cli) -> Result<Run> {
    let plan = args
        .plan
        .as_deref()
        .map(plan::load_plan)
        .transpose()?;
    plan::build_run(PlanSource {
        exercises: &args.exercises,
        plan,
        unit: args.unit,
        slots: args.slots,
        policy: SequencePolicy {
            unit: DurationUnit::default(),
            start: args.start_policy,
            completion: args.on_complete,
        },
    })
}

pub async fn run(args: Cli) -> Result<()> {
    if args.tick_interval.as_secs_f64() <= 0.0 {
        return Err(anyhow::anyhow!("--tick-interval must be greater than zero"));
    }

    let initial = build_run(&args)?;

    if !args.is_headless() {
        #[cfg(feature = "tui")]
        {
            let log_path = logging::init(LogSink::File, &args.log_level)?;
            tracing::info!(log = ?log_path, "starting tui");
            return crate::tui::run(args, initial).await;
        }
    }

    logging::init(LogSink::Stderr, &args.log_level)?;
    run_headless(args, initial).await
}

/// Start immediately, acknowledge every ready exercise, and stop when the run finishes.
async fn run_headless(args: Cli, initial: Run) -> Result<()> {
    if initial.valid_exercises().next().is_none() {
        return Err(anyhow::anyhow!(
            "no valid exercises: pass --exercise NAME=DURATION or --plan FILE"
        ));
    }
    // Auto-acknowledging a repeating exercise would never finish.
    if initial.policy.completion == CompletionPolicy::Repeat {
        return Err(anyhow::anyhow!(
            "--on-complete repeat needs the TUI; headless runs always advance"
        ));
    }

    let (out_tx, out_handle) = spawn_output_writer();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<TimerEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let period = Duration::from(args.tick_interval);
    let handle = tokio::spawn(run_controller(initial, period, event_tx, cmd_rx));
    let _ = cmd_tx.send(UiCommand::Start);

    let mut summary: Option<RunSummary> = None;
    let mut last_active: Vec<u32> = Vec::new();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let res: Result<()> = loop {
        tokio::select! {
            ev = event_rx.recv() => {
                let Some(ev) = ev else { break Ok(()); };
                match ev {
                    TimerEvent::Snapshot(run) => {
                        let active = active_ids(&run);
                        if active != last_active {
                            let started = run
                                .exercises
                                .iter()
                                .filter(|e| active.contains(&e.id) && !last_active.contains(&e.id));
                            for ex in started {
                                let _ = out_tx.send(OutputLine::Stderr(format!(
                                    "▶ {} ({})",
                                    ex.name.trim(),
                                    crate::progress::format_clock(ex.time_remaining)
                                )));
                            }
                            last_active = active;
                        }
                    }
                    TimerEvent::Notification(n) => {
                        let _ = out_tx.send(OutputLine::Stderr(format!("✓ {} {}", n.title, n.body)));
                        let _ = cmd_tx.send(UiCommand::Complete { id: n.exercise_id });
                    }
                    TimerEvent::Finished(s) => {
                        summary = Some(*s);
                        let _ = cmd_tx.send(UiCommand::Quit);
                    }
                    TimerEvent::Info(info) => {
                        let _ = out_tx.send(OutputLine::Stderr(info.to_message()));
                    }
                }
            }
            _ = &mut ctrl_c => {
                let _ = out_tx.send(OutputLine::Stderr("Interrupted".into()));
                let _ = cmd_tx.send(UiCommand::Quit);
                break Ok(());
            }
        }
    };

    let final_run = handle
        .await
        .context("controller task failed")??;
    res?;

    for line in final_report(args.json, summary.as_ref(), &final_run)? {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

/// Stdout lines printed once a headless run ends. JSON falls back to the final run
/// when the workout was interrupted before it finished.
fn final_report(json: bool, summary: Option<&RunSummary>, final_run: &Run) -> Result<Vec<String>> {
    if json {
        let out = match summary {
            Some(s) => serde_json::to_string_pretty(s)?,
            None => serde_json::to_string_pretty(final_run)?,
        };
        return Ok(vec![out]);
    }
    Ok(summary
        .map(|s| crate::text_summary::build_text_summary(s).lines)
        .unwrap_or_default())
}

fn active_ids(run: &Run) -> Vec<u32> {
    run.exercises
        .iter()
        .filter(|e| e.status == crate::model::ExerciseStatus::Active)
        .map(|e| e.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_exercises_and_policies() {
        let args = Cli::try_parse_from([
            "workout-timer",
            "-e",
            "Push-ups=30",
            "--exercise",
            "Plank=1m",
            "--on-complete",
            "repeat",
            "--start-policy",
            "simultaneous",
            "--text",
        ])
        .expect("parse args");
        assert!(args.is_headless());
        let run = build_run(&args).expect("build run");
        assert_eq!(run.policy.completion, CompletionPolicy::Repeat);
        assert_eq!(run.policy.start, StartPolicy::Simultaneous);
        assert_eq!(run.exercises[1].name, "Plank");
        assert_eq!(run.exercises[1].duration, 60);
        assert_eq!(run.exercises.len(), 3);
    }

    #[test]
    fn test_cli_minutes_unit() {
        let args = Cli::try_parse_from(["workout-timer", "-e", "Run=5", "--unit", "minutes"])
            .expect("parse args");
        let run = build_run(&args).expect("build run");
        assert_eq!(run.policy.unit, DurationUnit::Minutes);
        assert_eq!(run.exercises[0].time_remaining, 300);
    }

    #[test]
    fn test_cli_rejects_malformed_exercise() {
        assert!(Cli::try_parse_from(["workout-timer", "-e", "Plank"]).is_err());
    }

    #[tokio::test]
    async fn test_headless_run_completes() {
        let args = Cli::try_parse_from([
            "workout-timer",
            "-e",
            "A=2",
            "-e",
            "B=1",
            "--tick-interval",
            "10ms",
            "--text",
        ])
        .expect("parse args");
        let initial = build_run(&args).expect("build run");
        run_headless(args, initial).await.expect("headless run");
    }

    #[tokio::test]
    async fn test_headless_json_run_completes() {
        let args = Cli::try_parse_from([
            "workout-timer",
            "-e",
            "A=1",
            "--tick-interval",
            "10ms",
            "--json",
        ])
        .expect("parse args");
        assert!(args.is_headless());
        let initial = build_run(&args).expect("build run");
        run_headless(args, initial).await.expect("headless run");
    }

    #[tokio::test]
    async fn test_headless_rejects_repeat_policy() {
        let args = Cli::try_parse_from([
            "workout-timer",
            "-e",
            "A=1",
            "--on-complete",
            "repeat",
            "--text",
        ])
        .expect("parse args");
        let initial = build_run(&args).expect("build run");
        let err = run_headless(args, initial).await.unwrap_err();
        assert!(err.to_string().contains("repeat"), "{err}");
    }

    #[test]
    fn test_final_report_json_and_text() {
        let mut run = build_run(
            &Cli::try_parse_from(["workout-timer", "-e", "Plank=45", "--slots", "0"])
                .expect("parse args"),
        )
        .expect("build run");
        run.mode = crate::model::Mode::Running;
        run.exercises[0].status = crate::model::ExerciseStatus::Completed;
        let summary = RunSummary {
            started_at_utc: "2024-01-01T00:00:00Z".into(),
            finished_at_utc: "2024-01-01T00:00:46Z".into(),
            elapsed: Duration::from_secs(46),
            run: run.clone(),
        };

        let lines = final_report(true, Some(&summary), &run).expect("json report");
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&lines[0]).expect("valid json");
        assert_eq!(value["elapsed"], "46s");
        assert_eq!(value["run"]["exercises"][0]["name"], "Plank");
        assert_eq!(value["run"]["exercises"][0]["status"], "completed");

        // Interrupted: no summary, the final run is printed instead.
        let lines = final_report(true, None, &run).expect("json report");
        let value: serde_json::Value = serde_json::from_str(&lines[0]).expect("valid json");
        assert_eq!(value["mode"], "running");

        let lines = final_report(false, Some(&summary), &run).expect("text report");
        assert!(lines.iter().any(|l| l.contains("Completed 1/1 exercises")));
        assert!(final_report(false, None, &run).expect("text report").is_empty());
    }

    #[tokio::test]
    async fn test_headless_requires_valid_exercise() {
        let args = Cli::try_parse_from(["workout-timer", "--text"]).expect("parse args");
        let initial = build_run(&args).expect("build run");
        assert!(run_headless(args, initial).await.is_err());
    }
}
