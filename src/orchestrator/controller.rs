//! Sequence controller.
//!
//! Owns the [`Run`], applies user commands and periodic ticks one at a time, and emits
//! snapshots and notifications for presentation layers.

use super::ticker::Ticker;
use crate::model::{
    ExerciseField, ExerciseStatus, InfoEvent, Mode, Run, RunSummary, TimerEvent,
};
use crate::sequence;
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

/// Commands emitted by UI layers to drive the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UiCommand {
    Edit {
        id: u32,
        field: ExerciseField,
        value: String,
    },
    Start,
    Complete {
        id: u32,
    },
    Reset,
    Quit,
}

/// Wall-clock bookkeeping for the run in progress.
struct RunClock {
    started: Instant,
    started_at_utc: String,
    finished_reported: bool,
}

struct Controller {
    run: Run,
    ticker: Ticker,
    event_tx: UnboundedSender<TimerEvent>,
    clock: Option<RunClock>,
}

impl Controller {
    fn new(run: Run, tick_period: Duration, event_tx: UnboundedSender<TimerEvent>) -> Self {
        Self {
            run,
            ticker: Ticker::new(tick_period),
            event_tx,
            clock: None,
        }
    }

    fn emit(&self, ev: TimerEvent) {
        let _ = self.event_tx.send(ev);
    }

    fn info(&self, ev: InfoEvent) {
        self.emit(TimerEvent::Info(ev));
    }

    fn publish(&self) {
        self.emit(TimerEvent::Snapshot(Box::new(self.run.clone())));
    }

    /// Apply one command. Returns `false` once the controller should stop.
    fn handle(&mut self, cmd: UiCommand) -> bool {
        debug!(?cmd, "command received");
        match cmd {
            UiCommand::Edit { id, field, value } => {
                if self.run.mode == Mode::Running {
                    debug!(id, "editing exercise while running");
                }
                self.run = sequence::edit_exercise(&self.run, id, field, &value);
            }
            UiCommand::Start => {
                let next = sequence::start(&self.run);
                if next.mode == Mode::Running {
                    self.run = next;
                    // Starting always replaces whatever timer was outstanding.
                    self.ticker.arm();
                    self.clock = Some(RunClock {
                        started: Instant::now(),
                        started_at_utc: now_rfc3339(),
                        finished_reported: false,
                    });
                    let active: Vec<String> = self
                        .run
                        .exercises
                        .iter()
                        .filter(|e| e.status == ExerciseStatus::Active)
                        .map(|e| e.name.clone())
                        .collect();
                    info!(
                        exercises = self.run.valid_exercises().count(),
                        active = self.run.active_count(),
                        "workout started"
                    );
                    self.info(InfoEvent::Started { active });
                } else {
                    debug!("start ignored: no valid exercises");
                    self.info(InfoEvent::NothingToStart);
                }
            }
            UiCommand::Complete { id } => {
                let next = sequence::complete_exercise(&self.run, id);
                if next == self.run {
                    debug!(id, "complete ignored: exercise not ready");
                } else {
                    self.run = next;
                    if let Some(ex) = self.run.get(id) {
                        info!(id, exercise = %ex.name, status = ex.status.label(), "exercise acknowledged");
                    }
                }
            }
            UiCommand::Reset => {
                self.run = sequence::reset(&self.run);
                self.clock = None;
                info!("workout reset");
                self.info(InfoEvent::Reset);
            }
            UiCommand::Quit => return false,
        }
        self.after_mutation();
        true
    }

    fn on_tick(&mut self) {
        let outcome = sequence::tick(&self.run);
        self.run = outcome.run;
        for n in outcome.notifications {
            info!(id = n.exercise_id, title = %n.title, "exercise ready");
            self.emit(TimerEvent::Notification(n));
        }
        self.after_mutation();
    }

    /// Keep the timer armed only while something can still count down, and report the
    /// end of a run exactly once.
    fn after_mutation(&mut self) {
        let finished = self.run.is_finished();
        if self.run.mode != Mode::Running || finished {
            self.ticker.disarm();
        } else if !self.ticker.is_armed() {
            self.ticker.arm();
        }

        self.publish();

        if finished {
            if let Some(clock) = self.clock.as_mut() {
                if !clock.finished_reported {
                    clock.finished_reported = true;
                    let summary = RunSummary {
                        started_at_utc: clock.started_at_utc.clone(),
                        finished_at_utc: now_rfc3339(),
                        elapsed: clock.started.elapsed(),
                        run: self.run.clone(),
                    };
                    info!(elapsed = ?summary.elapsed, "workout finished");
                    self.emit(TimerEvent::Finished(Box::new(summary)));
                }
            }
        }
    }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}

/// Serialize UI commands and ticks until `Quit` or the command channel closes.
/// Returns the final state of the run.
pub(crate) async fn run_controller(
    initial: Run,
    tick_period: Duration,
    event_tx: UnboundedSender<TimerEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<Run> {
    let mut ctl = Controller::new(initial, tick_period, event_tx);
    ctl.publish();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(cmd) => {
                        if !ctl.handle(cmd) {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = ctl.ticker.tick() => ctl.on_tick(),
        }
    }

    // Dropping the controller releases the timer.
    let Controller { run, .. } = ctl;
    Ok(run)
}
