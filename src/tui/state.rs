use crate::model::{Exercise, ExerciseField, ExerciseStatus, Mode, Notification, Run, TimerEvent};
use std::time::{Duration, Instant};

/// How long a ready notification stays in the status bar.
pub const TOAST_TTL: Duration = Duration::from_secs(6);

/// In-progress text edit of one setup field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    pub id: u32,
    pub field: ExerciseField,
    pub buffer: String,
}

/// Everything the UI thread renders. `run` is only ever replaced by controller snapshots.
pub struct UiState {
    pub run: Run,
    /// Index into [`UiState::rows`].
    pub selected: usize,
    pub editing: Option<FieldEdit>,
    pub show_help: bool,
    pub info: String,
    pub toast: Option<(Notification, Instant)>,
    pub finished: bool,
    pub log_path: Option<String>,
}

impl UiState {
    pub fn new(run: Run) -> Self {
        Self {
            run,
            selected: 0,
            editing: None,
            show_help: false,
            info: "Fill in your exercises, then press s to start".into(),
            toast: None,
            finished: false,
            log_path: None,
        }
    }

    /// Rows shown in the current mode: every slot during setup, valid exercises while running.
    pub fn rows(&self) -> Vec<&Exercise> {
        match self.run.mode {
            Mode::Setup => self.run.exercises.iter().collect(),
            Mode::Running => self.run.valid_exercises().collect(),
        }
    }

    pub fn selected_exercise(&self) -> Option<&Exercise> {
        self.rows().get(self.selected).copied()
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        let last = self.rows().len().saturating_sub(1);
        self.selected = (self.selected + 1).min(last);
    }

    fn clamp_selection(&mut self) {
        let len = self.rows().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Live toast, dropping it once expired.
    pub fn current_toast(&mut self) -> Option<&Notification> {
        let expired = matches!(&self.toast, Some((_, at)) if at.elapsed() >= TOAST_TTL);
        if expired {
            self.toast = None;
        }
        self.toast.as_ref().map(|(n, _)| n)
    }

    pub fn apply_event(&mut self, ev: TimerEvent) {
        match ev {
            TimerEvent::Snapshot(run) => {
                let mode_changed = run.mode != self.run.mode;
                self.run = *run;
                if mode_changed {
                    self.selected = 0;
                    self.editing = None;
                    if self.run.mode == Mode::Setup {
                        self.finished = false;
                        self.toast = None;
                    }
                }
                if self.run.mode == Mode::Running && !mode_changed {
                    self.follow_focus();
                }
                self.clamp_selection();
            }
            TimerEvent::Notification(n) => {
                self.info = format!("{} {}", n.title, n.body);
                self.toast = Some((n, Instant::now()));
            }
            TimerEvent::Finished(_) => {
                self.finished = true;
                self.info = "Workout complete! Press r to set up another".into();
            }
            TimerEvent::Info(info) => self.info = info.to_message(),
        }
    }

    /// While running, keep the cursor on a ready exercise so Enter acknowledges it.
    fn follow_focus(&mut self) {
        let rows = self.rows();
        let on_ready = rows
            .get(self.selected)
            .is_some_and(|e| e.status == ExerciseStatus::Ready);
        if on_ready {
            return;
        }
        let target = rows
            .iter()
            .position(|e| e.status == ExerciseStatus::Ready)
            .or_else(|| rows.iter().position(|e| e.status == ExerciseStatus::Active));
        if let Some(idx) = target {
            self.selected = idx;
        }
    }
}
