//! Key handling for the TUI.
//!
//! Translates key presses into local UI changes or controller commands. Nothing here
//! mutates the run itself; edits become [`UiCommand::Edit`] on commit.

use super::state::{FieldEdit, UiState};
use crate::model::{ExerciseField, ExerciseStatus, Mode};
use crate::orchestrator::UiCommand;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum KeyOutcome {
    None,
    Send(UiCommand),
    Quit,
}

pub(crate) fn handle_key(state: &mut UiState, key: KeyEvent) -> KeyOutcome {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyOutcome::Quit;
    }
    if state.editing.is_some() {
        return handle_edit_key(state, key.code);
    }
    if state.show_help {
        state.show_help = false;
        return KeyOutcome::None;
    }

    match key.code {
        KeyCode::Char('q') => KeyOutcome::Quit,
        KeyCode::Char('?') => {
            state.show_help = true;
            KeyOutcome::None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.select_prev();
            KeyOutcome::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.select_next();
            KeyOutcome::None
        }
        code => match state.run.mode {
            Mode::Setup => handle_setup_key(state, code),
            Mode::Running => handle_running_key(state, code),
        },
    }
}

fn begin_edit(state: &mut UiState, field: ExerciseField) -> KeyOutcome {
    let Some(ex) = state.selected_exercise() else {
        return KeyOutcome::None;
    };
    let buffer = match field {
        ExerciseField::Name => ex.name.clone(),
        ExerciseField::Duration if ex.duration == 0 => String::new(),
        ExerciseField::Duration => ex.duration.to_string(),
    };
    state.editing = Some(FieldEdit {
        id: ex.id,
        field,
        buffer,
    });
    KeyOutcome::None
}

fn handle_setup_key(state: &mut UiState, code: KeyCode) -> KeyOutcome {
    match code {
        KeyCode::Enter | KeyCode::Char('n') => begin_edit(state, ExerciseField::Name),
        KeyCode::Char('t') | KeyCode::Tab => begin_edit(state, ExerciseField::Duration),
        KeyCode::Char('s') => KeyOutcome::Send(UiCommand::Start),
        _ => KeyOutcome::None,
    }
}

fn handle_running_key(state: &mut UiState, code: KeyCode) -> KeyOutcome {
    match code {
        KeyCode::Enter | KeyCode::Char('d') | KeyCode::Char(' ') => {
            // The selected exercise if it is ready, otherwise the first ready one.
            let target = state
                .selected_exercise()
                .filter(|e| e.status == ExerciseStatus::Ready)
                .or_else(|| {
                    state
                        .run
                        .exercises
                        .iter()
                        .find(|e| e.status == ExerciseStatus::Ready)
                })
                .map(|e| e.id);
            match target {
                Some(id) => KeyOutcome::Send(UiCommand::Complete { id }),
                None => KeyOutcome::None,
            }
        }
        KeyCode::Char('r') => KeyOutcome::Send(UiCommand::Reset),
        _ => KeyOutcome::None,
    }
}

fn handle_edit_key(state: &mut UiState, code: KeyCode) -> KeyOutcome {
    let Some(edit) = state.editing.as_mut() else {
        return KeyOutcome::None;
    };
    match code {
        KeyCode::Esc => {
            state.editing = None;
            KeyOutcome::None
        }
        KeyCode::Enter | KeyCode::Tab => {
            let FieldEdit { id, field, buffer } = edit.clone();
            // Tab hops from name to duration of the same exercise.
            state.editing = match (code, field) {
                (KeyCode::Tab, ExerciseField::Name) => {
                    let duration = state.run.get(id).map(|e| e.duration).unwrap_or(0);
                    Some(FieldEdit {
                        id,
                        field: ExerciseField::Duration,
                        buffer: if duration == 0 {
                            String::new()
                        } else {
                            duration.to_string()
                        },
                    })
                }
                _ => None,
            };
            KeyOutcome::Send(UiCommand::Edit {
                id,
                field,
                value: buffer,
            })
        }
        KeyCode::Backspace => {
            edit.buffer.pop();
            KeyOutcome::None
        }
        KeyCode::Char(c) => {
            let accept = match edit.field {
                ExerciseField::Name => !c.is_control(),
                ExerciseField::Duration => c.is_ascii_digit(),
            };
            if accept {
                edit.buffer.push(c);
            }
            KeyOutcome::None
        }
        _ => KeyOutcome::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Run, SequencePolicy};
    use crate::sequence;

    fn press(state: &mut UiState, code: KeyCode) -> KeyOutcome {
        handle_key(state, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(state: &mut UiState, text: &str) {
        for c in text.chars() {
            assert_eq!(press(state, KeyCode::Char(c)), KeyOutcome::None);
        }
    }

    #[test]
    fn test_edit_name_then_duration_with_tab() {
        let mut state = UiState::new(Run::with_placeholders(3, SequencePolicy::default()));
        press(&mut state, KeyCode::Down);
        press(&mut state, KeyCode::Enter);
        type_text(&mut state, "Squats");
        assert_eq!(
            press(&mut state, KeyCode::Tab),
            KeyOutcome::Send(UiCommand::Edit {
                id: 2,
                field: ExerciseField::Name,
                value: "Squats".into(),
            })
        );
        type_text(&mut state, "4x5");
        assert_eq!(
            press(&mut state, KeyCode::Enter),
            KeyOutcome::Send(UiCommand::Edit {
                id: 2,
                field: ExerciseField::Duration,
                value: "45".into(),
            })
        );
        assert!(state.editing.is_none());
    }

    #[test]
    fn test_escape_cancels_edit() {
        let mut state = UiState::new(Run::with_placeholders(1, SequencePolicy::default()));
        press(&mut state, KeyCode::Char('n'));
        type_text(&mut state, "q");
        assert_eq!(press(&mut state, KeyCode::Esc), KeyOutcome::None);
        assert!(state.editing.is_none());
        assert_eq!(press(&mut state, KeyCode::Char('q')), KeyOutcome::Quit);
    }

    #[test]
    fn test_done_acknowledges_ready_exercise() {
        let mut run = Run::with_placeholders(2, SequencePolicy::default());
        run = sequence::edit_exercise(&run, 1, ExerciseField::Name, "Plank");
        run = sequence::edit_exercise(&run, 1, ExerciseField::Duration, "1");
        run = sequence::start(&run);
        let mut state = UiState::new(run.clone());
        assert_eq!(press(&mut state, KeyCode::Char('d')), KeyOutcome::None);

        state.run = sequence::tick(&run).run;
        assert_eq!(
            press(&mut state, KeyCode::Enter),
            KeyOutcome::Send(UiCommand::Complete { id: 1 })
        );
        assert_eq!(
            press(&mut state, KeyCode::Char('r')),
            KeyOutcome::Send(UiCommand::Reset)
        );
    }

    #[test]
    fn test_start_only_in_setup() {
        let mut state = UiState::new(Run::with_placeholders(1, SequencePolicy::default()));
        assert_eq!(
            press(&mut state, KeyCode::Char('s')),
            KeyOutcome::Send(UiCommand::Start)
        );
        assert_eq!(press(&mut state, KeyCode::Char('r')), KeyOutcome::None);
    }

    #[test]
    fn test_help_toggles_and_swallows_next_key() {
        let mut state = UiState::new(Run::with_placeholders(1, SequencePolicy::default()));
        press(&mut state, KeyCode::Char('?'));
        assert!(state.show_help);
        assert_eq!(press(&mut state, KeyCode::Char('q')), KeyOutcome::None);
        assert!(!state.show_help);
    }
}
