mod help;
mod input;
mod state;

use crate::cli::Cli;
use crate::model::{Exercise, ExerciseField, ExerciseStatus, Mode, Run, TimerEvent};
use crate::orchestrator::{self, UiCommand};
use crate::progress::{format_clock, progress_ratio};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use input::KeyOutcome;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Terminal,
};
use state::UiState;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli, initial: Run) -> Result<()> {
    // Unbounded channels: the controller never waits on the UI.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<TimerEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let log_path = crate::logging::log_file_path().map(|p| p.display().to_string());

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_initial = initial.clone();
    let ui_handle =
        std::thread::spawn(move || run_threaded(ui_initial, log_path, event_rx, cmd_tx));

    let period = Duration::from(args.tick_interval);
    let res = orchestrator::run_controller(initial, period, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res.map(|_| ())
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    initial: Run,
    log_path: Option<String>,
    mut event_rx: UnboundedReceiver<TimerEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; the run inside it is a snapshot.
    let mut state = UiState::new(initial);
    state.log_path = log_path;

    let tick_rate = Duration::from_millis(100);
    let mut last_draw = Instant::now();
    let mut dirty = true;

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
            dirty = true;
        }

        if dirty || last_draw.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &mut state)).ok();
            last_draw = Instant::now();
            dirty = false;
        }

        if event::poll(Duration::from_millis(20)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match input::handle_key(&mut state, k) {
                    KeyOutcome::None => {}
                    KeyOutcome::Send(cmd) => {
                        let _ = cmd_tx.send(cmd);
                    }
                    KeyOutcome::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                }
                dirty = true;
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &mut UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)].as_ref())
        .split(area);

    match state.run.mode {
        Mode::Setup => draw_setup(chunks[0], f, state),
        Mode::Running => draw_workout(chunks[0], f, state),
    }
    draw_status(chunks[1], f, state);

    if state.show_help {
        let w = area.width.min(72);
        let h = area.height.min(20);
        let popup = Rect {
            x: area.x + (area.width - w) / 2,
            y: area.y + (area.height - h) / 2,
            width: w,
            height: h,
        };
        help::draw_help(popup, f, state.log_path.as_deref());
    }
}

fn draw_setup(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let unit = state.run.policy.unit.label();
    let mut lines = Vec::new();
    for (idx, ex) in state.run.exercises.iter().enumerate() {
        let selected = idx == state.selected;
        let editing = state.editing.as_ref().filter(|e| e.id == ex.id);

        let name = match editing {
            Some(e) if e.field == ExerciseField::Name => format!("{}▏", e.buffer),
            _ if ex.name.is_empty() => "Exercise name".to_string(),
            _ => ex.name.clone(),
        };
        let duration = match editing {
            Some(e) if e.field == ExerciseField::Duration => format!("{}▏", e.buffer),
            _ => ex.duration.to_string(),
        };

        let name_style = if ex.name.is_empty() && editing.is_none() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let marker = if selected { "› " } else { "  " };
        let label_style = if selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{marker}Exercise {}", idx + 1), label_style),
            Span::raw(if ex.is_valid() { "" } else { "  (incomplete)" }),
        ]));
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::styled(name, name_style),
        ]));
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::raw(duration),
            Span::styled(format!(" {unit}"), Style::default().fg(Color::DarkGray)),
        ]));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(vec![
        Span::styled("s", Style::default().fg(Color::Magenta)),
        Span::raw(" Start Workout   "),
        Span::styled("?", Style::default().fg(Color::Magenta)),
        Span::raw(" Help"),
    ]));

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Setup Your Workout"),
    );
    f.render_widget(p, area);
}

fn status_color(status: ExerciseStatus) -> Color {
    match status {
        ExerciseStatus::Active => Color::Green,
        ExerciseStatus::Ready => Color::Yellow,
        ExerciseStatus::Completed | ExerciseStatus::Waiting => Color::DarkGray,
    }
}

fn gauge_label(ex: &Exercise) -> String {
    let mut label = format!("{}  {}", ex.name.trim(), format_clock(ex.time_remaining));
    match ex.status {
        ExerciseStatus::Ready => label.push_str("  [Done ⏎]"),
        ExerciseStatus::Active => label.push_str("  ●"),
        ExerciseStatus::Completed => label.push_str("  ✓"),
        ExerciseStatus::Waiting => {}
    }
    label
}

fn draw_workout(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title(Line::from(vec![
        Span::raw("Workout Timer  "),
        Span::styled("r", Style::default().fg(Color::Magenta)),
        Span::raw(" Reset"),
    ]));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = state.rows();
    let constraints: Vec<Constraint> = rows
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (idx, ex) in rows.iter().enumerate() {
        let border = if idx == state.selected {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_style(border))
            .gauge_style(Style::default().fg(status_color(ex.status)))
            .ratio(progress_ratio(&state.run, ex))
            .label(gauge_label(ex));
        f.render_widget(gauge, slots[idx]);
    }
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &mut UiState) {
    let toast = state
        .current_toast()
        .map(|n| format!("{} {}", n.title, n.body));
    let (text, style) = match toast {
        Some(text) => (text, Style::default().fg(Color::Black).bg(Color::Yellow)),
        None if state.finished => (
            state.info.clone(),
            Style::default().fg(Color::Black).bg(Color::Green),
        ),
        None => (state.info.clone(), Style::default()),
    };
    let p = Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SequencePolicy;
    use ratatui::backend::TestBackend;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_draw_setup_and_workout() {
        let mut run = Run::with_placeholders(2, SequencePolicy::default());
        run = crate::sequence::edit_exercise(&run, 1, ExerciseField::Name, "Plank");
        run = crate::sequence::edit_exercise(&run, 1, ExerciseField::Duration, "60");
        let mut state = UiState::new(run.clone());

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).expect("terminal");
        terminal
            .draw(|f| draw(f.area(), f, &mut state))
            .expect("draw setup");
        let text = buffer_text(&terminal);
        assert!(text.contains("Setup Your Workout"));
        assert!(text.contains("Plank"));

        state.apply_event(TimerEvent::Snapshot(Box::new(crate::sequence::start(&run))));
        terminal
            .draw(|f| draw(f.area(), f, &mut state))
            .expect("draw workout");
        let text = buffer_text(&terminal);
        assert!(text.contains("Workout Timer"));
        assert!(text.contains("Plank  1:00"));
    }

    #[test]
    fn test_gauge_label_marks_ready() {
        let ex = Exercise {
            id: 1,
            name: "Squats".into(),
            duration: 45,
            status: ExerciseStatus::Ready,
            time_remaining: 0,
        };
        assert_eq!(gauge_label(&ex), "Squats  0:00  [Done ⏎]");
    }
}
