use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(desc),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame, log_path: Option<&str>) {
    let mut lines = vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        key_line("↑/↓ j/k", 5, "Select exercise"),
        key_line("?", 11, "Show this help"),
        Line::from(""),
        Line::from("Setup:"),
        key_line("Enter", 7, "Edit name (n)"),
        key_line("Tab", 9, "Edit duration (t); Tab again moves name → duration"),
        key_line("Esc", 9, "Cancel edit"),
        key_line("s", 11, "Start workout"),
        Line::from(""),
        Line::from("Workout:"),
        key_line("Enter", 7, "Done: acknowledge a ready exercise (d / space)"),
        key_line("r", 11, "Reset to setup"),
    ];
    if let Some(path) = log_path {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::raw("Log: "),
            Span::styled(path.to_string(), Style::default().fg(Color::Cyan)),
        ]));
    }

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
