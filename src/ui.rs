//! Rendering of the menu, notice and prompt screens.
//!
//! Pure functions over `&App`; all state changes happen in `app`.

use crate::app::{App, LineKind, NoticeLine, Screen};
use crate::commands::Command;
use crate::prompt::Prompt;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Text};
use ratatui::Frame;

pub fn render(frame: &mut Frame, app: &App) {
    match &app.screen {
        Screen::Menu => render_menu(frame, app.selected),
        Screen::Notice { lines } => render_notice(frame, lines),
        Screen::Prompt {
            context, prompt, ..
        } => render_prompt(frame, context, prompt),
    }
}

fn line_style(kind: LineKind) -> Style {
    match kind {
        LineKind::Heading => Style::new().blue(),
        LineKind::Info => Style::new(),
        LineKind::Success => Style::new().green(),
        LineKind::Warning => Style::new().yellow(),
    }
}

fn notice_lines(lines: &[NoticeLine]) -> Vec<Line<'_>> {
    lines
        .iter()
        .map(|line| Line::styled(line.text.as_str(), line_style(line.kind)))
        .collect()
}

fn render_menu(frame: &mut Frame, selected: usize) {
    let mut lines = vec![Line::styled("--- POS Console ---", Style::new().blue())];
    for (i, command) in Command::ALL.iter().enumerate() {
        if i == selected {
            lines.push(Line::styled(
                format!("> {}", command.label()),
                Style::new().green(),
            ));
        } else {
            lines.push(Line::raw(format!("  {}", command.label())));
        }
    }
    frame.render_widget(Text::from(lines), frame.area());
}

fn render_notice(frame: &mut Frame, lines: &[NoticeLine]) {
    let mut out = notice_lines(lines);
    out.push(Line::raw(""));
    out.push(Line::raw("Press Enter to continue..."));
    frame.render_widget(Text::from(out), frame.area());
}

fn render_prompt(frame: &mut Frame, context: &[NoticeLine], prompt: &Prompt) {
    let area = frame.area();
    if area.height == 0 {
        return;
    }

    let context_area = Rect::new(0, 0, area.width, area.height - 1);
    let input_area = Rect::new(0, area.height - 1, area.width, 1);

    frame.render_widget(Text::from(notice_lines(context)), context_area);
    frame.render_widget(
        Line::raw(format!("{}{}", prompt.label(), prompt.input())),
        input_area,
    );

    let cursor_x = (prompt.label().chars().count() + prompt.input().chars().count()) as u16;
    frame.set_cursor_position(Position::new(
        cursor_x.min(area.width.saturating_sub(1)),
        input_area.y,
    ));
}
