//! Layout components (header, status bar)

use crate::app::App;
use crate::state::AutosaveStatus;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

/// Height of the header with the progress gauge
const HEADER_HEIGHT: u16 = 3;

/// Split the screen into header and form, reserving the bottom line for the
/// status bar
pub fn create_layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT), // Header
            Constraint::Min(0),                // Form
            Constraint::Length(1),             // Status bar
        ])
        .split(area);

    (chunks[0], chunks[1])
}

/// Draw the title and completion gauge
pub fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let (filled, total) = app.state.form.completion();

    let block = Block::default()
        .title(" Project Intake ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .percent(u16::from(app.state.form.progress_percent()))
        .label(format!("{filled}/{total} answered"));
    frame.render_widget(gauge, area);
}

/// Draw the status bar
pub fn draw_status_bar(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let status_area = Rect {
        x: 0,
        y: area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };

    let form = &app.state.form;
    let classification = form.classification();
    let mut spans = vec![
        Span::styled(
            format!(" {} ", classification.complexity.label()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{} ", classification.project_type.label()),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("| {} shown  {}% ", form.visible_count(), form.progress_percent()),
            Style::default().fg(Color::White),
        ),
    ];

    // Autosave indicator
    let autosave = app.state.autosave;
    let autosave_color = match autosave {
        AutosaveStatus::Failed => Color::Red,
        AutosaveStatus::Pending => Color::Yellow,
        _ => Color::Green,
    };
    if autosave != AutosaveStatus::Idle {
        spans.push(Span::styled(
            format!("| {} ", autosave.label()),
            Style::default().fg(autosave_color),
        ));
    }

    if app.state.submitting {
        spans.push(Span::styled(
            "| Submitting... ",
            Style::default().fg(Color::Yellow),
        ));
    }

    if let Some(msg) = app.state.status_message() {
        spans.push(Span::raw("| "));
        spans.push(Span::styled(msg, Style::default().fg(Color::Green)));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::styled(
        focus_hints(app),
        Style::default().fg(Color::Gray),
    ));

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, status_area);

    // Global shortcuts on the right
    let global_hint = " ^S:submit  ^E/^K:expand/collapse  ^R:reset  Esc:quit ";
    let hint_width = global_hint.len() as u16;
    if area.width > hint_width * 2 {
        let hint_area = Rect {
            x: area.width.saturating_sub(hint_width),
            y: area.height.saturating_sub(1),
            width: hint_width,
            height: 1,
        };
        let hint_widget = Paragraph::new(global_hint)
            .style(Style::default().bg(Color::DarkGray).fg(Color::Gray));
        frame.render_widget(hint_widget, hint_area);
    }
}

/// Keyboard hints for whatever has focus
fn focus_hints(app: &App) -> &'static str {
    use crate::catalog::FieldKind;

    if app.state.has_modal() {
        return "";
    }
    match app.state.form.focused_field().map(|f| f.kind) {
        None => "| Tab:next  Enter:expand/collapse",
        Some(FieldKind::Select) | Some(FieldKind::RadioGroup) => "| Tab:next  ←→:choose",
        Some(FieldKind::CheckboxGroup) => "| Tab:next  ←→:move  Space:toggle",
        Some(FieldKind::Textarea) => "| Tab:next  Enter:newline",
        Some(_) => "| Tab:next  type to edit",
    }
}
