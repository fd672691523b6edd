//! Field rendering utilities for forms

use crate::catalog::FieldKind;
use crate::state::FormField;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Rows a textarea shows
const TEXTAREA_ROWS: u16 = 4;

/// Height of a field widget including its border
pub fn field_height(field: &FormField) -> u16 {
    let rows = match field.kind {
        FieldKind::Textarea => TEXTAREA_ROWS,
        FieldKind::CheckboxGroup => field.options.len().max(1) as u16,
        _ => 1,
    };
    rows + 2
}

/// Draw a form field. `instructions` are shown under the active field.
pub fn draw_field(
    frame: &mut Frame,
    area: Rect,
    field: &FormField,
    instructions: &str,
    is_active: bool,
) {
    let border_style = if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let title = if field.required {
        Line::from(vec![
            Span::raw(format!(" {}", field.label)),
            Span::styled(" * ", Style::default().fg(Color::Red)),
        ])
    } else {
        Line::from(format!(" {} ", field.label))
    };

    let mut block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);
    if is_active && !instructions.is_empty() {
        block = block.title_bottom(Line::from(Span::styled(
            format!(" {instructions} "),
            Style::default().fg(Color::Gray),
        )));
    }

    let lines = match field.kind {
        FieldKind::Text | FieldKind::Textarea | FieldKind::Date => text_lines(field, is_active),
        FieldKind::Select => vec![select_line(field, is_active)],
        FieldKind::RadioGroup => vec![radio_line(field, is_active)],
        FieldKind::CheckboxGroup => checkbox_lines(field, is_active),
    };

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(block),
        area,
    );
}

fn value_style(is_active: bool) -> Style {
    if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    }
}

fn placeholder<'a>(field: &'a FormField, is_active: bool) -> Span<'a> {
    let text = if !field.placeholder.is_empty() {
        field.placeholder.as_str()
    } else if field.kind == FieldKind::Date {
        "YYYY-MM-DD"
    } else if is_active {
        ""
    } else {
        "(empty)"
    };
    Span::styled(text, Style::default().fg(Color::DarkGray))
}

fn text_lines(field: &FormField, is_active: bool) -> Vec<Line<'_>> {
    let cursor = Span::styled(
        if is_active { "▌" } else { "" },
        Style::default().fg(Color::Cyan),
    );
    let text = field.as_text();

    if text.is_empty() {
        return vec![Line::from(vec![cursor, placeholder(field, is_active)])];
    }

    let style = value_style(is_active);
    let mut lines: Vec<Line> = text
        .split('\n')
        .map(|l| Line::from(Span::styled(l, style)))
        .collect();
    // Keep the cursor after the last character, including a trailing newline
    if let Some(last) = lines.last_mut() {
        last.spans.push(cursor);
    }
    if field.is_multiline() && lines.len() > TEXTAREA_ROWS as usize {
        lines.drain(..lines.len() - TEXTAREA_ROWS as usize);
    }
    lines
}

fn select_line(field: &FormField, is_active: bool) -> Line<'_> {
    let value = field.display_value();
    let arrow_style = if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut spans = vec![Span::styled("‹ ", arrow_style)];
    if value.is_empty() {
        spans.push(Span::styled(
            "Select an option",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::styled(value, value_style(is_active)));
    }
    spans.push(Span::styled(" ›", arrow_style));
    Line::from(spans)
}

fn radio_line(field: &FormField, is_active: bool) -> Line<'_> {
    let selected = field.display_value();
    let spans = field
        .options
        .iter()
        .flat_map(|option| {
            let is_selected = *option == selected;
            let (mark, style) = if is_selected {
                (
                    "(•) ",
                    value_style(is_active).add_modifier(Modifier::BOLD),
                )
            } else {
                ("( ) ", Style::default().fg(Color::DarkGray))
            };
            [
                Span::styled(format!("{mark}{option}"), style),
                Span::raw("  "),
            ]
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

fn checkbox_lines(field: &FormField, is_active: bool) -> Vec<Line<'_>> {
    if field.options.is_empty() {
        return vec![Line::from(Span::styled(
            "(no options)",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    field
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let checked = field.is_checked(option);
            let under_cursor = is_active && i == field.option_cursor;
            let prefix = if under_cursor { "▸ " } else { "  " };
            let mark = if checked { "[x] " } else { "[ ] " };
            let style = match (under_cursor, checked) {
                (true, _) => Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
                (false, true) => Style::default().fg(Color::White),
                (false, false) => Style::default().fg(Color::DarkGray),
            };
            Line::from(Span::styled(format!("{prefix}{mark}{option}"), style))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldDescriptor;
    use ratatui::{backend::TestBackend, Terminal};

    fn field(kind: FieldKind, options: &[&str]) -> FormField {
        FormField::from_descriptor(
            &FieldDescriptor::new("S", "Channels", kind).with_options(options),
        )
    }

    fn render(field: &FormField, is_active: bool) -> String {
        let backend = TestBackend::new(40, field_height(field));
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| draw_field(frame, frame.area(), field, "Pick all that apply", is_active))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_heights_follow_kind() {
        assert_eq!(field_height(&field(FieldKind::Text, &[])), 3);
        assert_eq!(field_height(&field(FieldKind::Textarea, &[])), 6);
        assert_eq!(
            field_height(&field(FieldKind::CheckboxGroup, &["a", "b", "c"])),
            5
        );
    }

    #[test]
    fn test_checkbox_group_marks_checked_options() {
        let mut f = field(FieldKind::CheckboxGroup, &["Email", "Phone"]);
        f.cursor_next();
        f.toggle_at_cursor();

        let screen = render(&f, true);
        assert!(screen.contains("[ ] Email"));
        assert!(screen.contains("▸ [x] Phone"));
        assert!(screen.contains("Pick all that apply"));
    }

    #[test]
    fn test_instructions_hidden_when_inactive() {
        let f = field(FieldKind::Text, &[]);
        let screen = render(&f, false);
        assert!(screen.contains("Channels"));
        assert!(screen.contains("(empty)"));
        assert!(!screen.contains("Pick all"));
    }

    #[test]
    fn test_select_shows_choice() {
        let mut f = field(FieldKind::Select, &["Strategic", "Technical"]);
        f.select("Technical");
        let screen = render(&f, false);
        assert!(screen.contains("‹ Technical ›"));
    }
}
