//! Intake form rendering: collapsible sections of visible fields

use super::field_renderer::{draw_field, field_height};
use crate::app::App;
use crate::state::{FocusTarget, Form, FormState};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Draw the form, scrolled so the focused item is on screen
pub fn draw_intake_form(frame: &mut Frame, area: Rect, app: &App) {
    let form = &app.state.form;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let targets = form.focus_targets();
    if targets.is_empty() {
        let empty = Paragraph::new("No fields to show.").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let heights: Vec<u16> = targets.iter().map(|t| item_height(form, t)).collect();
    let active = form.active_field();
    let first = first_visible_item(&heights, active, inner.height);

    let mut y = inner.y;
    let bottom = inner.y + inner.height;
    for (index, target) in targets.iter().enumerate().skip(first) {
        if y >= bottom {
            break;
        }
        let height = heights[index].min(bottom - y);
        let item_area = Rect {
            x: inner.x,
            y,
            width: inner.width,
            height,
        };
        draw_item(frame, item_area, form, target, index == active);
        y += height;
    }
}

fn item_height(form: &FormState, target: &FocusTarget) -> u16 {
    match target {
        FocusTarget::SectionHeader(_) => 1,
        FocusTarget::Field(id) => form.field(id).map(field_height).unwrap_or(0),
    }
}

/// Index of the first item to draw so that `active` fits in `height` rows
fn first_visible_item(heights: &[u16], active: usize, height: u16) -> usize {
    let mut first = 0;
    let mut used: u32 = heights
        .iter()
        .take(active + 1)
        .map(|h| u32::from(*h))
        .sum();
    while used > u32::from(height) && first < active {
        used -= u32::from(heights[first]);
        first += 1;
    }
    first
}

fn draw_item(frame: &mut Frame, area: Rect, form: &FormState, target: &FocusTarget, active: bool) {
    match target {
        FocusTarget::SectionHeader(id) => {
            let Some(section) = form.catalog().section(id) else {
                return;
            };
            let collapsed = form.is_collapsed(id);
            let marker = if collapsed { "▸ " } else { "▾ " };
            let shown = section.fields.iter().filter(|f| form.is_visible(f)).count();
            let style = if active {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            };
            let line = Line::from(vec![
                Span::styled(format!("{marker}{}", section.title), style),
                Span::styled(
                    format!("  ({shown})"),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            frame.render_widget(Paragraph::new(line), area);
        }
        FocusTarget::Field(id) => {
            let Some(field) = form.field(id) else {
                return;
            };
            let instructions = form
                .descriptor(id)
                .map(|d| d.instructions.as_str())
                .unwrap_or_default();
            draw_field(frame, area, field, instructions, active);
        }
    }
}
