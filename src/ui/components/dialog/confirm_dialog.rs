//! Yes/no confirmation dialog

use super::base::{key_hint, render_dialog, DialogConfig};
use crate::state::{ConfirmAction, PendingConfirm};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    Frame,
};

/// Render a pending confirmation with its two options
pub fn render_confirm_dialog(frame: &mut Frame, confirm: &PendingConfirm) {
    let (accept, decline, accent) = match confirm.action {
        ConfirmAction::RestoreAutosave { .. } => ("Restore", "Start fresh", Color::Cyan),
        ConfirmAction::ResetForm => ("Reset", "Cancel", Color::Red),
    };

    // Accept first, so the default selection sits on top
    let choices = [(true, accept, accent), (false, decline, Color::White)]
        .into_iter()
        .map(|(option, label, color)| {
            let is_selected = confirm.selected_option == option;
            let prefix = if is_selected { "▸ " } else { "  " };
            let style = if is_selected {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::from(Span::styled(format!("{prefix}{label}"), style))
        })
        .collect();

    let hint = key_hint(&[("↑↓", "select"), ("Enter", "confirm"), ("Esc", "no")]);

    let message = confirm.message();
    render_dialog(
        frame,
        DialogConfig {
            title: confirm.title(),
            title_color: accent,
            border_color: accent,
            message: &message,
            choices,
            hint: Some(hint),
            max_width: 56,
        },
    );
}
