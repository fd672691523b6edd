//! Error dialog component

use super::base::{key_hint, render_dialog, DialogConfig};
use ratatui::{style::Color, Frame};

/// Render the oldest of `queued` errors. With more waiting behind it the
/// title shows the position and dismissing moves on to the next one.
pub fn render_error_dialog(frame: &mut Frame, error_message: &str, queued: usize) {
    let (title, hint) = if queued > 1 {
        (
            format!("Error (1 of {queued})"),
            key_hint(&[("Enter/Esc", "next")]),
        )
    } else {
        ("Error".to_string(), key_hint(&[("Enter/Esc", "dismiss")]))
    };

    render_dialog(
        frame,
        DialogConfig {
            title: &title,
            title_color: Color::Red,
            border_color: Color::Red,
            message: error_message,
            hint: Some(hint),
            max_width: 64,
            ..Default::default()
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(message: &str, queued: usize) -> String {
        let mut terminal = Terminal::new(TestBackend::new(70, 12)).unwrap();
        terminal
            .draw(|frame| render_error_dialog(frame, message, queued))
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
    fn test_single_error_is_dismissed() {
        let screen = render("Could not clear saved data", 1);
        assert!(screen.contains("Error"));
        assert!(!screen.contains("1 of"));
        assert!(screen.contains("Enter/Esc dismiss"));
        assert!(screen.contains("Could not clear saved data"));
    }

    #[test]
    fn test_queued_errors_show_position() {
        let screen = render("Submission failed: timeout", 3);
        assert!(screen.contains("Error (1 of 3)"));
        assert!(screen.contains("Enter/Esc next"));
    }
}
