//! UI module for rendering the TUI

mod components;
mod forms;
mod layout;

use crate::app::App;
use components::{render_confirm_dialog, render_error_dialog};
use ratatui::Frame;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let (header_area, main_area) = layout::create_layout(frame.area());

    layout::draw_header(frame, header_area, app);
    forms::draw_intake_form(frame, main_area, app);
    layout::draw_status_bar(frame, app);

    // Modals last so they sit on top; errors win over confirmations
    if let Some(error) = app.state.current_error() {
        render_error_dialog(frame, error, app.state.error_count());
    } else if let Some(confirm) = &app.state.confirm {
        render_confirm_dialog(frame, confirm);
    }
}
