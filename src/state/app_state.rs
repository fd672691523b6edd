//! Application state

use super::forms::FormState;
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a status bar message stays up
pub const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(5);

/// Autosave indicator shown in the status bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutosaveStatus {
    #[default]
    Idle,
    /// An edit is waiting for the quiet period to end
    Pending,
    Saved(DateTime<Local>),
    Failed,
}

impl AutosaveStatus {
    pub fn label(&self) -> String {
        match self {
            AutosaveStatus::Idle => String::new(),
            AutosaveStatus::Pending => "Saving...".to_string(),
            AutosaveStatus::Saved(at) => format!("Saved {}", at.format("%H:%M:%S")),
            AutosaveStatus::Failed => "Autosave failed".to_string(),
        }
    }
}

/// What a yes/no prompt is asking about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Restore answers autosaved at the given (display) time
    RestoreAutosave { saved_at: String },
    /// Clear every answer
    ResetForm,
}

/// Pending yes/no prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirm {
    pub action: ConfirmAction,
    /// true = "Yes" highlighted
    pub selected_option: bool,
}

impl PendingConfirm {
    pub fn new(action: ConfirmAction) -> Self {
        Self {
            action,
            selected_option: true,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.action {
            ConfirmAction::RestoreAutosave { .. } => "Restore Saved Answers",
            ConfirmAction::ResetForm => "Reset Form",
        }
    }

    pub fn message(&self) -> String {
        match &self.action {
            ConfirmAction::RestoreAutosave { saved_at } => {
                format!("Found saved form data from {saved_at}. Would you like to restore it?")
            }
            ConfirmAction::ResetForm => {
                "Clear every answer and start over? Saved answers are removed too.".to_string()
            }
        }
    }

    pub fn toggle(&mut self) {
        self.selected_option = !self.selected_option;
    }
}

/// Main application state
#[derive(Debug)]
pub struct AppState {
    pub form: FormState,
    pub autosave: AutosaveStatus,
    /// A submission task is running
    pub submitting: bool,
    pub confirm: Option<PendingConfirm>,
    errors: VecDeque<String>,
    status_message: Option<(String, Instant)>,
}

impl AppState {
    pub fn new(form: FormState) -> Self {
        Self {
            form,
            autosave: AutosaveStatus::default(),
            submitting: false,
            confirm: None,
            errors: VecDeque::new(),
            status_message: None,
        }
    }

    /// Queue an error for the error dialog
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push_back(message.into());
    }

    /// Error currently shown, if any
    pub fn current_error(&self) -> Option<&str> {
        self.errors.front().map(String::as_str)
    }

    /// Errors waiting, including the one shown
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn dismiss_error(&mut self) {
        self.errors.pop_front();
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Status message, if it has not expired
    pub fn status_message(&self) -> Option<&str> {
        self.status_message
            .as_ref()
            .filter(|(_, at)| at.elapsed() < STATUS_MESSAGE_TTL)
            .map(|(message, _)| message.as_str())
    }

    /// Drop an expired status message
    pub fn expire_status(&mut self) {
        if self.status_message().is_none() {
            self.status_message = None;
        }
    }

    /// A modal is open and takes every key
    pub fn has_modal(&self) -> bool {
        self.current_error().is_some() || self.confirm.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, FieldDescriptor, FieldKind};
    use crate::visibility::{ClassificationInputs, Resolver};

    fn state() -> AppState {
        let catalog = Catalog::from_descriptors(vec![
            FieldDescriptor::new("About", "Company", FieldKind::Text).universal()
        ]);
        AppState::new(FormState::new(
            catalog,
            ClassificationInputs::default(),
            Resolver::default(),
        ))
    }

    #[test]
    fn test_errors_are_shown_in_order() {
        let mut state = state();
        assert!(!state.has_modal());
        state.push_error("first");
        state.push_error("second");

        assert_eq!(state.current_error(), Some("first"));
        assert_eq!(state.error_count(), 2);
        state.dismiss_error();
        assert_eq!(state.current_error(), Some("second"));
        assert_eq!(state.error_count(), 1);
        state.dismiss_error();
        assert_eq!(state.current_error(), None);
    }

    #[test]
    fn test_status_message_is_visible_until_expired() {
        let mut state = state();
        state.set_status("Saved locally");
        assert_eq!(state.status_message(), Some("Saved locally"));

        state.status_message = Some((
            "old".to_string(),
            Instant::now() - STATUS_MESSAGE_TTL - Duration::from_millis(1),
        ));
        assert_eq!(state.status_message(), None);
        state.expire_status();
        assert!(state.status_message.is_none());
    }

    #[test]
    fn test_confirm_prompt() {
        let mut state = state();
        let mut confirm = PendingConfirm::new(ConfirmAction::RestoreAutosave {
            saved_at: "10/19/2026, 9:00:00 AM".to_string(),
        });
        assert!(confirm.selected_option);
        assert!(confirm.message().contains("10/19/2026"));
        confirm.toggle();
        assert!(!confirm.selected_option);

        state.confirm = Some(confirm);
        assert!(state.has_modal());
    }

    #[test]
    fn test_autosave_labels() {
        assert_eq!(AutosaveStatus::Idle.label(), "");
        assert_eq!(AutosaveStatus::Pending.label(), "Saving...");
        assert_eq!(AutosaveStatus::Failed.label(), "Autosave failed");
    }
}
