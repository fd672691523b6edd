//! Application state and core logic

use crate::catalog::{Catalog, FieldId, FieldKind};
use crate::config::Settings;
use crate::state::{
    AppState, AutosaveStatus, ConfirmAction, FocusTarget, Form, FormState, PendingConfirm,
};
use crate::storage::{self, SharedStore};
use crate::submission::{
    Payload, ResubmitReport, SubmissionClient, SubmitError, SubmitOutcome, Submitter,
};
use crate::visibility::{expected_counts, ClassificationInputs, Debouncer, Resolver};
use anyhow::Result;
use chrono::{Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// Main application struct
pub struct App {
    /// Current application state
    pub state: AppState,
    store: SharedStore,
    submitter: Submitter,
    /// Pending text commits, one per edited field
    text_commits: Debouncer<FieldId>,
    /// Pending autosave
    autosave: Debouncer<()>,
    /// Answers waiting for the user to accept the restore prompt
    pending_restore: Option<Payload>,
    submit_task: Option<JoinHandle<Result<SubmitOutcome, SubmitError>>>,
    resubmit_task: Option<JoinHandle<Result<ResubmitReport, SubmitError>>>,
    /// Whether the app should quit
    quit: bool,
}

impl App {
    /// Create the app over a loaded catalog
    pub fn new(
        settings: &Settings,
        catalog: Catalog,
        store: SharedStore,
        client: Arc<dyn SubmissionClient>,
    ) -> Self {
        let form = FormState::new(
            catalog,
            ClassificationInputs::default(),
            Resolver::new(settings.dependency_match),
        );
        let counts = expected_counts(form.catalog(), &form.classification().project_type);
        tracing::debug!(
            simple = counts.simple,
            standard = counts.standard,
            complex = counts.complex,
            "Fields admitted per complexity"
        );
        let mut state = AppState::new(form);
        let mut pending_restore = None;

        {
            let store = storage::lock(&store);
            match store.load_collapsed() {
                Ok(Some(collapsed)) => state.form.set_collapsed(collapsed),
                Ok(None) => state.form.collapse_all(),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring saved collapsed sections");
                    state.form.collapse_all();
                }
            }
            match store.load_answers() {
                Ok(Some(saved)) => {
                    state.confirm = Some(PendingConfirm::new(ConfirmAction::RestoreAutosave {
                        saved_at: saved.saved_at_label(),
                    }));
                    pending_restore = Some(saved.answers);
                }
                Ok(None) => {}
                Err(e) => state.push_error(format!("Saved answers could not be read: {e}")),
            }
        }

        Self {
            state,
            submitter: Submitter::new(client, store.clone()),
            store,
            text_commits: Debouncer::new(settings.text_debounce),
            autosave: Debouncer::new(settings.autosave_delay),
            pending_restore,
            submit_task: None,
            resubmit_task: None,
            quit: false,
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Push an error message to the error queue for display
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.state.push_error(message);
    }

    /// Replay locally saved submissions in the background
    pub fn start_resubmit(&mut self) {
        let submitter = self.submitter.clone();
        self.resubmit_task = Some(tokio::spawn(
            async move { submitter.resubmit_outbox().await },
        ));
    }

    /// Handle a key event
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle error dialog dismissal first (modal)
        if self.state.current_error().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.state.dismiss_error();
            }
            return Ok(());
        }

        if self.state.confirm.is_some() {
            self.handle_confirm_key(key);
            return Ok(());
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.request_quit(),
            KeyCode::Char('c') if ctrl => self.request_quit(),
            KeyCode::Char('s') if ctrl => self.submit(),
            KeyCode::Char('e') if ctrl => {
                self.state.form.expand_all();
                self.save_collapsed();
            }
            KeyCode::Char('k') if ctrl => {
                self.state.form.collapse_all();
                self.save_collapsed();
            }
            KeyCode::Char('r') if ctrl => {
                self.state.confirm = Some(PendingConfirm::new(ConfirmAction::ResetForm));
            }
            KeyCode::Tab | KeyCode::Down => self.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(false),
            _ => match self.state.form.focused() {
                Some(FocusTarget::SectionHeader(section)) => {
                    if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                        self.state.form.toggle_section(&section);
                        self.save_collapsed();
                    }
                }
                Some(FocusTarget::Field(id)) => self.handle_field_key(&id, key),
                None => {}
            },
        }
        Ok(())
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let Some(confirm) = self.state.confirm.as_mut() else {
            return;
        };
        let accepted = match key.code {
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                confirm.toggle();
                return;
            }
            KeyCode::Enter => confirm.selected_option,
            KeyCode::Char('y') | KeyCode::Char('Y') => true,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
            _ => return,
        };
        if let Some(confirm) = self.state.confirm.take() {
            self.resolve_confirm(confirm.action, accepted);
        }
    }

    fn resolve_confirm(&mut self, action: ConfirmAction, accepted: bool) {
        match action {
            ConfirmAction::RestoreAutosave { .. } => {
                let saved = self.pending_restore.take();
                match (saved, accepted) {
                    (Some(saved), true) => {
                        self.state.form.apply_answers(&saved);
                        self.state.set_status("Restored saved answers");
                    }
                    _ => {
                        let result = storage::lock(&self.store).clear_answers();
                        if let Err(e) = result {
                            self.push_error(format!("Could not discard saved answers: {e}"));
                        }
                    }
                }
            }
            ConfirmAction::ResetForm if accepted => self.reset_form(),
            ConfirmAction::ResetForm => {}
        }
    }

    /// Edit the focused field
    fn handle_field_key(&mut self, id: &FieldId, key: KeyEvent) {
        let Some(field) = self.state.form.focused_field_mut() else {
            return;
        };
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let kind = field.kind;

        match kind {
            FieldKind::Text | FieldKind::Textarea | FieldKind::Date => {
                match key.code {
                    KeyCode::Char(c) if !ctrl => field.push_char(c),
                    KeyCode::Backspace => field.pop_char(),
                    KeyCode::Enter if kind.is_multiline() => field.push_char('\n'),
                    KeyCode::Enter => {
                        self.move_focus(true);
                        return;
                    }
                    _ => return,
                }
                self.text_commits.schedule(id.clone(), Instant::now());
                self.schedule_autosave();
            }
            FieldKind::Select | FieldKind::RadioGroup => {
                match key.code {
                    KeyCode::Left => field.select_prev(),
                    KeyCode::Right | KeyCode::Char(' ') => field.select_next(),
                    KeyCode::Backspace | KeyCode::Delete if kind == FieldKind::Select => {
                        field.clear();
                    }
                    _ => return,
                }
                self.commit(id);
            }
            FieldKind::CheckboxGroup => match key.code {
                KeyCode::Left => field.cursor_prev(),
                KeyCode::Right => field.cursor_next(),
                KeyCode::Char(' ') | KeyCode::Enter => {
                    field.toggle_at_cursor();
                    self.commit(id);
                }
                _ => {}
            },
        }
    }

    fn move_focus(&mut self, forward: bool) {
        // Leaving a text field commits it right away
        if let Some(FocusTarget::Field(id)) = self.state.form.focused() {
            if self.text_commits.is_pending(&id) {
                self.text_commits.cancel(&id);
                self.commit(&id);
            }
        }
        if forward {
            self.state.form.next_field();
        } else {
            self.state.form.prev_field();
        }
    }

    /// Propagate a committed value and queue an autosave
    fn commit(&mut self, id: &FieldId) {
        let change = self.state.form.commit(id);
        for cleared in &change.cleared {
            self.text_commits.cancel(cleared);
        }
        self.schedule_autosave();
    }

    fn schedule_autosave(&mut self) {
        self.autosave.schedule((), Instant::now());
        self.state.autosave = AutosaveStatus::Pending;
    }

    fn flush_text_commits(&mut self) {
        for id in self.text_commits.flush() {
            self.commit(&id);
        }
    }

    fn save_answers(&mut self) {
        let snapshot = self.state.form.snapshot();
        let result = storage::lock(&self.store).save_answers(&snapshot, Utc::now());
        self.state.autosave = match result {
            Ok(()) => AutosaveStatus::Saved(Local::now()),
            Err(e) => {
                tracing::warn!(error = %e, "Autosave failed");
                AutosaveStatus::Failed
            }
        };
    }

    fn save_collapsed(&mut self) {
        let collapsed = self.state.form.collapsed_sections();
        if let Err(e) = storage::lock(&self.store).save_collapsed(&collapsed) {
            tracing::warn!(error = %e, "Could not save collapsed sections");
        }
    }

    /// Run due debounced work and collect finished background tasks
    pub async fn tick(&mut self, now: Instant) {
        for id in self.text_commits.due(now) {
            self.commit(&id);
        }
        if !self.autosave.due(now).is_empty() {
            self.save_answers();
        }

        if self.submit_task.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(task) = self.submit_task.take() {
                self.state.submitting = false;
                match task.await {
                    Ok(result) => self.on_submit_result(result),
                    Err(e) => self.push_error(format!("Submission task failed: {e}")),
                }
            }
        }

        if self.resubmit_task.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(task) = self.resubmit_task.take() {
                match task.await {
                    Ok(Ok(report)) if report.sent > 0 => self
                        .state
                        .set_status(format!("Sent {} saved submission(s)", report.sent)),
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => tracing::warn!(error = %e, "Outbox replay failed"),
                    Err(e) => tracing::warn!(error = %e, "Outbox replay task failed"),
                }
            }
        }

        self.state.expire_status();
    }

    /// Validate and submit in the background. A submit while one is running
    /// is dropped.
    pub fn submit(&mut self) {
        if self.state.submitting || self.submitter.is_in_flight() {
            self.state.set_status("Submission already in progress");
            return;
        }
        self.flush_text_commits();

        let payload = self.state.form.payload();
        let missing = self.state.form.missing_required();
        let submitter = self.submitter.clone();
        self.state.submitting = true;
        self.state.set_status("Submitting...");
        self.submit_task = Some(tokio::spawn(async move {
            submitter.submit(payload, missing).await
        }));
    }

    fn on_submit_result(&mut self, result: Result<SubmitOutcome, SubmitError>) {
        match result {
            Ok(SubmitOutcome::Submitted { submission_id, .. }) => {
                let reference = submission_id.unwrap_or_else(|| "n/a".to_string());
                self.state
                    .set_status(format!("Submission successful. Reference ID: {reference}"));
                self.clear_form();
            }
            Ok(SubmitOutcome::SavedLocally { submission_id }) => {
                self.state.set_status(format!(
                    "Saved locally. Reference ID: {submission_id}. It will be sent when the server is available."
                ));
                self.clear_form();
            }
            Ok(SubmitOutcome::Invalid { missing }) => {
                // The server lists field ids; show the labels the user sees
                let missing: Vec<String> = missing
                    .into_iter()
                    .map(|name| {
                        self.state
                            .form
                            .descriptor(&FieldId::new(name.as_str()))
                            .map_or(name, |d| d.label.clone())
                    })
                    .collect();
                self.focus_first_missing(&missing);
                let list = missing
                    .iter()
                    .map(|label| format!("- {label}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                self.push_error(format!("Please fill in the required fields:\n{list}"));
            }
            Err(SubmitError::InFlight) => {
                self.state.set_status("Submission already in progress");
            }
            Err(e) => self.push_error(format!("Submission failed: {e}")),
        }
    }

    fn focus_first_missing(&mut self, missing: &[String]) {
        let Some(label) = missing.first() else {
            return;
        };
        let form = &self.state.form;
        let Some(id) = form
            .visible_fields()
            .find(|f| &f.label == label || f.id.as_str() == label)
            .map(|f| f.id.clone())
        else {
            return;
        };
        let section = form
            .catalog()
            .sections()
            .iter()
            .find(|s| s.fields.contains(&id))
            .map(|s| s.id.clone());
        if let Some(section) = section {
            if self.state.form.is_collapsed(&section) {
                self.state.form.toggle_section(&section);
                self.save_collapsed();
            }
        }
        self.state.form.focus(&FocusTarget::Field(id));
    }

    /// Empty the form after a submission; stored data is left to the submitter
    fn clear_form(&mut self) {
        self.text_commits.flush();
        self.autosave.flush();
        let collapsed = self.state.form.collapsed_sections();
        self.state.form.reset();
        self.state.form.set_collapsed(collapsed);
        self.state.autosave = AutosaveStatus::Idle;
    }

    /// Clear every answer, the autosave and the collapsed list
    fn reset_form(&mut self) {
        self.text_commits.flush();
        self.autosave.flush();
        self.state.form.reset();
        self.state.autosave = AutosaveStatus::Idle;
        let result = storage::lock(&self.store).clear_form();
        if let Err(e) = result {
            self.push_error(format!("Could not clear saved data: {e}"));
        }
        self.state.set_status("Form reset");
    }

    /// Commit and save pending edits, then quit
    fn request_quit(&mut self) {
        self.flush_text_commits();
        if !self.autosave.flush().is_empty() {
            self.save_answers();
        }
        self.quit = true;
    }
}
