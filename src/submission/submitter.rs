//! Submit orchestration

use super::{Payload, SubmissionClient, SubmitError};
use crate::storage::{self, OutboxEntry, SharedStore};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How a submit attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Accepted by the server
    Submitted {
        submission_id: Option<String>,
        cleared_autosave: bool,
    },
    /// Server unreachable; answers queued in the outbox
    SavedLocally { submission_id: String },
    /// Required answers missing, locally or according to the server
    Invalid { missing: Vec<String> },
}

/// Result of replaying the outbox
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResubmitReport {
    pub sent: usize,
    pub remaining: usize,
}

/// Clears the in-flight flag when the attempt ends, however it ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs submissions against a client, falling back to the local outbox
#[derive(Clone)]
pub struct Submitter {
    client: Arc<dyn SubmissionClient>,
    store: SharedStore,
    in_flight: Arc<AtomicBool>,
}

impl Submitter {
    pub fn new(client: Arc<dyn SubmissionClient>, store: SharedStore) -> Self {
        Self {
            client,
            store,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<InFlightGuard<'_>, SubmitError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(SubmitError::InFlight);
        }
        Ok(InFlightGuard(&self.in_flight))
    }

    /// Submit visible answers. `missing` lists labels of required fields with
    /// no value; a non-empty list stops the attempt before any transport.
    pub async fn submit(
        &self,
        payload: Payload,
        missing: Vec<String>,
    ) -> Result<SubmitOutcome, SubmitError> {
        let _guard = self.begin()?;

        if !missing.is_empty() {
            return Ok(SubmitOutcome::Invalid { missing });
        }

        if !self.client.health().await {
            tracing::warn!("Server unavailable, saving submission locally");
            return self.save_locally(payload);
        }

        match self.client.submit(&payload).await {
            Ok(response) if response.success => {
                let cleared_autosave = response.clear_local_storage;
                if cleared_autosave {
                    storage::lock(&self.store).clear_answers()?;
                }
                tracing::info!(id = ?response.submission_id, "Submission accepted");
                Ok(SubmitOutcome::Submitted {
                    submission_id: response.submission_id,
                    cleared_autosave,
                })
            }
            Ok(response) if !response.missing_fields.is_empty() => Ok(SubmitOutcome::Invalid {
                missing: response.missing_fields,
            }),
            Ok(response) => Err(SubmitError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "Submission failed".to_string()),
            )),
            Err(e) if e.is_offline() => {
                tracing::warn!(error = %e, "Submission failed in transit, saving locally");
                self.save_locally(payload)
            }
            Err(e) => Err(e),
        }
    }

    fn save_locally(&self, payload: Payload) -> Result<SubmitOutcome, SubmitError> {
        let entry = OutboxEntry::new(payload, Utc::now());
        let submission_id = entry.submission_id.clone();
        let mut store = storage::lock(&self.store);
        store.push_outbox(entry)?;
        // The outbox entry is the record now; stale autosave is only a nuisance
        if let Err(e) = store.clear_answers() {
            tracing::warn!(error = %e, "Could not clear autosaved answers");
        }
        tracing::info!(id = %submission_id, "Submission saved locally");
        Ok(SubmitOutcome::SavedLocally { submission_id })
    }

    /// Re-post every outbox entry if the server is up. Accepted entries leave
    /// the outbox; the rest stay for the next attempt.
    pub async fn resubmit_outbox(&self) -> Result<ResubmitReport, SubmitError> {
        let _guard = self.begin()?;

        let entries = storage::lock(&self.store).outbox()?;
        if entries.is_empty() {
            return Ok(ResubmitReport::default());
        }
        if !self.client.health().await {
            return Ok(ResubmitReport {
                sent: 0,
                remaining: entries.len(),
            });
        }

        let mut accepted = Vec::new();
        for entry in &entries {
            match self.client.submit(&entry.answers).await {
                Ok(response) if response.success => accepted.push(entry.submission_id.clone()),
                Ok(response) => tracing::warn!(
                    id = %entry.submission_id,
                    error = ?response.error,
                    "Saved submission rejected"
                ),
                Err(e) => tracing::warn!(
                    id = %entry.submission_id,
                    error = %e,
                    "Saved submission not sent"
                ),
            }
        }

        let sent = storage::lock(&self.store).remove_from_outbox(&accepted)?;
        let report = ResubmitReport {
            sent,
            remaining: entries.len() - sent,
        };
        tracing::info!(sent = report.sent, remaining = report.remaining, "Outbox replayed");
        Ok(report)
    }
}
