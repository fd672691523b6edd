//! Submissions saved while the server was unreachable

use super::{LocalStore, StorageError};
use crate::submission::Payload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const OUTBOX_KEY: &str = "intakeSubmissions";
pub const STATUS_SAVED_LOCALLY: &str = "saved_locally";

/// One locally saved submission: the answers plus bookkeeping fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    pub submission_id: String,
    pub submitted_at: DateTime<Utc>,
    pub status: String,
    #[serde(flatten)]
    pub answers: Payload,
}

impl OutboxEntry {
    pub fn new(answers: Payload, now: DateTime<Utc>) -> Self {
        Self {
            submission_id: Uuid::new_v4().to_string(),
            submitted_at: now,
            status: STATUS_SAVED_LOCALLY.to_string(),
            answers,
        }
    }
}

impl LocalStore {
    pub fn outbox(&self) -> Result<Vec<OutboxEntry>, StorageError> {
        Ok(self.get(OUTBOX_KEY)?.unwrap_or_default())
    }

    pub fn push_outbox(&mut self, entry: OutboxEntry) -> Result<(), StorageError> {
        let mut entries = self.outbox()?;
        entries.push(entry);
        self.set(OUTBOX_KEY, &entries)
    }

    /// Drop entries by submission id. Returns how many were removed.
    pub fn remove_from_outbox(&mut self, ids: &[String]) -> Result<usize, StorageError> {
        let mut entries = self.outbox()?;
        let before = entries.len();
        entries.retain(|e| !ids.contains(&e.submission_id));
        let removed = before - entries.len();
        if removed == 0 {
            return Ok(0);
        }
        if entries.is_empty() {
            self.remove(OUTBOX_KEY)?;
        } else {
            self.set(OUTBOX_KEY, &entries)?;
        }
        Ok(removed)
    }
}
