//! Submission of completed answers
//!
//! - `payload`: flat answer mapping
//! - `client`: health check and POST over HTTP, behind a mockable trait
//! - `submitter`: validation, online/offline choice, outbox resubmission

mod client;
mod payload;
mod submitter;

pub use client::{HttpSubmissionClient, SubmissionClient, SubmitResponse};
pub use payload::Payload;
pub use submitter::{ResubmitReport, SubmitOutcome, Submitter};

#[cfg(test)]
pub use client::MockSubmissionClient;

use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a submission is already in progress")]
    InFlight,
    #[error("could not reach the server: {0}")]
    Transport(String),
    #[error("server reply was not understood: {0}")]
    InvalidResponse(String),
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SubmitError {
    /// Failures that send the answers to the outbox instead of the user
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::InvalidResponse(_))
    }
}
