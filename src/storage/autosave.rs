//! Autosaved answers and collapsed sections

use super::{LocalStore, StorageError};
use crate::catalog::SectionId;
use crate::submission::Payload;
use chrono::{DateTime, Local, Utc};

pub const FORM_DATA_KEY: &str = "intakeFormData";
pub const FORM_TIMESTAMP_KEY: &str = "intakeFormTimestamp";
pub const COLLAPSED_SECTIONS_KEY: &str = "collapsedSections";

/// Answers found in the store
#[derive(Debug, Clone, PartialEq)]
pub struct SavedAnswers {
    pub answers: Payload,
    pub saved_at: Option<DateTime<Utc>>,
}

impl SavedAnswers {
    /// Save time in local time, for the restore prompt
    pub fn saved_at_label(&self) -> String {
        match self.saved_at {
            Some(at) => at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            None => "unknown time".to_string(),
        }
    }
}

impl LocalStore {
    pub fn save_answers(
        &mut self,
        answers: &Payload,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.set(FORM_DATA_KEY, answers)?;
        self.set(FORM_TIMESTAMP_KEY, &now.to_rfc3339())
    }

    /// Saved answers, if any. An unreadable timestamp is reported as unknown.
    pub fn load_answers(&self) -> Result<Option<SavedAnswers>, StorageError> {
        let Some(answers) = self.get::<Payload>(FORM_DATA_KEY)? else {
            return Ok(None);
        };
        let saved_at = self
            .get::<String>(FORM_TIMESTAMP_KEY)
            .ok()
            .flatten()
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|at| at.with_timezone(&Utc));
        Ok(Some(SavedAnswers { answers, saved_at }))
    }

    pub fn clear_answers(&mut self) -> Result<(), StorageError> {
        self.remove_all(&[FORM_DATA_KEY, FORM_TIMESTAMP_KEY])
    }

    pub fn save_collapsed(&mut self, sections: &[SectionId]) -> Result<(), StorageError> {
        let ids: Vec<&str> = sections.iter().map(SectionId::as_str).collect();
        self.set(COLLAPSED_SECTIONS_KEY, &ids)
    }

    /// `None` when no list was ever saved
    pub fn load_collapsed(&self) -> Result<Option<Vec<SectionId>>, StorageError> {
        Ok(self
            .get::<Vec<String>>(COLLAPSED_SECTIONS_KEY)?
            .map(|ids| ids.into_iter().map(SectionId::new).collect()))
    }

    /// Forget answers and the collapsed list
    pub fn clear_form(&mut self) -> Result<(), StorageError> {
        self.remove_all(&[FORM_DATA_KEY, FORM_TIMESTAMP_KEY, COLLAPSED_SECTIONS_KEY])
    }
}
