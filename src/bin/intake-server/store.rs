//! Submission files on disk: one JSON document each plus a running CSV

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub const CSV_FILE: &str = "submissions.csv";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode submission: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct SubmissionStore {
    dir: PathBuf,
    /// Serializes CSV appends so rows never interleave
    csv: Mutex<()>,
}

impl SubmissionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            csv: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stamp and persist one submission, returning its id. A failed CSV
    /// append is logged; the JSON document is the record of truth.
    pub async fn save(
        &self,
        answers: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut submission = answers;
        submission.insert("submissionId".to_string(), Value::String(id.clone()));
        submission.insert(
            "submittedAt".to_string(),
            Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        submission.insert("status".to_string(), Value::String("pending".to_string()));

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Write {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(format!("submission-{id}.json"));
        let document = serde_json::to_vec_pretty(&submission)?;
        tokio::fs::write(&path, document)
            .await
            .map_err(|source| StoreError::Write { path, source })?;

        if let Err(e) = self.append_csv(&submission).await {
            tracing::warn!(error = %e, submission = %id, "CSV append failed");
        }

        tracing::info!(submission = %id, "Submission stored");
        Ok(id)
    }

    /// Append a row. The header is written with the first row; later rows
    /// follow its columns, leaving unknown ones empty.
    async fn append_csv(&self, submission: &Map<String, Value>) -> Result<(), StoreError> {
        let _guard = self.csv.lock().await;
        let path = self.dir.join(CSV_FILE);
        let write_err = |source| StoreError::Write {
            path: path.clone(),
            source,
        };

        let existing = match tokio::fs::read_to_string(&path).await {
            Ok(text) => Some(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(write_err(e)),
        };

        let mut out = String::new();
        let columns: Vec<String> = match existing.as_deref().and_then(|t| t.lines().next()) {
            Some(header) => header.split(',').map(str::to_string).collect(),
            None => {
                let mut columns: Vec<String> = submission.keys().cloned().collect();
                columns.sort();
                out.push_str(&columns.join(","));
                out.push('\n');
                columns
            }
        };

        let row: Vec<String> = columns
            .iter()
            .map(|column| submission.get(column).map(csv_cell).unwrap_or_default())
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(write_err)?;
        file.write_all(out.as_bytes()).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)
    }
}

/// Quoted cell; checkbox arrays are joined with `; `
fn csv_cell(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    format!("\"{}\"", text.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn answers(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("answers must be an object"),
        }
    }

    #[test]
    fn test_csv_cell_quotes_and_joins() {
        assert_eq!(csv_cell(&json!("say \"hi\"")), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_cell(&json!(["Web", "Cloud"])), "\"Web; Cloud\"");
        assert_eq!(csv_cell(&Value::Null), "\"\"");
        assert_eq!(csv_cell(&json!(3)), "\"3\"");
    }

    #[tokio::test]
    async fn test_save_writes_document_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let store = SubmissionStore::new(dir.path().join("submissions"));
        let now = Utc::now();

        let id = store
            .save(answers(json!({"companyname": "Acme"})), now)
            .await
            .unwrap();

        let document = std::fs::read_to_string(
            store.dir().join(format!("submission-{id}.json")),
        )
        .unwrap();
        let document: Value = serde_json::from_str(&document).unwrap();
        assert_eq!(document["companyname"], json!("Acme"));
        assert_eq!(document["submissionId"], json!(id));
        assert_eq!(document["status"], json!("pending"));

        let csv = std::fs::read_to_string(store.dir().join(CSV_FILE)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "companyname,status,submissionId,submittedAt");
        assert!(lines[1].starts_with("\"Acme\",\"pending\","));
    }

    #[tokio::test]
    async fn test_later_rows_follow_first_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = SubmissionStore::new(dir.path());
        let now = Utc::now();

        store
            .save(answers(json!({"companyname": "Acme"})), now)
            .await
            .unwrap();
        store
            .save(answers(json!({"email": "a@b.c", "companyname": "Beta"})), now)
            .await
            .unwrap();

        let csv = std::fs::read_to_string(dir.path().join(CSV_FILE)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "companyname,status,submissionId,submittedAt");
        assert!(lines[2].starts_with("\"Beta\",\"pending\","));
        assert!(!lines[2].contains("a@b.c"));
    }
}
