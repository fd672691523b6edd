//! Request routing for the intake endpoints

use crate::http::{Request, Response};
use crate::store::SubmissionStore;
use chrono::Utc;
use serde_json::{json, Map, Value};

pub const HEALTH_PATH: &str = "/api/health";
pub const SUBMIT_PATH: &str = "/api/submit-form";

/// Answer ids that must be present and non-empty
pub const DEFAULT_REQUIRED: &[&str] = &[
    "companyname",
    "email",
    "problemcategory",
    "budgetrange",
    "projectduration",
    "problemdescription",
];

pub struct Routes {
    store: SubmissionStore,
    required: Vec<String>,
}

impl Routes {
    pub fn new(store: SubmissionStore, required: Vec<String>) -> Self {
        Self { store, required }
    }

    pub fn store(&self) -> &SubmissionStore {
        &self.store
    }

    pub async fn handle(&self, request: Request) -> Response {
        match (request.method.as_str(), request.path.as_str()) {
            ("OPTIONS", _) => Response::no_content(),
            ("GET", HEALTH_PATH) => Response::json(
                200,
                json!({ "status": "ok", "timestamp": Utc::now().to_rfc3339() }),
            ),
            ("POST", SUBMIT_PATH) => self.submit(&request.body).await,
            (_, HEALTH_PATH | SUBMIT_PATH) => Response::json(
                405,
                json!({ "success": false, "error": "Method not allowed" }),
            ),
            _ => Response::json(404, json!({ "success": false, "error": "Not found" })),
        }
    }

    async fn submit(&self, body: &[u8]) -> Response {
        let answers = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(answers)) => answers,
            _ => {
                return Response::json(
                    400,
                    json!({ "success": false, "error": "Expected a JSON object" }),
                )
            }
        };

        let missing = self.missing_fields(&answers);
        if !missing.is_empty() {
            tracing::info!(missing = ?missing, "Submission rejected");
            return Response::json(
                400,
                json!({
                    "success": false,
                    "error": "Missing required fields",
                    "missingFields": missing,
                }),
            );
        }

        match self.store.save(answers, Utc::now()).await {
            Ok(id) => Response::json(
                200,
                json!({
                    "success": true,
                    "message": "Form submitted successfully",
                    "submissionId": id,
                    "clearLocalStorage": true,
                }),
            ),
            Err(e) => {
                tracing::error!(error = %e, "Submission could not be stored");
                Response::json(
                    500,
                    json!({ "success": false, "error": "Failed to process submission" }),
                )
            }
        }
    }

    fn missing_fields(&self, answers: &Map<String, Value>) -> Vec<String> {
        self.required
            .iter()
            .filter(|id| answers.get(id.as_str()).map_or(true, is_blank))
            .cloned()
            .collect()
    }
}

/// Empty strings, null, false and zero count as unanswered
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}
