//! Outcome model: the single result value a performed task resolves to.
//!
//! Replaces a success/failure callback pair. Exactly one outcome is produced
//! per `perform`, so success or failure is reported exactly once.

use serde::de::DeserializeOwned;

use super::errors::ApiError;
use super::response::TaskResponse;

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Succeeded(TaskResponse),
    Failed(ApiError),
    /// The task was cancelled; neither success nor failure is reported.
    Cancelled,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskOutcome::Cancelled)
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            TaskOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Collapse into a `Result`; cancellation becomes `ApiError::Cancelled`.
    pub fn into_result(self) -> Result<TaskResponse, ApiError> {
        match self {
            TaskOutcome::Succeeded(response) => Ok(response),
            TaskOutcome::Failed(err) => Err(err),
            TaskOutcome::Cancelled => Err(ApiError::Cancelled),
        }
    }

    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        self.into_result()?.decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cancelled_collapses_to_cancelled_error() {
        let err = TaskOutcome::Cancelled.into_result().unwrap_err();
        assert_eq!(err, ApiError::Cancelled);
    }

    #[test]
    fn succeeded_decodes_mapped_value() {
        let outcome = TaskOutcome::Succeeded(TaskResponse {
            raw: json!({ "login": "octocat" }),
            mapped: json!({ "name": "octocat" }),
        });
        assert!(outcome.is_success());
        let value: serde_json::Value = outcome.decode().unwrap();
        assert_eq!(value["name"], "octocat");
    }

    #[test]
    fn failed_exposes_error() {
        let outcome = TaskOutcome::Failed(ApiError::transport(Some(500), "boom"));
        assert_eq!(outcome.error().and_then(ApiError::status), Some(500));
    }
}
