//! Response shapes: what comes back from the transport and what the runner
//! hands to the caller.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::ApiError;

/// Raw response object accompanying a transport failure.
///
/// Delegates inspect it to build custom errors (for example from an error
/// body the server sent along with a 4xx status).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    pub status: Option<u16>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl RawResponse {
    pub fn with_status(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A failed transport call: the error plus whatever response was received.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportFailure {
    pub error: ApiError,
    pub response: RawResponse,
}

impl TransportFailure {
    pub fn new(error: ApiError, response: RawResponse) -> Self {
        Self { error, response }
    }

    /// HTTP-style failure: status code, message and optional error body.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            error: ApiError::transport(Some(status), message),
            response: RawResponse::with_status(status),
        }
    }

    /// Failure without any response (connection refused, timeout, ...).
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            error: ApiError::transport(None, message),
            response: RawResponse::default(),
        }
    }
}

/// Successful result of a task: the decoded wire payload and its mapped form.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResponse {
    pub raw: Value,
    pub mapped: Value,
}

impl TaskResponse {
    /// Deserialize the mapped value into a concrete type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.mapped.clone()).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_failure_carries_status_in_both_parts() {
        let failure = TransportFailure::status(401, "unauthorized");
        assert_eq!(failure.error.status(), Some(401));
        assert_eq!(failure.response.status, Some(401));
    }

    #[test]
    fn decode_reports_mismatch_as_decode_error() {
        let response = TaskResponse {
            raw: json!({}),
            mapped: json!({ "id": "not a number" }),
        };

        #[derive(Debug, serde::Deserialize)]
        struct Item {
            #[allow(dead_code)]
            id: u64,
        }

        let err = response.decode::<Item>().unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
