//! JSON shapes shared with the request-handling layer.

use serde::{Deserialize, Serialize};

use crate::DetectorError;

/// Error body returned alongside [`DetectorError::status_code()`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl From<&DetectorError> for ErrorBody {
    fn from(err: &DetectorError) -> Self {
        Self {
            detail: err.to_string(),
        }
    }
}

/// Liveness body for the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
