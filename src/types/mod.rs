//! Public types for the detector gateway API.

mod boundary;
mod request;
mod result;

pub use boundary::{ErrorBody, HealthResponse};
pub use request::{AnalyzeRequest, DEFAULT_CONTENT_TYPE};
pub use result::{AnalyzeResult, UNKNOWN};
