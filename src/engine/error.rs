use thiserror::Error;

use crate::elements::ElementsError;
use crate::propagate::PropagationError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid element set {catalog_id:?}: {field}: {reason}")]
    InvalidElementSet {
        catalog_id: Option<u64>,
        field: &'static str,
        reason: String,
    },
    #[error("invalid request: {field}: {reason}")]
    InvalidRequest { field: &'static str, reason: String },
    #[error("propagation diverged at every sampled epoch for catalog {catalog_id}: {source}")]
    PropagationDivergence {
        catalog_id: u64,
        #[source]
        source: PropagationError,
    },
}

impl EngineError {
    pub(crate) fn invalid_request(field: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidRequest {
            field,
            reason: reason.into(),
        }
    }
}

impl From<ElementsError> for EngineError {
    fn from(err: ElementsError) -> Self {
        EngineError::InvalidElementSet {
            catalog_id: err.catalog_id(),
            field: err.field(),
            reason: err.to_string(),
        }
    }
}
