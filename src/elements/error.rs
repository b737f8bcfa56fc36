use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElementsError {
    #[error("catalog {catalog_id}: {field} {reason}")]
    OutOfRange {
        catalog_id: u64,
        field: &'static str,
        reason: String,
    },
    #[error("invalid tle: {0}")]
    InvalidTle(String),
    #[error("invalid tle format")]
    InvalidTleFormat,
    #[error("catalog {catalog_id}: propagator rejected elements: {message}")]
    Model { catalog_id: u64, message: String },
}

impl ElementsError {
    pub fn catalog_id(&self) -> Option<u64> {
        match self {
            ElementsError::OutOfRange { catalog_id, .. }
            | ElementsError::Model { catalog_id, .. } => Some(*catalog_id),
            ElementsError::InvalidTle(_) | ElementsError::InvalidTleFormat => None,
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            ElementsError::OutOfRange { field, .. } => field,
            ElementsError::InvalidTle(_) | ElementsError::InvalidTleFormat => "tle",
            ElementsError::Model { .. } => "elements",
        }
    }
}

impl From<sgp4::TleError> for ElementsError {
    fn from(err: sgp4::TleError) -> Self {
        ElementsError::InvalidTle(err.to_string())
    }
}
