use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure to produce a state for one satellite at one epoch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationError {
    #[error("catalog {catalog_id} at {epoch}: sgp4 diverged: {message}")]
    Sgp4 {
        catalog_id: u64,
        epoch: DateTime<Utc>,
        message: String,
    },
    #[error(
        "catalog {catalog_id} at {epoch}: Kepler equation did not converge in {iterations} iterations (e = {eccentricity})"
    )]
    KeplerDivergence {
        catalog_id: u64,
        epoch: DateTime<Utc>,
        eccentricity: f64,
        iterations: usize,
    },
    #[error("catalog {catalog_id} at {epoch}: orbit decayed (perigee radius {perigee_km:.1} km)")]
    Decayed {
        catalog_id: u64,
        epoch: DateTime<Utc>,
        perigee_km: f64,
    },
}

impl PropagationError {
    pub fn catalog_id(&self) -> u64 {
        match self {
            PropagationError::Sgp4 { catalog_id, .. }
            | PropagationError::KeplerDivergence { catalog_id, .. }
            | PropagationError::Decayed { catalog_id, .. } => *catalog_id,
        }
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        match self {
            PropagationError::Sgp4 { epoch, .. }
            | PropagationError::KeplerDivergence { epoch, .. }
            | PropagationError::Decayed { epoch, .. } => *epoch,
        }
    }
}
