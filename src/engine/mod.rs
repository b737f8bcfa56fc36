mod assess;
pub mod batch;
pub mod dataset;
mod error;
mod request;
mod result;

use chrono::{DateTime, Utc};

use crate::elements::OrbitalElementSet;
use crate::propagate::{PropagationModel, Satellite, StateVector};

pub use assess::{assess, ConjunctionEngine};
pub use batch::{discover_pairs, BatchParams, BatchReport, BatchRunner};
pub use dataset::{write_labels, LabelRow, Labels, SatelliteFeatures};
pub use error::EngineError;
pub use request::{
    PairAssessmentRequest, DEFAULT_APSIS_THRESHOLD_KM, DEFAULT_SAMPLING_INTERVAL_S,
    DEFAULT_SPATIAL_THRESHOLD_KM,
};
pub use result::{
    Diagnostics, FilterStage, PairAssessmentResult, PropagationWarning, RefinedApproach,
};

/// State of one element set at `epoch` with the default SGP4 model.
pub fn propagate(
    elements: &OrbitalElementSet,
    epoch: DateTime<Utc>,
) -> Result<StateVector, EngineError> {
    propagate_with(elements, epoch, PropagationModel::default())
}

pub fn propagate_with(
    elements: &OrbitalElementSet,
    epoch: DateTime<Utc>,
    model: PropagationModel,
) -> Result<StateVector, EngineError> {
    let satellite = Satellite::new(elements.clone(), model)?;
    satellite
        .propagate(epoch)
        .map_err(|source| EngineError::PropagationDivergence {
            catalog_id: elements.catalog_id(),
            source,
        })
}
