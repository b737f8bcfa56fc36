use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sgp4::{Constants, MinutesSinceEpoch, Orbit};
use strum_macros::Display;

use crate::elements::{ElementsError, OrbitalElementSet};
use crate::propagate::error::PropagationError;
use crate::propagate::secular::SecularModel;
use crate::propagate::state::StateVector;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PropagationModel {
    #[default]
    Sgp4,
    Secular,
}

enum Model {
    Sgp4(Box<Constants>),
    Secular(SecularModel),
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Model::Sgp4(_) => f.write_str("Sgp4"),
            Model::Secular(model) => f.debug_tuple("Secular").field(model).finish(),
        }
    }
}

/// An element set prepared for repeated propagation.
#[derive(Debug)]
pub struct Satellite {
    elements: OrbitalElementSet,
    model: Model,
}

impl Satellite {
    pub fn new(elements: OrbitalElementSet, model: PropagationModel) -> Result<Self, ElementsError> {
        let model = match model {
            PropagationModel::Sgp4 => Model::Sgp4(Box::new(sgp4_constants(&elements)?)),
            PropagationModel::Secular => Model::Secular(SecularModel::new(&elements)),
        };
        Ok(Self { elements, model })
    }

    pub fn elements(&self) -> &OrbitalElementSet {
        &self.elements
    }

    pub fn catalog_id(&self) -> u64 {
        self.elements.catalog_id()
    }

    pub fn model(&self) -> PropagationModel {
        match self.model {
            Model::Sgp4(_) => PropagationModel::Sgp4,
            Model::Secular(_) => PropagationModel::Secular,
        }
    }

    pub fn propagate(&self, epoch: DateTime<Utc>) -> Result<StateVector, PropagationError> {
        match &self.model {
            Model::Sgp4(constants) => {
                let minutes = self.elements.minutes_since_epoch(epoch);
                let prediction = constants
                    .propagate(MinutesSinceEpoch(minutes))
                    .map_err(|e| PropagationError::Sgp4 {
                        catalog_id: self.catalog_id(),
                        epoch,
                        message: e.to_string(),
                    })?;
                Ok(StateVector {
                    epoch,
                    position_km: prediction.position,
                    velocity_km_s: prediction.velocity,
                })
            }
            Model::Secular(model) => model.propagate(epoch),
        }
    }
}

fn sgp4_constants(elements: &OrbitalElementSet) -> Result<Constants, ElementsError> {
    let model_error = |message: String| ElementsError::Model {
        catalog_id: elements.catalog_id(),
        message,
    };

    let orbit = Orbit::from_kozai_elements(
        &sgp4::WGS84,
        elements.inclination(),
        elements.raan(),
        elements.eccentricity(),
        elements.arg_perigee(),
        elements.mean_anomaly(),
        elements.kozai_mean_motion(),
    )
    .map_err(|e| model_error(e.to_string()))?;

    Constants::new(
        sgp4::WGS84,
        sgp4::iau_epoch_to_sidereal_time,
        sgp4::julian_years_since_j2000(&elements.epoch().naive_utc()),
        elements.bstar(),
        orbit,
    )
    .map_err(|e| model_error(e.to_string()))
}
