//! Conjunction assessment for pairs of Earth-orbiting objects.
//!
//! Element sets are propagated (SGP4 by default), screened by radial bands
//! and sampled proximity, refined to a closest approach per candidate window
//! and scored with a collision probability.

pub mod approach;
pub mod config;
pub mod constants;
pub mod elements;
pub mod engine;
pub mod propagate;
pub mod screening;
pub mod window;

pub use config::{Config, ConfigError, EngineConfig};
pub use elements::{Catalog, MeanElements, OrbitalElementSet};
pub use engine::{
    assess, propagate, ConjunctionEngine, EngineError, FilterStage, PairAssessmentRequest,
    PairAssessmentResult,
};
pub use propagate::{PropagationModel, StateVector};
pub use window::TimeWindow;
