pub mod probability;
pub mod refine;

pub use probability::{
    disk_probability, estimate_probability, max_probability, Encounter, ProbabilityModel,
};
pub use refine::{refine, ClosestApproach, RefinerConfig, Refinement};
