mod element_set;
mod error;
mod tle;

pub use element_set::{MeanElements, OrbitalElementSet};
pub(crate) use element_set::seconds_between;
pub use error::ElementsError;
pub use tle::{parse_tle, parse_tle_lines, Catalog};
