pub mod apsis;
pub mod kdtree;
pub mod spatial;

pub use apsis::{band_gap_km, quick_reject, radial_band_km, radial_margin_km};
pub use kdtree::KdTree;
pub use spatial::{find_candidate_windows, SampledApproach, SpatialScreen};
