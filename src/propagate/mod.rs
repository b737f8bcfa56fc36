mod cache;
mod error;
mod kepler;
mod satellite;
mod secular;
mod state;
mod trajectory;

pub use cache::TrajectoryCache;
pub use error::PropagationError;
pub use kepler::{solve_kepler, KeplerSolution, KEPLER_MAX_ITERATIONS, KEPLER_TOLERANCE};
pub use satellite::{PropagationModel, Satellite};
pub use secular::SecularModel;
pub use state::StateVector;
pub use trajectory::{SampleGrid, Trajectory};
