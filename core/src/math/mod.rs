pub mod kalman;
pub mod stats;

pub use kalman::KalmanSmoother;
pub use stats::{DataStats, StatsHelper};
