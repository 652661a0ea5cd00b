pub mod matrix;
pub mod spline;
pub mod stats;

pub use matrix::MatrixHelper;
pub use spline::{ClosedCurve, PeriodicSpline};
pub use stats::StatsHelper;
