//! Contour generation: turns a closed polygon of user-placed handles into a
//! fixed-length ordered point sequence.

pub mod evenly;
pub mod uniform;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::prelude::{ContourInterpolator, Point, ScanError, ScanResult};

pub use evenly::EvenlyBetween;
pub use uniform::UniformSpline;

/// Ordered polygon vertices in pixel space; implicitly closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct HandleSet(Vec<Point>);

impl HandleSet {
    pub const MIN_HANDLES: usize = 3;

    pub fn new(points: Vec<Point>) -> ScanResult<Self> {
        if points.len() < Self::MIN_HANDLES {
            return Err(ScanError::MissingData(format!(
                "a contour needs at least {} handles, got {}",
                Self::MIN_HANDLES,
                points.len()
            )));
        }
        Ok(Self(points))
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consecutive handle pairs, wrapping the last handle back to the first.
    pub fn edges(&self) -> impl Iterator<Item = (&Point, &Point)> {
        self.0.iter().zip(self.0.iter().cycle().skip(1))
    }
}

impl TryFrom<Vec<Point>> for HandleSet {
    type Error = ScanError;

    fn try_from(points: Vec<Point>) -> ScanResult<Self> {
        HandleSet::new(points)
    }
}

impl From<HandleSet> for Vec<Point> {
    fn from(handles: HandleSet) -> Self {
        handles.0
    }
}

/// Interpolation strategy used to expand handles into contour points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContourStrategy {
    /// Closed cubic spline sampled at uniform parameter steps.
    #[default]
    Uniform,
    /// Equal point count on every polygon edge.
    EvenlyBetween,
}

impl ContourStrategy {
    pub fn generate(&self, handles: &HandleSet, points: usize) -> ScanResult<Vec<Point>> {
        match self {
            ContourStrategy::Uniform => UniformSpline.interpolate(handles, points),
            ContourStrategy::EvenlyBetween => EvenlyBetween.interpolate(handles, points),
        }
    }
}

impl fmt::Display for ContourStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContourStrategy::Uniform => write!(f, "Uniform"),
            ContourStrategy::EvenlyBetween => write!(f, "Evenly between"),
        }
    }
}

impl FromStr for ContourStrategy {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "uniform" => Ok(ContourStrategy::Uniform),
            "evenly-between" | "evenly" => Ok(ContourStrategy::EvenlyBetween),
            other => Err(ScanError::Configuration(format!(
                "unknown contour strategy '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_set_requires_three_points() {
        let two = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        assert!(matches!(HandleSet::new(two), Err(ScanError::MissingData(_))));
    }

    #[test]
    fn edges_wrap_around() {
        let handles = HandleSet::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ])
        .unwrap();
        let edges: Vec<_> = handles.edges().collect();
        assert_eq!(edges.len(), 3);
        assert_eq!(*edges[2].1, Point::new(0.0, 0.0));
    }

    #[test]
    fn strategy_parses_display_names() {
        assert_eq!(
            "Evenly between".parse::<ContourStrategy>().unwrap(),
            ContourStrategy::EvenlyBetween
        );
        assert_eq!("uniform".parse::<ContourStrategy>().unwrap(), ContourStrategy::Uniform);
        assert!("spiral".parse::<ContourStrategy>().is_err());
    }

    #[test]
    fn handle_set_deserialization_enforces_minimum() {
        let parsed: Result<HandleSet, _> = serde_json::from_str("[[0, 0], [1, 1]]");
        assert!(parsed.is_err());
        let parsed: HandleSet = serde_json::from_str("[[0, 0], [1, 1], [2, 0]]").unwrap();
        assert_eq!(parsed.len(), 3);
    }
}
