use crate::contour::HandleSet;
use crate::math::{ClosedCurve, StatsHelper};
use crate::prelude::{ContourInterpolator, Point, ScanError, ScanResult};

/// Fits a closed, unsmoothed cubic spline through the handles (chord-length
/// parameterized) and samples it at evenly spaced parameter values over
/// `[0, 1]`. Output points only coincide with handles where a sample lands on
/// a handle's parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformSpline;

impl ContourInterpolator for UniformSpline {
    fn interpolate(&self, handles: &HandleSet, points: usize) -> ScanResult<Vec<Point>> {
        if points == 0 {
            return Err(ScanError::Configuration(
                "contour length must be at least one point".into(),
            ));
        }
        let curve = ClosedCurve::through(handles.points())?;
        Ok(StatsHelper::linspace(0.0, 1.0, points)
            .into_iter()
            .map(|t| curve.at(t))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn triangle() -> HandleSet {
        HandleSet::new(vec![
            Point::new(100.0, 100.0),
            Point::new(200.0, 100.0),
            Point::new(150.0, 200.0),
        ])
        .unwrap()
    }

    #[test]
    fn uniform_contour_has_requested_length() {
        let contour = UniformSpline.interpolate(&triangle(), 300).unwrap();
        assert_eq!(contour.len(), 300);
    }

    #[test]
    fn uniform_contour_starts_and_ends_on_first_handle() {
        let contour = UniformSpline.interpolate(&triangle(), 64).unwrap();
        let first = contour[0];
        let last = contour[63];
        assert_abs_diff_eq!(first.x, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(first.y, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(last.x, first.x, epsilon = 1e-9);
        assert_abs_diff_eq!(last.y, first.y, epsilon = 1e-9);
    }

    #[test]
    fn uniform_contour_steps_are_bounded() {
        let contour = UniformSpline.interpolate(&triangle(), 500).unwrap();
        // perimeter is about 324 px; no step should jump far beyond the mean
        let max_step = contour
            .windows(2)
            .map(|w| w[0].distance(&w[1]))
            .fold(0.0, f64::max);
        assert!(max_step < 2.0, "max step {}", max_step);
    }
}
