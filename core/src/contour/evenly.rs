use crate::contour::HandleSet;
use crate::prelude::{ContourInterpolator, Point, ScanError, ScanResult};

/// Places the same number of points on every polygon edge, so each handle is
/// itself a contour point.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvenlyBetween;

impl ContourInterpolator for EvenlyBetween {
    fn interpolate(&self, handles: &HandleSet, points: usize) -> ScanResult<Vec<Point>> {
        let handle_count = handles.len();
        if points == 0 || points % handle_count != 0 {
            return Err(ScanError::Configuration(format!(
                "contour length {} is not a multiple of the handle count {}",
                points, handle_count
            )));
        }
        let per_edge = points / handle_count;

        // Each edge contributes its start handle plus the points up to (but not
        // including) the next handle, which opens the following edge. The
        // closing edge from the last handle back to the first is emitted last,
        // leaving the first drawn handle at the head of the sequence; that is
        // where the mirrors are parked before a scan.
        let contour: Vec<Point> = handles
            .edges()
            .flat_map(|(from, to)| {
                (0..per_edge).map(move |step| from.lerp(to, step as f64 / per_edge as f64))
            })
            .collect();

        debug_assert_eq!(contour.len(), points);
        Ok(contour)
    }
}
