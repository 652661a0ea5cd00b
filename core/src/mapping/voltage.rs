use crate::prelude::{Point, ScanError, ScanResult, TracePair, REFERENCE_FRAME_PIXELS};

/// Linear pixel-to-voltage mapping, calibrated against a fixed frame width.
///
/// `v = ((p / R) * 2 - 1) * half_range`, rounded to millivolts per axis. The
/// calibration only holds when the caller's frame is exactly `R` pixels wide;
/// other frame sizes are rejected rather than rescaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageMapper {
    volt_half_range: f64,
    reference_pixels: usize,
}

impl VoltageMapper {
    pub fn new(volt_half_range: f64) -> Self {
        Self::with_reference(volt_half_range, REFERENCE_FRAME_PIXELS)
    }

    pub fn with_reference(volt_half_range: f64, reference_pixels: usize) -> Self {
        Self {
            volt_half_range,
            reference_pixels,
        }
    }

    pub fn volt_half_range(&self) -> f64 {
        self.volt_half_range
    }

    fn check_frame(&self, frame_pixels: usize) -> ScanResult<()> {
        if frame_pixels != self.reference_pixels {
            return Err(ScanError::CalibrationMismatch {
                expected: self.reference_pixels,
                actual: frame_pixels,
            });
        }
        Ok(())
    }

    fn to_volts(&self, pixel: f64) -> f64 {
        let volts = ((pixel / self.reference_pixels as f64) * 2.0 - 1.0) * self.volt_half_range;
        round_millivolts(volts)
    }

    /// Maps `points` to voltage space and forces both axes to exactly
    /// `contour_length` samples. Length changes wrap cyclically (repeat from
    /// the start, or truncate) rather than resample.
    pub fn convert(
        &self,
        frame_pixels: usize,
        points: &[Point],
        contour_length: usize,
    ) -> ScanResult<TracePair> {
        self.check_frame(frame_pixels)?;
        if points.is_empty() {
            return Err(ScanError::MissingData(
                "no contour points to convert".into(),
            ));
        }
        log::debug!(
            "converting {} points within [-{}, {}] V",
            points.len(),
            self.volt_half_range,
            self.volt_half_range
        );

        let x: Vec<f64> = points.iter().map(|p| self.to_volts(p.x)).collect();
        let y: Vec<f64> = points.iter().map(|p| self.to_volts(p.y)).collect();
        TracePair::new(
            resize_cyclic(&x, contour_length),
            resize_cyclic(&y, contour_length),
        )
    }

    pub fn convert_point(&self, frame_pixels: usize, point: Point) -> ScanResult<(f64, f64)> {
        self.check_frame(frame_pixels)?;
        Ok((self.to_volts(point.x), self.to_volts(point.y)))
    }
}

/// Rounds to three decimals, ties to even.
fn round_millivolts(volts: f64) -> f64 {
    (volts * 1000.0).round_ties_even() / 1000.0
}

fn resize_cyclic(values: &[f64], len: usize) -> Vec<f64> {
    values.iter().copied().cycle().take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn frame_edges_map_to_voltage_limits() {
        let mapper = VoltageMapper::new(3.0);
        let traces = mapper
            .convert(500, &[Point::new(0.0, 500.0), Point::new(250.0, 125.0)], 2)
            .unwrap();
        assert_abs_diff_eq!(traces.x[0], -3.0, epsilon = 1e-3);
        assert_abs_diff_eq!(traces.y[0], 3.0, epsilon = 1e-3);
        assert_abs_diff_eq!(traces.x[1], 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(traces.y[1], -1.5, epsilon = 1e-3);
    }

    #[test]
    fn other_frame_sizes_are_rejected() {
        let mapper = VoltageMapper::new(3.0);
        for frame in [0, 256, 499, 501, 1024] {
            assert!(matches!(
                mapper.convert(frame, &[Point::new(1.0, 1.0)], 1),
                Err(ScanError::CalibrationMismatch { expected: 500, actual }) if actual == frame
            ));
        }
    }

    #[test]
    fn values_are_rounded_to_millivolts() {
        let mapper = VoltageMapper::new(1.0);
        let (x, _) = mapper.convert_point(500, Point::new(1.0, 0.0)).unwrap();
        // 1 px = 4 mV exactly; a third of a pixel lands between millivolt steps
        assert_abs_diff_eq!(x, -0.996, epsilon = 1e-12);
        let (x, _) = mapper.convert_point(500, Point::new(1.0 / 3.0, 0.0)).unwrap();
        assert_abs_diff_eq!(x, -0.999, epsilon = 1e-12);
    }

    #[test]
    fn resize_wraps_cyclically() {
        let mapper = VoltageMapper::new(1.0);
        let points = [Point::new(0.0, 0.0), Point::new(500.0, 500.0)];
        let longer = mapper.convert(500, &points, 5).unwrap();
        assert_eq!(longer.x, vec![-1.0, 1.0, -1.0, 1.0, -1.0]);
        let shorter = mapper.convert(500, &points, 1).unwrap();
        assert_eq!(shorter.y, vec![-1.0]);
    }
}
