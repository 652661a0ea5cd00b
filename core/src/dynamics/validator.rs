use serde::{Deserialize, Serialize};
use std::fmt;

use crate::math::StatsHelper;
use crate::prelude::{Axis, HardwareLimits, ScanError, ScanResult, TracePair};
use crate::telemetry::StatusSink;

/// Discrete kinematics of one axis and the samples that break the limits.
///
/// Violation indices are 1-based positions in the speed / acceleration
/// arrays, matching the handle numbering shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisDynamics {
    pub axis: Axis,
    pub speed_violations: Vec<usize>,
    pub accel_violations: Vec<usize>,
    pub mean_speed: f64,
    pub peak_speed: f64,
    pub mean_accel: f64,
    pub peak_accel: f64,
}

impl AxisDynamics {
    fn measure(axis: Axis, trace: &[f64], sample_rate: u32, limits: &HardwareLimits) -> Self {
        let dt = 1.0 / sample_rate as f64;
        let speed = StatsHelper::derivative(trace, dt);
        let accel = StatsHelper::derivative(&speed, dt);

        let exceeding = |values: &[f64], limit: f64| -> Vec<usize> {
            values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.abs() > limit)
                .map(|(i, _)| i + 1)
                .collect()
        };

        Self {
            axis,
            speed_violations: exceeding(&speed, limits.max_galvo_speed),
            accel_violations: exceeding(&accel, limits.max_galvo_accel),
            mean_speed: StatsHelper::mean_abs(&speed),
            peak_speed: StatsHelper::max_abs(&speed),
            mean_accel: StatsHelper::mean_abs(&accel),
            peak_accel: StatsHelper::max_abs(&accel),
        }
    }

    pub fn speed_ok(&self) -> bool {
        self.speed_violations.is_empty()
    }

    pub fn accel_ok(&self) -> bool {
        self.accel_violations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub sample_rate: u32,
    pub x: AxisDynamics,
    pub y: AxisDynamics,
    pub passed: bool,
}

impl ValidationReport {
    pub fn axes(&self) -> [&AxisDynamics; 2] {
        [&self.x, &self.y]
    }

    pub fn speed_ok(&self) -> bool {
        self.x.speed_ok() && self.y.speed_ok()
    }

    pub fn accel_ok(&self) -> bool {
        self.x.accel_ok() && self.y.accel_ok()
    }

    pub fn speed_message(&self) -> String {
        if self.speed_ok() {
            return "Contour speed is OK".to_string();
        }
        let mut message = String::from("Speed too high in direction(s):");
        for axis in self.axes().into_iter().filter(|a| !a.speed_ok()) {
            message.push_str(&format!(
                " {} ({:.2} V/s) at handles {:?}",
                axis.axis, axis.peak_speed, axis.speed_violations
            ));
        }
        message
    }

    pub fn accel_message(&self) -> String {
        if self.accel_ok() {
            return "Contour acceleration is OK".to_string();
        }
        let mut message = String::from("Acceleration too high in direction(s):");
        for axis in self.axes().into_iter().filter(|a| !a.accel_ok()) {
            message.push_str(&format!(
                " {} ({:.2e} V/s²) at handles {:?}",
                axis.axis, axis.peak_accel, axis.accel_violations
            ));
        }
        message
    }

    /// Mean absolute speed and acceleration per axis.
    pub fn summary(&self) -> Vec<String> {
        self.axes()
            .into_iter()
            .flat_map(|axis| {
                [
                    format!("Mean {} speed: {:.0} [volt/s]", axis.axis, axis.mean_speed),
                    format!(
                        "Mean {} acceleration: {:.2e} [volt/s^2]",
                        axis.axis, axis.mean_accel
                    ),
                ]
            })
            .collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}; {}", self.speed_message(), self.accel_message())
    }
}

/// Checks candidate drive traces against the galvo speed and acceleration
/// limits using first and second discrete differences.
#[derive(Debug, Clone, Copy)]
pub struct DynamicsValidator {
    limits: HardwareLimits,
}

impl DynamicsValidator {
    pub fn new(limits: HardwareLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &HardwareLimits {
        &self.limits
    }

    /// Builds the report without judging it; never fails.
    pub fn check(&self, sample_rate: u32, x: &[f64], y: &[f64]) -> ValidationReport {
        let x = AxisDynamics::measure(Axis::X, x, sample_rate, &self.limits);
        let y = AxisDynamics::measure(Axis::Y, y, sample_rate, &self.limits);
        let passed = x.speed_ok() && y.speed_ok() && x.accel_ok() && y.accel_ok();
        ValidationReport {
            sample_rate,
            x,
            y,
            passed,
        }
    }

    /// Returns the report when the traces are within limits, otherwise a
    /// `DynamicsViolation` carrying the same report.
    pub fn validate(&self, sample_rate: u32, traces: &TracePair) -> ScanResult<ValidationReport> {
        if sample_rate == 0 {
            return Err(ScanError::InvalidInput("sample rate must be positive".into()));
        }
        if traces.x.len() != traces.y.len() {
            return Err(ScanError::InvalidInput(format!(
                "x trace has {} samples but y trace has {}",
                traces.x.len(),
                traces.y.len()
            )));
        }

        let report = self.check(sample_rate, &traces.x, &traces.y);
        log::debug!(
            "validated {} samples at {} Hz: passed={}",
            traces.len(),
            sample_rate,
            report.passed
        );
        if report.passed {
            Ok(report)
        } else {
            Err(ScanError::DynamicsViolation(Box::new(report)))
        }
    }

    pub fn publish(report: &ValidationReport, sink: &dyn StatusSink) {
        for line in report.summary() {
            sink.publish(&line);
        }
        sink.publish(&report.speed_message());
        sink.publish(&report.accel_message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::CollectingSink;

    fn validator() -> DynamicsValidator {
        DynamicsValidator::new(HardwareLimits {
            max_galvo_speed: 1_000.0,
            max_galvo_accel: 1.0e7,
        })
    }

    fn ramp(len: usize, step: f64) -> Vec<f64> {
        (0..len).map(|i| i as f64 * step).collect()
    }

    #[test]
    fn constant_velocity_trace_passes() {
        // 0.01 V per sample at 10 kHz = 100 V/s
        let x = ramp(50, 0.01);
        let y = ramp(50, -0.005);
        let report = validator().check(10_000, &x, &y);
        assert!(report.passed);
        assert!(report.x.speed_violations.is_empty());
        assert!(report.y.accel_violations.is_empty());
        assert_eq!(report.speed_message(), "Contour speed is OK");
    }

    #[test]
    fn single_step_flags_exactly_one_speed_index() {
        let mut x = ramp(50, 0.01);
        for value in x.iter_mut().skip(20) {
            *value += 0.5;
        }
        let y = ramp(50, 0.0);
        let report = validator().check(10_000, &x, &y);
        assert!(!report.passed);
        assert_eq!(report.x.speed_violations, vec![20]);
        assert!(report.y.speed_violations.is_empty());
        assert!(report.speed_message().starts_with("Speed too high in direction(s): X"));
        assert!(report.speed_message().contains("at handles [20]"));
    }

    #[test]
    fn validate_wraps_failures_in_dynamics_violation() {
        let mut y = ramp(10, 0.0);
        y[5] = 1.0;
        let traces = TracePair::new(ramp(10, 0.0), y).unwrap();
        match validator().validate(10_000, &traces) {
            Err(ScanError::DynamicsViolation(report)) => {
                assert_eq!(report.y.speed_violations, vec![5, 6]);
                assert_eq!(report.y.accel_violations, vec![4, 5, 6]);
            }
            other => panic!("expected a dynamics violation, got {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_zero_sample_rate() {
        let traces = TracePair::new(ramp(4, 0.0), ramp(4, 0.0)).unwrap();
        assert!(matches!(
            validator().validate(0, &traces),
            Err(ScanError::InvalidInput(_))
        ));
    }

    #[test]
    fn publish_sends_summary_and_verdicts() {
        let sink = CollectingSink::new();
        let report = validator().check(10_000, &ramp(8, 0.01), &ramp(8, 0.01));
        DynamicsValidator::publish(&report, &sink);
        let messages = sink.messages();
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0], "Mean X speed: 100 [volt/s]");
        assert_eq!(messages[5], "Contour acceleration is OK");
    }
}
