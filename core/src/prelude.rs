use serde::{Deserialize, Serialize};
use std::fmt;

use crate::contour::{ContourStrategy, HandleSet};
use crate::dynamics::ValidationReport;

/// Frame width (pixels) the pixel-to-voltage calibration was measured against.
pub const REFERENCE_FRAME_PIXELS: usize = 500;

/// Physical dynamic limits of the galvo mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareLimits {
    /// Maximum slew speed in volt/s.
    pub max_galvo_speed: f64,
    /// Maximum acceleration in volt/s^2.
    pub max_galvo_accel: f64,
}

impl Default for HardwareLimits {
    fn default() -> Self {
        Self {
            max_galvo_speed: 20_000.0,
            max_galvo_accel: 1.54e8,
        }
    }
}

impl HardwareLimits {
    pub fn check(&self) -> ScanResult<()> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(self.max_galvo_speed) || !valid(self.max_galvo_accel) {
            return Err(ScanError::InvalidInput(format!(
                "hardware limits must be positive and finite (speed {}, accel {})",
                self.max_galvo_speed, self.max_galvo_accel
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub sample_rate: u32,
    pub volt_half_range: f64,
    pub frame_pixels: usize,
    pub contour_points: usize,
    pub strategy: ContourStrategy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            sample_rate: 50_000,
            volt_half_range: 3.0,
            frame_pixels: REFERENCE_FRAME_PIXELS,
            contour_points: 400,
            strategy: ContourStrategy::Uniform,
        }
    }
}

/// Pixel-space point. Serialized as a `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl From<[f64; 2]> for Point {
    fn from(value: [f64; 2]) -> Self {
        Point::new(value[0], value[1])
    }
}

impl From<Point> for [f64; 2] {
    fn from(value: Point) -> Self {
        [value.x, value.y]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
        }
    }
}

/// Paired x/y voltage traces sampled at a common rate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TracePair {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl TracePair {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> ScanResult<Self> {
        if x.len() != y.len() {
            return Err(ScanError::InvalidInput(format!(
                "x trace has {} samples but y trace has {}",
                x.len(),
                y.len()
            )));
        }
        Ok(Self { x, y })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// First (x, y) sample; the position the mirrors are parked at before a scan.
    pub fn first_sample(&self) -> Option<(f64, f64)> {
        Some((*self.x.first()?, *self.y.first()?))
    }
}

/// Error kinds raised by the scan pipeline. None of them are fatal; each
/// simply prevents a scan from starting.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ScanError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("{0}")]
    DynamicsViolation(Box<ValidationReport>),
    #[error("missing data: {0}")]
    MissingData(String),
    #[error("slot {slot} already holds a {existing} contour; cannot add a {requested} contour")]
    MutualExclusion {
        slot: u32,
        existing: String,
        requested: String,
    },
    #[error("calibration mismatch: mapping is calibrated for {expected} pixels, frame has {actual}")]
    CalibrationMismatch { expected: usize, actual: usize },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type ScanResult<T> = Result<T, ScanError>;

pub trait ContourInterpolator {
    fn interpolate(&self, handles: &HandleSet, points: usize) -> ScanResult<Vec<Point>>;
}
