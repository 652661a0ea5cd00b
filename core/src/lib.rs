//! Drive-waveform synthesis and dynamics validation for galvo laser scanning.
//!
//! The crate turns raster parameters or user-drawn polygons into calibrated
//! x/y voltage traces, checks them against the mirrors' speed and acceleration
//! limits, and assembles the accepted traces into one periodic drive cycle.
//! Hardware transport stays outside; callers receive a `DriveWaveform`.

pub mod contour;
pub mod daq_interface;
pub mod dynamics;
pub mod mapping;
pub mod math;
pub mod prelude;
pub mod scan;
pub mod telemetry;
pub mod waveform;

pub use prelude::{HardwareLimits, Point, ScanConfig, ScanError, ScanResult, TracePair};
