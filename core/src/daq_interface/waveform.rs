use serde::{Deserialize, Serialize};

use crate::prelude::TracePair;

/// `(sample_rate, x, y)` tuple consumed by the analog output hardware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveWaveform {
    pub sample_rate: u32,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl DriveWaveform {
    pub fn from_traces(sample_rate: u32, traces: TracePair) -> Self {
        Self {
            sample_rate,
            x: traces.x,
            y: traces.y,
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.x.len() as f64 / self.sample_rate as f64
    }

    pub fn first_sample(&self) -> Option<(f64, f64)> {
        Some((*self.x.first()?, *self.y.first()?))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    Continuous,
    SingleShot,
}

/// Analog output device driving the galvo mirrors. Implementations live
/// outside this crate; the core only produces their input.
pub trait DaqOutput {
    type Error;

    fn start(&mut self, waveform: &DriveWaveform, mode: OutputMode) -> Result<(), Self::Error>;

    fn park(&mut self, x: f64, y: f64) -> Result<(), Self::Error>;

    fn stop(&mut self) -> Result<(), Self::Error>;
}
