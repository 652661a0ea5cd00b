use galvocore::daq_interface::DriveWaveform;
use galvocore::prelude::Point;
use galvocore::scan::AssembledScan;
use serde::{Deserialize, Serialize};

/// State served to the front end on `GET /waveform`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WaveformModel {
    pub waveform: Option<DriveWaveform>,
    pub points_per_round: usize,
    pub contour_frequency: f64,
    pub time_per_round_ms: f64,
    pub committed_slots: Vec<u32>,
    pub messages: Vec<String>,
}

impl WaveformModel {
    pub fn from_scan(scan: &AssembledScan, committed_slots: Vec<u32>, messages: Vec<String>) -> Self {
        Self {
            waveform: Some(scan.to_waveform()),
            points_per_round: scan.points_per_round(),
            contour_frequency: scan.contour_frequency(),
            time_per_round_ms: scan.time_per_round_ms(),
            committed_slots,
            messages,
        }
    }
}

/// Body of `POST /contour`: an externally segmented outline for one slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContourRequest {
    pub slot: u32,
    pub contour: Vec<Point>,
}
