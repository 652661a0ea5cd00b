use ndarray::{concatenate, Array2, ArrayView2, Axis};

use crate::daq_interface::DriveWaveform;
use crate::prelude::{ScanError, ScanResult, TracePair};

/// One periodic drive cycle built from every committed ROI, stacked as a
/// (2, points_per_round) array of x and y voltages.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledScan {
    sample_rate: u32,
    signals: Array2<f64>,
}

impl AssembledScan {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn signals(&self) -> ArrayView2<'_, f64> {
        self.signals.view()
    }

    pub fn points_per_round(&self) -> usize {
        self.signals.ncols()
    }

    /// Rounds per second of continuous contour scanning.
    pub fn contour_frequency(&self) -> f64 {
        self.sample_rate as f64 / self.points_per_round() as f64
    }

    pub fn time_per_round_ms(&self) -> f64 {
        1.0 / self.sample_rate as f64 * 1000.0 * self.points_per_round() as f64
    }

    /// Voltage pair the mirrors should be moved to before the cycle starts.
    pub fn first_point(&self) -> Option<(f64, f64)> {
        if self.signals.ncols() == 0 {
            return None;
        }
        Some((self.signals[[0, 0]], self.signals[[1, 0]]))
    }

    pub fn to_waveform(&self) -> DriveWaveform {
        DriveWaveform {
            sample_rate: self.sample_rate,
            x: self.signals.row(0).to_vec(),
            y: self.signals.row(1).to_vec(),
        }
    }
}

fn stack(traces: &TracePair) -> Array2<f64> {
    Array2::from_shape_fn((2, traces.len()), |(row, col)| {
        if row == 0 {
            traces.x[col]
        } else {
            traces.y[col]
        }
    })
}

pub struct ScanAssembler;

impl ScanAssembler {
    pub fn assemble<'a, I>(sample_rate: u32, traces: I) -> ScanResult<AssembledScan>
    where
        I: IntoIterator<Item = &'a TracePair>,
    {
        if sample_rate == 0 {
            return Err(ScanError::InvalidInput("sample rate must be positive".into()));
        }

        let stacked: Vec<Array2<f64>> = traces.into_iter().map(stack).collect();
        let signals = match stacked.len() {
            0 => {
                return Err(ScanError::MissingData(
                    "no contour coordinates found; add at least one ROI".into(),
                ))
            }
            1 => stacked.into_iter().next().unwrap_or_default(),
            _ => {
                let views: Vec<ArrayView2<f64>> = stacked.iter().map(|a| a.view()).collect();
                concatenate(Axis(1), &views)
                    .map_err(|err| ScanError::InvalidInput(err.to_string()))?
            }
        };

        if signals.ncols() == 0 {
            return Err(ScanError::MissingData("committed ROIs hold no samples".into()));
        }

        Ok(AssembledScan {
            sample_rate,
            signals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn traces(len: usize, offset: f64) -> TracePair {
        TracePair::new(
            (0..len).map(|i| offset + i as f64 * 1e-3).collect(),
            vec![offset; len],
        )
        .unwrap()
    }

    #[test]
    fn two_rois_concatenate_into_one_round() {
        let first = traces(100, 0.0);
        let second = traces(150, 1.0);
        let scan = ScanAssembler::assemble(50_000, [&first, &second]).unwrap();
        assert_eq!(scan.points_per_round(), 250);
        assert_abs_diff_eq!(scan.contour_frequency(), 200.0);
        assert_abs_diff_eq!(scan.time_per_round_ms(), 5.0, epsilon = 1e-12);

        let waveform = scan.to_waveform();
        assert_eq!(waveform.x[100], 1.0);
        assert_eq!(waveform.y[99], 0.0);
    }

    #[test]
    fn single_roi_passes_through() {
        let only = traces(10, 0.5);
        let scan = ScanAssembler::assemble(1_000, [&only]).unwrap();
        let waveform = scan.to_waveform();
        assert_eq!(waveform.x, only.x);
        assert_eq!(waveform.y, only.y);
        assert_eq!(scan.first_point(), Some((0.5, 0.5)));
    }

    #[test]
    fn no_rois_is_missing_data() {
        let none: Vec<&TracePair> = Vec::new();
        assert!(matches!(
            ScanAssembler::assemble(50_000, none),
            Err(ScanError::MissingData(_))
        ));
    }
}
