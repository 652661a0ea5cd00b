use anyhow::Context;
use galvocore::contour::{ContourStrategy, HandleSet};
use galvocore::mapping::AffineRegistration;
use galvocore::prelude::{HardwareLimits, Point, ScanConfig};
use galvocore::waveform::RasterConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One ROI slot to fill: either drawn handles or an external camera contour.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoiSpec {
    pub slot: u32,
    #[serde(default)]
    pub handles: Option<HandleSet>,
    #[serde(default)]
    pub contour: Option<Vec<Point>>,
}

/// Three matching vertices in camera and scanner pixel space.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrationSpec {
    pub camera: Vec<Point>,
    pub scanner: Vec<Point>,
}

impl RegistrationSpec {
    pub fn solve(&self) -> anyhow::Result<AffineRegistration> {
        AffineRegistration::from_vertices(&self.camera, &self.scanner)
            .context("solving camera-to-scanner registration")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub limits: HardwareLimits,
    pub scan: ScanConfig,
    pub raster: RasterConfig,
    pub registration: Option<RegistrationSpec>,
    pub rois: Vec<RoiSpec>,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        sample_rate: u32,
        volt_half_range: f64,
        contour_points: usize,
        strategy: ContourStrategy,
    ) -> Self {
        Self {
            scan: ScanConfig {
                sample_rate,
                volt_half_range,
                contour_points,
                strategy,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
