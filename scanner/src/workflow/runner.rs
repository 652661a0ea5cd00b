use crate::workflow::config::{RoiSpec, WorkflowConfig};
use anyhow::{bail, Context};
use galvocore::daq_interface::DriveWaveform;
use galvocore::dynamics::{DynamicsValidator, ValidationReport};
use galvocore::scan::{AssembledScan, ScanSession};
use galvocore::telemetry::{CollectingSink, StatusSink};
use galvocore::waveform::raster_frame;
use std::sync::Arc;

pub struct ContourResult {
    pub session: ScanSession,
    pub scan: AssembledScan,
    pub reports: Vec<(u32, ValidationReport)>,
}

pub struct RasterResult {
    pub waveform: DriveWaveform,
    pub line_size: usize,
    pub frame_duration: f64,
    pub report: ValidationReport,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    sink: Arc<CollectingSink>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            sink: Arc::new(CollectingSink::new()),
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Status messages published by every session this runner built.
    pub fn sink(&self) -> Arc<CollectingSink> {
        self.sink.clone()
    }

    pub fn build_session(&self) -> anyhow::Result<ScanSession> {
        let mut session = ScanSession::new(self.config.scan.clone(), self.config.limits)
            .context("creating scan session")?
            .with_sink(self.sink.clone());
        if let Some(registration) = &self.config.registration {
            session = session.with_registration(registration.solve()?);
        }
        Ok(session)
    }

    fn commit_roi(session: &mut ScanSession, roi: &RoiSpec) -> anyhow::Result<ValidationReport> {
        let report = match (&roi.handles, &roi.contour) {
            (Some(handles), None) => {
                session
                    .draw(roi.slot, handles.clone())
                    .with_context(|| format!("drawing ROI {}", roi.slot))?;
                session.commit(roi.slot)
            }
            (None, Some(contour)) => session.commit_external(roi.slot, contour.clone()),
            (Some(_), Some(_)) => bail!("ROI {} lists both handles and a contour", roi.slot),
            (None, None) => bail!("ROI {} lists neither handles nor a contour", roi.slot),
        };
        report.with_context(|| format!("committing ROI {}", roi.slot))
    }

    pub fn execute_contour(&self) -> anyhow::Result<ContourResult> {
        if self.config.rois.is_empty() {
            bail!("workflow defines no ROIs");
        }

        let mut session = self.build_session()?;
        let mut reports = Vec::with_capacity(self.config.rois.len());
        for roi in &self.config.rois {
            let report = Self::commit_roi(&mut session, roi)?;
            reports.push((roi.slot, report));
        }
        let scan = session.assemble().context("assembling contour cycle")?;

        Ok(ContourResult {
            session,
            scan,
            reports,
        })
    }

    /// Builds the raster frame and reports its dynamics. Raster frames are not
    /// rejected here; the line steps on the slow axis usually exceed the
    /// contour limits.
    pub fn execute_raster(&self) -> anyhow::Result<RasterResult> {
        let raster = &self.config.raster;
        if raster.sample_rate == 0 || raster.x_pixels == 0 || raster.y_pixels == 0 {
            bail!(
                "raster needs a positive sample rate and frame size (rate {}, {}x{})",
                raster.sample_rate,
                raster.x_pixels,
                raster.y_pixels
            );
        }
        self.config.limits.check().context("checking hardware limits")?;

        let frame = raster_frame(raster, &self.config.limits);
        let frame_duration = frame.frame_duration(raster.sample_rate);
        let line_size = frame.line_size;
        let report = DynamicsValidator::new(self.config.limits).check(
            raster.sample_rate,
            &frame.x,
            &frame.y,
        );
        self.sink
            .publish(&format!("Frame duration: {:.4} s", frame_duration));
        DynamicsValidator::publish(&report, self.sink.as_ref());

        Ok(RasterResult {
            waveform: DriveWaveform::from_traces(raster.sample_rate, frame.into_traces()),
            line_size,
            frame_duration,
            report,
        })
    }
}
