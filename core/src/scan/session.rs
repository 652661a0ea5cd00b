use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::contour::HandleSet;
use crate::dynamics::{DynamicsValidator, ValidationReport};
use crate::mapping::{AffineRegistration, VoltageMapper};
use crate::prelude::{HardwareLimits, Point, ScanConfig, ScanError, ScanResult, TracePair};
use crate::scan::assembler::{AssembledScan, ScanAssembler};
use crate::telemetry::{LogManager, Metrics, MetricsRecorder, StatusSink};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoiOrigin {
    Drawn(HandleSet),
    /// Dense contour supplied from outside (camera segmentation), in camera
    /// pixel coordinates.
    External(Vec<Point>),
}

const DRAWN: &str = "drawn";
const EXTERNAL: &str = "externally supplied";

impl RoiOrigin {
    fn label(&self) -> &'static str {
        match self {
            RoiOrigin::Drawn(_) => DRAWN,
            RoiOrigin::External(_) => EXTERNAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiEntry {
    pub origin: RoiOrigin,
    pub traces: TracePair,
    pub report: ValidationReport,
}

#[derive(Debug, Clone, PartialEq)]
enum RoiSlot {
    Drawn(HandleSet),
    Committed(RoiEntry),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotState {
    Empty,
    Drawn,
    Committed,
}

/// Indexed ROI slots plus the configuration every trace is derived from.
///
/// Slots move `Empty -> Drawn -> Committed -> Empty`; externally supplied
/// contours go straight to `Committed`. A slot never mixes a drawn polygon and
/// an external contour.
pub struct ScanSession {
    config: ScanConfig,
    validator: DynamicsValidator,
    mapper: VoltageMapper,
    registration: AffineRegistration,
    slots: BTreeMap<u32, RoiSlot>,
    sink: Arc<dyn StatusSink>,
    metrics: MetricsRecorder,
}

impl ScanSession {
    pub fn new(config: ScanConfig, limits: HardwareLimits) -> ScanResult<Self> {
        limits.check()?;
        if config.sample_rate == 0 {
            return Err(ScanError::InvalidInput("sample rate must be positive".into()));
        }
        Ok(Self {
            mapper: VoltageMapper::new(config.volt_half_range),
            config,
            validator: DynamicsValidator::new(limits),
            registration: AffineRegistration::identity(),
            slots: BTreeMap::new(),
            sink: Arc::new(LogManager::new()),
            metrics: MetricsRecorder::new(),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_registration(mut self, registration: AffineRegistration) -> Self {
        self.registration = registration;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn limits(&self) -> &HardwareLimits {
        self.validator.limits()
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }

    pub fn state(&self, index: u32) -> SlotState {
        match self.slots.get(&index) {
            None => SlotState::Empty,
            Some(RoiSlot::Drawn(_)) => SlotState::Drawn,
            Some(RoiSlot::Committed(_)) => SlotState::Committed,
        }
    }

    pub fn entry(&self, index: u32) -> Option<&RoiEntry> {
        match self.slots.get(&index) {
            Some(RoiSlot::Committed(entry)) => Some(entry),
            _ => None,
        }
    }

    /// Handles stored for a slot, whether pending or committed, so the
    /// polygon can be redrawn.
    pub fn handles(&self, index: u32) -> Option<&HandleSet> {
        match self.slots.get(&index)? {
            RoiSlot::Drawn(handles) => Some(handles),
            RoiSlot::Committed(RoiEntry {
                origin: RoiOrigin::Drawn(handles),
                ..
            }) => Some(handles),
            RoiSlot::Committed(_) => None,
        }
    }

    pub fn committed_slots(&self) -> Vec<u32> {
        self.slots
            .iter()
            .filter(|(_, slot)| matches!(slot, RoiSlot::Committed(_)))
            .map(|(index, _)| *index)
            .collect()
    }

    fn existing_origin(&self, index: u32) -> Option<&'static str> {
        match self.slots.get(&index)? {
            RoiSlot::Drawn(_) => Some(DRAWN),
            RoiSlot::Committed(entry) => Some(entry.origin.label()),
        }
    }

    fn reject_mixed(&self, index: u32, requested: &'static str) -> ScanResult<()> {
        match self.existing_origin(index) {
            Some(existing) if existing != requested => {
                let err = ScanError::MutualExclusion {
                    slot: index,
                    existing: existing.to_string(),
                    requested: requested.to_string(),
                };
                self.sink.publish(&err.to_string());
                Err(err)
            }
            _ => Ok(()),
        }
    }

    /// Places a drawn polygon in a slot, replacing any earlier polygon or
    /// committed drawn contour in that slot.
    pub fn draw(&mut self, index: u32, handles: HandleSet) -> ScanResult<()> {
        self.reject_mixed(index, DRAWN)?;
        log::debug!("slot {} drawn with {} handles", index, handles.len());
        self.slots.insert(index, RoiSlot::Drawn(handles));
        Ok(())
    }

    pub fn contour_traces(&self, handles: &HandleSet) -> ScanResult<(TracePair, ValidationReport)> {
        let length = self.config.contour_points;
        let points = self.config.strategy.generate(handles, length)?;
        let traces = self.mapper.convert(self.config.frame_pixels, &points, length)?;
        let report = self.validate(&traces)?;
        Ok((traces, report))
    }

    fn validate(&self, traces: &TracePair) -> ScanResult<ValidationReport> {
        let outcome = self.validator.validate(self.config.sample_rate, traces);
        match &outcome {
            Ok(report) => {
                DynamicsValidator::publish(report, self.sink.as_ref());
                self.metrics.record_accepted();
            }
            Err(ScanError::DynamicsViolation(report)) => {
                DynamicsValidator::publish(report, self.sink.as_ref());
                self.metrics.record_rejected();
            }
            Err(_) => self.metrics.record_rejected(),
        }
        outcome
    }

    /// Commits the slot's drawn polygon. A slot that is already committed is
    /// left as is.
    pub fn commit(&mut self, index: u32) -> ScanResult<ValidationReport> {
        let handles = match self.slots.get(&index) {
            Some(RoiSlot::Drawn(handles)) => handles.clone(),
            Some(RoiSlot::Committed(entry)) => return Ok(entry.report.clone()),
            None => {
                let err = ScanError::MissingData(format!(
                    "slot {} has no contour; draw or supply one first",
                    index
                ));
                self.sink.publish(&err.to_string());
                return Err(err);
            }
        };

        let (traces, report) = self.contour_traces(&handles)?;
        self.sink
            .publish(&format!("Adding drawn contour to slot {}", index));
        self.slots.insert(
            index,
            RoiSlot::Committed(RoiEntry {
                origin: RoiOrigin::Drawn(handles),
                traces,
                report: report.clone(),
            }),
        );
        Ok(report)
    }

    /// Commits an externally supplied contour straight into a slot. The
    /// contour keeps its own length; it is registered into the scanner frame
    /// before voltage mapping.
    pub fn commit_external(&mut self, index: u32, contour: Vec<Point>) -> ScanResult<ValidationReport> {
        self.reject_mixed(index, EXTERNAL)?;
        if contour.is_empty() {
            return Err(ScanError::MissingData("external contour has no points".into()));
        }

        let registered = self.registration.transform(&contour);
        let traces = self
            .mapper
            .convert(self.config.frame_pixels, &registered, registered.len())?;
        let report = self.validate(&traces)?;
        self.sink
            .publish(&format!("Adding external contour to slot {}", index));
        self.slots.insert(
            index,
            RoiSlot::Committed(RoiEntry {
                origin: RoiOrigin::External(contour),
                traces,
                report: report.clone(),
            }),
        );
        Ok(report)
    }

    pub fn clear(&mut self, index: u32) -> bool {
        self.slots.remove(&index).is_some()
    }

    pub fn reset(&mut self) {
        self.slots.clear();
        self.sink.publish("ROI stack cleared");
    }

    /// Joins every committed slot, in slot order, into one drive cycle.
    pub fn assemble(&self) -> ScanResult<AssembledScan> {
        let traces = self.slots.values().filter_map(|slot| match slot {
            RoiSlot::Committed(entry) => Some(&entry.traces),
            RoiSlot::Drawn(_) => None,
        });
        let scan = ScanAssembler::assemble(self.config.sample_rate, traces)?;
        self.metrics.record_assembled();
        self.sink.publish(&format!(
            "Contour cycle: {} points per round, {:.4} Hz",
            scan.points_per_round(),
            scan.contour_frequency()
        ));
        Ok(scan)
    }

    pub fn point_voltage(&self, point: Point) -> ScanResult<(f64, f64)> {
        self.mapper.convert_point(self.config.frame_pixels, point)
    }
}
