use anyhow::Context;
use galvocore::daq_interface::{DaqOutput, DriveWaveform, OutputMode};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// Stand-in analog output that writes each started waveform to a JSON file.
pub struct FileOutput {
    path: PathBuf,
    parked: Option<(f64, f64)>,
    running: Option<OutputMode>,
}

impl FileOutput {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            parked: None,
            running: None,
        }
    }

    pub fn parked(&self) -> Option<(f64, f64)> {
        self.parked
    }

    pub fn running(&self) -> Option<OutputMode> {
        self.running
    }
}

impl DaqOutput for FileOutput {
    type Error = anyhow::Error;

    fn start(&mut self, waveform: &DriveWaveform, mode: OutputMode) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = waveform.to_json().context("serializing drive waveform")?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing waveform to {}", self.path.display()))?;
        log::info!(
            "{:?} output of {} samples at {} Hz -> {}",
            mode,
            waveform.len(),
            waveform.sample_rate,
            self.path.display()
        );
        self.running = Some(mode);
        Ok(())
    }

    fn park(&mut self, x: f64, y: f64) -> anyhow::Result<()> {
        log::info!("parking galvos at ({:.3} V, {:.3} V)", x, y);
        self.parked = Some((x, y));
        Ok(())
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        if self.running.take().is_some() {
            log::info!("output stopped");
        }
        Ok(())
    }
}

/// Plays every new waveform from the hand-off until its sender goes away.
/// Mirrors are parked at the first sample before each start.
pub async fn run_output_worker<O>(
    mut receiver: watch::Receiver<Option<Arc<DriveWaveform>>>,
    mut output: O,
) -> anyhow::Result<usize>
where
    O: DaqOutput<Error = anyhow::Error>,
{
    let mut played = 0;
    while receiver.changed().await.is_ok() {
        let latest = receiver.borrow_and_update().clone();
        let Some(waveform) = latest else { continue };
        if let Some((x, y)) = waveform.first_sample() {
            output.park(x, y)?;
        }
        output.start(&waveform, OutputMode::Continuous)?;
        played += 1;
    }
    output.stop()?;
    Ok(played)
}
