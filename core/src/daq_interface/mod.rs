pub mod handoff;
pub mod waveform;

pub use handoff::OutputHandoff;
pub use waveform::{DaqOutput, DriveWaveform, OutputMode};
