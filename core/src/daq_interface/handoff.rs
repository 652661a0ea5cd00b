use std::sync::Arc;
use tokio::sync::watch;

use crate::daq_interface::DriveWaveform;

/// Latest-value hand-off between the waveform producer and the output worker
/// running in its own execution context. Workers only ever see the newest
/// waveform; intermediate ones are skipped.
pub struct OutputHandoff {
    sender: watch::Sender<Option<Arc<DriveWaveform>>>,
}

impl OutputHandoff {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<DriveWaveform>>> {
        self.sender.subscribe()
    }

    pub fn submit(&self, waveform: DriveWaveform) -> Arc<DriveWaveform> {
        let shared = Arc::new(waveform);
        self.sender.send_replace(Some(shared.clone()));
        shared
    }

    pub fn latest(&self) -> Option<Arc<DriveWaveform>> {
        self.sender.borrow().clone()
    }
}

impl Default for OutputHandoff {
    fn default() -> Self {
        Self::new()
    }
}
