pub mod log;
pub mod metrics;

pub use self::log::{CollectingSink, LogManager, StatusSink};
pub use metrics::{Metrics, MetricsRecorder};
