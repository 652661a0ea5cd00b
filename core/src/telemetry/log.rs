use log::info;
use std::sync::Mutex;

/// One-way channel for human-readable status and violation messages.
pub trait StatusSink: Send + Sync {
    fn publish(&self, message: &str);
}

pub struct LogManager;

impl LogManager {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, message: &str) {
        info!("{}", message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for LogManager {
    fn publish(&self, message: &str) {
        self.record(message);
    }
}

/// Keeps every published message, for callers that surface them later.
#[derive(Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn drain(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }
}

impl StatusSink for CollectingSink {
    fn publish(&self, message: &str) {
        info!("{}", message);
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_buffers_until_drained() {
        let sink = CollectingSink::new();
        sink.publish("first");
        sink.publish("second");
        assert_eq!(sink.messages(), vec!["first", "second"]);
        assert_eq!(sink.drain().len(), 2);
        assert!(sink.messages().is_empty());
    }
}
