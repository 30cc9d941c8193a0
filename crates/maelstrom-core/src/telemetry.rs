//! Destinations for the periodic intensity snapshot.
//!
//! Once per publish interval a station reports every known intensity, its
//! own included, as `(key, value)` pairs. Where those go is up to the
//! sink: an audio patch, a log, or a buffer in tests.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

/// Receives one `(key, value)` pair per known station.
pub trait TelemetrySink: Send {
    /// Record the latest value for a station key.
    fn record(&mut self, key: &str, value: f32);
}

/// Discards every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&mut self, _key: &str, _value: f32) {}
}

/// Emits each sample as a `debug` tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&mut self, key: &str, value: f32) {
        debug!(station = key, intensity = value, "telemetry sample");
    }
}

/// Buffers samples in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<(String, f32)>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sample recorded so far, oldest first.
    pub fn entries(&self) -> Vec<(String, f32)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TelemetrySink for MemorySink {
    fn record(&mut self, key: &str, value: f32) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((key.to_owned(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.record("corals", 0.5);
        writer.record("feed", 0.25);

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.first().map(|(k, _)| k.as_str()), Some("corals"));
    }

    #[test]
    fn null_and_tracing_sinks_accept_samples() {
        NullSink.record("corals", 0.5);
        TracingSink.record("corals", 0.5);
    }
}
