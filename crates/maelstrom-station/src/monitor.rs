//! Passive monitor for a running installation.
//!
//! A process configured with role `none` publishes nothing. It listens to
//! every station, samples the peer store on a fixed interval, and keeps a
//! bounded history per station so operators can see how intensity has moved
//! over the last few minutes.

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use maelstrom_core::config::MaelstromConfig;
use maelstrom_core::peers::PeerStateStore;
use maelstrom_net::GossipTransport;
use maelstrom_types::Role;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::error::StationError;

/// Summary of one station's recorded history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyStats {
    /// Most recent sample.
    pub last: f32,
    /// Smallest sample in the window.
    pub min: f32,
    /// Largest sample in the window.
    pub max: f32,
    /// Number of samples in the window.
    pub samples: usize,
}

/// Bounded per-station sample history.
#[derive(Debug, Clone)]
pub struct Monitor {
    capacity: usize,
    history: BTreeMap<&'static str, VecDeque<f32>>,
}

impl Monitor {
    /// Create a monitor keeping at most `capacity` samples per station.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            history: BTreeMap::new(),
        }
    }

    /// Append one sample for every station in `snapshot`.
    pub fn record(&mut self, snapshot: &BTreeMap<&'static str, f32>) {
        let capacity = self.capacity;
        for (key, value) in snapshot {
            let samples = self
                .history
                .entry(*key)
                .or_insert_with(|| VecDeque::with_capacity(capacity));
            samples.push_back(*value);
            while samples.len() > capacity {
                samples.pop_front();
            }
        }
    }

    /// Stations heard from so far.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.history.keys().copied()
    }

    /// Last, min, and max for `key`, if it has been heard from.
    pub fn stats(&self, key: &str) -> Option<KeyStats> {
        let samples = self.history.get(key)?;
        let last = samples.back().copied()?;
        let (min, max) = samples
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), value| {
                (lo.min(*value), hi.max(*value))
            });
        Some(KeyStats {
            last,
            min,
            max,
            samples: samples.len(),
        })
    }

    /// One JSON object per station plus a timestamp.
    pub fn snapshot_json(&self, at: DateTime<Utc>) -> Value {
        let stations: Map<String, Value> = self
            .keys()
            .filter_map(|key| {
                self.stats(key).map(|stats| {
                    (
                        key.to_owned(),
                        json!({
                            "last": stats.last,
                            "min": stats.min,
                            "max": stats.max,
                            "samples": stats.samples,
                        }),
                    )
                })
            })
            .collect();
        json!({
            "at": at.to_rfc3339(),
            "stations": stations,
        })
    }

    fn log_summary(&self) {
        for key in self.keys() {
            if let Some(stats) = self.stats(key) {
                info!(
                    station = key,
                    last = stats.last,
                    min = stats.min,
                    max = stats.max,
                    samples = stats.samples,
                    "station intensity"
                );
            }
        }
        info!(snapshot = %self.snapshot_json(Utc::now()), "monitor snapshot");
    }
}

/// Listen to every station until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`StationError::Transport`] if the sockets cannot be bound.
pub async fn run_monitor<F>(config: &MaelstromConfig, shutdown: F) -> Result<(), StationError>
where
    F: Future<Output = ()>,
{
    let store = Arc::new(PeerStateStore::new());
    let transport = GossipTransport::bind(&config.network, Role::None, Arc::clone(&store))?;
    let mut monitor = Monitor::new(config.monitor.history_len);

    let mut interval =
        tokio::time::interval(Duration::from_millis(config.monitor.report_interval_ms));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(
        port = config.network.port,
        history_len = config.monitor.history_len,
        report_interval_ms = config.monitor.report_interval_ms,
        "monitor listening"
    );

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = interval.tick() => {
                monitor.record(&store.all_external());
                monitor.log_summary();
            }
        }
    }

    transport.shutdown().await;
    info!("monitor stopped");
    Ok(())
}
