//! The station facade: one engine, one peer store, one transport.
//!
//! A host application drives a station with three calls:
//!
//! 1. [`StationFacade::initialize`] once, with the resolved configuration.
//! 2. [`StationFacade::tick`] once per frame, with the current activity
//!    ratio. It returns the intensity to render.
//! 3. [`StationFacade::shutdown`] when the application exits.
//!
//! `tick` never waits on the network. Beacons are fire-and-forget and peer
//! values are read from memory.

use std::collections::BTreeMap;
use std::sync::Arc;

use maelstrom_core::config::MaelstromConfig;
use maelstrom_core::engine::{Beacon, IntensityEngine, TickReport};
use maelstrom_core::peers::PeerStateStore;
use maelstrom_core::random::{RandomSource, StdRandom};
use maelstrom_core::telemetry::{TelemetrySink, TracingSink};
use maelstrom_net::GossipTransport;
use maelstrom_types::Role;
use tracing::{debug, info};

use crate::error::StationError;

/// Everything that exists only between `initialize` and `shutdown`.
#[derive(Debug)]
struct Running {
    role: Role,
    engine: IntensityEngine,
    store: Arc<PeerStateStore>,
    transport: GossipTransport,
    last_report: Option<TickReport>,
}

/// Entry point for a host application.
pub struct StationFacade {
    random: Option<Box<dyn RandomSource>>,
    sink: Box<dyn TelemetrySink>,
    running: Option<Running>,
}

impl std::fmt::Debug for StationFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationFacade")
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl Default for StationFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl StationFacade {
    /// Create an uninitialized facade that logs telemetry through `tracing`.
    pub fn new() -> Self {
        Self {
            random: None,
            sink: Box::new(TracingSink),
            running: None,
        }
    }

    /// Use `random` for spike rolls instead of seeding from the config.
    #[must_use]
    pub fn with_random(mut self, random: Box<dyn RandomSource>) -> Self {
        self.random = Some(random);
        self
    }

    /// Send full-publish snapshots to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn TelemetrySink>) -> Self {
        self.sink = sink;
        self
    }

    /// Validate `config`, bind the transport, and build the engine.
    ///
    /// Calling this on an initialized facade does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::Config`] for an invalid configuration and
    /// [`StationError::Transport`] when a socket cannot be bound.
    pub fn initialize(&mut self, config: MaelstromConfig) -> Result<(), StationError> {
        if let Some(running) = &self.running {
            debug!(role = %running.role, "station already initialized");
            return Ok(());
        }

        config.validate()?;

        let role = config.station.role;
        let store = Arc::new(PeerStateStore::with_local_role(role));
        let transport = GossipTransport::bind(&config.network, role, Arc::clone(&store))?;

        let random = self
            .random
            .take()
            .unwrap_or_else(|| Box::new(StdRandom::from_optional_seed(config.station.seed)));
        let engine = IntensityEngine::new(config.intensity, random);

        info!(
            role = %role,
            port = config.network.port,
            speed_modifier = config.station.speed_modifier,
            "station initialized"
        );

        self.running = Some(Running {
            role,
            engine,
            store,
            transport,
            last_report: None,
        });
        Ok(())
    }

    /// Advance one frame and return the new intensity.
    ///
    /// Returns `0.0` before [`initialize`](Self::initialize) and after
    /// [`shutdown`](Self::shutdown).
    pub fn tick(&mut self, activity_ratio: f32, speed_modifier: f32) -> f32 {
        let Some(running) = self.running.as_mut() else {
            return 0.0;
        };

        let report = running
            .engine
            .tick(activity_ratio, speed_modifier, &running.store);

        match report.beacon {
            Beacon::Silent => {}
            Beacon::Bare => running.transport.publish(report.intensity),
            Beacon::Full => {
                running.transport.publish(report.intensity);
                let snapshot = running
                    .store
                    .all_including_local(running.role, report.intensity);
                for (key, value) in &snapshot {
                    self.sink.record(key, *value);
                }
                debug!(
                    role = %running.role,
                    intensity = report.intensity,
                    target = report.target,
                    peers = running.store.len(),
                    "full publish"
                );
            }
        }

        running.last_report = Some(report);
        report.intensity
    }

    /// Stop the transport and drop the engine.
    ///
    /// Safe to call before `initialize` and more than once.
    pub async fn shutdown(&mut self) {
        if let Some(running) = self.running.take() {
            running.transport.shutdown().await;
            info!(role = %running.role, "station shut down");
        }
    }

    /// The configured role, or [`Role::None`] when not initialized.
    pub fn role(&self) -> Role {
        self.running.as_ref().map_or(Role::None, |running| running.role)
    }

    /// Whether `initialize` has succeeded and `shutdown` has not run since.
    pub const fn is_initialized(&self) -> bool {
        self.running.is_some()
    }

    /// Latest value from each peer station.
    pub fn peers(&self) -> BTreeMap<&'static str, f32> {
        self.running
            .as_ref()
            .map(|running| running.store.all_external())
            .unwrap_or_default()
    }

    /// The report from the most recent tick, if any.
    pub fn last_report(&self) -> Option<TickReport> {
        self.running.as_ref().and_then(|running| running.last_report)
    }

    /// Local addresses of the transport sockets.
    pub fn local_addrs(&self) -> Vec<std::net::SocketAddr> {
        self.running
            .as_ref()
            .map(|running| running.transport.local_addrs().to_vec())
            .unwrap_or_default()
    }
}
