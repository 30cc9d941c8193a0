//! The spike/decay state machine that produces a station's intensity.
//!
//! Each tick the engine:
//!
//! 1. Rolls a uniform value and adds the peer average to it, so busy peers
//!    make spikes more likely everywhere.
//! 2. Picks a new target once `current` has caught up with the old one:
//!    a big or medium spike when the local activity clears the floor and the
//!    roll clears a threshold, otherwise a slow drift toward the activity.
//! 3. Selects a blend rate: slow while any of the last `history_len`
//!    targets was high (inertia after a spike), fast otherwise.
//! 4. Blends `current` toward the target.
//! 5. Records the target and decides whether this tick beacons.
//!
//! The engine performs no I/O. The [`Beacon`] in the returned [`TickReport`]
//! tells the caller whether to publish and whether to take a telemetry
//! snapshot.

use std::collections::VecDeque;

use maelstrom_types::{clamp01, lerp};
use tracing::debug;

use crate::config::IntensityConfig;
use crate::peers::PeerStateStore;
use crate::random::RandomSource;

/// Which spike fired on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spike {
    /// Target jumped to the medium spike value.
    Medium,
    /// Target jumped to the big spike value.
    Big,
}

/// Blend regime used on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inertia {
    /// No recent high target; the fast blend rate applies.
    Light,
    /// A recent target was high; the slow blend rate applies.
    Heavy,
}

/// What the caller should send after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Beacon {
    /// Nothing to send.
    Silent,
    /// Publish the intensity only.
    Bare,
    /// Publish the intensity and take a telemetry snapshot.
    Full,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// The new intensity, in `[0, 1]`.
    pub intensity: f32,
    /// The target `intensity` is moving toward.
    pub target: f32,
    /// Uniform draw plus peer average (may exceed 1).
    pub roll: f32,
    /// Mean of the peer values used for the roll.
    pub peer_average: f32,
    /// The spike chosen on this tick, if a new spike target was set.
    pub spike: Option<Spike>,
    /// Blend regime applied on this tick.
    pub inertia: Inertia,
    /// Blend factor actually applied, after the speed modifier.
    pub blend_rate: f32,
    /// Whether and how to publish.
    pub beacon: Beacon,
}

/// Per-station intensity state.
pub struct IntensityEngine {
    config: IntensityConfig,
    random: Box<dyn RandomSource>,
    current: f32,
    target: f32,
    history: VecDeque<f32>,
    ticks_since_publish: u32,
}

impl std::fmt::Debug for IntensityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntensityEngine")
            .field("current", &self.current)
            .field("target", &self.target)
            .field("history_len", &self.history.len())
            .field("ticks_since_publish", &self.ticks_since_publish)
            .finish_non_exhaustive()
    }
}

impl IntensityEngine {
    /// Create an engine at rest (`current = target = 0`).
    pub fn new(config: IntensityConfig, random: Box<dyn RandomSource>) -> Self {
        let capacity = config.history_len.saturating_add(1);
        Self {
            config,
            random,
            current: 0.0,
            target: 0.0,
            history: VecDeque::with_capacity(capacity),
            ticks_since_publish: 0,
        }
    }

    /// Current intensity.
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Current target.
    pub const fn target(&self) -> f32 {
        self.target
    }

    /// Recorded targets, oldest first.
    pub fn history(&self) -> impl Iterator<Item = f32> + '_ {
        self.history.iter().copied()
    }

    /// Number of recorded targets.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Advance one frame using the peer average from `peers`.
    pub fn tick(
        &mut self,
        activity_ratio: f32,
        speed_modifier: f32,
        peers: &PeerStateStore,
    ) -> TickReport {
        self.advance(activity_ratio, speed_modifier, peers.external_average())
    }

    /// Advance one frame with an explicit peer average.
    pub fn advance(
        &mut self,
        activity_ratio: f32,
        speed_modifier: f32,
        peer_average: f32,
    ) -> TickReport {
        let roll = self.random.next_f32_01() + peer_average;

        let mut spike = None;
        if (self.current - self.target).abs() < self.config.convergence_epsilon {
            let (target, chosen) = self.choose_target(activity_ratio, roll);
            self.target = target;
            spike = chosen;
            if let Some(kind) = chosen {
                debug!(?kind, target, roll, activity_ratio, "spike");
            }
        }

        let inertia = self.inertia();
        let base_rate = match inertia {
            Inertia::Heavy => self.config.slow_blend_rate,
            Inertia::Light => self.config.fast_blend_rate,
        };
        let blend_rate = clamp01(base_rate * speed_modifier);

        self.current = clamp01(lerp(self.current, self.target, blend_rate));

        self.history.push_back(self.target);
        while self.history.len() > self.config.history_len {
            self.history.pop_front();
        }

        TickReport {
            intensity: self.current,
            target: self.target,
            roll,
            peer_average,
            spike,
            inertia,
            blend_rate,
            beacon: self.next_beacon(),
        }
    }

    fn choose_target(&self, activity_ratio: f32, roll: f32) -> (f32, Option<Spike>) {
        let active = activity_ratio > self.config.activity_floor;
        if active && roll >= self.config.high_threshold {
            (self.config.big_spike, Some(Spike::Big))
        } else if active && roll >= self.config.medium_threshold {
            (self.config.medium_spike, Some(Spike::Medium))
        } else {
            let drift = clamp01(lerp(self.current, activity_ratio, self.config.drift_rate));
            (drift, None)
        }
    }

    fn inertia(&self) -> Inertia {
        if self
            .history
            .iter()
            .any(|value| *value >= self.config.recent_high_threshold)
        {
            Inertia::Heavy
        } else {
            Inertia::Light
        }
    }

    fn next_beacon(&mut self) -> Beacon {
        self.ticks_since_publish = self.ticks_since_publish.saturating_add(1);
        if self.ticks_since_publish >= self.config.publish_interval {
            self.ticks_since_publish = 0;
            Beacon::Full
        } else if self.config.continuous_beacon {
            Beacon::Bare
        } else {
            Beacon::Silent
        }
    }
}

/// Run a fresh engine over `ratios` with no peers and return the intensity
/// after each tick.
pub fn replay(
    config: IntensityConfig,
    random: Box<dyn RandomSource>,
    ratios: &[f32],
    speed_modifier: f32,
) -> Vec<f32> {
    let mut engine = IntensityEngine::new(config, random);
    ratios
        .iter()
        .map(|ratio| engine.advance(*ratio, speed_modifier, 0.0).intensity)
        .collect()
}
