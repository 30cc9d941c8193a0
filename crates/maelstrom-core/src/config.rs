//! Configuration loading and typed config structures for a Maelstrom station.
//!
//! Each station reads `maelstrom-config.yaml` from its working directory
//! once at startup. Every field has a default, so an empty or missing file
//! yields a working `none` (monitor) configuration. The resolved
//! [`MaelstromConfig`] is passed by value to the station facade; nothing
//! re-reads configuration at runtime.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;

use maelstrom_types::Role;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level station configuration.
///
/// Mirrors the structure of `maelstrom-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MaelstromConfig {
    /// Station identity and frame pacing.
    #[serde(default)]
    pub station: StationConfig,

    /// Spike, decay, and publish tuning for the intensity engine.
    #[serde(default)]
    pub intensity: IntensityConfig,

    /// UDP beacon addressing.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Passive monitor settings.
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl MaelstromConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// Environment overrides are not applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply environment variable overrides.
    ///
    /// - `MAELSTROM_ROLE` overrides `station.role` (`corals`, `ghostNet`,
    ///   `feed`, or `none`; case-insensitive)
    /// - `MAELSTROM_PORT` overrides `network.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set but unparseable.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("MAELSTROM_ROLE") {
            self.station.role = val.parse().map_err(|e| ConfigError::Invalid {
                reason: format!("MAELSTROM_ROLE: {e}"),
            })?;
        }
        if let Ok(val) = std::env::var("MAELSTROM_PORT") {
            self.network.port = val.trim().parse().map_err(|e| ConfigError::Invalid {
                reason: format!("MAELSTROM_PORT: {e}"),
            })?;
        }
        Ok(())
    }

    /// Check every section for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.station.validate()?;
        self.intensity.validate()?;
        self.monitor.validate()
    }
}

/// Station identity and frame pacing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationConfig {
    /// Which station this process is. `none` runs the passive monitor.
    #[serde(default)]
    pub role: Role,

    /// Multiplier applied to both blend rates. Deployments with slower frame
    /// rates or denser data raise it.
    #[serde(default = "default_speed_modifier")]
    pub speed_modifier: f32,

    /// Frames per second of the headless frame loop.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Fixed seed for the spike rolls. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            role: Role::None,
            speed_modifier: default_speed_modifier(),
            frame_rate: default_frame_rate(),
            seed: None,
        }
    }
}

impl StationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.speed_modifier.is_finite() && self.speed_modifier >= 0.0,
            "station.speed_modifier must be finite and non-negative",
        )?;
        ensure(self.frame_rate > 0, "station.frame_rate must be at least 1")
    }
}

/// Tuning for the intensity state machine.
///
/// The defaults follow the history-of-100 inertia policy with a once-per-60
/// ticks full publish.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IntensityConfig {
    /// Activity ratio that must be exceeded before any spike may fire.
    #[serde(default = "default_activity_floor")]
    pub activity_floor: f32,

    /// Roll (plus peer average) at or above which a big spike fires.
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f32,

    /// Roll (plus peer average) at or above which a medium spike fires.
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f32,

    /// Target set by a big spike.
    #[serde(default = "default_big_spike")]
    pub big_spike: f32,

    /// Target set by a medium spike.
    #[serde(default = "default_medium_spike")]
    pub medium_spike: f32,

    /// Blend factor pulling the target toward the station's own activity.
    #[serde(default = "default_drift_rate")]
    pub drift_rate: f32,

    /// Distance under which current and target count as converged.
    #[serde(default = "default_convergence_epsilon")]
    pub convergence_epsilon: f32,

    /// Any recent target at or above this value selects the slow blend rate.
    #[serde(default = "default_recent_high_threshold")]
    pub recent_high_threshold: f32,

    /// Blend rate while a recent high target is in the history window.
    #[serde(default = "default_slow_blend_rate")]
    pub slow_blend_rate: f32,

    /// Blend rate during calm periods.
    #[serde(default = "default_fast_blend_rate")]
    pub fast_blend_rate: f32,

    /// Number of past targets remembered for inertia selection.
    #[serde(default = "default_history_len")]
    pub history_len: usize,

    /// Ticks between full publishes (beacon plus telemetry snapshot).
    #[serde(default = "default_publish_interval")]
    pub publish_interval: u32,

    /// Publish the bare intensity on every tick between full publishes.
    #[serde(default)]
    pub continuous_beacon: bool,
}

impl Default for IntensityConfig {
    fn default() -> Self {
        Self {
            activity_floor: default_activity_floor(),
            high_threshold: default_high_threshold(),
            medium_threshold: default_medium_threshold(),
            big_spike: default_big_spike(),
            medium_spike: default_medium_spike(),
            drift_rate: default_drift_rate(),
            convergence_epsilon: default_convergence_epsilon(),
            recent_high_threshold: default_recent_high_threshold(),
            slow_blend_rate: default_slow_blend_rate(),
            fast_blend_rate: default_fast_blend_rate(),
            history_len: default_history_len(),
            publish_interval: default_publish_interval(),
            continuous_beacon: false,
        }
    }
}

impl IntensityConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.activity_floor.is_finite() && self.activity_floor >= 0.0,
            "intensity.activity_floor must be finite and non-negative",
        )?;
        ensure(
            self.medium_threshold.is_finite() && self.high_threshold.is_finite(),
            "intensity thresholds must be finite",
        )?;
        ensure(
            self.medium_threshold <= self.high_threshold,
            "intensity.medium_threshold must not exceed intensity.high_threshold",
        )?;
        ensure(
            in_unit_range(self.big_spike) && in_unit_range(self.medium_spike),
            "intensity spike targets must lie in [0, 1]",
        )?;
        ensure(
            in_unit_range(self.recent_high_threshold),
            "intensity.recent_high_threshold must lie in [0, 1]",
        )?;
        ensure(
            in_unit_range(self.drift_rate)
                && in_unit_range(self.slow_blend_rate)
                && in_unit_range(self.fast_blend_rate),
            "intensity drift and blend rates must lie in [0, 1]",
        )?;
        ensure(
            self.convergence_epsilon.is_finite() && self.convergence_epsilon > 0.0,
            "intensity.convergence_epsilon must be positive",
        )?;
        ensure(self.history_len > 0, "intensity.history_len must be at least 1")?;
        ensure(
            self.publish_interval > 0,
            "intensity.publish_interval must be at least 1",
        )
    }
}

/// UDP beacon addressing. Both families share one port.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkConfig {
    /// Port every station binds and sends to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// IPv4 broadcast address of the installation subnet.
    #[serde(default = "default_ipv4_broadcast")]
    pub ipv4_broadcast: Ipv4Addr,

    /// IPv6 multicast group joined by every station.
    #[serde(default = "default_ipv6_group")]
    pub ipv6_group: Ipv6Addr,

    /// Whether to open the IPv6 channel at all.
    #[serde(default = "default_true")]
    pub ipv6_enabled: bool,

    /// Interface index for the IPv6 group join and sends (0 = default).
    #[serde(default)]
    pub ipv6_interface: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            ipv4_broadcast: default_ipv4_broadcast(),
            ipv6_group: default_ipv6_group(),
            ipv6_enabled: true,
            ipv6_interface: 0,
        }
    }
}

/// Passive monitor settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonitorConfig {
    /// Samples kept per station.
    #[serde(default = "default_monitor_history_len")]
    pub history_len: usize,

    /// Milliseconds between samples.
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_len: default_monitor_history_len(),
            report_interval_ms: default_report_interval_ms(),
        }
    }
}

impl MonitorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.history_len > 0, "monitor.history_len must be at least 1")?;
        ensure(
            self.report_interval_ms > 0,
            "monitor.report_interval_ms must be at least 1",
        )
    }
}

fn ensure(condition: bool, reason: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            reason: reason.to_owned(),
        })
    }
}

fn in_unit_range(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

const fn default_speed_modifier() -> f32 {
    1.0
}

const fn default_frame_rate() -> u32 {
    60
}

const fn default_activity_floor() -> f32 {
    0.2
}

const fn default_high_threshold() -> f32 {
    0.95
}

const fn default_medium_threshold() -> f32 {
    0.85
}

const fn default_big_spike() -> f32 {
    1.0
}

const fn default_medium_spike() -> f32 {
    0.7
}

const fn default_drift_rate() -> f32 {
    0.1
}

const fn default_convergence_epsilon() -> f32 {
    0.002
}

const fn default_recent_high_threshold() -> f32 {
    0.65
}

const fn default_slow_blend_rate() -> f32 {
    0.001
}

const fn default_fast_blend_rate() -> f32 {
    0.01
}

const fn default_history_len() -> usize {
    100
}

const fn default_publish_interval() -> u32 {
    60
}

const fn default_port() -> u16 {
    5000
}

const fn default_ipv4_broadcast() -> Ipv4Addr {
    Ipv4Addr::new(192, 168, 1, 255)
}

const fn default_ipv6_group() -> Ipv6Addr {
    Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 1)
}

const fn default_monitor_history_len() -> usize {
    1080
}

const fn default_report_interval_ms() -> u64 {
    1000
}
