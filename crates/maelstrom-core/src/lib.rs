//! Intensity state machine and shared station state for Maelstrom.
//!
//! This crate owns everything a station computes locally. It has no network
//! code; the transport fills the [`PeerStateStore`] and the facade drives
//! the [`IntensityEngine`] once per frame.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `maelstrom-config.yaml` into
//!   strongly-typed structs.
//! - [`peers`] -- [`PeerStateStore`], the concurrent map of peer intensities.
//! - [`random`] -- [`RandomSource`] trait plus OS-seeded, seeded, and
//!   scripted implementations.
//! - [`telemetry`] -- [`TelemetrySink`] trait for the periodic snapshot.
//! - [`engine`] -- The spike/decay state machine.
//!
//! [`PeerStateStore`]: peers::PeerStateStore
//! [`IntensityEngine`]: engine::IntensityEngine
//! [`RandomSource`]: random::RandomSource
//! [`TelemetrySink`]: telemetry::TelemetrySink

pub mod config;
pub mod engine;
pub mod peers;
pub mod random;
pub mod telemetry;
