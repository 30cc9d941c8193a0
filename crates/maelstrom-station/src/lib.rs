//! Host-facing surface of a Maelstrom station.
//!
//! [`StationFacade`] is what a renderer or audio patch embeds: initialize it
//! once, call `tick` every frame, and shut it down on exit. A process with
//! role `none` runs the passive [`monitor`] instead.
//!
//! # Modules
//!
//! - [`activity`] -- Activity ratio sources; a bounded random walk for
//!   headless runs.
//! - [`error`] -- [`StationError`].
//! - [`monitor`] -- Passive listener with per-station history.
//! - [`station`] -- [`StationFacade`].

pub mod activity;
pub mod error;
pub mod monitor;
pub mod station;

pub use error::StationError;
pub use station::StationFacade;
