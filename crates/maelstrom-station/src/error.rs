//! Error types for the station facade and binary.
//!
//! [`StationError`] is the single error type `initialize` and `main`
//! propagate with `?`.

use maelstrom_core::config::ConfigError;
use maelstrom_net::TransportError;

/// Top-level error for a Maelstrom station.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The gossip transport could not be opened.
    #[error("transport error: {source}")]
    Transport {
        /// The underlying transport error.
        #[from]
        source: TransportError,
    },
}
