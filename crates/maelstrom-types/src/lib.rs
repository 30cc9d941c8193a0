//! Shared type definitions for the Maelstrom stations.
//!
//! Every crate in the workspace agrees on three things defined here: who a
//! station is ([`Role`]), what an intensity value looks like ([`clamp01`],
//! [`lerp`]), and how a value travels between stations
//! ([`IntensityDatagram`]).
//!
//! # Modules
//!
//! - [`role`] -- Station identities and their string keys.
//! - [`intensity`] -- Clamping and blending helpers for the `[0, 1]` signal.
//! - [`wire`] -- The fixed 6-byte role + value datagram.

pub mod intensity;
pub mod role;
pub mod wire;

pub use intensity::{clamp01, lerp};
pub use role::{Role, UnknownRoleKey};
pub use wire::{DATAGRAM_LEN, IntensityDatagram, WireError};
