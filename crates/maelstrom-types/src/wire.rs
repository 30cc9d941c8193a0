//! The intensity beacon datagram.
//!
//! Every beacon is exactly [`DATAGRAM_LEN`] bytes:
//!
//! | bytes  | content                                   |
//! |--------|-------------------------------------------|
//! | `0..2` | role id, big-endian `u16`                 |
//! | `2..6` | intensity, IEEE-754 `f32`, big-endian     |
//!
//! There is no framing, sequence number, or checksum. The value is clamped to
//! `[0, 1]` on both sides of the wire.

use crate::intensity::clamp01;
use crate::role::Role;

/// Exact length of an encoded datagram.
pub const DATAGRAM_LEN: usize = 6;

/// Errors produced while encoding or decoding a datagram.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// Only station roles may be encoded.
    #[error("role none cannot be encoded")]
    InvalidRole,

    /// The payload is not exactly [`DATAGRAM_LEN`] bytes.
    #[error("datagram must be 6 bytes, got {len}")]
    Length {
        /// Length of the rejected payload.
        len: usize,
    },

    /// The role id does not name a station.
    #[error("unknown role id {id}")]
    UnknownRole {
        /// The rejected role id.
        id: u16,
    },
}

/// A decoded (or to-be-encoded) beacon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityDatagram {
    role: Role,
    value: f32,
}

impl IntensityDatagram {
    /// Build a datagram; `value` is clamped to `[0, 1]`.
    pub fn new(role: Role, value: f32) -> Self {
        Self {
            role,
            value: clamp01(value),
        }
    }

    /// The sending station.
    pub const fn role(&self) -> Role {
        self.role
    }

    /// The clamped intensity.
    pub const fn value(&self) -> f32 {
        self.value
    }

    /// Encode into the 6-byte wire form.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidRole`] for [`Role::None`].
    pub fn encode(&self) -> Result<[u8; DATAGRAM_LEN], WireError> {
        if !self.role.is_station() {
            return Err(WireError::InvalidRole);
        }
        let [r0, r1] = self.role.id().to_be_bytes();
        let [v0, v1, v2, v3] = clamp01(self.value).to_be_bytes();
        Ok([r0, r1, v0, v1, v2, v3])
    }

    /// Decode a received payload.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Length`] when the payload is not exactly
    /// [`DATAGRAM_LEN`] bytes and [`WireError::UnknownRole`] when the role id
    /// is `0` or outside the station range.
    pub fn decode(payload: &[u8]) -> Result<Self, WireError> {
        let bytes: [u8; DATAGRAM_LEN] = payload.try_into().map_err(|_err| WireError::Length {
            len: payload.len(),
        })?;
        let [r0, r1, v0, v1, v2, v3] = bytes;
        let id = u16::from_be_bytes([r0, r1]);
        let role = Role::from_wire_id(id).ok_or(WireError::UnknownRole { id })?;
        Ok(Self::new(role, f32::from_be_bytes([v0, v1, v2, v3])))
    }
}
