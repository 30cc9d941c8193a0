//! Station identities.
//!
//! A [`Role`] is both the tag carried in every datagram and the key under
//! which a peer's intensity is stored. Each role maps to a fixed string key
//! (`corals`, `ghostNet`, `feed`); key lookups ignore ASCII case.
//!
//! [`Role::None`] is not a station. A process running as `None` never
//! publishes and observes all three stations (the passive monitor).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role key: {0}")]
pub struct UnknownRoleKey(pub String);

/// Identity of a process taking part in the installation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
#[repr(u16)]
pub enum Role {
    /// No station identity. Listens only.
    #[default]
    None = 0,
    /// The corals station.
    Corals = 1,
    /// The ghost net station.
    GhostNet = 2,
    /// The feed station.
    Feed = 3,
}

impl Role {
    /// The three station roles, in wire-id order.
    pub const STATIONS: [Self; 3] = [Self::Corals, Self::GhostNet, Self::Feed];

    /// Numeric id used on the wire.
    pub const fn id(self) -> u16 {
        self as u16
    }

    /// Resolve a wire id to a station role.
    ///
    /// Returns `None` for `0` and for any id outside `1..=3`; neither may
    /// enter a peer store.
    pub const fn from_wire_id(id: u16) -> Option<Self> {
        match id {
            1 => Some(Self::Corals),
            2 => Some(Self::GhostNet),
            3 => Some(Self::Feed),
            _ => None,
        }
    }

    /// Store key for a station role, `None` for [`Role::None`].
    pub const fn key(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Corals => Some("corals"),
            Self::GhostNet => Some("ghostNet"),
            Self::Feed => Some("feed"),
        }
    }

    /// Resolve a store key to a station role, ignoring ASCII case.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::STATIONS
            .into_iter()
            .find(|role| role.key().is_some_and(|k| k.eq_ignore_ascii_case(key)))
    }

    /// Whether this role is one of the three stations.
    pub const fn is_station(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key().unwrap_or("none"))
    }
}

impl FromStr for Role {
    type Err = UnknownRoleKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self::None);
        }
        Self::from_key(trimmed).ok_or_else(|| UnknownRoleKey(trimmed.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_both_ways() {
        for role in Role::STATIONS {
            let key = role.key().unwrap();
            assert_eq!(Role::from_key(key), Some(role));
            assert_eq!(Role::from_wire_id(role.id()), Some(role));
        }
        assert_eq!(Role::None.key(), None);
    }

    #[test]
    fn key_lookup_ignores_case() {
        assert_eq!(Role::from_key("GHOSTNET"), Some(Role::GhostNet));
        assert_eq!(Role::from_key("ghostnet"), Some(Role::GhostNet));
        assert_eq!(Role::from_key("Corals"), Some(Role::Corals));
        assert_eq!(Role::from_key("reef"), None);
        assert_eq!(Role::from_key("none"), None);
    }

    #[test]
    fn invalid_wire_ids_are_rejected() {
        assert_eq!(Role::from_wire_id(0), None);
        assert_eq!(Role::from_wire_id(4), None);
        assert_eq!(Role::from_wire_id(u16::MAX), None);
    }

    #[test]
    fn parse_accepts_none_and_stations() {
        assert_eq!("none".parse::<Role>().unwrap(), Role::None);
        assert_eq!(" Feed ".parse::<Role>().unwrap(), Role::Feed);
        assert!("kelp".parse::<Role>().is_err());
    }

    #[test]
    fn display_uses_key() {
        assert_eq!(Role::GhostNet.to_string(), "ghostNet");
        assert_eq!(Role::None.to_string(), "none");
    }

    #[test]
    fn yaml_names_match_keys() {
        let role: Role = serde_yml::from_str("ghostNet").unwrap();
        assert_eq!(role, Role::GhostNet);
        let role: Role = serde_yml::from_str("none").unwrap();
        assert_eq!(role, Role::None);
    }
}
