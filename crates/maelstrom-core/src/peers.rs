//! Latest intensity heard from each peer station.
//!
//! The transport's receive loop writes into the store while the frame loop
//! reads it, so every access goes through an [`RwLock`]. Values are last
//! write wins with no ordering guarantee between peers.
//!
//! The store never holds an entry for [`Role::None`] or for the local
//! station's own role.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use maelstrom_types::{Role, clamp01};

/// Concurrent map from station role to last received intensity.
#[derive(Debug, Default)]
pub struct PeerStateStore {
    local_role: Role,
    values: RwLock<BTreeMap<Role, f32>>,
}

impl PeerStateStore {
    /// Create an empty store that accepts every station role.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that rejects writes for `local_role`.
    pub fn with_local_role(local_role: Role) -> Self {
        Self {
            local_role,
            values: RwLock::new(BTreeMap::new()),
        }
    }

    /// The role this store refuses to record.
    pub const fn local_role(&self) -> Role {
        self.local_role
    }

    /// Record a value by string key (case-insensitive).
    ///
    /// Returns `false` and leaves the store untouched when the key does not
    /// name a station or names the local station.
    pub fn set(&self, key: &str, value: f32) -> bool {
        Role::from_key(key).is_some_and(|role| self.set_role(role, value))
    }

    /// Record a value for `role`, clamped to `[0, 1]`.
    ///
    /// Returns `false` for [`Role::None`] and for the local role.
    pub fn set_role(&self, role: Role, value: f32) -> bool {
        if !role.is_station() || role == self.local_role {
            return false;
        }
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(role, clamp01(value));
        true
    }

    /// Last value recorded under a string key, if any.
    pub fn get(&self, key: &str) -> Option<f32> {
        Role::from_key(key).and_then(|role| self.get_role(role))
    }

    /// Last value recorded for `role`, if any.
    pub fn get_role(&self, role: Role) -> Option<f32> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&role)
            .copied()
    }

    /// Snapshot of every recorded peer, keyed by role key.
    pub fn all_external(&self) -> BTreeMap<&'static str, f32> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|(role, value)| role.key().map(|key| (key, *value)))
            .collect()
    }

    /// Snapshot of every recorded peer plus the local station's own value.
    ///
    /// The local entry is only added when `local_role` is a station.
    pub fn all_including_local(
        &self,
        local_role: Role,
        local_value: f32,
    ) -> BTreeMap<&'static str, f32> {
        let mut snapshot = self.all_external();
        if let Some(key) = local_role.key() {
            snapshot.insert(key, clamp01(local_value));
        }
        snapshot
    }

    /// Arithmetic mean of all recorded peers, `0.0` when none are known.
    #[allow(clippy::cast_precision_loss)]
    pub fn external_average(&self) -> f32 {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        if values.is_empty() {
            return 0.0;
        }
        let sum: f32 = values.values().sum();
        sum / values.len() as f32
    }

    /// Number of peers heard from.
    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no peer has been heard from yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every recorded peer.
    pub fn clear(&self) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn empty_store_averages_to_zero() {
        let store = PeerStateStore::new();
        assert!(store.is_empty());
        assert!(approx(store.external_average(), 0.0));
        assert!(store.all_external().is_empty());
    }

    #[test]
    fn set_and_get_by_key() {
        let store = PeerStateStore::new();
        assert!(store.set("corals", 0.4));
        assert!(store.set("GHOSTNET", 0.8));
        assert!(approx(store.get("Corals").unwrap(), 0.4));
        assert!(approx(store.get_role(Role::GhostNet).unwrap(), 0.8));
        assert_eq!(store.get("feed"), None);
        assert!(approx(store.external_average(), 0.6));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let store = PeerStateStore::new();
        assert!(!store.set("kelp", 0.5));
        assert!(!store.set("none", 0.5));
        assert!(!store.set_role(Role::None, 0.5));
        assert!(store.is_empty());
    }

    #[test]
    fn local_role_is_never_stored() {
        let store = PeerStateStore::with_local_role(Role::Feed);
        assert!(!store.set_role(Role::Feed, 0.9));
        assert!(!store.set("feed", 0.9));
        assert!(store.set_role(Role::Corals, 0.3));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_role(Role::Feed), None);
    }

    #[test]
    fn values_are_clamped_and_overwritten() {
        let store = PeerStateStore::new();
        store.set_role(Role::Corals, 3.0);
        assert!(approx(store.get_role(Role::Corals).unwrap(), 1.0));
        store.set_role(Role::Corals, f32::NAN);
        assert!(approx(store.get_role(Role::Corals).unwrap(), 0.0));
        store.set_role(Role::Corals, 0.25);
        assert!(approx(store.get_role(Role::Corals).unwrap(), 0.25));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn snapshot_including_local() {
        let store = PeerStateStore::with_local_role(Role::GhostNet);
        store.set_role(Role::Corals, 0.2);
        store.set_role(Role::Feed, 0.6);

        let snapshot = store.all_including_local(Role::GhostNet, 0.9);
        assert_eq!(snapshot.len(), 3);
        assert!(approx(*snapshot.get("ghostNet").unwrap(), 0.9));
        assert!(approx(*snapshot.get("corals").unwrap(), 0.2));

        // The local value does not leak into the peer average.
        assert!(approx(store.external_average(), 0.4));

        let without_local = store.all_including_local(Role::None, 0.9);
        assert_eq!(without_local.len(), 2);
    }

    #[test]
    fn clear_forgets_everything() {
        let store = PeerStateStore::new();
        store.set_role(Role::Corals, 0.2);
        store.set_role(Role::Feed, 0.6);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let store = Arc::new(PeerStateStore::new());
        let mut handles = Vec::new();

        for role in Role::STATIONS {
            let writer = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for step in 0..1000_u16 {
                    writer.set_role(role, f32::from(step) / 1000.0);
                }
            }));
        }
        let reader = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for _ in 0..1000 {
                let avg = reader.external_average();
                assert!((0.0..=1.0).contains(&avg));
            }
        }));

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 3);
        for role in Role::STATIONS {
            assert!(approx(store.get_role(role).unwrap(), 0.999));
        }
    }
}
