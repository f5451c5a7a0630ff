//! Whole-aggregate snapshots for host-managed durability.
//!
//! The host environment owns durable storage; the core only provides a
//! faithful byte capture of the aggregate with an integrity hash, so hosts
//! can persist and restore a DAO without replaying its history. Event
//! subscribers are not part of the capture and must re-subscribe after a
//! restore.

use serde::{Deserialize, Serialize};

use moot_types::Timestamp;

use crate::error::RegistryError;
use crate::registry::DaoRegistry;

/// A captured DAO state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaoSnapshot {
    /// Blake2b-256 of the serialized state.
    pub hash: [u8; 32],
    /// When the snapshot was captured.
    pub created_at: Timestamp,
    /// Snapshot version for compatibility.
    pub version: u32,
    state: Vec<u8>,
}

impl DaoSnapshot {
    /// Capture the current aggregate state.
    pub fn capture(dao: &DaoRegistry) -> Self {
        let state = bincode::serialize(dao).expect("state serialization should not fail");
        let hash = hash_bytes(&state);
        Self {
            hash,
            created_at: Timestamp::now(),
            version: 1,
            state,
        }
    }

    /// Verify the integrity hash matches the captured state.
    pub fn verify(&self) -> bool {
        self.hash == hash_bytes(&self.state)
    }

    /// Rebuild the aggregate from the captured state.
    pub fn restore(&self) -> Result<DaoRegistry, RegistryError> {
        if !self.verify() {
            return Err(RegistryError::Snapshot("integrity hash mismatch".into()));
        }
        bincode::deserialize(&self.state).map_err(|e| RegistryError::Snapshot(e.to_string()))
    }

    /// Serialize the snapshot to bytes (bincode).
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("snapshot serialization should not fail")
    }

    /// Deserialize a snapshot from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RegistryError> {
        bincode::deserialize(bytes).map_err(|e| RegistryError::Snapshot(e.to_string()))
    }
}

fn hash_bytes(bytes: &[u8]) -> [u8; 32] {
    use blake2::digest::consts::U32;
    use blake2::{Blake2b, Digest};

    let mut hasher = Blake2b::<U32>::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DaoConfig;

    fn sample_dao() -> DaoRegistry {
        DaoRegistry::from_config(DaoConfig::default()).unwrap()
    }

    #[test]
    fn capture_verifies() {
        let snapshot = DaoSnapshot::capture(&sample_dao());
        assert!(snapshot.verify());
        assert_eq!(snapshot.version, 1);
    }

    #[test]
    fn tampered_snapshot_fails_verify_and_restore() {
        let mut snapshot = DaoSnapshot::capture(&sample_dao());
        assert!(snapshot.verify());

        snapshot.state.push(0xFF);
        assert!(!snapshot.verify());
        assert!(matches!(
            snapshot.restore().unwrap_err(),
            RegistryError::Snapshot(_)
        ));
    }

    #[test]
    fn byte_roundtrip_restores_the_aggregate() {
        let dao = sample_dao();
        let snapshot = DaoSnapshot::capture(&dao);

        let bytes = snapshot.to_bytes();
        let restored_snapshot = DaoSnapshot::from_bytes(&bytes).unwrap();
        assert!(restored_snapshot.verify());

        let restored = restored_snapshot.restore().unwrap();
        assert_eq!(
            restored.config().voting_period_secs,
            dao.config().voting_period_secs
        );
        assert_eq!(restored.bank_extension_id(), dao.bank_extension_id());
    }
}
