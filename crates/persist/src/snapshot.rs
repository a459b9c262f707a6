//! Session snapshots.
//!
//! A snapshot stores the session as canonical JSON text plus its SHA-256
//! digest, so verification never depends on re-serializing floats.
//!
//! ```text
//! {
//!   "schema_version": 2,
//!   "saved_at_ms": 1700000000000,
//!   "sha256": "…",
//!   "payload": "{\"state\":{…},\"pending\":[…],\"ledger\":{…}}"
//! }
//! ```

use aethercast_kernel::{PendingTask, SimulationState};
use aethercast_ledger::LedgerBalance;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Current snapshot schema version.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 2;

/// Errors from snapshot persistence.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
}

/// Everything a session needs to resume.
///
/// Ledger limits are not saved; they come from configuration on resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub state: SimulationState,
    /// Deferred tasks still queued, with absolute due times.
    #[serde(default)]
    pub pending: Vec<PendingTask>,
    pub ledger: LedgerBalance,
}

/// A verifiable snapshot of a casting session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u32,
    pub saved_at_ms: u64,
    pub sha256: String,
    payload: String,
}

impl Snapshot {
    /// Capture a session at `saved_at_ms`.
    pub fn capture(session: &SessionData, saved_at_ms: u64) -> Result<Self, PersistError> {
        let payload = serde_json::to_string(session)?;
        Ok(Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            saved_at_ms,
            sha256: sha256_hex(payload.as_bytes()),
            payload,
        })
    }

    /// Recompute the digest and compare.
    pub fn verify(&self) -> bool {
        sha256_hex(self.payload.as_bytes()) == self.sha256
    }

    /// Decode the session after checking schema and digest.
    pub fn restore(&self) -> Result<SessionData, PersistError> {
        if self.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(PersistError::SchemaMismatch {
                file_version: self.schema_version,
                expected_version: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        let actual = sha256_hex(self.payload.as_bytes());
        if actual != self.sha256 {
            tracing::warn!(expected = %self.sha256, %actual, "snapshot digest mismatch");
            return Err(PersistError::IntegrityMismatch {
                expected: self.sha256.clone(),
                actual,
            });
        }
        Ok(serde_json::from_str(&self.payload)?)
    }

    /// Write the snapshot as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        serde_json::to_writer_pretty(std::fs::File::create(path)?, self)?;
        tracing::info!(path = %path.display(), "saved session snapshot");
        Ok(())
    }

    /// Read a snapshot file. Integrity is checked by `restore`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let file = std::fs::File::open(path.as_ref())?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
