//! Persistence: verifiable snapshots of a casting session.
//!
//! # Invariants
//! - Snapshots are content-addressed and verifiable.
//! - A snapshot never restores when its digest or schema does not match.
//! - Pending deferred tasks are saved with their absolute due times; overdue
//!   ones fire on the first tick after a resume.
//! - Ledger limits are never saved; only the balance is.

mod snapshot;

pub use snapshot::{PersistError, SNAPSHOT_SCHEMA_VERSION, SessionData, Snapshot};

pub fn crate_info() -> &'static str {
    "aethercast-persist v0.1.0"
}
