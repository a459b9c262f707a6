//! Casting orchestration: the layer between an author's script and the kernel.
//!
//! # Invariants
//! - A cast whose cost exceeds ledger energy never touches the engine.
//! - Energy is spent only when every spell in the script is accepted.

mod caster;
mod config;

pub use caster::{CastOutcome, Caster, Compiled};
pub use config::{AetherConfig, ConfigError};

pub fn crate_info() -> &'static str {
    "aethercast-caster v0.1.0"
}
