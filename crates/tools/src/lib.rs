//! Developer tooling: state inspection for terminals and debugging.
//!
//! # Invariants
//! - Tools only read state; they never mutate the engine.

mod inspector;

pub use inspector::{EffectInfo, RealitySummary, StateInspector};

pub fn crate_info() -> &'static str {
    "aethercast-tools v0.1.0"
}
