//! Simulation kernel: authoritative reality parameters, guarded spell
//! transitions, time-bounded effects, and deferred corrections.
//!
//! # Invariants
//! - A rejected spell changes nothing but `last_spell_focus`.
//! - Multi-spell chains stop at the first rejection.
//! - Deferred tasks act on the state as it is when they fire.
//! - Effect removal is idempotent whether it comes from a timer or a sweep.

pub mod config;
pub mod engine;
pub mod result;
pub mod scheduler;
pub mod state;
pub mod transition;

pub use config::EngineConfig;
pub use engine::{SimEvent, SimulationEngine};
pub use result::{FeedbackKind, SpellResult};
pub use scheduler::{DeferredTask, PendingTask, Scheduler};
pub use state::{Dimensions, EffectKind, SimulationEffect, SimulationState};

pub fn crate_info() -> &'static str {
    "aethercast-kernel v0.1.0"
}
