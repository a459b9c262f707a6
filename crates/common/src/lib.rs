//! Shared vocabulary for the aethercast crates.
//!
//! # Invariants
//! - Enumerated spell values only exist in their validated forms.
//! - All time is measured in milliseconds from a `Clock`.

pub mod clock;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use types::{AnchorType, Direction, EffectId, Focus, ParamValue, UnknownName};
