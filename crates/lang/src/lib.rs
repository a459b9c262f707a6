//! Spell language: the clause grammar, its parser, and privileged keyword detection.
//!
//! # Invariants
//! - Parsing is atomic: a script yields every spell or an error, never a partial list.
//! - Every non-final spell is bound; only the final spell is sealed.
//! - Privileged keywords are detected once per script and applied to every spell.

pub mod parser;
pub mod protocol;
pub mod spell;

pub use parser::{Clause, ParseError, parse};
pub use protocol::ProtocolKeyword;
pub use spell::{Anchor, DEFAULT_SPELL, ParsedSpell, Shift};

pub fn crate_info() -> &'static str {
    "aethercast-lang v0.1.0"
}
