//! Economy of casting: the cost model and the caster's resource ledger.
//!
//! # Invariants
//! - Computed cost is at least the configured minimum (1 by default).
//! - Ledger energy stays within `[0, capacity]`; it drops only through `spend`.

mod cost;
mod ledger;

pub use cost::{CostBreakdown, CostConfig, CostModel};
pub use ledger::{LedgerBalance, LedgerConfig, ResourceLedger};

pub fn crate_info() -> &'static str {
    "aethercast-ledger v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("ledger"));
    }
}
