use serde::{Deserialize, Serialize};

/// Limits of the caster's energy pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub capacity: u32,
    pub initial: u32,
    /// Energy restored by one `refresh`.
    pub regen_step: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            initial: 100,
            regen_step: 10,
        }
    }
}

/// The persistable part of a ledger. Limits come from configuration on restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBalance {
    pub energy: u32,
    #[serde(default)]
    pub current_cost: u32,
}

/// The caster's spendable energy, independent of simulation state.
///
/// `spend` never rejects; callers gate casts with `can_afford` first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLedger {
    energy: u32,
    current_cost: u32,
    config: LedgerConfig,
}

impl ResourceLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            energy: config.initial.min(config.capacity),
            current_cost: 0,
            config,
        }
    }

    /// Rebuild a ledger from a saved balance under `config`.
    ///
    /// Energy above the configured capacity is clamped.
    pub fn restore(config: LedgerConfig, balance: LedgerBalance) -> Self {
        Self {
            energy: balance.energy.min(config.capacity),
            current_cost: balance.current_cost,
            config,
        }
    }

    pub fn balance(&self) -> LedgerBalance {
        LedgerBalance {
            energy: self.energy,
            current_cost: self.current_cost,
        }
    }

    pub fn energy(&self) -> u32 {
        self.energy
    }

    /// Cost last computed for the current draft.
    pub fn current_cost(&self) -> u32 {
        self.current_cost
    }

    pub fn set_current_cost(&mut self, cost: u32) {
        self.current_cost = cost;
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn can_afford(&self, cost: u32) -> bool {
        cost <= self.energy
    }

    /// Deduct energy, flooring at zero. Returns the remaining energy.
    pub fn spend(&mut self, amount: u32) -> u32 {
        self.energy = self.energy.saturating_sub(amount);
        tracing::debug!(amount, remaining = self.energy, "energy spent");
        self.energy
    }

    /// Restore one regeneration step, capped at capacity. Returns the new energy.
    pub fn refresh(&mut self) -> u32 {
        self.energy = self
            .energy
            .saturating_add(self.config.regen_step)
            .min(self.config.capacity);
        tracing::debug!(energy = self.energy, "energy refreshed");
        self.energy
    }
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}
