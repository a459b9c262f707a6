use aethercast_common::{AnchorType, Focus};
use aethercast_lang::{ParsedSpell, ProtocolKeyword};
use serde::{Deserialize, Serialize};

/// Rates and modifiers of the cost model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Cost per shift percent, per focus.
    pub energy_rate: f64,
    pub probability_rate: f64,
    pub entropy_rate: f64,
    pub time_rate: f64,
    /// Anchor multiplier for `Object`.
    pub object_factor: f64,
    /// `Zone` multiplier is `zone_base + zone_per_radius * radius`.
    pub zone_base: f64,
    pub zone_per_radius: f64,
    /// Radius assumed when a zone declares none.
    pub default_radius: f64,
    /// Applied to the running total for each spell carrying `void.manifest`.
    pub discount_factor: f64,
    /// Applied to the running total for each spell carrying `paradox.engine`.
    pub surcharge_factor: f64,
    pub minimum: u32,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            energy_rate: 0.5,
            probability_rate: 0.8,
            entropy_rate: 1.0,
            time_rate: 1.2,
            object_factor: 1.2,
            zone_base: 1.0,
            zone_per_radius: 0.1,
            default_radius: 1.0,
            discount_factor: 0.7,
            surcharge_factor: 1.5,
            minimum: 1,
        }
    }
}

/// Per-spell costs and the adjusted total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostBreakdown {
    pub per_spell: Vec<u32>,
    pub total: u32,
}

/// Computes the energy a script costs to cast.
#[derive(Debug, Clone, Default)]
pub struct CostModel {
    pub config: CostConfig,
}

impl CostModel {
    pub fn new(config: CostConfig) -> Self {
        Self { config }
    }

    /// Total cost of a spell list, never below the configured minimum.
    pub fn compute(&self, spells: &[ParsedSpell]) -> u32 {
        self.breakdown(spells).total
    }

    pub fn breakdown(&self, spells: &[ParsedSpell]) -> CostBreakdown {
        let cfg = &self.config;
        let mut per_spell = Vec::with_capacity(spells.len());
        let mut total: u64 = 0;

        for spell in spells {
            let base = f64::from(spell.shift.amount) * self.focus_rate(spell.focus);
            let cost = ceil_units(base * self.anchor_factor(spell));
            per_spell.push(saturate(cost));
            total = total.saturating_add(cost);

            // Keyword adjustments compound once per qualifying spell.
            if spell.uses_hidden_protocol {
                if spell.has_keyword(ProtocolKeyword::VoidManifest) {
                    total = ceil_units(total as f64 * cfg.discount_factor);
                }
                if spell.has_keyword(ProtocolKeyword::ParadoxEngine) {
                    total = ceil_units(total as f64 * cfg.surcharge_factor);
                }
            }
        }

        let total = saturate(total).max(cfg.minimum);
        tracing::trace!(spells = spells.len(), total, "computed spell cost");
        CostBreakdown { per_spell, total }
    }

    fn focus_rate(&self, focus: Focus) -> f64 {
        match focus {
            Focus::Energy => self.config.energy_rate,
            Focus::Probability => self.config.probability_rate,
            Focus::Entropy => self.config.entropy_rate,
            Focus::Time => self.config.time_rate,
        }
    }

    fn anchor_factor(&self, spell: &ParsedSpell) -> f64 {
        let cfg = &self.config;
        match spell.anchor.kind {
            AnchorType::SelfAnchor => 1.0,
            AnchorType::Object => cfg.object_factor,
            AnchorType::Zone => {
                let radius = spell.anchor.radius().unwrap_or(cfg.default_radius);
                cfg.zone_base + cfg.zone_per_radius * radius
            }
        }
    }
}

/// Round up, absorbing float noise such as `10.0 * 1.2 == 12.000000000000002`.
///
/// A plain `ceil` would charge 13 for that product and turn a discounted 10
/// (`7.000000000000001`) into 8. Products within `1e-9` above an integer
/// are charged as that integer.
fn ceil_units(x: f64) -> u64 {
    if x.is_nan() || x <= 0.0 {
        return 0;
    }
    (x - 1e-9).ceil() as u64
}

fn saturate(x: u64) -> u32 {
    u32::try_from(x).unwrap_or(u32::MAX)
}
