use aethercast_common::{AnchorType, EffectId, Focus};
use aethercast_kernel::{EffectKind, SimulationState};

/// Read-only queries against simulation state for terminals and debugging.
pub struct StateInspector;

impl StateInspector {
    /// The "scry" view of the reality parameters.
    pub fn summary(state: &SimulationState) -> RealitySummary {
        RealitySummary {
            energy: state.energy_level,
            probability: state.probability_shift,
            entropy: state.entropy_level,
            time_speed: state.time_speed,
            active_effects: state.active_effects.len(),
            last_focus: state.last_spell_focus,
        }
    }

    /// Active effects in creation order with their remaining lifetime.
    pub fn effects(state: &SimulationState, now_ms: u64) -> Vec<EffectInfo> {
        state
            .active_effects
            .iter()
            .map(|e| EffectInfo {
                id: e.id,
                kind: e.kind,
                anchor: e.anchor_type,
                shift_amount: e.shift_amount,
                intensity: e.intensity,
                remaining_ms: e.remaining_ms(now_ms),
            })
            .collect()
    }
}

/// Summary of the reality parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RealitySummary {
    pub energy: f64,
    pub probability: f64,
    pub entropy: f64,
    pub time_speed: f64,
    pub active_effects: usize,
    pub last_focus: Option<Focus>,
}

impl std::fmt::Display for RealitySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Energy: {:.1}", self.energy)?;
        writeln!(f, "Probability: {:.1}", self.probability)?;
        writeln!(f, "Entropy: {:.1}", self.entropy)?;
        writeln!(f, "Time: {:.1}x", self.time_speed)?;
        write!(f, "Active effects: {}", self.active_effects)
    }
}

/// Detailed info about a single effect.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectInfo {
    pub id: EffectId,
    pub kind: EffectKind,
    pub anchor: AnchorType,
    pub shift_amount: i64,
    pub intensity: f64,
    pub remaining_ms: u64,
}

impl std::fmt::Display for EffectInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Effect [{}] {:?} @ {} shift={:+} intensity={:.2} remaining={:.1}s",
            &self.id.to_string()[..8],
            self.kind,
            self.anchor,
            self.shift_amount,
            self.intensity,
            self.remaining_ms as f64 / 1000.0,
        )
    }
}
