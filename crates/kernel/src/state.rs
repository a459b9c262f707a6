use aethercast_common::{AnchorType, EffectId, Focus, ParamValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Viewport sizing reported by the renderer. No effect on transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// What an effect visualizes: a focus, or the amplified kernel-space distortion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Energy,
    Probability,
    Entropy,
    Time,
    KernelSpace,
}

impl From<Focus> for EffectKind {
    fn from(focus: Focus) -> Self {
        match focus {
            Focus::Energy => EffectKind::Energy,
            Focus::Probability => EffectKind::Probability,
            Focus::Entropy => EffectKind::Entropy,
            Focus::Time => EffectKind::Time,
        }
    }
}

/// Time-bounded record of one applied spell. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEffect {
    pub id: EffectId,
    pub kind: EffectKind,
    pub anchor_type: AnchorType,
    pub anchor_params: BTreeMap<String, ParamValue>,
    /// Signed shift the effect carries.
    pub shift_amount: i64,
    pub duration_ms: u64,
    pub start_ms: u64,
    pub intensity: f64,
}

impl SimulationEffect {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.start_ms) >= self.duration_ms
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.duration_ms
            .saturating_sub(now_ms.saturating_sub(self.start_ms))
    }
}

/// Reality parameters of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub energy_level: f64,
    pub probability_shift: f64,
    pub entropy_level: f64,
    pub time_speed: f64,
    /// Insertion order is creation order.
    pub active_effects: Vec<SimulationEffect>,
    pub last_spell_focus: Option<Focus>,
    pub dimensions: Dimensions,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self {
            energy_level: 100.0,
            probability_shift: 0.0,
            entropy_level: 20.0,
            time_speed: 1.0,
            active_effects: Vec::new(),
            last_spell_focus: None,
            dimensions: Dimensions::default(),
        }
    }
}

impl SimulationState {
    pub fn effect(&self, id: EffectId) -> Option<&SimulationEffect> {
        self.active_effects.iter().find(|e| e.id == id)
    }
}
