//! Guarded per-focus transition rules.
//!
//! Each rule reads the current state and either rejects without touching it
//! or writes the new values and describes the effect and deferred tasks the
//! engine must materialize.

use aethercast_common::Focus;
use aethercast_lang::{ParsedSpell, ProtocolKeyword};

use crate::config::EngineConfig;
use crate::result::{FeedbackKind, SpellResult};
use crate::scheduler::DeferredTask;
use crate::state::{EffectKind, SimulationState};

/// Effect to record for an accepted transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectPlan {
    pub kind: EffectKind,
    pub shift_amount: i64,
    pub duration_ms: u64,
    pub intensity: f64,
}

/// Result of one transition rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub result: SpellResult,
    pub effect: Option<EffectPlan>,
    /// `(delay_ms, task)` pairs to schedule.
    pub deferred: Vec<(u64, DeferredTask)>,
}

impl Transition {
    fn reject(message: impl Into<String>, feedback: FeedbackKind) -> Self {
        Self {
            result: SpellResult::rejected(message, feedback),
            effect: None,
            deferred: Vec::new(),
        }
    }

    fn accept(message: impl Into<String>) -> Self {
        Self {
            result: SpellResult::accepted(message),
            effect: None,
            deferred: Vec::new(),
        }
    }

    fn with_effect(mut self, kind: EffectKind, shift: i64, duration_ms: u64) -> Self {
        self.effect = Some(EffectPlan {
            kind,
            shift_amount: shift,
            duration_ms,
            intensity: shift.unsigned_abs() as f64 / 100.0,
        });
        self
    }

    fn defer(mut self, delay_ms: u64, task: DeferredTask) -> Self {
        self.deferred.push((delay_ms, task));
        self
    }
}

/// Apply one spell's rule to `state`.
pub fn apply(state: &mut SimulationState, spell: &ParsedSpell, cfg: &EngineConfig) -> Transition {
    state.last_spell_focus = Some(spell.focus);
    let shift = spell.shift.signed();

    if spell.uses_hidden_protocol {
        return privileged(state, spell, shift, cfg);
    }

    if shift.unsigned_abs() > u64::from(cfg.max_safe_shift) {
        return Transition::reject(
            "Spell exceeds safe reality manipulation limits.",
            FeedbackKind::RealityFracture,
        );
    }

    match spell.focus {
        Focus::Energy => energy(state, shift, cfg),
        Focus::Probability => probability(state, shift, cfg),
        Focus::Entropy => entropy(state, shift, cfg),
        Focus::Time => time(state, shift, cfg),
    }
}

fn energy(state: &mut SimulationState, shift: i64, cfg: &EngineConfig) -> Transition {
    let next = state.energy_level + shift as f64;
    if next < 0.0 {
        return Transition::reject(
            "Cannot reduce energy below zero.",
            FeedbackKind::EnergyInsufficient,
        );
    }
    state.energy_level = next.min(cfg.energy_ceiling);
    Transition::accept(format!(
        "Energy level {} by {}%.",
        verb(shift, "increased", "decreased"),
        shift.unsigned_abs()
    ))
    .with_effect(EffectKind::Energy, shift, cfg.energy_effect_ms)
}

fn probability(state: &mut SimulationState, shift: i64, cfg: &EngineConfig) -> Transition {
    state.probability_shift += shift as f64;
    let accepted = if state.probability_shift.abs() > cfg.probability_limit {
        Transition::accept("Probability shifted drastically. Reality struggles to compensate.")
            .defer(
                cfg.probability_correction_delay_ms,
                DeferredTask::HalveProbability,
            )
    } else {
        Transition::accept(format!(
            "Probability {} by {}%.",
            verb(shift, "increased", "decreased"),
            shift.unsigned_abs()
        ))
    };
    accepted.with_effect(EffectKind::Probability, shift, cfg.probability_effect_ms)
}

fn entropy(state: &mut SimulationState, shift: i64, cfg: &EngineConfig) -> Transition {
    let next = state.entropy_level + shift as f64;
    if next < 0.0 {
        return Transition::reject("Cannot reduce entropy below zero.", FeedbackKind::Paradox);
    }
    if next > cfg.entropy_ceiling {
        return Transition::reject(
            "Entropy too high. Reality becoming unstable.",
            FeedbackKind::RealityFracture,
        );
    }
    state.entropy_level = next;
    Transition::accept(format!(
        "Entropy level {} by {}%.",
        verb(shift, "increased", "decreased"),
        shift.unsigned_abs()
    ))
    .with_effect(EffectKind::Entropy, shift, cfg.entropy_effect_ms)
}

fn time(state: &mut SimulationState, shift: i64, cfg: &EngineConfig) -> Transition {
    let multiplier = 1.0 + shift as f64 / 100.0;
    if multiplier <= 0.0 {
        return Transition::reject("Cannot halt or reverse time flow.", FeedbackKind::TimeLoop);
    }
    if multiplier > cfg.max_time_multiplier {
        return Transition::reject("Time acceleration too extreme.", FeedbackKind::TimeLoop);
    }
    state.time_speed = multiplier;
    Transition::accept(format!(
        "Time flow {} by {}%.",
        verb(shift, "accelerated", "decelerated"),
        shift.unsigned_abs()
    ))
    .with_effect(EffectKind::Time, shift, cfg.time_effect_ms)
    .defer(cfg.time_normalization_delay_ms, DeferredTask::NormalizeTime)
}

/// Privileged spells skip every guard. Only the highest-precedence keyword acts.
fn privileged(
    state: &mut SimulationState,
    spell: &ParsedSpell,
    shift: i64,
    cfg: &EngineConfig,
) -> Transition {
    let keyword = ProtocolKeyword::ALL
        .into_iter()
        .find(|k| spell.has_keyword(*k));

    match keyword {
        Some(ProtocolKeyword::KernelSpace) => {
            let mut t = Transition::accept(
                "KERNEL ACCESS GRANTED: Spatial parameters reconfigured beyond normal limits.",
            )
            .with_effect(EffectKind::KernelSpace, shift * 2, cfg.kernel_effect_ms);
            if let Some(plan) = t.effect.as_mut() {
                plan.intensity = shift.unsigned_abs() as f64 / 50.0;
            }
            t
        }
        Some(ProtocolKeyword::RootEntropy) => {
            state.entropy_level =
                (state.entropy_level + shift as f64).clamp(0.0, cfg.privileged_entropy_ceiling);
            Transition::accept("ROOT ACCESS: Fundamental entropic constants modified.")
        }
        Some(ProtocolKeyword::VoidManifest) => {
            state.energy_level += shift.unsigned_abs() as f64;
            state.probability_shift += (shift * 2) as f64;
            Transition::accept("VOID MANIFESTATION: Energy created from quantum fluctuations.")
        }
        Some(ProtocolKeyword::QuantumSuperposition) => {
            state.probability_shift = (shift * 3) as f64;
            Transition::accept(
                "QUANTUM STATE ALIGNED: Probability wave functions collapsed to desired outcome.",
            )
        }
        Some(ProtocolKeyword::ParadoxEngine) => {
            state.time_speed = if shift > 0 {
                cfg.paradox_fast_speed
            } else {
                cfg.paradox_slow_speed
            };
            Transition::accept("PARADOX ENGINE ENGAGED: Contradictory states now coexisting.")
        }
        None => Transition::accept("Hidden protocol recognized, but effect is subtle."),
    }
}

fn verb(shift: i64, up: &'static str, down: &'static str) -> &'static str {
    if shift > 0 { up } else { down }
}
