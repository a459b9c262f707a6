use aethercast_common::{Clock, EffectId, Focus, SystemClock};
use aethercast_lang::ParsedSpell;

use crate::config::EngineConfig;
use crate::result::{FeedbackKind, SpellResult};
use crate::scheduler::{DeferredTask, PendingTask, Scheduler};
use crate::state::{Dimensions, SimulationEffect, SimulationState};
use crate::transition::{self, EffectPlan};

/// An event record produced by every mutation of the simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A spell passed its guards and mutated state.
    SpellApplied {
        focus: Focus,
        shift: i64,
        message: String,
    },
    /// A spell was rejected; state is unchanged apart from `last_spell_focus`.
    SpellRejected {
        focus: Focus,
        shift: i64,
        feedback: Option<FeedbackKind>,
        message: String,
    },
    EffectExpired { id: EffectId },
    ProbabilityCorrected { from: f64, to: f64 },
    TimeNormalized { from: f64, to: f64 },
    /// A direct override set a parameter outside of spellcasting.
    ParameterOverridden { focus: Focus, value: f64 },
}

/// The authoritative simulation.
///
/// All mutations go through explicit operations: spells, deferred tasks,
/// sweeps, and overrides. Reads hand out borrows or copies, never the live
/// state mutably. Exclusive access is required for every mutation; hosts with
/// several threads must serialize calls.
pub struct SimulationEngine<C: Clock = SystemClock> {
    state: SimulationState,
    config: EngineConfig,
    scheduler: Scheduler,
    clock: C,
    /// Append-only log of all mutations.
    events: Vec<SimEvent>,
}

impl SimulationEngine<SystemClock> {
    /// Engine with default state and configuration on the wall clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock, EngineConfig::default())
    }
}

impl Default for SimulationEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SimulationEngine<C> {
    pub fn with_clock(clock: C, config: EngineConfig) -> Self {
        Self::from_state(SimulationState::default(), config, clock)
    }

    /// Resume from a saved state with no pending tasks.
    pub fn from_state(state: SimulationState, config: EngineConfig, clock: C) -> Self {
        Self::from_parts(state, Vec::new(), config, clock)
    }

    /// Resume from a saved state and its pending task queue.
    ///
    /// Overdue tasks fire on the next `run_due` or `tick`.
    pub fn from_parts(
        state: SimulationState,
        pending: Vec<PendingTask>,
        config: EngineConfig,
        clock: C,
    ) -> Self {
        Self {
            state,
            config,
            scheduler: Scheduler::from_pending(pending),
            clock,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Read-only view of the live state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Detached copy of the state.
    pub fn snapshot(&self) -> SimulationState {
        self.state.clone()
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.state.dimensions = Dimensions { width, height };
    }

    /// Number of deferred tasks still waiting to fire.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// The deferred task queue in firing order, for saving with the state.
    pub fn pending_schedule(&self) -> Vec<PendingTask> {
        self.scheduler.pending()
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Apply spells left to right, stopping at the first rejection.
    pub fn apply_spell(&mut self, spells: &[ParsedSpell]) -> SpellResult {
        let _span = tracing::info_span!("apply_spell", spells = spells.len()).entered();

        for spell in spells {
            let result = self.apply_single(spell);
            if !result.success {
                return result;
            }
        }
        SpellResult::accepted("Spell cast successfully! Reality shifts to your will.")
    }

    fn apply_single(&mut self, spell: &ParsedSpell) -> SpellResult {
        let shift = spell.shift.signed();
        let t = transition::apply(&mut self.state, spell, &self.config);

        if !t.result.success {
            tracing::warn!(
                focus = %spell.focus,
                shift,
                feedback = ?t.result.feedback,
                "spell rejected"
            );
            self.events.push(SimEvent::SpellRejected {
                focus: spell.focus,
                shift,
                feedback: t.result.feedback,
                message: t.result.message.clone(),
            });
            return t.result;
        }

        let now = self.clock.now_ms();
        if let Some(plan) = t.effect {
            self.add_effect(spell, plan, now);
        }
        for (delay_ms, task) in t.deferred {
            self.scheduler.schedule(now.saturating_add(delay_ms), task);
        }

        tracing::debug!(focus = %spell.focus, shift, message = %t.result.message, "spell applied");
        self.events.push(SimEvent::SpellApplied {
            focus: spell.focus,
            shift,
            message: t.result.message.clone(),
        });
        t.result
    }

    fn add_effect(&mut self, spell: &ParsedSpell, plan: EffectPlan, now: u64) -> EffectId {
        let id = EffectId::new();
        self.state.active_effects.push(SimulationEffect {
            id,
            kind: plan.kind,
            anchor_type: spell.anchor.kind,
            anchor_params: spell.anchor.params.clone(),
            shift_amount: plan.shift_amount,
            duration_ms: plan.duration_ms,
            start_ms: now,
            intensity: plan.intensity,
        });
        self.scheduler.schedule(
            now.saturating_add(plan.duration_ms),
            DeferredTask::ExpireEffect(id),
        );
        id
    }

    /// Remove every effect whose age has reached its duration.
    ///
    /// Idempotent; returns the number of effects removed.
    pub fn cleanup_expired_effects(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut expired = Vec::new();
        self.state.active_effects.retain(|e| {
            let keep = !e.is_expired(now);
            if !keep {
                expired.push(e.id);
            }
            keep
        });
        for id in &expired {
            self.events.push(SimEvent::EffectExpired { id: *id });
        }
        if !expired.is_empty() {
            tracing::trace!(removed = expired.len(), "swept expired effects");
        }
        expired.len()
    }

    /// Fire every deferred task that is due. Returns the number fired.
    pub fn run_due(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut fired = 0;
        while let Some(task) = self.scheduler.pop_due(now) {
            self.fire(task);
            fired += 1;
        }
        fired
    }

    /// Periodic pump: fire due tasks, then sweep expired effects.
    pub fn tick(&mut self) -> usize {
        self.run_due() + self.cleanup_expired_effects()
    }

    fn fire(&mut self, task: DeferredTask) {
        match task {
            DeferredTask::ExpireEffect(id) => {
                let before = self.state.active_effects.len();
                self.state.active_effects.retain(|e| e.id != id);
                if self.state.active_effects.len() != before {
                    self.events.push(SimEvent::EffectExpired { id });
                }
            }
            DeferredTask::HalveProbability => {
                let from = self.state.probability_shift;
                let to = from / 2.0;
                self.state.probability_shift = to;
                tracing::debug!(from, to, "probability self-corrected");
                self.events.push(SimEvent::ProbabilityCorrected { from, to });
            }
            DeferredTask::NormalizeTime => {
                let from = self.state.time_speed;
                let to = from.clamp(self.config.time_normal_min, self.config.time_normal_max);
                if to != from {
                    self.state.time_speed = to;
                    tracing::debug!(from, to, "time flow normalized");
                    self.events.push(SimEvent::TimeNormalized { from, to });
                }
            }
        }
    }

    /// Set a parameter directly, clamped to its override range.
    ///
    /// Energy, probability and entropy accept `[0, 100]`; time accepts
    /// `[0.1, 2.0]`. Returns the value applied.
    pub fn override_parameter(&mut self, focus: Focus, value: f64) -> f64 {
        let value = match focus {
            Focus::Time => value.clamp(0.1, 2.0),
            _ => value.clamp(0.0, 100.0),
        };
        match focus {
            Focus::Energy => self.state.energy_level = value,
            Focus::Probability => self.state.probability_shift = value,
            Focus::Entropy => self.state.entropy_level = value,
            Focus::Time => self.state.time_speed = value,
        }
        self.state.last_spell_focus = Some(focus);
        tracing::info!(focus = %focus, value, "parameter overridden");
        self.events.push(SimEvent::ParameterOverridden { focus, value });
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EffectKind;
    use aethercast_common::{AnchorType, Direction, ManualClock, ParamValue};
    use aethercast_lang::{Anchor, ProtocolKeyword, Shift};

    fn engine() -> (SimulationEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_000);
        (
            SimulationEngine::with_clock(clock.clone(), EngineConfig::default()),
            clock,
        )
    }

    fn spell(focus: Focus, direction: Direction, amount: u32) -> ParsedSpell {
        ParsedSpell::new(
            focus,
            Anchor::new(AnchorType::Zone).with_param("radius", ParamValue::Number(2.0)),
            Shift::new(direction, amount),
        )
    }

    #[test]
    fn accepted_spell_records_effect_and_expiry() {
        let (mut engine, clock) = engine();
        let result = engine.apply_spell(&[spell(Focus::Energy, Direction::Increase, 20)]);
        assert!(result.success);
        assert_eq!(engine.state().energy_level, 120.0);
        assert_eq!(engine.state().last_spell_focus, Some(Focus::Energy));

        let effect = &engine.state().active_effects[0];
        assert_eq!(effect.kind, EffectKind::Energy);
        assert_eq!(effect.anchor_type, AnchorType::Zone);
        assert_eq!(effect.start_ms, 1_000);
        assert_eq!(effect.intensity, 0.2);
        assert_eq!(engine.pending_tasks(), 1);

        clock.advance(7_999);
        assert_eq!(engine.run_due(), 0);
        assert_eq!(engine.state().active_effects.len(), 1);
        clock.advance(1);
        assert_eq!(engine.run_due(), 1);
        assert!(engine.state().active_effects.is_empty());
    }

    #[test]
    fn rejected_energy_leaves_state_unchanged() {
        let (mut engine, _clock) = engine();
        engine.override_parameter(Focus::Energy, 10.0);
        let before = engine.snapshot();
        let result = engine.apply_spell(&[spell(Focus::Energy, Direction::Decrease, 20)]);
        assert!(!result.success);
        assert_eq!(result.feedback, Some(FeedbackKind::EnergyInsufficient));
        assert_eq!(engine.state(), &before);
        assert_eq!(engine.pending_tasks(), 0);
    }

    #[test]
    fn chain_short_circuits_on_first_failure() {
        let (mut engine, _clock) = engine();
        let spells = [
            spell(Focus::Entropy, Direction::Increase, 30),
            spell(Focus::Time, Direction::Decrease, 100),
            spell(Focus::Energy, Direction::Increase, 50),
        ];
        let result = engine.apply_spell(&spells);
        assert_eq!(result.feedback, Some(FeedbackKind::TimeLoop));
        assert_eq!(engine.state().entropy_level, 50.0);
        assert_eq!(engine.state().energy_level, 100.0);
        assert_eq!(engine.state().active_effects.len(), 1);
        assert!(matches!(
            engine.events().last(),
            Some(SimEvent::SpellRejected { focus: Focus::Time, .. })
        ));
    }

    #[test]
    fn full_chain_returns_terminal_success() {
        let (mut engine, _clock) = engine();
        let result = engine.apply_spell(&[
            spell(Focus::Entropy, Direction::Increase, 10),
            spell(Focus::Probability, Direction::Decrease, 10),
        ]);
        assert!(result.success);
        assert_eq!(
            result.message,
            "Spell cast successfully! Reality shifts to your will."
        );
        assert_eq!(engine.state().active_effects.len(), 2);
    }

    #[test]
    fn probability_correction_reads_current_value() {
        let (mut engine, clock) = engine();
        engine.apply_spell(&[spell(Focus::Probability, Direction::Increase, 150)]);
        assert_eq!(engine.state().probability_shift, 150.0);

        // An intervening cast moves the accumulator before the correction fires.
        clock.advance(1_000);
        engine.apply_spell(&[spell(Focus::Probability, Direction::Increase, 50)]);
        assert_eq!(engine.state().probability_shift, 200.0);

        clock.advance(4_000);
        engine.run_due();
        assert_eq!(engine.state().probability_shift, 100.0);

        clock.advance(1_000);
        engine.run_due();
        assert_eq!(engine.state().probability_shift, 50.0);
    }

    #[test]
    fn time_normalizes_after_delay() {
        let (mut engine, clock) = engine();
        let result = engine.apply_spell(&[spell(Focus::Time, Direction::Increase, 200)]);
        assert!(result.success);
        assert_eq!(engine.state().time_speed, 3.0);

        clock.advance(14_999);
        engine.tick();
        assert_eq!(engine.state().time_speed, 3.0);

        clock.advance(1);
        engine.tick();
        assert_eq!(engine.state().time_speed, 2.0);
        assert!(engine.state().active_effects.is_empty());
        assert!(
            engine
                .events()
                .contains(&SimEvent::TimeNormalized { from: 3.0, to: 2.0 })
        );
    }

    #[test]
    fn time_at_five_is_accepted() {
        let clock = ManualClock::new(0);
        let config = EngineConfig {
            max_safe_shift: 500,
            ..EngineConfig::default()
        };
        let mut engine = SimulationEngine::with_clock(clock, config);
        assert!(engine.apply_spell(&[spell(Focus::Time, Direction::Increase, 400)]).success);
        let result = engine.apply_spell(&[spell(Focus::Time, Direction::Increase, 450)]);
        assert_eq!(result.feedback, Some(FeedbackKind::TimeLoop));
        assert_eq!(engine.state().time_speed, 5.0);
    }

    #[test]
    fn cleanup_is_idempotent() {
        let (mut engine, clock) = engine();
        engine.apply_spell(&[spell(Focus::Energy, Direction::Increase, 5)]);
        engine.apply_spell(&[spell(Focus::Entropy, Direction::Increase, 5)]);
        clock.advance(9_000);
        assert_eq!(engine.cleanup_expired_effects(), 1);
        assert_eq!(engine.cleanup_expired_effects(), 0);
        assert_eq!(engine.state().active_effects.len(), 1);
    }

    #[test]
    fn sweep_and_timer_agree_on_same_effect() {
        let (mut engine, clock) = engine();
        engine.apply_spell(&[spell(Focus::Energy, Direction::Increase, 5)]);
        clock.advance(8_000);
        assert_eq!(engine.cleanup_expired_effects(), 1);
        // The scheduled removal still fires but finds nothing to remove.
        assert_eq!(engine.run_due(), 1);
        let expired = engine
            .events()
            .iter()
            .filter(|e| matches!(e, SimEvent::EffectExpired { .. }))
            .count();
        assert_eq!(expired, 1);
    }

    #[test]
    fn restored_engine_sweeps_stale_effects() {
        let (mut engine, clock) = engine();
        engine.apply_spell(&[spell(Focus::Entropy, Direction::Increase, 5)]);
        let saved = engine.snapshot();

        clock.advance(60_000);
        let mut restored =
            SimulationEngine::from_state(saved, EngineConfig::default(), clock.clone());
        assert_eq!(restored.pending_tasks(), 0);
        assert_eq!(restored.tick(), 1);
        assert!(restored.state().active_effects.is_empty());
    }

    #[test]
    fn restored_engine_fires_overdue_tasks() {
        let (mut engine, clock) = engine();
        engine.apply_spell(&[spell(Focus::Time, Direction::Increase, 150)]);
        assert_eq!(engine.state().time_speed, 2.5);
        let saved = engine.snapshot();
        let pending = engine.pending_schedule();
        assert_eq!(pending.len(), 2);

        clock.advance(60_000);
        let mut restored =
            SimulationEngine::from_parts(saved, pending, EngineConfig::default(), clock.clone());
        assert_eq!(restored.pending_tasks(), 2);
        restored.tick();
        assert_eq!(restored.state().time_speed, 2.0);
        assert!(restored.state().active_effects.is_empty());
        assert_eq!(restored.pending_tasks(), 0);
    }

    #[test]
    fn snapshot_is_detached() {
        let (mut engine, _clock) = engine();
        let mut copy = engine.snapshot();
        copy.energy_level = 0.0;
        assert_eq!(engine.state().energy_level, 100.0);
        engine.set_dimensions(1920, 1080);
        assert_eq!(engine.state().dimensions.width, 1920);
        assert_eq!(copy.dimensions.width, 800);
    }

    #[test]
    fn overrides_clamp() {
        let (mut engine, _clock) = engine();
        assert_eq!(engine.override_parameter(Focus::Entropy, 250.0), 100.0);
        assert_eq!(engine.override_parameter(Focus::Time, 0.0), 0.1);
        assert_eq!(engine.override_parameter(Focus::Probability, -3.0), 0.0);
        assert_eq!(engine.state().time_speed, 0.1);
        assert_eq!(engine.state().last_spell_focus, Some(Focus::Probability));
    }

    #[test]
    fn privileged_chain_never_rejects() {
        let (mut engine, _clock) = engine();
        let spells: Vec<ParsedSpell> = [
            spell(Focus::Energy, Direction::Decrease, 900),
            spell(Focus::Time, Direction::Increase, 900),
        ]
        .into_iter()
        .map(|s| s.with_protocols(&[ProtocolKeyword::ParadoxEngine]))
        .collect();
        let result = engine.apply_spell(&spells);
        assert!(result.success);
        assert_eq!(engine.state().time_speed, 10.0);
        // Paradox time is not normalized: nothing was scheduled.
        assert_eq!(engine.pending_tasks(), 0);
    }

    #[test]
    fn drain_events_empties_log() {
        let (mut engine, _clock) = engine();
        engine.apply_spell(&[spell(Focus::Energy, Direction::Increase, 5)]);
        assert_eq!(engine.drain_events().len(), 1);
        assert!(engine.events().is_empty());
    }
}
