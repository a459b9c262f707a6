use aethercast_common::{Clock, SystemClock};
use aethercast_kernel::{FeedbackKind, SimulationEngine, SpellResult};
use aethercast_lang::{ParseError, ParsedSpell};
use aethercast_ledger::{CostModel, ResourceLedger};

use crate::config::AetherConfig;

/// A script that parsed, with its computed cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub spells: Vec<ParsedSpell>,
    pub cost: u32,
}

/// What happened to one cast attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct CastOutcome {
    pub result: SpellResult,
    pub cost: u32,
    /// Ledger energy after the attempt.
    pub energy: u32,
}

/// Casting session: one engine, one ledger, one cost model.
///
/// Owns the gate the engine knows nothing about: a cast reaches the engine
/// only when its computed cost fits the ledger, and energy is spent only
/// when the engine accepts every spell.
pub struct Caster<C: Clock = SystemClock> {
    engine: SimulationEngine<C>,
    ledger: ResourceLedger,
    cost_model: CostModel,
}

impl Caster<SystemClock> {
    pub fn new(config: AetherConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Caster<C> {
    pub fn with_clock(config: AetherConfig, clock: C) -> Self {
        Self {
            engine: SimulationEngine::with_clock(clock, config.engine),
            ledger: ResourceLedger::new(config.ledger),
            cost_model: CostModel::new(config.cost),
        }
    }

    /// Assemble a session from restored parts.
    pub fn from_parts(
        engine: SimulationEngine<C>,
        ledger: ResourceLedger,
        cost_model: CostModel,
    ) -> Self {
        Self {
            engine,
            ledger,
            cost_model,
        }
    }

    pub fn engine(&self) -> &SimulationEngine<C> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SimulationEngine<C> {
        &mut self.engine
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    /// Parse and cost a script, recording the cost as the current draft cost.
    pub fn compile(&mut self, script: &str) -> Result<Compiled, ParseError> {
        let spells = aethercast_lang::parse(script)?;
        let cost = self.cost_model.compute(&spells);
        let declared: u32 = spells.iter().map(|s| s.cost).sum();
        if declared != cost {
            tracing::debug!(declared, computed = cost, "declared cost differs from computed cost");
        }
        self.ledger.set_current_cost(cost);
        Ok(Compiled { spells, cost })
    }

    /// Compile and cast a script.
    pub fn cast(&mut self, script: &str) -> Result<CastOutcome, ParseError> {
        let compiled = self.compile(script)?;
        Ok(self.cast_compiled(&compiled))
    }

    /// Gate, apply, and pay for an already compiled script.
    pub fn cast_compiled(&mut self, compiled: &Compiled) -> CastOutcome {
        let _span = tracing::info_span!("cast", cost = compiled.cost).entered();
        let energy = self.ledger.energy();

        if !self.ledger.can_afford(compiled.cost) {
            tracing::warn!(cost = compiled.cost, energy, "insufficient energy to cast");
            return CastOutcome {
                result: SpellResult::rejected(
                    format!("Not enough energy. Need {}E, have {}E.", compiled.cost, energy),
                    FeedbackKind::EnergyInsufficient,
                ),
                cost: compiled.cost,
                energy,
            };
        }

        let result = self.engine.apply_spell(&compiled.spells);
        if result.success {
            self.ledger.spend(compiled.cost);
        }
        self.flush_events();
        tracing::info!(success = result.success, cost = compiled.cost, "cast finished");
        CastOutcome {
            result,
            cost: compiled.cost,
            energy: self.ledger.energy(),
        }
    }

    /// Restore one step of caster energy.
    pub fn regenerate(&mut self) -> u32 {
        self.ledger.refresh()
    }

    /// Periodic pump of the engine's timers and sweep.
    pub fn tick(&mut self) -> usize {
        let fired = self.engine.tick();
        self.flush_events();
        fired
    }

    pub fn into_parts(self) -> (SimulationEngine<C>, ResourceLedger, CostModel) {
        (self.engine, self.ledger, self.cost_model)
    }

    /// Hand the engine's event log to tracing so it never accumulates.
    fn flush_events(&mut self) {
        for event in self.engine.drain_events() {
            tracing::debug!(?event, "simulation event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aethercast_common::{Focus, ManualClock};
    use aethercast_lang::DEFAULT_SPELL;

    fn caster() -> (Caster<ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        (Caster::with_clock(AetherConfig::default(), clock.clone()), clock)
    }

    fn script(focus: &str, shift: &str) -> String {
        format!("focus: {focus}\nanchor: Self\nshift: {shift}\ncost: 1E\nintent: \"test\"\nseal")
    }

    #[test]
    fn compile_records_current_cost() {
        let (mut caster, _clock) = caster();
        let compiled = caster.compile(DEFAULT_SPELL).unwrap();
        // 15 * 0.8 = 12, not the declared 30.
        assert_eq!(compiled.cost, 12);
        assert_eq!(caster.ledger().current_cost(), 12);
    }

    #[test]
    fn successful_cast_spends_energy() {
        let (mut caster, _clock) = caster();
        let outcome = caster.cast(&script("Entropy", "+30%")).unwrap();
        assert!(outcome.result.success);
        assert_eq!(outcome.cost, 30);
        assert_eq!(outcome.energy, 70);
        assert_eq!(caster.engine().state().entropy_level, 50.0);
    }

    #[test]
    fn unaffordable_cast_never_reaches_engine() {
        let (mut caster, _clock) = caster();
        let outcome = caster.cast(&script("Time", "+100%")).unwrap();
        assert!(!outcome.result.success);
        assert_eq!(outcome.result.feedback, Some(FeedbackKind::EnergyInsufficient));
        assert_eq!(outcome.result.message, "Not enough energy. Need 120E, have 100E.");
        assert_eq!(outcome.energy, 100);
        assert_eq!(caster.engine().state().time_speed, 1.0);
        assert_eq!(caster.engine().state().last_spell_focus, None);
    }

    #[test]
    fn rejected_cast_keeps_energy() {
        let (mut caster, _clock) = caster();
        caster.engine_mut().override_parameter(Focus::Entropy, 5.0);
        let outcome = caster.cast(&script("Entropy", "-10%")).unwrap();
        assert_eq!(outcome.result.feedback, Some(FeedbackKind::Paradox));
        assert_eq!(outcome.energy, 100);
    }

    #[test]
    fn syntax_errors_propagate() {
        let (mut caster, _clock) = caster();
        let err = caster.cast("focus: Energy").unwrap_err();
        assert_eq!(err, ParseError::Unsealed);
        assert!(caster.cast("").is_err());
    }

    #[test]
    fn regenerate_and_tick() {
        let (mut caster, clock) = caster();
        caster.cast(&script("Energy", "+40%")).unwrap();
        assert_eq!(caster.ledger().energy(), 80);
        assert_eq!(caster.regenerate(), 90);

        clock.advance(8_000);
        assert_eq!(caster.tick(), 1);
        assert!(caster.engine().state().active_effects.is_empty());
    }

    #[test]
    fn event_log_is_drained() {
        let (mut caster, clock) = caster();
        caster.cast(&script("Probability", "+20%")).unwrap();
        assert!(caster.engine().events().is_empty());

        caster.engine_mut().override_parameter(Focus::Time, 1.5);
        assert_eq!(caster.engine().events().len(), 1);
        clock.advance(12_000);
        caster.tick();
        assert!(caster.engine().events().is_empty());
    }
}
