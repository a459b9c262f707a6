use serde::{Deserialize, Serialize};

/// Safety bounds, effect lifetimes, and correction delays of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest |shift| an unprivileged spell may request.
    pub max_safe_shift: u32,
    pub energy_ceiling: f64,
    pub entropy_ceiling: f64,
    /// Entropy ceiling under `root.entropy`.
    pub privileged_entropy_ceiling: f64,
    /// Time multipliers above this are rejected without privilege.
    pub max_time_multiplier: f64,
    /// Range `timeSpeed` is clamped into when normalization fires.
    pub time_normal_min: f64,
    pub time_normal_max: f64,
    /// |probability shift| above which the self-correction is scheduled.
    pub probability_limit: f64,
    pub probability_correction_delay_ms: u64,
    pub time_normalization_delay_ms: u64,
    pub energy_effect_ms: u64,
    pub probability_effect_ms: u64,
    pub entropy_effect_ms: u64,
    pub time_effect_ms: u64,
    pub kernel_effect_ms: u64,
    /// Time speeds forced by `paradox.engine` for positive and other shifts.
    pub paradox_fast_speed: f64,
    pub paradox_slow_speed: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_safe_shift: 200,
            energy_ceiling: 200.0,
            entropy_ceiling: 200.0,
            privileged_entropy_ceiling: 500.0,
            max_time_multiplier: 5.0,
            time_normal_min: 0.5,
            time_normal_max: 2.0,
            probability_limit: 100.0,
            probability_correction_delay_ms: 5_000,
            time_normalization_delay_ms: 15_000,
            energy_effect_ms: 8_000,
            probability_effect_ms: 12_000,
            entropy_effect_ms: 10_000,
            time_effect_ms: 15_000,
            kernel_effect_ms: 20_000,
            paradox_fast_speed: 10.0,
            paradox_slow_speed: 0.1,
        }
    }
}
