//! Telemetry mirror: a side channel that records casts and feedback reported
//! by clients and tracks which privileged keywords each caller has found.
//!
//! # Invariants
//! - The mirror is never authoritative for simulation state.
//! - At most `PHENOMENA_CAPACITY` phenomena are retained, oldest dropped first.
//! - A caller's discoveries only grow, each keyword once, in discovery order.

use aethercast_kernel::FeedbackKind;
use aethercast_lang::{ProtocolKeyword, protocol};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use uuid::Uuid;

pub const PHENOMENA_CAPACITY: usize = 10;
/// Characters of script text retained per recorded cast.
pub const FRAGMENT_CHARS: usize = 50;
/// Anomaly level above which integrity degrades.
pub const ANOMALY_THRESHOLD: f64 = 10.0;
pub const INTEGRITY_PENALTY: i32 = 5;

/// Errors from mirror requests.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MirrorError {
    #[error("no spell code provided")]
    EmptySpell,
}

/// Something a client reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phenomenon {
    SpellCast {
        id: Uuid,
        timestamp_ms: u64,
        energy_cost: u32,
        spell_fragment: String,
    },
    Feedback {
        id: Uuid,
        timestamp_ms: u64,
        feedback: FeedbackKind,
        intensity: f64,
    },
}

/// Read-only summary of the mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorStatus {
    pub phenomena: Vec<Phenomenon>,
    pub system_integrity: i32,
    pub anomaly_level: f64,
}

/// What a caller has found so far, with a nudge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discoveries {
    pub discovered: Vec<ProtocolKeyword>,
    pub hint: &'static str,
}

#[derive(Debug, Clone)]
pub struct Mirror {
    phenomena: VecDeque<Phenomenon>,
    discoveries: BTreeMap<String, Vec<ProtocolKeyword>>,
    system_integrity: i32,
    anomaly_level: f64,
}

impl Default for Mirror {
    fn default() -> Self {
        Self {
            phenomena: VecDeque::with_capacity(PHENOMENA_CAPACITY + 1),
            discoveries: BTreeMap::new(),
            system_integrity: 100,
            anomaly_level: 0.0,
        }
    }
}

impl Mirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cast and scan it for keywords new to `caller`.
    ///
    /// Returns the keywords discovered by this call.
    pub fn record_cast(
        &mut self,
        caller: &str,
        script: &str,
        energy_cost: u32,
        now_ms: u64,
    ) -> Result<Vec<ProtocolKeyword>, MirrorError> {
        if script.trim().is_empty() {
            return Err(MirrorError::EmptySpell);
        }
        self.push(Phenomenon::SpellCast {
            id: Uuid::new_v4(),
            timestamp_ms: now_ms,
            energy_cost,
            spell_fragment: script.chars().take(FRAGMENT_CHARS).collect(),
        });

        let known = self.discoveries.entry(caller.to_string()).or_default();
        let fresh: Vec<ProtocolKeyword> = protocol::scan(script)
            .into_iter()
            .filter(|k| !known.contains(k))
            .collect();
        known.extend(fresh.iter().copied());
        if !fresh.is_empty() {
            tracing::info!(caller, discovered = ?fresh, "caller discovered protocols");
        }
        Ok(fresh)
    }

    /// Record client feedback. Returns the system integrity afterwards.
    pub fn record_feedback(
        &mut self,
        feedback: FeedbackKind,
        intensity: Option<f64>,
        now_ms: u64,
    ) -> i32 {
        let intensity = intensity.unwrap_or(1.0);
        self.push(Phenomenon::Feedback {
            id: Uuid::new_v4(),
            timestamp_ms: now_ms,
            feedback,
            intensity,
        });
        self.anomaly_level += intensity;
        if self.anomaly_level > ANOMALY_THRESHOLD {
            self.system_integrity -= INTEGRITY_PENALTY;
            self.anomaly_level = 0.0;
            tracing::warn!(integrity = self.system_integrity, "anomaly threshold crossed");
        }
        self.system_integrity
    }

    pub fn discoveries(&self, caller: &str) -> Discoveries {
        let discovered = self.discoveries.get(caller).cloned().unwrap_or_default();
        let hint = if discovered.is_empty() {
            "Look for hidden patterns in the code"
        } else {
            "You've begun to see beyond the veil"
        };
        Discoveries { discovered, hint }
    }

    pub fn status(&self) -> MirrorStatus {
        MirrorStatus {
            phenomena: self.phenomena.iter().cloned().collect(),
            system_integrity: self.system_integrity,
            anomaly_level: self.anomaly_level,
        }
    }

    fn push(&mut self, phenomenon: Phenomenon) {
        self.phenomena.push_back(phenomenon);
        while self.phenomena.len() > PHENOMENA_CAPACITY {
            self.phenomena.pop_front();
        }
    }
}

pub fn crate_info() -> &'static str {
    "aethercast-mirror v0.1.0"
}
