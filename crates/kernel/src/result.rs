use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of feedback a front-end should play when a spell goes wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    EnergyOverload,
    RealityFracture,
    TimeLoop,
    EnergyInsufficient,
    Paradox,
}

impl FeedbackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackKind::EnergyOverload => "energy_overload",
            FeedbackKind::RealityFracture => "reality_fracture",
            FeedbackKind::TimeLoop => "time_loop",
            FeedbackKind::EnergyInsufficient => "energy_insufficient",
            FeedbackKind::Paradox => "paradox",
        }
    }
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of applying spells. Rejections are ordinary values, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<FeedbackKind>,
}

impl SpellResult {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            feedback: None,
        }
    }

    pub fn rejected(message: impl Into<String>, feedback: FeedbackKind) -> Self {
        Self {
            success: false,
            message: message.into(),
            feedback: Some(feedback),
        }
    }
}
