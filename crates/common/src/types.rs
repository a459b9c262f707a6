use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a simulation effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(pub Uuid);

impl EffectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A name that did not match any variant of an enumerated spell value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{found}`")]
pub struct UnknownName {
    pub kind: &'static str,
    pub found: String,
}

/// The reality parameter a spell targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Focus {
    Energy,
    Probability,
    Entropy,
    Time,
}

impl Focus {
    pub const ALL: [Focus; 4] = [Focus::Energy, Focus::Probability, Focus::Entropy, Focus::Time];

    pub fn as_str(self) -> &'static str {
        match self {
            Focus::Energy => "Energy",
            Focus::Probability => "Probability",
            Focus::Entropy => "Entropy",
            Focus::Time => "Time",
        }
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Focus {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Focus::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownName {
                kind: "focus",
                found: s.to_string(),
            })
    }
}

/// Targeting scope of a spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnchorType {
    #[serde(rename = "Self")]
    SelfAnchor,
    Object,
    Zone,
}

impl AnchorType {
    pub const ALL: [AnchorType; 3] = [AnchorType::SelfAnchor, AnchorType::Object, AnchorType::Zone];

    pub fn as_str(self) -> &'static str {
        match self {
            AnchorType::SelfAnchor => "Self",
            AnchorType::Object => "Object",
            AnchorType::Zone => "Zone",
        }
    }
}

impl fmt::Display for AnchorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnchorType {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnchorType::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownName {
                kind: "anchor type",
                found: s.to_string(),
            })
    }
}

/// Sign of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "+")]
    Increase,
    #[serde(rename = "-")]
    Decrease,
}

impl Direction {
    pub fn as_char(self) -> char {
        match self {
            Direction::Increase => '+',
            Direction::Decrease => '-',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Direction::Increase),
            '-' => Some(Direction::Decrease),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Anchor parameter value: numeric when the source text parses as a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Coerce raw parameter text, keeping it as trimmed text when it is not numeric.
    pub fn coerce(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => ParamValue::Number(n),
            _ => ParamValue::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            ParamValue::Text(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}
