use aethercast_common::{AnchorType, Direction, Focus, ParamValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::protocol::ProtocolKeyword;

/// Starter script handed to authors by front-ends.
pub const DEFAULT_SPELL: &str = "focus: Probability
anchor: Self
shift: +15%
cost: 30E
intent: \"Increase odds of favorable outcome\"
seal";

/// Targeting scope plus its free-form parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    #[serde(rename = "type")]
    pub kind: AnchorType,
    pub params: BTreeMap<String, ParamValue>,
}

impl Anchor {
    pub fn new(kind: AnchorType) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter, builder style.
    pub fn with_param(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Numeric `radius` parameter, if present.
    pub fn radius(&self) -> Option<f64> {
        self.params.get("radius").and_then(ParamValue::as_number)
    }
}

/// Direction and unsigned percentage of a requested change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub direction: Direction,
    pub amount: u32,
}

impl Shift {
    pub fn new(direction: Direction, amount: u32) -> Self {
        Self { direction, amount }
    }

    /// Amount with the direction applied.
    pub fn signed(&self) -> i64 {
        match self.direction {
            Direction::Increase => i64::from(self.amount),
            Direction::Decrease => -i64::from(self.amount),
        }
    }
}

/// One casting unit parsed from a script segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSpell {
    pub focus: Focus,
    pub anchor: Anchor,
    pub shift: Shift,
    /// Cost declared by the author in the `cost:` clause. Informational only.
    pub cost: u32,
    pub intent: String,
    pub is_bound: bool,
    pub is_sealed: bool,
    pub uses_hidden_protocol: bool,
    pub protocol_keywords: Vec<ProtocolKeyword>,
}

impl ParsedSpell {
    /// A plain, unbound, sealed spell. Handy for callers that build spells directly.
    pub fn new(focus: Focus, anchor: Anchor, shift: Shift) -> Self {
        Self {
            focus,
            anchor,
            shift,
            cost: 0,
            intent: String::new(),
            is_bound: false,
            is_sealed: true,
            uses_hidden_protocol: false,
            protocol_keywords: Vec::new(),
        }
    }

    /// Mark the spell privileged with the given keywords.
    pub fn with_protocols(mut self, keywords: &[ProtocolKeyword]) -> Self {
        self.uses_hidden_protocol = !keywords.is_empty();
        self.protocol_keywords = keywords.to_vec();
        self
    }

    pub fn has_keyword(&self, keyword: ProtocolKeyword) -> bool {
        self.protocol_keywords.contains(&keyword)
    }
}
