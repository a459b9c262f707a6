//! Clause scanner for spell scripts.
//!
//! A script is split into segments on lines consisting of `bind`. Within a
//! segment every clause sits on its own line as `key: value`; clause order is
//! free and lines that start with no clause key are ignored. The final
//! segment must end with the `seal` keyword.

use aethercast_common::{AnchorType, Direction, Focus, ParamValue};
use std::fmt;

use crate::protocol;
use crate::spell::{Anchor, ParsedSpell, Shift};

const BIND: &str = "bind";
const SEAL: &str = "seal";

/// A required `key: value` clause of a spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Focus,
    Anchor,
    Shift,
    Cost,
    Intent,
}

impl Clause {
    pub const ALL: [Clause; 5] = [
        Clause::Focus,
        Clause::Anchor,
        Clause::Shift,
        Clause::Cost,
        Clause::Intent,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Clause::Focus => "focus",
            Clause::Anchor => "anchor",
            Clause::Shift => "shift",
            Clause::Cost => "cost",
            Clause::Intent => "intent",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Syntax errors. Any of these fails the whole script.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty spell: write a spell first")]
    Empty,
    #[error("missing '{0}:' in spell")]
    MissingClause(Clause),
    #[error("duplicate '{0}:' in spell")]
    DuplicateClause(Clause),
    #[error("invalid focus value: {found}. Must be one of: {valid}")]
    InvalidFocus { found: String, valid: String },
    #[error("invalid anchor type: {found}. Must be one of: {valid}")]
    InvalidAnchorType { found: String, valid: String },
    #[error("invalid anchor format: {0}. Must be Type or Type(key:value,...)")]
    MalformedAnchor(String),
    #[error("invalid shift format: {0}. Must be in format +XX% or -XX%")]
    MalformedShift(String),
    #[error("invalid cost format: {0}. Must be in format XXE")]
    MalformedCost(String),
    #[error("missing or malformed intent: {0}. Must be in format: intent: \"Your intention\"")]
    MalformedIntent(String),
    #[error("script must be sealed: final spell must end with 'seal'")]
    Unsealed,
    #[error("'seal' may only end the final spell, found at the end of spell {0}")]
    SealBeforeEnd(usize),
    #[error("'bind' must join two spells")]
    DanglingBind,
}

/// Parse a script into one spell per segment.
///
/// Parsing is atomic: the first malformed clause fails the whole script.
pub fn parse(script: &str) -> Result<Vec<ParsedSpell>, ParseError> {
    if script.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let segments = split_segments(script);
    if segments.iter().any(|s| s.iter().all(|l| l.trim().is_empty())) {
        return Err(ParseError::DanglingBind);
    }

    let keywords = protocol::scan(script);
    let last = segments.len() - 1;
    let mut spells = Vec::with_capacity(segments.len());

    for (i, lines) in segments.iter().enumerate() {
        let stripped = strip_seal(lines);
        let body = match (i == last, stripped) {
            (true, Some(body)) => body,
            (true, None) => return Err(ParseError::Unsealed),
            (false, Some(_)) => return Err(ParseError::SealBeforeEnd(i + 1)),
            (false, None) => lines.clone(),
        };

        let mut spell = parse_segment(&body)?;
        spell.is_bound = i < last;
        spell.is_sealed = i == last;
        spell.uses_hidden_protocol = !keywords.is_empty();
        spell.protocol_keywords = keywords.clone();
        spells.push(spell);
    }

    tracing::debug!(
        spells = spells.len(),
        privileged = !keywords.is_empty(),
        "parsed spell script"
    );
    Ok(spells)
}

fn split_segments(script: &str) -> Vec<Vec<&str>> {
    let mut segments = vec![Vec::new()];
    for line in script.lines() {
        if line.trim() == BIND {
            segments.push(Vec::new());
        } else if let Some(current) = segments.last_mut() {
            current.push(line);
        }
    }
    segments
}

/// Return the segment without its trailing `seal` token, or `None` if it
/// does not end with one.
fn strip_seal<'a>(lines: &[&'a str]) -> Option<Vec<&'a str>> {
    let last_idx = lines.iter().rposition(|l| !l.trim().is_empty())?;
    let rest = lines[last_idx].trim_end().strip_suffix(SEAL)?;
    if !(rest.is_empty() || rest.ends_with(char::is_whitespace)) {
        return None;
    }
    let mut body = lines[..last_idx].to_vec();
    body.push(rest);
    Some(body)
}

fn parse_segment(lines: &[&str]) -> Result<ParsedSpell, ParseError> {
    let clauses = extract_clauses(lines)?;
    let get = |clause: Clause| clauses[clause.index()].ok_or(ParseError::MissingClause(clause));

    let focus = parse_focus(get(Clause::Focus)?)?;
    let anchor = parse_anchor(get(Clause::Anchor)?)?;
    let shift = parse_shift(get(Clause::Shift)?)?;
    let cost = parse_cost(get(Clause::Cost)?)?;
    let intent = parse_intent(get(Clause::Intent)?)?;

    Ok(ParsedSpell {
        focus,
        anchor,
        shift,
        cost,
        intent,
        is_bound: false,
        is_sealed: false,
        uses_hidden_protocol: false,
        protocol_keywords: Vec::new(),
    })
}

fn extract_clauses<'a>(lines: &[&'a str]) -> Result<[Option<&'a str>; 5], ParseError> {
    let mut found = [None; 5];
    for line in lines {
        let line = line.trim();
        for clause in Clause::ALL {
            let Some(value) = line
                .strip_prefix(clause.key())
                .and_then(|rest| rest.strip_prefix(':'))
            else {
                continue;
            };
            let slot = &mut found[clause.index()];
            if slot.is_some() {
                return Err(ParseError::DuplicateClause(clause));
            }
            *slot = Some(value.trim());
            break;
        }
    }
    Ok(found)
}

fn parse_focus(value: &str) -> Result<Focus, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidFocus {
        found: value.to_string(),
        valid: join_names(Focus::ALL.iter().map(|f| f.as_str())),
    })
}

fn parse_anchor(value: &str) -> Result<Anchor, ParseError> {
    let name_end = value
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(value.len());
    let (name, rest) = value.split_at(name_end);
    if name.is_empty() {
        return Err(ParseError::MalformedAnchor(value.to_string()));
    }
    let kind: AnchorType = name.parse().map_err(|_| ParseError::InvalidAnchorType {
        found: name.to_string(),
        valid: join_names(AnchorType::ALL.iter().map(|a| a.as_str())),
    })?;

    let mut anchor = Anchor::new(kind);
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(anchor);
    }
    let inner = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| ParseError::MalformedAnchor(value.to_string()))?;

    // Pairs without both a key and a value are skipped.
    for pair in inner.split(',') {
        if let Some((key, raw)) = pair.split_once(':') {
            let (key, raw) = (key.trim(), raw.trim());
            if !key.is_empty() && !raw.is_empty() {
                anchor.params.insert(key.to_string(), ParamValue::coerce(raw));
            }
        }
    }
    Ok(anchor)
}

fn parse_shift(value: &str) -> Result<Shift, ParseError> {
    let malformed = || ParseError::MalformedShift(value.to_string());
    let mut chars = value.chars();
    let direction = chars
        .next()
        .and_then(Direction::from_char)
        .ok_or_else(malformed)?;
    let amount = chars
        .as_str()
        .strip_suffix('%')
        .and_then(parse_digits)
        .ok_or_else(malformed)?;
    Ok(Shift::new(direction, amount))
}

fn parse_cost(value: &str) -> Result<u32, ParseError> {
    value
        .strip_suffix('E')
        .and_then(parse_digits)
        .ok_or_else(|| ParseError::MalformedCost(value.to_string()))
}

fn parse_intent(value: &str) -> Result<String, ParseError> {
    let text = value
        .strip_prefix('"')
        .and_then(|rest| rest.split_once('"'))
        .map(|(inner, _)| inner.trim())
        .filter(|inner| !inner.is_empty())
        .ok_or_else(|| ParseError::MalformedIntent(value.to_string()))?;
    Ok(text.to_string())
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolKeyword;
    use crate::spell::DEFAULT_SPELL;

    const BASIC: &str = "focus: Energy
anchor: Self
shift: +20%
cost: 10E
intent: \"Warm the room\"
seal";

    #[test]
    fn default_template_parses() {
        let spells = parse(DEFAULT_SPELL).unwrap();
        assert_eq!(spells.len(), 1);
        let spell = &spells[0];
        assert_eq!(spell.focus, Focus::Probability);
        assert_eq!(spell.anchor.kind, AnchorType::SelfAnchor);
        assert_eq!(spell.shift, Shift::new(Direction::Increase, 15));
        assert_eq!(spell.cost, 30);
        assert_eq!(spell.intent, "Increase odds of favorable outcome");
        assert!(spell.is_sealed);
        assert!(!spell.is_bound);
        assert!(!spell.uses_hidden_protocol);
    }

    #[test]
    fn clause_order_is_free() {
        let clauses = [
            "focus: Time",
            "anchor: Object",
            "shift: -30%",
            "cost: 5E",
            "  intent: \"Slow down\"",
        ];
        let orders: [[usize; 5]; 6] = [
            [0, 1, 2, 3, 4],
            [4, 3, 2, 1, 0],
            [2, 0, 4, 1, 3],
            [1, 4, 0, 3, 2],
            [3, 2, 1, 4, 0],
            [4, 0, 3, 2, 1],
        ];
        for order in orders {
            let body: Vec<&str> = order.iter().map(|&i| clauses[i]).collect();
            let script = format!("{}\n\nseal\n", body.join("\n"));
            let spell = &parse(&script).unwrap()[0];
            assert_eq!(spell.focus, Focus::Time, "order {order:?}");
            assert_eq!(spell.anchor.kind, AnchorType::Object, "order {order:?}");
            assert_eq!(spell.shift.direction, Direction::Decrease, "order {order:?}");
            assert_eq!(spell.shift.amount, 30);
            assert_eq!(spell.cost, 5);
            assert_eq!(spell.intent, "Slow down");
        }
    }

    #[test]
    fn seal_may_share_the_last_line() {
        let script = BASIC.replace("\"\nseal", "\" seal");
        let spell = &parse(&script).unwrap()[0];
        assert_eq!(spell.intent, "Warm the room");
    }

    #[test]
    fn missing_anchor_names_the_clause() {
        let script = BASIC.replace("anchor: Self\n", "");
        let err = parse(&script).unwrap_err();
        assert_eq!(err, ParseError::MissingClause(Clause::Anchor));
        assert!(err.to_string().contains("anchor"));
    }

    #[test]
    fn bound_pair_flags() {
        let script = format!(
            "{}\nbind\n{}",
            BASIC.trim_end_matches("seal").trim_end(),
            BASIC.replace("Energy", "Entropy")
        );
        let spells = parse(&script).unwrap();
        assert_eq!(spells.len(), 2);
        assert!(spells[0].is_bound);
        assert!(!spells[0].is_sealed);
        assert!(!spells[1].is_bound);
        assert!(spells[1].is_sealed);
        assert_eq!(spells[1].focus, Focus::Entropy);
    }

    #[test]
    fn unsealed_script_fails() {
        let script = BASIC.trim_end_matches("seal");
        assert_eq!(parse(script).unwrap_err(), ParseError::Unsealed);
    }

    #[test]
    fn seal_inside_a_word_does_not_count() {
        let script = format!("{}\nreseal", BASIC.trim_end_matches("seal").trim_end());
        assert_eq!(parse(&script).unwrap_err(), ParseError::Unsealed);
    }

    #[test]
    fn seal_before_final_segment_fails() {
        let script = format!("{BASIC}\nbind\n{BASIC}");
        assert_eq!(parse(&script).unwrap_err(), ParseError::SealBeforeEnd(1));
    }

    #[test]
    fn dangling_bind_fails() {
        let script = format!("{BASIC}\nbind\n");
        assert_eq!(parse(&script).unwrap_err(), ParseError::DanglingBind);
    }

    #[test]
    fn empty_script_fails() {
        assert_eq!(parse("  \n ").unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn invalid_focus_lists_valid_values() {
        let err = parse(&BASIC.replace("Energy", "Gravity")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Gravity"));
        assert!(msg.contains("Energy, Probability, Entropy, Time"));
    }

    #[test]
    fn invalid_anchor_type_lists_valid_values() {
        let err = parse(&BASIC.replace("anchor: Self", "anchor: Planet(size:3)")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidAnchorType { ref found, .. } if found == "Planet"
        ));
        assert!(err.to_string().contains("Self, Object, Zone"));
    }

    #[test]
    fn anchor_params_are_coerced() {
        let script =
            BASIC.replace("anchor: Self", "anchor: Zone(radius: 3, label: north gate, bad)");
        let spell = &parse(&script).unwrap()[0];
        assert_eq!(spell.anchor.kind, AnchorType::Zone);
        assert_eq!(spell.anchor.radius(), Some(3.0));
        assert_eq!(
            spell.anchor.params.get("label"),
            Some(&ParamValue::Text("north gate".into()))
        );
        assert_eq!(spell.anchor.params.len(), 2);
    }

    #[test]
    fn unclosed_anchor_params_fail() {
        let script = BASIC.replace("anchor: Self", "anchor: Zone(radius:3");
        assert!(matches!(
            parse(&script).unwrap_err(),
            ParseError::MalformedAnchor(_)
        ));
    }

    #[test]
    fn malformed_shift_fails() {
        for bad in ["shift: 20%", "shift: +20", "shift: +x%", "shift: +%"] {
            let script = BASIC.replace("shift: +20%", bad);
            assert!(
                matches!(parse(&script).unwrap_err(), ParseError::MalformedShift(_)),
                "{bad}"
            );
        }
    }

    #[test]
    fn missing_and_malformed_cost() {
        let missing = BASIC.replace("cost: 10E\n", "");
        assert_eq!(
            parse(&missing).unwrap_err(),
            ParseError::MissingClause(Clause::Cost)
        );
        let malformed = BASIC.replace("cost: 10E", "cost: ten");
        assert!(matches!(
            parse(&malformed).unwrap_err(),
            ParseError::MalformedCost(_)
        ));
    }

    #[test]
    fn intent_must_be_quoted_and_non_empty() {
        for bad in ["intent: Warm the room", "intent: \"   \"", "intent: \"open"] {
            let script = BASIC.replace("intent: \"Warm the room\"", bad);
            assert!(
                matches!(parse(&script).unwrap_err(), ParseError::MalformedIntent(_)),
                "{bad}"
            );
        }
    }

    #[test]
    fn duplicate_clause_fails() {
        let script = BASIC.replace("focus: Energy", "focus: Energy\nfocus: Time");
        assert_eq!(
            parse(&script).unwrap_err(),
            ParseError::DuplicateClause(Clause::Focus)
        );
    }

    #[test]
    fn failure_in_any_segment_fails_whole_script() {
        let first = BASIC.replace("Energy", "Nothing");
        let script = format!(
            "{}\nbind\n{BASIC}",
            first.trim_end_matches("seal").trim_end()
        );
        assert!(matches!(
            parse(&script).unwrap_err(),
            ParseError::InvalidFocus { .. }
        ));
    }

    #[test]
    fn privileged_keyword_flags_every_segment() {
        let second = BASIC.replace("Warm the room", "open the Void.Manifest");
        let script = format!(
            "{}\nbind\n{second}",
            BASIC.trim_end_matches("seal").trim_end()
        );
        let spells = parse(&script).unwrap();
        assert_eq!(spells.len(), 2);
        for spell in &spells {
            assert!(spell.uses_hidden_protocol);
            assert_eq!(spell.protocol_keywords, vec![ProtocolKeyword::VoidManifest]);
        }
    }

    #[test]
    fn parsed_spell_serializes_with_wire_names() {
        let spell = &parse(BASIC).unwrap()[0];
        let json = serde_json::to_value(spell).unwrap();
        assert_eq!(json["focus"], "Energy");
        assert_eq!(json["anchor"]["type"], "Self");
        assert_eq!(json["shift"]["direction"], "+");
    }
}
