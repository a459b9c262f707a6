//! Line-oriented casting terminal.
//!
//! Spell clauses accumulate into a draft until `seal` casts it. Everything
//! else is a command acting on the session directly.

use std::io::{BufRead, Write};

use aethercast_caster::Caster;
use aethercast_common::{Clock, Focus};
use aethercast_mirror::Mirror;
use aethercast_tools::StateInspector;

const HELP: &str = "\
Available commands:
  scry - View current reality parameters
  effects - List active effects
  regen - Regenerate caster energy
  protocols - List discovered protocols
  clear - Discard the current draft
  bind - Chain the draft with another spell
  seal - Cast the current draft
  quit - Leave the terminal

Direct manipulation:
  energy set <0-100>
  probability set <0-100>
  entropy set <0-100>
  time set <0.1-2.0>

Spell components:
  focus: [Energy|Probability|Entropy|Time]
  anchor: [Self|Object|Zone(radius:n)]
  shift: [+|-]n%
  cost: nE
  intent: \"Your intention here\"";

/// What the terminal does after a line.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Print(String),
    Silent,
    Quit,
}

pub struct Repl<C: Clock> {
    caster: Caster<C>,
    mirror: Mirror,
    caller: String,
    draft: Vec<String>,
}

impl<C: Clock> Repl<C> {
    pub fn new(caster: Caster<C>, caller: &str) -> Self {
        Self {
            caster,
            mirror: Mirror::new(),
            caller: caller.to_string(),
            draft: Vec::new(),
        }
    }

    pub fn handle(&mut self, line: &str) -> Step {
        self.caster.tick();
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "" => Step::Silent,
            "quit" | "exit" => Step::Quit,
            "help" | "?" => Step::Print(HELP.to_string()),
            "scry" => {
                let summary = StateInspector::summary(self.caster.engine().state());
                Step::Print(summary.to_string())
            }
            "effects" => Step::Print(self.effects()),
            "regen" => {
                let energy = self.caster.regenerate();
                Step::Print(format!("Energy regenerated to {energy}E."))
            }
            "protocols" => Step::Print(self.protocols()),
            "clear" => {
                self.draft.clear();
                Step::Print("Draft cleared.".to_string())
            }
            "bind" => {
                self.draft.push("bind".to_string());
                Step::Silent
            }
            "seal" => Step::Print(self.seal()),
            lower => match parse_override(lower) {
                Some(Ok((focus, value))) => Step::Print(self.set(focus, value)),
                Some(Err(msg)) => Step::Print(msg),
                None => {
                    self.draft.push(line.to_string());
                    Step::Silent
                }
            },
        }
    }

    pub fn into_caster(self) -> Caster<C> {
        self.caster
    }

    fn seal(&mut self) -> String {
        self.draft.push("seal".to_string());
        let script = self.draft.join("\n");
        self.draft.clear();

        let now = self.caster.engine().now_ms();
        let outcome = match self.caster.cast(&script) {
            Ok(outcome) => outcome,
            Err(e) => return format!("Spell error: {e}"),
        };

        let mut out = format!(
            "{}\nCost: {}E. Energy: {}E.",
            outcome.result.message, outcome.cost, outcome.energy
        );
        match self.mirror.record_cast(&self.caller, &script, outcome.cost, now) {
            Ok(found) => {
                for keyword in found {
                    out.push_str(&format!("\nProtocol discovered: {keyword}"));
                }
            }
            Err(e) => tracing::warn!(error = %e, "mirror rejected cast"),
        }
        if let Some(feedback) = outcome.result.feedback {
            self.mirror.record_feedback(feedback, None, now);
        }
        out
    }

    fn set(&mut self, focus: Focus, value: f64) -> String {
        let applied = self.caster.engine_mut().override_parameter(focus, value);
        match focus {
            Focus::Energy => format!("Energy level set to {applied}"),
            Focus::Probability => format!("Probability shift set to {applied}"),
            Focus::Entropy => format!("Entropy level set to {applied}"),
            Focus::Time => format!("Time flow set to {applied}x"),
        }
    }

    fn effects(&self) -> String {
        let engine = self.caster.engine();
        let effects = StateInspector::effects(engine.state(), engine.now_ms());
        if effects.is_empty() {
            return "No active effects.".to_string();
        }
        effects
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn protocols(&self) -> String {
        let found = self.mirror.discoveries(&self.caller);
        if found.discovered.is_empty() {
            return format!("No protocols discovered. {}", found.hint);
        }
        let names: Vec<&str> = found.discovered.iter().map(|k| k.as_str()).collect();
        format!("Discovered: {}. {}", names.join(", "), found.hint)
    }
}

/// Recognize `<param> set <value>`. `None` means the line is not an override.
fn parse_override(lower: &str) -> Option<Result<(Focus, f64), String>> {
    let mut words = lower.split_whitespace();
    let param = words.next()?;
    if words.next()? != "set" {
        return None;
    }
    let focus = Focus::ALL
        .into_iter()
        .find(|f| f.as_str().eq_ignore_ascii_case(param))?;
    let value = match (words.next(), words.next()) {
        (Some(v), None) => v.parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    };
    Some(value.map(|v| (focus, v)).ok_or_else(|| format!("Usage: {param} set <value>")))
}

/// Run the terminal on stdin until `quit` or end of input.
pub fn run<C: Clock>(caster: Caster<C>, caller: &str) -> anyhow::Result<Caster<C>> {
    let mut repl = Repl::new(caster, caller);
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    println!("aethercast terminal. Type `help` for commands.");

    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match repl.handle(&line) {
            Step::Print(text) => println!("{text}"),
            Step::Silent => {}
            Step::Quit => break,
        }
    }
    Ok(repl.into_caster())
}
