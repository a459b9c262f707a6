mod repl;
mod session;

use std::io::Read;
use std::path::PathBuf;

use aethercast_caster::AetherConfig;
use aethercast_ledger::CostModel;
use aethercast_mirror::Mirror;
use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aethercast", about = "Parse, cost and cast spell scripts")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Session configuration (.json, .yaml or .yml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Parse a script and print its spells
    Parse {
        /// Script file, or `-` for stdin
        input: String,
        /// Print spells as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the computed cost of a script
    Cost {
        /// Script file, or `-` for stdin
        input: String,
    },
    /// Cast scripts in order through one session
    Cast {
        /// Script files, `-` for stdin
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Snapshot file to resume from and save to
        #[arg(short, long)]
        session: Option<PathBuf>,
        /// Caller id recorded in the mirror
        #[arg(long, default_value = "cli")]
        caller: String,
    },
    /// Interactive casting terminal
    Repl {
        /// Snapshot file to resume from and save to
        #[arg(short, long)]
        session: Option<PathBuf>,
        /// Caller id recorded in the mirror
        #[arg(long, default_value = "cli")]
        caller: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => AetherConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AetherConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("aethercast v{}", env!("CARGO_PKG_VERSION"));
            println!("lang: {}", aethercast_lang::crate_info());
            println!("ledger: {}", aethercast_ledger::crate_info());
            println!("kernel: {}", aethercast_kernel::crate_info());
            println!("caster: {}", aethercast_caster::crate_info());
            println!("persist: {}", aethercast_persist::crate_info());
            println!("mirror: {}", aethercast_mirror::crate_info());
            println!("tools: {}", aethercast_tools::crate_info());
        }
        Commands::Parse { input, json } => {
            let script = read_script(&input)?;
            let spells = aethercast_lang::parse(&script)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&spells)?);
            } else {
                for (i, spell) in spells.iter().enumerate() {
                    println!(
                        "#{} {} @ {} {}{}% cost={}E intent={:?}{}",
                        i + 1,
                        spell.focus,
                        spell.anchor.kind,
                        spell.shift.direction,
                        spell.shift.amount,
                        spell.cost,
                        spell.intent,
                        if spell.uses_hidden_protocol {
                            format!(" protocols={:?}", spell.protocol_keywords)
                        } else {
                            String::new()
                        }
                    );
                }
            }
        }
        Commands::Cost { input } => {
            let script = read_script(&input)?;
            let spells = aethercast_lang::parse(&script)?;
            let breakdown = CostModel::new(config.cost).breakdown(&spells);
            for (spell, cost) in spells.iter().zip(&breakdown.per_spell) {
                println!(
                    "{} {}{}%: {}E (declared {}E)",
                    spell.focus, spell.shift.direction, spell.shift.amount, cost, spell.cost
                );
            }
            println!("Total: {}E", breakdown.total);
        }
        Commands::Cast {
            inputs,
            session: session_path,
            caller,
        } => {
            let mut caster = session::open(session_path.as_deref(), config)?;
            let mut mirror = Mirror::new();

            for input in &inputs {
                let script = read_script(input)?;
                let now = caster.engine().now_ms();
                match caster.cast(&script) {
                    Ok(outcome) => {
                        let status = if outcome.result.success { "ok" } else { "failed" };
                        println!(
                            "[{input}] {status}: {} (cost {}E, energy {}E)",
                            outcome.result.message, outcome.cost, outcome.energy
                        );
                        let found = mirror.record_cast(&caller, &script, outcome.cost, now)?;
                        if !found.is_empty() {
                            println!("Discovered: {found:?}");
                        }
                        if let Some(feedback) = outcome.result.feedback {
                            mirror.record_feedback(feedback, None, now);
                        }
                    }
                    Err(e) => println!("[{input}] Spell error: {e}"),
                }
            }

            let summary = aethercast_tools::StateInspector::summary(caster.engine().state());
            println!("{summary}");
            if let Some(path) = session_path {
                session::save(&path, &caster)?;
            }
        }
        Commands::Repl {
            session: session_path,
            caller,
        } => {
            let caster = session::open(session_path.as_deref(), config)?;
            let caster = repl::run(caster, &caller)?;
            if let Some(path) = session_path {
                session::save(&path, &caster)?;
            }
        }
    }

    Ok(())
}

/// Read a script from a file, or stdin for `-`.
/// Log level used when `RUST_LOG` is unset.
fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

fn read_script(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut script = String::new();
        std::io::stdin().read_to_string(&mut script)?;
        return Ok(script);
    }
    std::fs::read_to_string(input).with_context(|| format!("reading script {input}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_defaults_to_info() {
        let cli = Cli::parse_from(["aethercast", "info"]);
        assert_eq!(default_filter(cli.verbose), "info");
        let cli = Cli::parse_from(["aethercast", "--verbose", "info"]);
        assert_eq!(default_filter(cli.verbose), "debug");
    }
}
