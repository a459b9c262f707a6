use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for aethercast")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates, warnings denied
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Cast the bundled default spell through the CLI
    Smoke,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            fmt()?;
            clippy()?;
            test()?;
            doc()?;
        }
        Commands::Fmt => fmt()?,
        Commands::Clippy => clippy()?,
        Commands::Test => test()?,
        Commands::Doc => doc()?,
        Commands::Build => cargo("build", &["build", "--workspace"])?,
        Commands::Smoke => smoke()?,
    }

    Ok(())
}

fn fmt() -> Result<()> {
    cargo("fmt check", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Result<()> {
    cargo(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn test() -> Result<()> {
    cargo("test", &["test", "--workspace"])
}

fn doc() -> Result<()> {
    cargo("doc", &["doc", "--workspace", "--no-deps"])
}

fn smoke() -> Result<()> {
    let dir = std::env::temp_dir().join("aethercast-smoke");
    std::fs::create_dir_all(&dir)?;
    let script = dir.join("default.spell");
    std::fs::write(&script, aethercast_lang::DEFAULT_SPELL)?;
    let script = script.to_string_lossy().into_owned();
    cargo(
        "smoke cast",
        &["run", "-q", "-p", "aethercast-cli", "--", "cast", script.as_str()],
    )
}

/// Run `cargo <args>`, failing when it exits unsuccessfully.
fn cargo(what: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {what}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {what} failed");
    }
    Ok(())
}
