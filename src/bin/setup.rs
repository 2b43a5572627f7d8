//! Randomizer bot setup wizard.
//!
//! Asks a few questions on the terminal and writes `config.toml` to the
//! project root (`RANDOMIZER_BOT_ROOT`, or the current directory).

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

// ── Config formatting ──────────────────────────────────────────────────────────

struct ConfigParams<'a> {
    bot_token: &'a str,
    poll_interval_secs: u64,
    digest_format: &'a str,
    seed: Option<u64>,
}

/// Produces a valid config.toml string. Extracted so it can be unit-tested.
fn format_config(p: &ConfigParams<'_>) -> String {
    // Quoted and escaped by the TOML serializer.
    let bot_token = toml::Value::String(p.bot_token.to_owned());
    let poll_interval_secs = p.poll_interval_secs;
    let digest_format = p.digest_format;
    let seed_line = match p.seed {
        Some(seed) => format!("seed = {seed}"),
        None => "# seed = 42".to_owned(),
    };

    format!(
        r#"[telegram]
bot_token = {bot_token}
poll_interval_secs = {poll_interval_secs}

[randomizer]
{seed_line}
digest_format = "{digest_format}"
numeric_range = "inclusive"

[limits]
max_range_len = 100000
max_string_len = 100000

[heartbeat]
cron = "0 0 * * * *"
"#
    )
}

fn parse_digest_format(input: &str) -> Result<&'static str> {
    match input.to_ascii_lowercase().as_str() {
        "" | "hex" => Ok("hex"),
        "raw" => Ok("raw"),
        other => anyhow::bail!("Unknown digest format '{other}' (expected hex or raw)"),
    }
}

fn parse_poll_interval(input: &str) -> Result<u64> {
    if input.is_empty() {
        return Ok(1);
    }
    let secs: u64 = input
        .parse()
        .with_context(|| format!("Poll interval must be a whole number of seconds, got '{input}'"))?;
    if secs == 0 {
        anyhow::bail!("Poll interval must be at least 1 second");
    }
    Ok(secs)
}

fn parse_seed(input: &str) -> Result<Option<u64>> {
    if input.is_empty() {
        return Ok(None);
    }
    input
        .parse()
        .map(Some)
        .with_context(|| format!("Seed must be a non-negative integer, got '{input}'"))
}

// ── CLI ────────────────────────────────────────────────────────────────────────

fn run_cli(project_root: &Path) -> Result<()> {
    println!("=== Randomizer Bot Setup ===\n");

    let read_line = |prompt: &str| -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_owned())
    };

    let bot_token = read_line("Telegram bot token: ")?;
    let poll_interval_secs = parse_poll_interval(&read_line("Poll interval in seconds [1]: ")?)?;
    let digest_format = parse_digest_format(&read_line("SHA digest format, hex or raw [hex]: ")?)?;
    let seed = parse_seed(&read_line("Fixed random seed (optional): ")?)?;

    let config = format_config(&ConfigParams {
        bot_token: &bot_token,
        poll_interval_secs,
        digest_format,
        seed,
    });

    let config_path = project_root.join("config.toml");
    std::fs::write(&config_path, &config)
        .with_context(|| format!("Could not write {}", config_path.display()))?;

    println!("\n✓  config.toml saved to {}", config_path.display());
    println!("   Run the bot with:  cargo run");
    Ok(())
}

fn main() -> Result<()> {
    let project_root = PathBuf::from(
        std::env::var("RANDOMIZER_BOT_ROOT").unwrap_or_else(|_| ".".to_string()),
    );
    run_cli(&project_root)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
