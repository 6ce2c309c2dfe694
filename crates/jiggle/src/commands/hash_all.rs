//! Hash-all command: snapshot the public symbols for later `--increment auto`.

use anyhow::Context;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use jiggle_core::config::Config;
use jiggle_core::digest::{self, SymbolDigest};

use super::digest_path;

/// Arguments for the `hash-all` subcommand.
#[derive(Args, Debug, Default)]
pub struct HashAllArgs {}

#[derive(Serialize)]
struct HashReport<'a> {
    path: String,
    #[serde(flatten)]
    snapshot: &'a SymbolDigest,
}

/// Collect `__all__` across the project and store the digest.
#[instrument(name = "cmd_hash_all", skip_all, fields(json_output))]
pub fn cmd_hash_all(
    _args: HashAllArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing hash-all command");

    let symbols = digest::collect_symbols(cwd, &config.ignore)
        .context("failed to collect public symbols")?;
    let path = digest_path(cwd, config);
    let snapshot = digest::write(&path, &symbols).context("failed to write symbol digest")?;

    if global_json {
        let report = HashReport {
            path: path.to_string(),
            snapshot: &snapshot,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "  {} {} public symbol(s) → {}",
            "✓".green(),
            snapshot.symbols.len(),
            path.as_str().cyan()
        );
        println!("{}: {}", "Digest".dimmed(), snapshot.digest);
    }

    Ok(())
}
