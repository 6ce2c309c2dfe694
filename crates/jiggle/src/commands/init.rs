//! Init command: add a default `[tool.jiggle_version]` table to pyproject.toml.

use std::io::Write;

use anyhow::{Context, bail};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, info, instrument};

use jiggle_core::config::{self, Config, PYPROJECT_TABLE};

/// Arguments for the `init` subcommand.
#[derive(Args, Debug, Default)]
pub struct InitArgs {}

#[derive(Debug, Serialize)]
struct InitReport {
    path: String,
    created: bool,
}

/// Append the default settings table unless one is already there.
#[instrument(name = "cmd_init", skip_all, fields(json_output))]
pub fn cmd_init(
    _args: InitArgs,
    global_json: bool,
    _config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing init command");

    let path = cwd.join("pyproject.toml");
    if !path.is_file() {
        bail!("pyproject.toml not found at {path}");
    }
    let text =
        std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;

    let created = if config::has_pyproject_table(&text)? {
        debug!(%path, "settings table already present");
        false
    } else {
        let mut block = config::pyproject_table_template();
        if !text.is_empty() && !text.ends_with('\n') {
            block.insert(0, '\n');
        }
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {path}"))?;
        file.write_all(block.as_bytes())
            .with_context(|| format!("failed to write {path}"))?;
        info!(%path, "added settings table");
        true
    };

    let report = InitReport {
        path: path.to_string(),
        created,
    };
    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if created {
        println!(
            "  {} Added default [{PYPROJECT_TABLE}] to {}",
            "✓".green(),
            report.path.cyan()
        );
    } else {
        println!(
            "  {} [{PYPROJECT_TABLE}] already exists in {}",
            "○".dimmed(),
            report.path.cyan()
        );
    }

    Ok(())
}
