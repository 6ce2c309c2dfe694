//! Check command: fail unless the project's versions agree.

use anyhow::Context;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use jiggle_core::config::Config;
use jiggle_core::consolidate::consolidate;

use super::{Survey, print_evidence};

/// Arguments for the `check` subcommand.
#[derive(Args, Debug, Default)]
pub struct CheckArgs {}

/// Consolidate every declared version and report the outcome.
///
/// Exits non-zero when no version is declared or the declarations disagree.
#[instrument(name = "cmd_check", skip_all, fields(json_output))]
pub fn cmd_check(
    _args: CheckArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing check command");

    let survey = Survey::run(cwd, config)?;
    let found = consolidate(survey.candidates, false).context("version check failed")?;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        println!(
            "{} {}",
            "Current version:".bold(),
            found.canonical.raw().green().bold()
        );
        print_evidence(&found);
    }

    Ok(())
}
