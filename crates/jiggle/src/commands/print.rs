//! Print command: write the current version to stdout, nothing else.

use anyhow::Context;
use clap::Args;
use serde_json::json;
use tracing::{debug, instrument};

use jiggle_core::config::Config;
use jiggle_core::consolidate::consolidate;

use super::Survey;

/// Arguments for the `print` subcommand.
#[derive(Args, Debug, Default)]
pub struct PrintArgs {
    /// Print `0.1.0` when the project declares no version
    #[arg(long)]
    pub init: bool,
}

/// Print the canonical version as declared in the project's files.
#[instrument(name = "cmd_print", skip_all, fields(json_output))]
pub fn cmd_print(
    args: PrintArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, init = args.init, "executing print command");

    let survey = Survey::run(cwd, config)?;
    let found = consolidate(survey.candidates, args.init).context("no single current version")?;

    if global_json {
        let out = json!({
            "version": found.canonical.raw(),
            "grammar": found.canonical.grammar(),
            "initialized": found.initialized,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", found.canonical.raw());
    }

    Ok(())
}
