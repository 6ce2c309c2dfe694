//! Inspect command: list version files and what each one declares.

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use jiggle_core::config::Config;
use jiggle_core::extract::FileKind;
use jiggle_core::grammar::{Grammar, parse_version};

use super::Survey;

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug, Default)]
pub struct InspectArgs {}

#[derive(Debug, Serialize)]
struct FileReport {
    source_id: String,
    kinds: Vec<FileKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    declared_symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grammar: Option<Grammar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn reports(survey: &Survey) -> Vec<FileReport> {
    survey
        .entries
        .iter()
        .map(|entry| {
            let candidate = survey.candidate_for(entry);
            let parsed = candidate.map(|c| parse_version(&c.raw_text));
            FileReport {
                source_id: entry.source_id.clone(),
                kinds: entry.kinds.clone(),
                declared_symbol: candidate.map(|c| c.declared_symbol.clone()),
                raw: candidate.map(|c| c.raw_text.clone()),
                grammar: parsed
                    .as_ref()
                    .and_then(|p| p.as_ref().ok())
                    .map(|v| v.grammar()),
                error: parsed.and_then(|p| p.err()).map(|e| e.to_string()),
            }
        })
        .collect()
}

/// List every inventoried file with the version candidate found in it.
#[instrument(name = "cmd_inspect", skip_all, fields(json_output))]
pub fn cmd_inspect(
    _args: InspectArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing inspect command");

    let survey = Survey::run(cwd, config)?;
    let reports = reports(&survey);

    if global_json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    if reports.is_empty() {
        println!("{}", "No version files found.".yellow());
        return Ok(());
    }

    println!("{}", "Version files".bold().underline());
    for report in &reports {
        match (&report.raw, report.grammar, &report.error) {
            (Some(raw), Some(grammar), _) => println!(
                "  {} {} {} {}",
                "✓".green(),
                report.source_id.cyan(),
                raw.bold(),
                format!(
                    "({grammar}, {})",
                    report.declared_symbol.as_deref().unwrap_or_default()
                )
                .dimmed()
            ),
            (Some(raw), _, Some(error)) => println!(
                "  {} {} {} {}",
                "○".yellow(),
                report.source_id.cyan(),
                raw,
                error.dimmed()
            ),
            _ => println!(
                "  {} {} {}",
                "○".dimmed(),
                report.source_id.cyan(),
                "no version declared".dimmed()
            ),
        }
    }

    Ok(())
}
