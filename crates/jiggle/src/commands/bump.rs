//! Bump command: thin CLI layer over `jiggle_core::bump`.

use std::io::IsTerminal;

use anyhow::{Context, bail};
use camino::Utf8Path;
use clap::Args;
use inquire::Confirm;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use jiggle_core::auto::SymbolDiff;
use jiggle_core::bump::{IncrementPolicy, IncrementRequest, bump};
use jiggle_core::config::Config;
use jiggle_core::consolidate::{ConsolidationError, consolidate};
use jiggle_core::digest;
use jiggle_core::grammar::{Grammar, ParsedVersion, parse_version};
use jiggle_core::rewrite::rewrite_first;

use super::{Survey, digest_path};

/// Arguments for the `bump` subcommand.
#[derive(Args, Debug, Default)]
pub struct BumpArgs {
    /// Which part of the version to increment (defaults to config `default_increment`)
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub increment: Option<IncrementPolicy>,

    /// Versioning scheme the new version must follow (defaults to config `scheme`)
    #[arg(long, value_enum, value_name = "SCHEME")]
    pub scheme: Option<Grammar>,

    /// Use this exact version instead of incrementing
    #[arg(long, value_name = "VERSION", conflicts_with = "increment")]
    pub set: Option<String>,

    /// Start from 0.1.0 when the project declares no version
    #[arg(long)]
    pub init: bool,

    /// Bump the first version found even when versions disagree, and skip
    /// files whose declaration cannot be rewritten
    #[arg(long)]
    pub force_write: bool,

    /// Show what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// A file and its contents after the bump.
struct Edit {
    source_id: String,
    path: camino::Utf8PathBuf,
    text: String,
}

#[derive(Debug, Serialize)]
struct BumpReport {
    previous: String,
    next: String,
    increment: String,
    scheme: Grammar,
    files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<String>,
    digest_updated: bool,
    dry_run: bool,
}

/// Pick the version to bump from, honoring `--init` and `--force-write`.
fn current_version(survey: &Survey, args: &BumpArgs) -> anyhow::Result<ParsedVersion> {
    match consolidate(survey.candidates.clone(), args.init) {
        Ok(found) => Ok(found.canonical),
        Err(err @ ConsolidationError::VersionDisagreement { .. }) if args.force_write => {
            warn!(error = %err, "versions disagree, bumping the first one found");
            survey
                .candidates
                .iter()
                .find_map(|c| parse_version(&c.raw_text).ok())
                .context("no parseable version to force")
        }
        Err(err) => Err(err).context("cannot determine the current version"),
    }
}

/// Turn flags and config into a concrete request.
fn build_request(
    args: &BumpArgs,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<(IncrementRequest, String)> {
    if let Some(ref version) = args.set {
        return Ok((IncrementRequest::Explicit(version.clone()), "explicit".to_string()));
    }
    let policy = args.increment.unwrap_or(config.default_increment);
    let request = match policy {
        IncrementPolicy::Major => IncrementRequest::Major,
        IncrementPolicy::Minor => IncrementRequest::Minor,
        IncrementPolicy::Patch => IncrementRequest::Patch,
        IncrementPolicy::Structural => IncrementRequest::Structural,
        IncrementPolicy::Auto => {
            let previous = digest::read(&digest_path(cwd, config))
                .context("failed to read symbol digest")?
                .symbols;
            let current = digest::collect_symbols(cwd, &config.ignore)
                .context("failed to collect public symbols")?;
            IncrementRequest::Auto(SymbolDiff::new(previous, current))
        }
    };
    Ok((request, policy.to_string()))
}

/// Files to write, plus the declaring files that cannot be rewritten.
#[derive(Default)]
struct Plan {
    edits: Vec<Edit>,
    stale: Vec<String>,
}

/// New contents for every file whose declaration could be rewritten.
///
/// A file that declares a version the rewriter cannot replace (a tuple, for
/// instance) lands in `stale`.
fn plan_edits(survey: &Survey, next: &str) -> anyhow::Result<Plan> {
    let mut plan = Plan::default();
    for entry in &survey.entries {
        let Some(text) = jiggle_core::inventory::read_text(&entry.path)? else {
            continue;
        };
        match rewrite_first(&entry.kinds, &text, next) {
            Some(new_text) if new_text != text => plan.edits.push(Edit {
                source_id: entry.source_id.clone(),
                path: entry.path.clone(),
                text: new_text,
            }),
            Some(_) => debug!(source = %entry.source_id, "already at the new version"),
            None if survey.candidate_for(entry).is_some() => {
                warn!(source = %entry.source_id, "declared version cannot be rewritten");
                plan.stale.push(entry.source_id.clone());
            }
            None => debug!(source = %entry.source_id, "nothing to rewrite"),
        }
    }
    Ok(plan)
}

fn print_skipped(skipped: &[String]) {
    for file in skipped {
        println!("  {} {} {}", "○".yellow(), file.cyan(), "not rewritten".dimmed());
    }
}

fn confirm(next: &str, count: usize) -> anyhow::Result<bool> {
    Confirm::new(&format!("Write {next} to {count} file(s)?"))
        .with_default(true)
        .prompt()
        .context("confirmation cancelled")
}

/// Execute the bump command.
#[instrument(name = "cmd_bump", skip_all, fields(json_output))]
pub fn cmd_bump(
    args: BumpArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing bump command");

    let survey = Survey::run(cwd, config)?;
    let current = current_version(&survey, &args)?;
    let scheme = args.scheme.unwrap_or(config.scheme);
    let (request, increment) = build_request(&args, config, cwd)?;
    let next = bump(&current, &request, scheme).context("bump failed")?;

    let Plan { edits, stale } = plan_edits(&survey, &next)?;
    if !stale.is_empty() && !args.force_write {
        bail!(
            "cannot rewrite the version declared in {}; update it by hand or pass --force-write to skip it",
            stale.join(", ")
        );
    }
    if edits.is_empty() && !args.dry_run {
        bail!("no file declares a version that can be rewritten");
    }

    let mut report = BumpReport {
        previous: current.raw().to_string(),
        next: next.clone(),
        increment,
        scheme,
        files: edits.iter().map(|e| e.source_id.clone()).collect(),
        skipped: stale,
        digest_updated: false,
        dry_run: args.dry_run,
    };

    if !global_json {
        println!(
            "{}: {} → {}",
            "Version".bold(),
            report.previous.dimmed(),
            report.next.green().bold()
        );
        println!("{}: {}", "Increment".dimmed(), report.increment);
        println!("{}: {}", "Scheme".dimmed(), report.scheme);
    }

    if args.dry_run {
        if global_json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            for file in &report.files {
                println!("  {} {}", "→".dimmed(), file.cyan());
            }
            print_skipped(&report.skipped);
            println!();
            println!("{}", "Dry run — no changes made.".yellow());
        }
        return Ok(());
    }

    let interactive = !args.yes && !global_json && std::io::stdin().is_terminal();
    if interactive && !confirm(&next, edits.len())? {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }

    for edit in &edits {
        std::fs::write(&edit.path, &edit.text)
            .with_context(|| format!("failed to write {}", edit.path))?;
        info!(source = %edit.source_id, version = %next, "updated version");
    }

    if let IncrementRequest::Auto(ref diff) = request {
        digest::write(&digest_path(cwd, config), &diff.current)
            .context("failed to update symbol digest")?;
        report.digest_updated = true;
    }

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!(
            "  {} Version updated to {}",
            "✓".green(),
            report.next.green().bold()
        );
        for file in &report.files {
            println!("  {} {}", "→".dimmed(), file.cyan());
        }
        print_skipped(&report.skipped);
        if report.digest_updated {
            println!("  {} Symbol digest updated", "✓".green());
        }
    }

    Ok(())
}
