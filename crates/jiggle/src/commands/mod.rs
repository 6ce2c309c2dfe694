//! Command implementations

pub mod bump;

pub mod check;

pub mod hash_all;

pub mod info;

pub mod init;

pub mod inspect;

pub mod print;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use owo_colors::OwoColorize;
use tracing::debug;

use jiggle_core::config::Config;
use jiggle_core::consolidate::Consolidated;
use jiggle_core::extract::VersionCandidate;
use jiggle_core::inventory::{self, InventoryEntry};

/// The version files of a project and the candidates found in them.
pub(crate) struct Survey {
    pub entries: Vec<InventoryEntry>,
    pub candidates: Vec<VersionCandidate>,
}

impl Survey {
    /// Inventory `root` and extract a candidate from each file.
    pub(crate) fn run(root: &Utf8Path, config: &Config) -> anyhow::Result<Self> {
        let entries = inventory::discover(root, &config.ignore)
            .with_context(|| format!("failed to search {root} for version files"))?;
        let candidates =
            inventory::read_candidates(&entries).context("failed to read version files")?;
        debug!(
            files = entries.len(),
            candidates = candidates.len(),
            "surveyed project"
        );
        Ok(Self {
            entries,
            candidates,
        })
    }

    /// The candidate extracted from `entry`, if any.
    pub(crate) fn candidate_for(&self, entry: &InventoryEntry) -> Option<&VersionCandidate> {
        self.candidates
            .iter()
            .find(|c| c.source_id == entry.source_id)
    }
}

/// Where the public-symbol snapshot lives for this project.
pub(crate) fn digest_path(root: &Utf8Path, config: &Config) -> Utf8PathBuf {
    root.join(&config.digest_file)
}

/// Print the accepted and rejected candidates behind a consolidation.
pub(crate) fn print_evidence(found: &Consolidated) {
    for entry in &found.accepted {
        println!(
            "  {} {} {} {}",
            "✓".green(),
            entry.candidate.source_id.cyan(),
            entry.candidate.raw_text,
            format!("({})", entry.parsed.grammar()).dimmed()
        );
    }
    for entry in &found.rejected {
        println!(
            "  {} {} {} {}",
            "○".yellow(),
            entry.candidate.source_id.cyan(),
            entry.candidate.raw_text,
            entry.reason.dimmed()
        );
    }
}
