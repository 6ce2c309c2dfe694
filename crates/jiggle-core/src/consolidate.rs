//! Reconcile the candidates found across a project into one current version.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::extract::VersionCandidate;
use crate::grammar::{ParsedVersion, parse_version};

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from consolidation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsolidationError {
    /// No candidate parsed as a version.
    #[error("no version found")]
    NoVersionFound,

    /// Candidates disagree and the patch tolerance does not apply.
    #[error("found conflicting versions: {}", format_versions(.versions))]
    VersionDisagreement {
        /// Every accepted candidate, source id → raw text.
        versions: BTreeMap<String, String>,
    },
}

fn format_versions(versions: &BTreeMap<String, String>) -> String {
    versions
        .iter()
        .map(|(source, raw)| format!("{source}={raw}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result alias for consolidation.
pub type ConsolidationResult<T> = Result<T, ConsolidationError>;

// ──────────────────────────────────────────────
// Types
// ──────────────────────────────────────────────

/// A candidate paired with its parsed form.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedCandidate {
    /// The extracted candidate.
    #[serde(flatten)]
    pub candidate: VersionCandidate,
    /// What the grammar engine made of it.
    pub parsed: ParsedVersion,
}

/// A candidate no grammar accepted.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedCandidate {
    /// The extracted candidate.
    #[serde(flatten)]
    pub candidate: VersionCandidate,
    /// Why it was rejected.
    pub reason: String,
}

/// The agreed current version plus the evidence behind it.
#[derive(Debug, Clone, Serialize)]
pub struct Consolidated {
    /// The current version.
    pub canonical: ParsedVersion,
    /// Candidates that parsed.
    pub accepted: Vec<AcceptedCandidate>,
    /// Candidates that did not parse.
    pub rejected: Vec<RejectedCandidate>,
    /// Whether `canonical` is the `0.1.0` placeholder.
    pub initialized: bool,
}

// ──────────────────────────────────────────────
// Consolidation
// ──────────────────────────────────────────────

/// Reduce every candidate to a single canonical version.
///
/// Unparseable candidates are set aside. If nothing parses, `force_init`
/// yields `0.1.0`. Two values that differ by exactly one patch release
/// resolve to the larger; any other disagreement is an error.
#[instrument(level = "debug", skip(candidates), fields(count = candidates.len()))]
pub fn consolidate(
    candidates: Vec<VersionCandidate>,
    force_init: bool,
) -> ConsolidationResult<Consolidated> {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for candidate in candidates {
        match parse_version(&candidate.raw_text) {
            Ok(parsed) => accepted.push(AcceptedCandidate { candidate, parsed }),
            Err(err) => {
                warn!(source = %candidate.source_id, raw = %candidate.raw_text, error = %err, "rejected version candidate");
                rejected.push(RejectedCandidate {
                    candidate,
                    reason: err.to_string(),
                });
            }
        }
    }

    if accepted.is_empty() {
        if force_init {
            debug!("no version found, initializing to 0.1.0");
            return Ok(Consolidated {
                canonical: ParsedVersion::initial(),
                accepted,
                rejected,
                initialized: true,
            });
        }
        return Err(ConsolidationError::NoVersionFound);
    }

    let mut distinct: Vec<&ParsedVersion> = Vec::new();
    let mut seen = BTreeSet::new();
    for entry in &accepted {
        if seen.insert(entry.parsed.raw()) {
            distinct.push(&entry.parsed);
        }
    }

    let canonical = match distinct.as_slice() {
        [only] => (*only).clone(),
        [a, b] if one_patch_apart(a, b) => {
            let (newer, older) = if a.release_part(2) > b.release_part(2) {
                (a, b)
            } else {
                (b, a)
            };
            warn!(chosen = %newer.raw(), straggler = %older.raw(), "versions differ by one patch release, using the newer");
            (*newer).clone()
        }
        _ => {
            let versions = accepted
                .iter()
                .map(|e| (e.candidate.source_id.clone(), e.candidate.raw_text.clone()))
                .collect();
            return Err(ConsolidationError::VersionDisagreement { versions });
        }
    };

    debug!(canonical = %canonical.raw(), "consolidated version");
    Ok(Consolidated {
        canonical,
        accepted,
        rejected,
        initialized: false,
    })
}

fn one_patch_apart(a: &ParsedVersion, b: &ParsedVersion) -> bool {
    a.grammar() == b.grammar()
        && a.release_part(0) == b.release_part(0)
        && a.release_part(1) == b.release_part(1)
        && a.release_part(2).abs_diff(b.release_part(2)) == 1
}
