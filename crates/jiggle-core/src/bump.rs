//! Next-version computation.
//!
//! [`bump`] takes the canonical version, an [`IncrementRequest`] and the
//! grammar the project follows, and returns the next version string. The
//! arithmetic levels always produce a plain `X.Y.Z`; the structural request
//! defers to the grammar's own successor rule.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::auto::SymbolDiff;
use crate::grammar::{Grammar, ParsedVersion, parse_version};

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from bump operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BumpError {
    /// An explicit version that no grammar accepts.
    #[error("{0:?} is not a version in any supported scheme")]
    InvalidExplicitVersion(String),

    /// A version that is valid, but not under the requested grammar.
    #[error("{version:?} is not a valid {grammar} version")]
    SchemeMismatch {
        /// The offending version.
        version: String,
        /// The grammar that was requested.
        grammar: Grammar,
    },

    /// The current version cannot be bumped.
    #[error("cannot bump {version:?}: {reason}")]
    InvalidVersionFormat {
        /// The offending version.
        version: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Result alias for bump operations.
pub type BumpResult<T> = Result<T, BumpError>;

// ──────────────────────────────────────────────
// Requests
// ──────────────────────────────────────────────

/// Arithmetic bump level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    /// Patch release (x.y.Z).
    Patch,
    /// Minor release (x.Y.0).
    Minor,
    /// Major release (X.0.0).
    Major,
}

impl std::fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

/// Configured or requested increment, before any symbol diff is known.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum IncrementPolicy {
    /// Bump the major release.
    Major,
    /// Bump the minor release.
    Minor,
    /// Bump the patch release.
    #[default]
    Patch,
    /// Pick a level from the change in public symbols.
    Auto,
    /// The grammar's own successor rule.
    #[serde(rename = "default")]
    #[value(name = "default")]
    Structural,
}

impl std::fmt::Display for IncrementPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
            Self::Auto => write!(f, "auto"),
            Self::Structural => write!(f, "default"),
        }
    }
}

/// What kind of increment to compute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncrementRequest {
    /// Next major release.
    Major,
    /// Next minor release.
    Minor,
    /// Next patch release.
    Patch,
    /// The grammar's structural successor.
    Structural,
    /// Use this exact version.
    Explicit(String),
    /// Classify the public-symbol change, then bump arithmetically.
    Auto(SymbolDiff),
}

impl From<BumpLevel> for IncrementRequest {
    fn from(level: BumpLevel) -> Self {
        match level {
            BumpLevel::Patch => Self::Patch,
            BumpLevel::Minor => Self::Minor,
            BumpLevel::Major => Self::Major,
        }
    }
}

// ──────────────────────────────────────────────
// Bump
// ──────────────────────────────────────────────

/// Compute the next version.
///
/// # Errors
///
/// - [`BumpError::InvalidExplicitVersion`] when an explicit version parses
///   under no grammar
/// - [`BumpError::SchemeMismatch`] when a version only parses under a grammar
///   other than `grammar`
/// - [`BumpError::InvalidVersionFormat`] when there is no release number to
///   increment, or the number to increment is already `u64::MAX`
#[instrument(level = "debug", skip(canonical), fields(current = %canonical.raw()))]
pub fn bump(
    canonical: &ParsedVersion,
    request: &IncrementRequest,
    grammar: Grammar,
) -> BumpResult<String> {
    let next = match request {
        IncrementRequest::Major => next_release(canonical, BumpLevel::Major)?,
        IncrementRequest::Minor => next_release(canonical, BumpLevel::Minor)?,
        IncrementRequest::Patch => next_release(canonical, BumpLevel::Patch)?,
        IncrementRequest::Auto(diff) => {
            let level = diff.classify();
            debug!(%level, "classified symbol changes");
            next_release(canonical, level)?
        }
        IncrementRequest::Structural => structural(canonical, grammar)?,
        IncrementRequest::Explicit(value) => explicit(value, grammar)?,
    };
    debug!(%next, "computed next version");
    Ok(next)
}

/// Parse `raw` and bump it.
///
/// A string no grammar accepts is reported as
/// [`BumpError::InvalidVersionFormat`].
pub fn bump_raw(raw: &str, request: &IncrementRequest, grammar: Grammar) -> BumpResult<String> {
    let parsed = parse_version(raw).map_err(|err| BumpError::InvalidVersionFormat {
        version: raw.to_string(),
        reason: err.to_string(),
    })?;
    bump(&parsed, request, grammar)
}

/// Increment one release number, zero the ones below it and drop every
/// qualifier. Missing numbers count as zero.
fn next_release(current: &ParsedVersion, level: BumpLevel) -> BumpResult<String> {
    if current.release().is_empty() {
        return Err(BumpError::InvalidVersionFormat {
            version: current.raw().to_string(),
            reason: "no numeric release segment".to_string(),
        });
    }
    let (major, minor, patch) = (
        current.release_part(0),
        current.release_part(1),
        current.release_part(2),
    );
    let bumped = match level {
        BumpLevel::Patch => patch.checked_add(1).map(|p| (major, minor, p)),
        BumpLevel::Minor => minor.checked_add(1).map(|m| (major, m, 0)),
        BumpLevel::Major => major.checked_add(1).map(|m| (m, 0, 0)),
    };
    let (major, minor, patch) = bumped.ok_or_else(|| overflow(current))?;
    Ok(format!("{major}.{minor}.{patch}"))
}

fn overflow(current: &ParsedVersion) -> BumpError {
    BumpError::InvalidVersionFormat {
        version: current.raw().to_string(),
        reason: "release number is already at its maximum".to_string(),
    }
}

fn structural(current: &ParsedVersion, grammar: Grammar) -> BumpResult<String> {
    if current.grammar() == grammar {
        return current.structural_next().ok_or_else(|| overflow(current));
    }
    let reparsed = grammar
        .parse_exact(current.raw())
        .map_err(|_| BumpError::SchemeMismatch {
            version: current.raw().to_string(),
            grammar,
        })?;
    reparsed.structural_next().ok_or_else(|| overflow(current))
}

fn explicit(value: &str, grammar: Grammar) -> BumpResult<String> {
    if grammar.parse_exact(value).is_ok() {
        return Ok(value.to_string());
    }
    if Grammar::ALL.iter().any(|g| g.parse_exact(value).is_ok()) {
        return Err(BumpError::SchemeMismatch {
            version: value.to_string(),
            grammar,
        });
    }
    Err(BumpError::InvalidExplicitVersion(value.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn raw(current: &str, request: IncrementRequest, grammar: Grammar) -> String {
        bump_raw(current, &request, grammar).unwrap()
    }

    #[test]
    fn patch() {
        assert_eq!(raw("1.2.3", IncrementRequest::Patch, Grammar::Pep440), "1.2.4");
    }

    #[test]
    fn patch_drops_prerelease() {
        assert_eq!(raw("1.2.3rc1", IncrementRequest::Patch, Grammar::Pep440), "1.2.4");
        assert_eq!(
            raw("1.2.3rc1.post2.dev3", IncrementRequest::Patch, Grammar::Pep440),
            "1.2.4"
        );
    }

    #[test]
    fn major_from_round_release() {
        assert_eq!(raw("4.0.0", IncrementRequest::Major, Grammar::SemVer), "5.0.0");
        assert_eq!(
            raw("1.2.3-alpha.1+exp.sha.5114f85", IncrementRequest::Major, Grammar::SemVer),
            "2.0.0"
        );
    }

    #[test]
    fn minor_drops_build_metadata() {
        assert_eq!(raw("1.2.3+build.5", IncrementRequest::Minor, Grammar::SemVer), "1.3.0");
    }

    #[test]
    fn missing_segments_count_as_zero() {
        assert_eq!(raw("1", IncrementRequest::Patch, Grammar::Pep440), "1.0.1");
        assert_eq!(raw("1.2", IncrementRequest::Minor, Grammar::Pep440), "1.3.0");
    }

    #[test]
    fn structural_in_own_grammar() {
        assert_eq!(raw("1.2.3", IncrementRequest::Structural, Grammar::SemVer), "1.2.4");
        assert_eq!(raw("1.2", IncrementRequest::Structural, Grammar::Pep440), "1.2.dev0");
        assert_eq!(
            raw("2024.05.final", IncrementRequest::Structural, Grammar::GenericNPart),
            "2024.06.final"
        );
    }

    #[test]
    fn release_at_u64_max_is_an_error() {
        let max = format!("1.2.{}", u64::MAX);
        for request in [IncrementRequest::Patch, IncrementRequest::Structural] {
            let err = bump_raw(&max, &request, Grammar::SemVer).unwrap_err();
            assert!(matches!(err, BumpError::InvalidVersionFormat { .. }), "{request:?}");
        }
        // Lower levels zero the saturated part, so they still work
        assert_eq!(raw(&max, IncrementRequest::Minor, Grammar::SemVer), "1.3.0");

        let max_major = format!("{}.0.0", u64::MAX);
        let err = bump_raw(&max_major, &IncrementRequest::Major, Grammar::SemVer).unwrap_err();
        assert!(matches!(err, BumpError::InvalidVersionFormat { .. }));
    }

    #[test]
    fn dev_counter_at_u64_max_is_an_error() {
        let raw = format!("1.2.dev{}", u64::MAX);
        let err = bump_raw(&raw, &IncrementRequest::Structural, Grammar::Pep440).unwrap_err();
        assert!(matches!(err, BumpError::InvalidVersionFormat { .. }));
    }

    #[test]
    fn structural_reparses_under_requested_grammar() {
        assert_eq!(
            raw("1.2.3", IncrementRequest::Structural, Grammar::Pep440),
            "1.2.3.dev0"
        );
    }

    #[test]
    fn structural_scheme_mismatch() {
        let err = bump_raw("1.2", &IncrementRequest::Structural, Grammar::SemVer).unwrap_err();
        assert_eq!(
            err,
            BumpError::SchemeMismatch {
                version: "1.2".to_string(),
                grammar: Grammar::SemVer,
            }
        );
    }

    #[test]
    fn explicit_is_returned_verbatim() {
        let request = IncrementRequest::Explicit("2.0.0rc1".to_string());
        assert_eq!(raw("1.0.0", request, Grammar::Pep440), "2.0.0rc1");
    }

    #[test]
    fn explicit_in_wrong_scheme() {
        let request = IncrementRequest::Explicit("2.0".to_string());
        let err = bump_raw("1.0.0", &request, Grammar::SemVer).unwrap_err();
        assert!(matches!(err, BumpError::SchemeMismatch { .. }));
    }

    #[test]
    fn explicit_garbage() {
        let request = IncrementRequest::Explicit("banana split".to_string());
        let err = bump_raw("1.0.0", &request, Grammar::Pep440).unwrap_err();
        assert_eq!(
            err,
            BumpError::InvalidExplicitVersion("banana split".to_string())
        );
    }

    #[test]
    fn auto_uses_symbol_diff() {
        let diff = SymbolDiff::new(
            BTreeSet::from(["a".to_string(), "b".to_string()]),
            BTreeSet::from(["a".to_string()]),
        );
        assert_eq!(raw("1.2.3", IncrementRequest::Auto(diff), Grammar::SemVer), "2.0.0");
    }

    #[test]
    fn unparseable_current_version() {
        let err = bump_raw("not-a-version", &IncrementRequest::Patch, Grammar::Pep440).unwrap_err();
        assert!(matches!(err, BumpError::InvalidVersionFormat { .. }));
    }

    #[test]
    fn level_display() {
        assert_eq!(BumpLevel::Major.to_string(), "major");
        assert_eq!(IncrementPolicy::Structural.to_string(), "default");
    }
}
