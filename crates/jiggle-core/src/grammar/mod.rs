//! Version grammars and the parse engine.
//!
//! A raw version string is tried against [`Grammar::ALL`] in order (SemVer,
//! then PEP 440, then generic dotted N-part) after one leading `v` is
//! stripped. When no grammar accepts it, a small set of normalization
//! rewrites is applied and the grammars are tried again, up to
//! [`PASS_BUDGET`] passes in total.

mod generic;
mod normalize;
mod pep440;

pub use generic::NPartVersion;
pub use pep440::{LocalPart, Pep440Version, PreTag};

use std::cmp::Ordering;
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, instrument};

/// Grammar passes allowed per parse: the initial attempt plus two rewrites.
pub const PASS_BUDGET: usize = 3;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from version parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// No grammar accepted the string, even after rewrites.
    #[error("unrecognized version {input:?} (last attempt: {attempted:?})")]
    Unrecognized {
        /// The string as it was handed in.
        input: String,
        /// The last rewritten form that was tried.
        attempted: String,
    },
}

/// Result alias for version parsing.
pub type VersionResult<T> = Result<T, VersionError>;

// ──────────────────────────────────────────────
// Segments
// ──────────────────────────────────────────────

/// One component of a parsed version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Segment {
    /// Numeric component.
    Num(u64),
    /// Textual component (`rc`, `final`, `dev`, ...).
    Tag(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Tag(t) => f.write_str(t),
        }
    }
}

// ──────────────────────────────────────────────
// Grammars
// ──────────────────────────────────────────────

/// A versioning notation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    /// Semantic Versioning 2.0.0.
    #[serde(rename = "semver")]
    #[value(name = "semver")]
    SemVer,
    /// PEP 440 (Python packaging).
    #[default]
    Pep440,
    /// Numeric head followed by dotted alphanumeric segments.
    #[serde(rename = "generic")]
    #[value(name = "generic")]
    GenericNPart,
}

impl Grammar {
    /// Attempt order used by [`parse_version`].
    pub const ALL: [Self; 3] = [Self::SemVer, Self::Pep440, Self::GenericNPart];

    /// Name used on the command line and in config files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SemVer => "semver",
            Self::Pep440 => "pep440",
            Self::GenericNPart => "generic",
        }
    }

    /// Parse under this grammar only: `v` stripping, no rewrites.
    pub fn parse_exact(self, raw: &str) -> VersionResult<ParsedVersion> {
        let text = strip_v(raw);
        self.accept(text)
            .map(|repr| ParsedVersion::new(raw, text, repr))
            .ok_or_else(|| VersionError::Unrecognized {
                input: raw.to_string(),
                attempted: text.to_string(),
            })
    }

    fn accept(self, text: &str) -> Option<Repr> {
        match self {
            Self::SemVer => semver::Version::parse(text).ok().map(Repr::SemVer),
            Self::Pep440 => Pep440Version::parse(text).map(Repr::Pep440),
            Self::GenericNPart => NPartVersion::parse(text).map(Repr::Generic),
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────────────────────────
// Parsed versions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Repr {
    SemVer(semver::Version),
    Pep440(Pep440Version),
    Generic(NPartVersion),
}

/// A version string accepted by one of the grammars.
///
/// Equality and ordering only hold within a grammar; comparing versions of
/// different grammars yields `None` from `partial_cmp`.
#[derive(Debug, Clone)]
pub struct ParsedVersion {
    raw: String,
    text: String,
    repr: Repr,
}

impl ParsedVersion {
    fn new(raw: &str, text: &str, repr: Repr) -> Self {
        Self {
            raw: raw.to_string(),
            text: text.to_string(),
            repr,
        }
    }

    /// The `0.1.0` placeholder used when a project has no version yet.
    pub fn initial() -> Self {
        Self::new("0.1.0", "0.1.0", Repr::SemVer(semver::Version::new(0, 1, 0)))
    }

    /// The grammar that accepted this version.
    pub const fn grammar(&self) -> Grammar {
        match self.repr {
            Repr::SemVer(_) => Grammar::SemVer,
            Repr::Pep440(_) => Grammar::Pep440,
            Repr::Generic(_) => Grammar::GenericNPart,
        }
    }

    /// The string exactly as it was found.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The text the grammar accepted, after `v` stripping and rewrites.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Components in order: release numbers followed by any qualifiers.
    pub fn components(&self) -> Vec<Segment> {
        match &self.repr {
            Repr::SemVer(v) => {
                let mut out = vec![
                    Segment::Num(v.major),
                    Segment::Num(v.minor),
                    Segment::Num(v.patch),
                ];
                if !v.pre.is_empty() {
                    out.extend(v.pre.as_str().split('.').map(|id| match id.parse() {
                        Ok(n) => Segment::Num(n),
                        Err(_) => Segment::Tag(id.to_string()),
                    }));
                }
                out
            }
            Repr::Pep440(v) => {
                let mut out: Vec<Segment> = v.release.iter().copied().map(Segment::Num).collect();
                if let Some((tag, n)) = v.pre {
                    out.push(Segment::Tag(tag.as_str().to_string()));
                    out.push(Segment::Num(n));
                }
                if let Some(n) = v.post {
                    out.push(Segment::Tag("post".to_string()));
                    out.push(Segment::Num(n));
                }
                if let Some(n) = v.dev {
                    out.push(Segment::Tag("dev".to_string()));
                    out.push(Segment::Num(n));
                }
                out
            }
            Repr::Generic(v) => v.segments().to_vec(),
        }
    }

    /// The leading numeric release segment (`1.2.3` → `[1, 2, 3]`).
    pub fn release(&self) -> Vec<u64> {
        match &self.repr {
            Repr::SemVer(v) => vec![v.major, v.minor, v.patch],
            Repr::Pep440(v) => v.release.clone(),
            Repr::Generic(v) => v.release(),
        }
    }

    /// Release number at `index`, zero when the version is shorter.
    pub fn release_part(&self, index: usize) -> u64 {
        self.release().get(index).copied().unwrap_or(0)
    }

    /// Whether the version carries pre-release, post-release, dev, local or
    /// build qualifiers.
    pub fn has_qualifiers(&self) -> bool {
        match &self.repr {
            Repr::SemVer(v) => !v.pre.is_empty() || !v.build.is_empty(),
            Repr::Pep440(v) => v.has_qualifiers(),
            Repr::Generic(v) => v.segments().iter().any(|s| matches!(s, Segment::Tag(_))),
        }
    }

    /// The grammar's default successor.
    ///
    /// - SemVer: next patch, or the bare release when a pre-release is set
    /// - PEP 440: next dev release
    /// - generic: last numeric segment plus one
    ///
    /// `None` when the number to increment is already `u64::MAX`.
    pub fn structural_next(&self) -> Option<String> {
        match &self.repr {
            Repr::SemVer(v) if !v.pre.is_empty() => {
                Some(semver::Version::new(v.major, v.minor, v.patch).to_string())
            }
            Repr::SemVer(v) => v
                .patch
                .checked_add(1)
                .map(|patch| semver::Version::new(v.major, v.minor, patch).to_string()),
            Repr::Pep440(v) => v.bump_dev().map(|next| next.to_string()),
            Repr::Generic(v) => v.increment_last_numeric().map(|next| next.to_string()),
        }
    }
}

impl PartialEq for ParsedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.repr == other.repr
    }
}

impl PartialOrd for ParsedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (&self.repr, &other.repr) {
            (Repr::SemVer(a), Repr::SemVer(b)) => Some(a.cmp(b)),
            (Repr::Pep440(a), Repr::Pep440(b)) => Some(a.cmp(b)),
            (Repr::Generic(a), Repr::Generic(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::SemVer(v) => write!(f, "{v}"),
            Repr::Pep440(v) => write!(f, "{v}"),
            Repr::Generic(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for ParsedVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ParsedVersion", 4)?;
        state.serialize_field("grammar", &self.grammar())?;
        state.serialize_field("raw", &self.raw)?;
        state.serialize_field("normalized", &self.to_string())?;
        state.serialize_field("components", &self.components())?;
        state.end()
    }
}

// ──────────────────────────────────────────────
// Engine
// ──────────────────────────────────────────────

fn strip_v(raw: &str) -> &str {
    raw.strip_prefix('v').unwrap_or(raw)
}

/// Parse a raw version string with the grammar engine.
///
/// The first grammar in [`Grammar::ALL`] that accepts the string wins. On
/// failure the first applicable normalization rewrite is applied and the
/// grammars are retried, for at most [`PASS_BUDGET`] passes.
#[instrument(level = "debug")]
pub fn parse_version(raw: &str) -> VersionResult<ParsedVersion> {
    let mut attempt = strip_v(raw).to_string();

    if !attempt.is_empty() {
        for pass in 1..=PASS_BUDGET {
            if let Some(repr) = Grammar::ALL.iter().find_map(|g| g.accept(&attempt)) {
                let parsed = ParsedVersion::new(raw, &attempt, repr);
                debug!(grammar = %parsed.grammar(), pass, accepted = %attempt, "parsed version");
                return Ok(parsed);
            }
            if pass == PASS_BUDGET {
                break;
            }
            match normalize::rewrite(&attempt) {
                Some(next) => {
                    debug!(from = %attempt, to = %next, "rewrote unrecognized version");
                    attempt = next;
                }
                None => break,
            }
        }
    }

    Err(VersionError::Unrecognized {
        input: raw.to_string(),
        attempted: attempt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_triple_is_semver() {
        let v = parse_version("1.2.3").unwrap();
        assert_eq!(v.grammar(), Grammar::SemVer);
        assert_eq!(v.release(), vec![1, 2, 3]);
    }

    #[test]
    fn strips_one_v_prefix() {
        let v = parse_version("v1.2.3").unwrap();
        assert_eq!(v.raw(), "v1.2.3");
        assert_eq!(v.text(), "1.2.3");
        assert_eq!(v.to_string(), "1.2.3");
    }

    #[test]
    fn short_versions_fall_through_to_pep440() {
        let v = parse_version("0.1").unwrap();
        assert_eq!(v.grammar(), Grammar::Pep440);
        assert_eq!(v.release_part(2), 0);
    }

    #[test]
    fn bare_number_parses() {
        let v = parse_version("21").unwrap();
        assert_eq!(v.release_part(0), 21);
        assert_eq!(v.release_part(1), 0);
    }

    #[test]
    fn compact_prerelease_parses() {
        let v = parse_version("1a1").unwrap();
        assert_eq!(v.grammar(), Grammar::Pep440);
        assert_eq!(v.release(), vec![1]);
        assert!(v.has_qualifiers());
    }

    #[test]
    fn alphanumeric_segments_are_generic() {
        let v = parse_version("2024.05.final").unwrap();
        assert_eq!(v.grammar(), Grammar::GenericNPart);
    }

    #[test]
    fn pathological_input_is_unrecognized() {
        let err = parse_version("not-a-version").unwrap_err();
        assert_eq!(
            err,
            VersionError::Unrecognized {
                input: "not-a-version".to_string(),
                attempted: "not-a-version.0.0".to_string(),
            }
        );
    }

    #[test]
    fn rewrite_budget_is_bounded() {
        let VersionError::Unrecognized { attempted, .. } = parse_version("abc").unwrap_err();
        assert_eq!(attempted, "a.bc.0");
    }

    #[test]
    fn empty_string_is_unrecognized() {
        assert!(parse_version("").is_err());
        assert!(parse_version("v").is_err());
    }

    #[test]
    fn ordering_is_within_a_grammar() {
        let a = parse_version("1.2.3").unwrap();
        let b = parse_version("1.2.4").unwrap();
        let c = parse_version("1.2").unwrap();
        assert!(a < b);
        assert_eq!(a.partial_cmp(&c), None);
        assert_ne!(a, c);
    }

    #[test]
    fn structural_next_per_grammar() {
        let next = |raw: &str| parse_version(raw).unwrap().structural_next().unwrap();
        assert_eq!(next("1.2.3"), "1.2.4");
        assert_eq!(next("1.2.3-rc.1"), "1.2.3");
        assert_eq!(next("1.2"), "1.2.dev0");
        assert_eq!(next("1.2.dev3"), "1.2.dev4");
        assert_eq!(next("1.7.final"), "1.8.final");
    }

    #[test]
    fn structural_next_at_u64_max() {
        let v = parse_version(&format!("1.2.{}", u64::MAX)).unwrap();
        assert_eq!(v.grammar(), Grammar::SemVer);
        assert_eq!(v.structural_next(), None);
    }

    #[test]
    fn parse_exact_does_not_rewrite() {
        assert!(Grammar::SemVer.parse_exact("1.2").is_err());
        assert_eq!(
            Grammar::Pep440.parse_exact("v1.2").unwrap().grammar(),
            Grammar::Pep440
        );
    }

    #[test]
    fn components_include_qualifiers() {
        let v = parse_version("1.2rc1").unwrap();
        assert_eq!(
            v.components(),
            vec![
                Segment::Num(1),
                Segment::Num(2),
                Segment::Tag("rc".to_string()),
                Segment::Num(1),
            ]
        );
    }

    #[test]
    fn serializes_for_reports() {
        let v = parse_version("1.0-alpha.1").unwrap();
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["grammar"], "pep440");
        assert_eq!(json["raw"], "1.0-alpha.1");
        assert_eq!(json["normalized"], "1.0a1");
    }

    #[test]
    fn initial_is_zero_one_zero() {
        let v = ParsedVersion::initial();
        assert_eq!(v.grammar(), Grammar::SemVer);
        assert_eq!(v.to_string(), "0.1.0");
    }
}
