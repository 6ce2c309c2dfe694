//! Pull a raw version string out of a file's text.
//!
//! Python files (modules and build scripts) go through three strategies in
//! order: a syntax-tree walk, a delimiter-based line split, and a per-line
//! regular expression. The first strategy that finds something wins. Table
//! formats read one well-known key. Every value must pass [`is_plausible`].
//!
//! Nothing in here touches the filesystem.

mod lines;
mod metadata;
mod python;

pub use python::public_symbols;

use std::fmt;

use serde::Serialize;
use tracing::{debug, instrument};

/// Identifiers that declare a version, in priority order.
pub const VERSION_TOKENS: [&str; 5] = [
    "__version__",
    "__VERSION__",
    "VERSION",
    "version",
    "PACKAGE_VERSION",
];

/// How a file's text should be searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// A Python module (`__init__.py`, `_version.py`, ...).
    SourceModule,
    /// `setup.py`.
    BuildScript,
    /// `[project].version` in `pyproject.toml`.
    TomlProject,
    /// `[tool.setuptools].version` in `pyproject.toml`.
    TomlTool,
    /// `[metadata] version` in `setup.cfg`.
    IniMetadata,
    /// A file whose first line is the version.
    PlainText,
}

impl FileKind {
    /// Short name for reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SourceModule => "source_module",
            Self::BuildScript => "build_script",
            Self::TomlProject => "toml_project",
            Self::TomlTool => "toml_tool",
            Self::IniMetadata => "ini_metadata",
            Self::PlainText => "plain_text",
        }
    }

    /// Whether the file is Python source.
    pub const fn is_python(self) -> bool {
        matches!(self, Self::SourceModule | Self::BuildScript)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw version string found in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionCandidate {
    /// Where it came from, usually a project-relative path.
    pub source_id: String,
    /// The string as written, not yet validated by any grammar.
    pub raw_text: String,
    /// The identifier or key it was declared under.
    pub declared_symbol: String,
}

/// A strategy hit before it is tied to a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Found {
    pub raw: String,
    pub symbol: String,
}

impl Found {
    pub(crate) fn new(raw: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            symbol: symbol.into(),
        }
    }
}

type Strategy = fn(FileKind, &str) -> Option<Found>;

/// Python strategies in the order they are tried.
const PYTHON_STRATEGIES: &[(&str, Strategy)] = &[
    ("syntax_tree", python::find),
    ("delimiter_split", lines::split_find),
    ("line_regex", lines::regex_find),
];

/// Whether an extracted value could be a version at all.
///
/// Rejects empty strings, `""`, `.`, and anything with whitespace or
/// parentheses.
pub fn is_plausible(value: &str) -> bool {
    !matches!(value, "" | "\"\"" | ".")
        && !value
            .chars()
            .any(|c| c.is_whitespace() || c == '(' || c == ')')
}

/// Extract at most one version candidate from `text`.
#[instrument(level = "debug", skip(text))]
pub fn extract(source_id: &str, kind: FileKind, text: &str) -> Option<VersionCandidate> {
    let found = match kind {
        FileKind::SourceModule | FileKind::BuildScript => {
            PYTHON_STRATEGIES.iter().find_map(|(name, strategy)| {
                let found = strategy(kind, text)?;
                debug!(strategy = name, raw = %found.raw, symbol = %found.symbol, "strategy matched");
                Some(found)
            })
        }
        FileKind::TomlProject => metadata::toml_key(text, &["project", "version"]),
        FileKind::TomlTool => metadata::toml_key(text, &["tool", "setuptools", "version"]),
        FileKind::IniMetadata => metadata::ini_key(text, "metadata", "version"),
        FileKind::PlainText => metadata::first_line(text),
    }?;

    if !is_plausible(&found.raw) {
        debug!(raw = %found.raw, "rejected implausible version");
        return None;
    }

    Some(VersionCandidate {
        source_id: source_id.to_string(),
        raw_text: found.raw,
        declared_symbol: found.symbol,
    })
}

/// Try each kind in order and return the first candidate.
pub fn extract_first(source_id: &str, kinds: &[FileKind], text: &str) -> Option<VersionCandidate> {
    kinds
        .iter()
        .find_map(|&kind| extract(source_id, kind, text))
}
