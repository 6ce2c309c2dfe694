//! Find the files in a Python project that may declare its version.
//!
//! The walk honors `.gitignore`, the global gitignore and `.git/info/exclude`,
//! always skips [`DEFAULT_IGNORE_DIRS`], and skips any caller-supplied paths.
//! Hidden files are included.

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::extract::{FileKind, VersionCandidate, extract_first};

/// Directories never searched.
pub const DEFAULT_IGNORE_DIRS: [&str; 4] = [".git", ".tox", ".venv", "__pycache__"];

/// Files only looked for at the project root.
const ROOT_FILES: &[(&str, &[FileKind])] = &[
    (
        "pyproject.toml",
        &[FileKind::TomlProject, FileKind::TomlTool],
    ),
    ("setup.cfg", &[FileKind::IniMetadata]),
    ("setup.py", &[FileKind::BuildScript]),
    ("version.txt", &[FileKind::PlainText]),
];

/// Module names that hold a version wherever they appear.
const VERSION_MODULES: [&str; 3] = ["_version.py", "__version__.py", "__about__.py"];

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from inventory operations.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// An ignore path could not be turned into a pattern.
    #[error("invalid ignore pattern {pattern:?}: {source}")]
    Pattern {
        /// The pattern as built.
        pattern: String,
        /// Underlying error.
        #[source]
        source: ignore::Error,
    },

    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The file.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

// ──────────────────────────────────────────────
// Types
// ──────────────────────────────────────────────

/// A file worth searching, and how to search it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryEntry {
    /// Project-relative path with `/` separators.
    pub source_id: String,
    /// Path on disk.
    pub path: Utf8PathBuf,
    /// Kinds to try, in order.
    pub kinds: Vec<FileKind>,
}

// ──────────────────────────────────────────────
// Walk
// ──────────────────────────────────────────────

/// Every non-ignored file under `root`, as sorted root-relative paths.
pub fn walk(root: &Utf8Path, ignore: &[Utf8PathBuf]) -> InventoryResult<Vec<Utf8PathBuf>> {
    let mut overrides = OverrideBuilder::new(root);
    let mut add = |pattern: String| {
        overrides
            .add(&pattern)
            .map(|_| ())
            .map_err(|source| InventoryError::Pattern { pattern, source })
    };
    for dir in DEFAULT_IGNORE_DIRS {
        add(format!("!{dir}"))?;
        add(format!("!{dir}/**"))?;
    }
    for path in ignore {
        let rel = path.strip_prefix(root).unwrap_or(path);
        let rel = rel.as_str().trim_end_matches('/');
        if rel.is_empty() {
            continue;
        }
        add(format!("!/{rel}"))?;
        add(format!("!/{rel}/**"))?;
    }
    let overrides = overrides.build().map_err(|source| InventoryError::Pattern {
        pattern: "<overrides>".to_string(),
        source,
    })?;

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .require_git(false)
        .overrides(overrides);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let Ok(path) = Utf8PathBuf::try_from(entry.into_path()) else {
            debug!("skipping non-UTF-8 path");
            continue;
        };
        match path.strip_prefix(root) {
            Ok(rel) => files.push(rel.to_path_buf()),
            Err(_) => debug!(%path, "walked outside the project root"),
        }
    }
    files.sort();
    Ok(files)
}

fn classify(rel: &Utf8Path) -> Option<&'static [FileKind]> {
    let parts: Vec<&str> = rel.components().map(|c| c.as_str()).collect();
    let name = *parts.last()?;

    if parts.len() == 1
        && let Some((_, kinds)) = ROOT_FILES.iter().find(|(file, _)| *file == name)
    {
        return Some(kinds);
    }
    if VERSION_MODULES.contains(&name) {
        return Some(&[FileKind::SourceModule]);
    }
    // Top-level packages, flat or under src/
    let top_level = parts.len() == 2 || (parts.len() == 3 && parts[0] == "src");
    if name == "__init__.py" && top_level {
        return Some(&[FileKind::SourceModule]);
    }
    None
}

/// Inventory every file under `root` that may declare the version.
#[instrument(skip(ignore), fields(%root))]
pub fn discover(root: &Utf8Path, ignore: &[Utf8PathBuf]) -> InventoryResult<Vec<InventoryEntry>> {
    let entries: Vec<InventoryEntry> = walk(root, ignore)?
        .into_iter()
        .filter_map(|rel| {
            let kinds = classify(&rel)?;
            Some(InventoryEntry {
                source_id: rel.components().map(|c| c.as_str()).collect::<Vec<_>>().join("/"),
                path: root.join(&rel),
                kinds: kinds.to_vec(),
            })
        })
        .collect();
    debug!(count = entries.len(), "inventoried version files");
    Ok(entries)
}

// ──────────────────────────────────────────────
// Read
// ──────────────────────────────────────────────

/// Read a file as UTF-8, dropping a byte-order mark.
///
/// Returns `Ok(None)` for files that are not valid UTF-8.
pub fn read_text(path: &Utf8Path) -> InventoryResult<Option<String>> {
    let bytes = std::fs::read(path).map_err(|source| InventoryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(Some(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        })),
        Err(_) => {
            warn!(%path, "skipping file that is not valid UTF-8");
            Ok(None)
        }
    }
}

/// Run the extractor over every inventoried file.
#[instrument(skip_all, fields(files = entries.len()))]
pub fn read_candidates(entries: &[InventoryEntry]) -> InventoryResult<Vec<VersionCandidate>> {
    let mut candidates = Vec::new();
    for entry in entries {
        let Some(text) = read_text(&entry.path)? else {
            continue;
        };
        match extract_first(&entry.source_id, &entry.kinds, &text) {
            Some(candidate) => candidates.push(candidate),
            None => debug!(source = %entry.source_id, "no version declared"),
        }
    }
    Ok(candidates)
}
