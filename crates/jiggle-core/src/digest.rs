//! The stored public-symbol snapshot used by automatic increments.
//!
//! The snapshot is a small TOML file at the project root:
//!
//! ```toml
//! digest = "xxh3:5e0e3d8f7a1c2b94"
//! symbols = ["Client", "connect"]
//! ```

use std::collections::BTreeSet;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use xxhash_rust::xxh3::xxh3_64;

use crate::extract::public_symbols;
use crate::inventory::{self, InventoryError};

/// Default snapshot file name, relative to the project root.
pub const DEFAULT_DIGEST_FILE: &str = ".jiggle_version.config";

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from digest operations.
#[derive(Error, Debug)]
pub enum DigestError {
    /// The snapshot could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Snapshot path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The snapshot could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Snapshot path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The snapshot is not valid TOML.
    #[error("invalid digest file {path}: {source}")]
    Parse {
        /// Snapshot path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },

    /// The snapshot could not be encoded.
    #[error("failed to encode digest: {0}")]
    Encode(#[from] toml::ser::Error),

    /// Walking the project failed.
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

/// Result alias for digest operations.
pub type DigestResult<T> = Result<T, DigestError>;

// ──────────────────────────────────────────────
// Snapshot
// ──────────────────────────────────────────────

/// Public symbols and their fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolDigest {
    /// `xxh3:<hex>` fingerprint of `symbols`.
    #[serde(default)]
    pub digest: String,
    /// Sorted public symbols.
    #[serde(default)]
    pub symbols: BTreeSet<String>,
}

impl SymbolDigest {
    /// Snapshot a symbol set.
    pub fn new(symbols: BTreeSet<String>) -> Self {
        Self {
            digest: fingerprint(&symbols),
            symbols,
        }
    }
}

/// `xxh3:<hex>` over the sorted symbols, newline-joined.
pub fn fingerprint(symbols: &BTreeSet<String>) -> String {
    let joined = symbols
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");
    format!("xxh3:{:016x}", xxh3_64(joined.as_bytes()))
}

/// Union of `__all__` across every non-ignored Python file under `root`.
#[instrument(skip(ignore), fields(%root))]
pub fn collect_symbols(root: &Utf8Path, ignore: &[Utf8PathBuf]) -> DigestResult<BTreeSet<String>> {
    let mut symbols = BTreeSet::new();
    for rel in inventory::walk(root, ignore)? {
        if rel.extension() != Some("py") {
            continue;
        }
        if let Some(text) = inventory::read_text(&root.join(&rel))? {
            symbols.extend(public_symbols(&text));
        }
    }
    debug!(count = symbols.len(), "collected public symbols");
    Ok(symbols)
}

/// Load a snapshot. A missing file is an empty snapshot.
pub fn read(path: &Utf8Path) -> DigestResult<SymbolDigest> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(%path, "no digest file");
            return Ok(SymbolDigest::default());
        }
        Err(source) => {
            return Err(DigestError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&text).map_err(|source| DigestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Persist a snapshot of `symbols`, replacing any previous one.
pub fn write(path: &Utf8Path, symbols: &BTreeSet<String>) -> DigestResult<SymbolDigest> {
    let snapshot = SymbolDigest::new(symbols.clone());
    let text = toml::to_string(&snapshot)?;
    std::fs::write(path, text).map_err(|source| DigestError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(%path, digest = %snapshot.digest, "wrote digest");
    Ok(snapshot)
}
