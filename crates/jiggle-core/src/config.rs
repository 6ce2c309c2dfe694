//! Configuration loading and discovery.
//!
//! This module provides configuration file discovery by:
//! 1. Walking up from the current directory to find project config
//! 2. Reading `[tool.jiggle_version]` from the nearest `pyproject.toml`
//! 3. Loading user config from XDG config directory
//! 4. Merging with sensible defaults
//!
//! # Supported formats
//!
//! The following configuration file formats are supported:
//! - TOML (`.toml`)
//! - YAML (`.yaml`, `.yml`)
//! - JSON (`.json`)
//!
//! # Config sources (in order of precedence, highest first):
//! - files passed explicitly (`--config`)
//! - `.jiggle.<ext>` or `jiggle.<ext>` in current directory or any parent
//! - `[tool.jiggle_version]` in `pyproject.toml`
//! - `~/.config/jiggle/config.<ext>` (user config)
//!
//! Where `<ext>` is one of: `toml`, `yaml`, `yml`, `json`
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use jiggle_core::config::{Config, ConfigLoader};
//!
//! let cwd = std::env::current_dir().unwrap();
//! let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
//! let config = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::bump::IncrementPolicy;
use crate::digest::DEFAULT_DIGEST_FILE;
use crate::error::{ConfigError, ConfigResult};
use crate::grammar::Grammar;

/// The configuration for jiggle.
///
/// Deserialized from config files found during discovery (TOML, YAML, or JSON).
/// Every key is optional; command-line flags override what is set here.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files (falls back to platform defaults if unset).
    pub log_dir: Option<Utf8PathBuf>,
    /// Versioning scheme new versions must satisfy.
    pub scheme: Grammar,
    /// Increment used when `bump` is run without `--increment`.
    pub default_increment: IncrementPolicy,
    /// Paths (relative to the project root) never searched for versions.
    pub ignore: Vec<Utf8PathBuf>,
    /// Where the public-symbol snapshot lives, relative to the project root.
    pub digest_file: Utf8PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_dir: None,
            scheme: Grammar::Pep440,
            default_increment: IncrementPolicy::Patch,
            ignore: Vec::new(),
            digest_file: Utf8PathBuf::from(DEFAULT_DIGEST_FILE),
        }
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "jiggle";

/// Table in `pyproject.toml` that holds jiggle settings.
pub const PYPROJECT_TABLE: &str = "tool.jiggle_version";

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include user config from XDG directory.
    include_user_config: bool,
    /// Whether to read `[tool.jiggle_version]` from `pyproject.toml`.
    include_pyproject: bool,
    /// Stop searching when we hit a directory containing this file/dir.
    boundary_marker: Option<String>,
    /// Explicit config files to load (for testing or programmatic use).
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            include_pyproject: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Set the starting directory for project config search.
    ///
    /// The loader will walk up from this directory looking for config files.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/jiggle/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Set whether to read `[tool.jiggle_version]` from `pyproject.toml`.
    pub const fn with_pyproject(mut self, include: bool) -> Self {
        self.include_pyproject = include;
        self
    }

    /// Set a boundary marker to stop directory traversal.
    ///
    /// When walking up directories, stop if we find a directory containing
    /// this file or directory name. Default is `.git`.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Disable boundary marker (search all the way to filesystem root).
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file to load.
    ///
    /// Files are loaded in order, with later files taking precedence.
    /// Explicit files are loaded after discovered files.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration, merging all discovered sources.
    ///
    /// Precedence (highest to lowest):
    /// 1. Explicit files (in order added via `with_file`)
    /// 2. Project config (closest to search root)
    /// 3. `[tool.jiggle_version]` in the nearest `pyproject.toml`
    /// 4. User config (`~/.config/jiggle/config.<ext>`)
    /// 5. Default values
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<Config> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Start with user config (lowest precedence of file sources)
        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            figment = Self::merge_file(figment, &user_config);
        }

        if let Some(ref root) = self.project_search_root {
            if self.include_pyproject
                && let Some(pyproject) = self.find_upwards(root, |dir| {
                    let path = dir.join("pyproject.toml");
                    path.is_file().then_some(path)
                })
            {
                tracing::debug!(%pyproject, "reading pyproject settings");
                figment = figment.merge(
                    Figment::from(Toml::file_exact(pyproject.as_str())).focus(PYPROJECT_TABLE),
                );
            }

            if let Some(project_config) = self.find_project_config(root) {
                figment = Self::merge_file(figment, &project_config);
            }
        }

        // Add explicit files (highest precedence)
        for file in &self.explicit_files {
            figment = Self::merge_file(figment, file);
        }

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::info!(
            log_level = config.log_level.as_str(),
            scheme = %config.scheme,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Walk up from `start`, returning the first hit of `probe`.
    ///
    /// The directory holding the boundary marker is the last one searched.
    fn find_upwards<F>(&self, start: &Utf8Path, probe: F) -> Option<Utf8PathBuf>
    where
        F: Fn(&Utf8Path) -> Option<Utf8PathBuf>,
    {
        let mut current = Some(start);

        while let Some(dir) = current {
            if let Some(hit) = probe(dir) {
                return Some(hit);
            }

            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
            {
                break;
            }

            current = dir.parent();
        }

        None
    }

    /// Find project config by walking up from the given directory.
    fn find_project_config(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        self.find_upwards(start, |dir| {
            CONFIG_EXTENSIONS.iter().find_map(|ext| {
                // Dotfile first (.jiggle.toml), then regular name (jiggle.toml)
                [
                    dir.join(format!(".{APP_NAME}.{ext}")),
                    dir.join(format!("{APP_NAME}.{ext}")),
                ]
                .into_iter()
                .find(|path| path.is_file())
            })
        })
    }

    /// Find user config in XDG config directory.
    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let config_dir = user_config_dir()?;

        // Try each supported extension
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| config_dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("toml") => figment.merge(Toml::file_exact(path.as_str())),
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}

/// Find the project config file path without loading it.
///
/// Useful for commands that need to know where config is located.
pub fn find_project_config<P: AsRef<Utf8Path>>(start: P) -> Option<Utf8PathBuf> {
    ConfigLoader::new()
        .with_project_search(start.as_ref())
        .without_boundary_marker()
        .find_project_config(start.as_ref())
}

/// Get the project directories for XDG-compliant path resolution.
///
/// Returns `None` if the home directory cannot be determined.
fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Get the user config directory path.
///
/// Returns `~/.config/jiggle/` on Linux, `~/Library/Application Support/jiggle/`
/// on macOS, and equivalent on other platforms.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}

/// The default `[tool.jiggle_version]` table, as appended to `pyproject.toml`.
pub fn pyproject_table_template() -> String {
    let defaults = Config::default();
    format!(
        "\n[{PYPROJECT_TABLE}]\nscheme = \"{}\"\ndefault_increment = \"{}\"\n# ignore = [\"docs/generated\", \"build/\"]\n",
        defaults.scheme, defaults.default_increment
    )
}

/// Whether `pyproject.toml` text already carries a `[tool.jiggle_version]`
/// table.
///
/// # Errors
///
/// Returns [`ConfigError::Pyproject`] when `text` is not valid TOML.
pub fn has_pyproject_table(text: &str) -> ConfigResult<bool> {
    let doc = text.parse::<toml::Table>().map_err(Box::new)?;
    let mut table = &doc;
    for key in PYPROJECT_TABLE.split('.') {
        match table.get(key).and_then(toml::Value::as_table) {
            Some(inner) => table = inner,
            None => return Ok(false),
        }
    }
    Ok(true)
}
