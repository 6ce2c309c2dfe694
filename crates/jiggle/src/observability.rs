//! Observability setup: structured logging.
//!
//! stdout carries command output (versions, JSON reports), so logs only ever
//! go to a JSONL file or, failing that, stderr.

use anyhow::{Result, anyhow};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const ENV_LOG_PATH: &str = "JIGGLE_LOG_PATH";
const ENV_LOG_DIR: &str = "JIGGLE_LOG_DIR";
const LOG_FILE_SUFFIX: &str = ".jsonl";

/// Configuration for observability setup.
#[derive(Clone, Debug)]
pub struct ObservabilityConfig {
    /// Name used for the log file and the platform data directory.
    pub service: String,
    /// Directory for JSONL log files. Falls back to platform defaults if unset.
    pub log_dir: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Build config for this binary, with the log directory from `Config`.
    pub fn from_env_with_overrides(log_dir: Option<PathBuf>) -> Self {
        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            log_dir,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LogTarget {
    dir: PathBuf,
    file_name: String,
}

impl LogTarget {
    fn in_dir(dir: PathBuf, service: &str) -> Self {
        Self {
            dir,
            file_name: format!("{service}{LOG_FILE_SUFFIX}"),
        }
    }

    fn at_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("{ENV_LOG_PATH} must end in a UTF-8 file name"))?;
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Ok(Self {
            dir: dir.to_path_buf(),
            file_name: file_name.to_string(),
        })
    }

    #[cfg(test)]
    fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    fn ensure_writable(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| anyhow!("cannot create log directory {}: {e}", self.dir.display()))?;
        let path = self.dir.join(&self.file_name);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| anyhow!("cannot open log file {}: {e}", path.display()))?;
        Ok(())
    }
}

/// Keeps the background log writer alive. Hold it until `main` returns.
pub struct ObservabilityGuard {
    _log_guard: WorkerGuard,
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_observability(
    cfg: &ObservabilityConfig,
    env_filter: EnvFilter,
) -> Result<ObservabilityGuard> {
    let (writer, guard) = match log_writer(&cfg.service, cfg.log_dir.as_deref()) {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("warning: {err}; logging to stderr");
            tracing_appender::non_blocking(std::io::stderr())
        }
    };

    let log_layer = tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::debug!("observability initialized");

    Ok(ObservabilityGuard { _log_guard: guard })
}

/// Build an `EnvFilter` based on CLI flags and environment.
///
/// Priority: quiet flag > verbose flag > RUST_LOG env > default_level
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }

    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

fn log_writer(service: &str, config_dir: Option<&Path>) -> Result<(NonBlocking, WorkerGuard)> {
    let target = resolve_log_target_with(
        service,
        std::env::var_os(ENV_LOG_PATH).map(PathBuf::from),
        std::env::var_os(ENV_LOG_DIR).map(PathBuf::from),
        config_dir.map(Path::to_path_buf),
    )?;
    let appender = tracing_appender::rolling::daily(&target.dir, &target.file_name);
    Ok(tracing_appender::non_blocking(appender))
}

/// Pick where logs go: `JIGGLE_LOG_PATH`, then `JIGGLE_LOG_DIR`, then the
/// configured `log_dir`, then the platform's local data directory.
fn resolve_log_target_with(
    service: &str,
    path_override: Option<PathBuf>,
    dir_override: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> Result<LogTarget> {
    let target = if let Some(path) = path_override {
        LogTarget::at_path(&path)?
    } else if let Some(dir) = dir_override.or(config_dir) {
        LogTarget::in_dir(dir, service)
    } else {
        let dirs = directories::ProjectDirs::from("", "", service)
            .ok_or_else(|| anyhow!("no home directory to keep logs in"))?;
        LogTarget::in_dir(dirs.data_local_dir().join("logs"), service)
    };
    target.ensure_writable()?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn env_filter_quiet_overrides() {
        assert_eq!(env_filter(true, 2, "info").to_string(), "error");
    }

    #[test]
    fn env_filter_verbose_maps_to_debug_and_trace() {
        assert_eq!(env_filter(false, 1, "info").to_string(), "debug");
        assert_eq!(env_filter(false, 3, "info").to_string(), "trace");
    }

    #[test]
    fn path_override_wins() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("custom.jsonl");
        let other = tmp.path().join("other");

        let target =
            resolve_log_target_with("demo", Some(file.clone()), Some(other.clone()), Some(other))
                .unwrap();

        assert_eq!(target.path(), file);
        assert!(file.exists());
    }

    #[test]
    fn dir_override_beats_config_dir() {
        let tmp = TempDir::new().unwrap();
        let env_dir = tmp.path().join("env");
        let config_dir = tmp.path().join("config");

        let target =
            resolve_log_target_with("demo", None, Some(env_dir.clone()), Some(config_dir)).unwrap();

        assert_eq!(target, LogTarget::in_dir(env_dir, "demo"));
        assert_eq!(target.file_name, "demo.jsonl");
    }

    #[test]
    fn config_dir_is_created() {
        let tmp = TempDir::new().unwrap();
        let config_dir = tmp.path().join("nested").join("logs");

        let target = resolve_log_target_with("demo", None, None, Some(config_dir.clone())).unwrap();

        assert_eq!(target.dir, config_dir);
        assert!(config_dir.is_dir());
    }

    #[test]
    fn bare_file_name_logs_to_cwd() {
        let target = LogTarget::at_path(Path::new("jiggle.jsonl")).unwrap();
        assert_eq!(target.dir, PathBuf::from("."));
        assert_eq!(target.file_name, "jiggle.jsonl");
    }
}
