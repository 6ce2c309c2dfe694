//! Core library for jiggle.
//!
//! This crate finds the version strings a Python project declares, checks
//! that they agree, and computes the next version. The `jiggle` CLI is a thin
//! layer over it.
//!
//! # Modules
//!
//! - [`extract`] - Pull a version candidate out of one file's text
//! - [`grammar`] - Parse versions as SemVer, PEP 440 or generic N-part
//! - [`consolidate`] - Reduce candidates to one canonical version
//! - [`bump`] - Compute the next version
//! - [`auto`] - Infer a bump level from public-symbol changes
//! - [`inventory`] - Find the files that may declare a version
//! - [`digest`] - Store and compare the public-symbol snapshot
//! - [`rewrite`] - Write a new version back into file text
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```no_run
//! use camino::Utf8Path;
//! use jiggle_core::{Grammar, IncrementRequest, bump, consolidate, inventory};
//!
//! let root = Utf8Path::new(".");
//! let entries = inventory::discover(root, &[]).expect("walk project");
//! let candidates = inventory::read_candidates(&entries).expect("read files");
//! let found = consolidate(candidates, false).expect("versions agree");
//! let next = bump(&found.canonical, &IncrementRequest::Patch, Grammar::Pep440)
//!     .expect("bump");
//! println!("{} -> {next}", found.canonical);
//! ```
#![deny(unsafe_code)]

pub mod auto;

pub mod bump;

pub mod config;

pub mod consolidate;

pub mod digest;

pub mod error;

pub mod extract;

pub mod grammar;

pub mod inventory;

pub mod rewrite;

pub use auto::SymbolDiff;

pub use bump::{BumpError, BumpLevel, BumpResult, IncrementPolicy, IncrementRequest, bump, bump_raw};

pub use config::{Config, ConfigLoader, LogLevel};

pub use consolidate::{Consolidated, ConsolidationError, consolidate};

pub use error::{ConfigError, ConfigResult};

pub use extract::{FileKind, VersionCandidate, extract};

pub use grammar::{Grammar, ParsedVersion, VersionError, parse_version};
