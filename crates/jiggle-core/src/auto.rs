//! Bump level inferred from the change in a package's public symbols.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::bump::BumpLevel;

/// Public symbols before and after a change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymbolDiff {
    /// Symbols recorded at the last release.
    pub previous: BTreeSet<String>,
    /// Symbols exported now.
    pub current: BTreeSet<String>,
}

impl SymbolDiff {
    /// Pair two symbol sets.
    pub const fn new(previous: BTreeSet<String>, current: BTreeSet<String>) -> Self {
        Self { previous, current }
    }

    /// Symbols that disappeared.
    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.previous.difference(&self.current).map(String::as_str)
    }

    /// Symbols that are new.
    pub fn added(&self) -> impl Iterator<Item = &str> {
        self.current.difference(&self.previous).map(String::as_str)
    }

    /// Removals are breaking, additions are features, anything else is a
    /// patch.
    pub fn classify(&self) -> BumpLevel {
        if self.removed().next().is_some() {
            BumpLevel::Major
        } else if self.added().next().is_some() {
            BumpLevel::Minor
        } else {
            BumpLevel::Patch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn removal_is_major() {
        let diff = SymbolDiff::new(set(&["a", "b"]), set(&["a", "c"]));
        assert_eq!(diff.classify(), BumpLevel::Major);
        assert_eq!(diff.removed().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn addition_is_minor() {
        let diff = SymbolDiff::new(set(&["a"]), set(&["a", "b"]));
        assert_eq!(diff.classify(), BumpLevel::Minor);
        assert_eq!(diff.added().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn unchanged_is_patch() {
        assert_eq!(
            SymbolDiff::new(set(&["a"]), set(&["a"])).classify(),
            BumpLevel::Patch
        );
        assert_eq!(SymbolDiff::default().classify(), BumpLevel::Patch);
    }
}
