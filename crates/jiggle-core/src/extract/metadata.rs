//! Packaging metadata: TOML tables, INI sections and plain version files.

use ini::Ini;
use tracing::debug;

use super::Found;

/// String value at a dotted key path in a TOML document.
pub(super) fn toml_key(text: &str, path: &[&str]) -> Option<Found> {
    let doc: toml::Table = match toml::from_str(text) {
        Ok(doc) => doc,
        Err(err) => {
            debug!(error = %err, "unparseable TOML");
            return None;
        }
    };

    let (first, rest) = path.split_first()?;
    let mut value = doc.get(*first)?;
    for key in rest {
        value = value.get(key)?;
    }

    match value.as_str() {
        Some(raw) => Some(Found::new(raw, path.join("."))),
        None => {
            debug!(key = %path.join("."), "version key is not a string");
            None
        }
    }
}

/// Value of `key` in `[section]` of an INI document.
pub(super) fn ini_key(text: &str, section: &str, key: &str) -> Option<Found> {
    let doc = match Ini::load_from_str(text) {
        Ok(doc) => doc,
        Err(err) => {
            debug!(error = %err, "unparseable INI");
            return None;
        }
    };
    doc.get_from(Some(section), key)
        .map(|raw| Found::new(raw.trim(), format!("{section}.{key}")))
}

/// The first line, trimmed.
pub(super) fn first_line(text: &str) -> Option<Found> {
    let line = text.lines().next()?.trim();
    Some(Found::new(line, "first_line"))
}
