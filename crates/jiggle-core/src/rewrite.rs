//! Put a new version into file text, keeping everything else as it was.
//!
//! Pure text in, text out. Returns `None` when the file had no declaration
//! this module knows how to replace.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::extract::{FileKind, VERSION_TOKENS};

/// A quoted assignment to a version token, optionally annotated.
static PY_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    let tokens = VERSION_TOKENS.map(regex::escape).join("|");
    let pattern = format!(
        r#"(?m)^(\s*(?:{tokens})\s*(?::\s*\w+\s*)?=\s*)(['"])[^'"\n]*(['"])"#
    );
    Regex::new(&pattern).expect("regex for python version assignment")
});

/// A quoted `version=` keyword argument anywhere on a line, as in
/// `setup(name='demo', version='1.2.3')`.
static PY_VERSION_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\bversion\s*=\s*)(['"])[^'"\n]*(['"])"#)
        .expect("regex for setup version keyword")
});

/// Replace the declared version in `text`.
pub fn rewrite(kind: FileKind, text: &str, new_version: &str) -> Option<String> {
    match kind {
        FileKind::SourceModule => python(text, new_version, &[&*PY_ASSIGNMENT]),
        FileKind::BuildScript => {
            python(text, new_version, &[&*PY_ASSIGNMENT, &*PY_VERSION_KEYWORD])
        }
        FileKind::TomlProject => section_value(text, "project", new_version, Style::Toml),
        FileKind::TomlTool => section_value(text, "tool.setuptools", new_version, Style::Toml),
        FileKind::IniMetadata => section_value(text, "metadata", new_version, Style::Ini),
        FileKind::PlainText => first_line(text, new_version),
    }
}

/// Try each kind in order and return the first rewrite that applies.
pub fn rewrite_first(kinds: &[FileKind], text: &str, new_version: &str) -> Option<String> {
    kinds
        .iter()
        .find_map(|&kind| rewrite(kind, text, new_version))
}

fn python(text: &str, new_version: &str, patterns: &[&Regex]) -> Option<String> {
    if !patterns.iter().any(|re| re.is_match(text)) {
        return None;
    }
    let replaced = patterns.iter().fold(text.to_string(), |acc, re| {
        re.replace_all(&acc, |caps: &Captures<'_>| {
            format!("{}{}{new_version}{}", &caps[1], &caps[2], &caps[3])
        })
        .into_owned()
    });
    Some(replaced)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Toml,
    Ini,
}

/// Rewrite the first `version = ...` line inside `[section]`.
fn section_value(text: &str, section: &str, new_version: &str, style: Style) -> Option<String> {
    let mut out = String::with_capacity(text.len() + new_version.len());
    let mut in_section = false;
    let mut replaced = false;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_section = header_name(trimmed) == Some(section);
        } else if in_section
            && !replaced
            && let Some(new_line) = replace_value(line, new_version, style)
        {
            out.push_str(&new_line);
            replaced = true;
            continue;
        }
        out.push_str(line);
    }

    replaced.then_some(out)
}

fn header_name(trimmed: &str) -> Option<&str> {
    let inner = trimmed.strip_prefix('[')?;
    if inner.starts_with('[') {
        return None;
    }
    inner.split(']').next().map(str::trim)
}

fn split_eol(line: &str) -> (&str, &str) {
    let body = line.trim_end_matches(['\r', '\n']);
    (body, &line[body.len()..])
}

fn replace_value(line: &str, new_version: &str, style: Style) -> Option<String> {
    let (body, eol) = split_eol(line);
    let (key, rest) = body.split_once('=')?;
    if key.trim() != "version" {
        return None;
    }
    let value = rest.trim_start();
    let gap = &rest[..rest.len() - value.len()];

    match style {
        Style::Toml => {
            let quote = value.chars().next().filter(|c| matches!(c, '"' | '\''))?;
            let close = value[1..].find(quote)? + 1;
            let tail = &value[close + 1..];
            Some(format!("{key}={gap}{quote}{new_version}{quote}{tail}{eol}"))
        }
        Style::Ini => Some(format!("{key}={gap}{new_version}{eol}")),
    }
}

fn first_line(text: &str, new_version: &str) -> Option<String> {
    let (line, rest) = match text.find('\n') {
        Some(i) => (&text[..i], &text[i..]),
        None => (text, ""),
    };
    if line.trim().is_empty() {
        return None;
    }
    Some(format!("{new_version}{rest}"))
}
