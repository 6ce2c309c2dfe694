//! Line-oriented fallbacks for Python files that the syntax tree missed.

use std::sync::LazyLock;

use regex::Regex;

use super::{FileKind, Found, VERSION_TOKENS, is_plausible};

static TOKEN_LINES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    VERSION_TOKENS
        .iter()
        .map(|token| {
            let pattern = format!(r#"^{} = ['"]([^'"]*)['"]"#, regex::escape(token));
            (*token, Regex::new(&pattern).expect("regex for version token line"))
        })
        .collect()
});

/// Drop the comment, squeeze out whitespace, unify quotes and trim commas.
fn simplify(line: &str) -> String {
    let code = line.split('#').next().unwrap_or_default();
    let squeezed: String = code
        .chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '\n' | '\r'))
        .map(|c| if c == '\'' { '"' } else { c })
        .collect();
    squeezed.trim_matches(',').to_string()
}

/// `<token>="<value>"` at the start of a simplified line.
pub(super) fn split_find(_kind: FileKind, text: &str) -> Option<Found> {
    let mut found = None;
    for line in text.lines() {
        let simple = simplify(line);
        for token in VERSION_TOKENS {
            let Some(rest) = simple
                .strip_prefix(token)
                .and_then(|r| r.strip_prefix("=\""))
            else {
                continue;
            };
            let value = rest.split('"').next().unwrap_or_default();
            if is_plausible(value) {
                found = Some(Found::new(value, token));
            }
            break;
        }
    }
    found
}

/// `<token> = '<value>'` matched with a regular expression, per line.
pub(super) fn regex_find(_kind: FileKind, text: &str) -> Option<Found> {
    let mut found = None;
    for line in text.lines() {
        let hit = TOKEN_LINES.iter().find_map(|(token, re)| {
            re.captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| (*token, m.as_str()))
        });
        if let Some((token, value)) = hit
            && is_plausible(value)
        {
            found = Some(Found::new(value, token));
        }
    }
    found
}
