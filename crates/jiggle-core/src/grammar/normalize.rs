//! Rewrites applied to a version string that no grammar accepted.
//!
//! Each rule either produces a new candidate string or declines. The engine
//! applies the first rule that fires and tries the grammars again.

type Rule = fn(&str) -> Option<String>;

/// Rules in the order they are tried.
const RULES: &[Rule] = &[
    split_alpha,
    split_beta,
    pad_single_segment,
    pad_two_segments,
    pad_bare_number,
];

const SEPARATORS: [char; 4] = ['.', '-', '_', '+'];

/// Apply the first rule that changes `text`.
pub(crate) fn rewrite(text: &str) -> Option<String> {
    RULES.iter().find_map(|rule| rule(text))
}

/// `1.0a1` → `1.0.a1`
fn split_alpha(text: &str) -> Option<String> {
    split_before(text, 'a')
}

/// `1.0b1` → `1.0.b1`
fn split_beta(text: &str) -> Option<String> {
    split_before(text, 'b')
}

fn split_before(text: &str, marker: char) -> Option<String> {
    let mut out = String::with_capacity(text.len() + 2);
    let mut prev: Option<char> = None;
    let mut changed = false;

    for c in text.chars() {
        if c == marker && prev.is_some_and(|p| !SEPARATORS.contains(&p)) {
            out.push('.');
            changed = true;
        }
        out.push(c);
        prev = Some(c);
    }

    changed.then_some(out)
}

fn pad_single_segment(text: &str) -> Option<String> {
    (text.split('.').count() == 1).then(|| format!("{text}.0.0"))
}

fn pad_two_segments(text: &str) -> Option<String> {
    (text.split('.').count() == 2).then(|| format!("{text}.0"))
}

// Plain digits are normally caught by `pad_single_segment` first.
fn pad_bare_number(text: &str) -> Option<String> {
    (!text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())).then(|| format!("{text}.0.0"))
}
