//! Dotted N-part versions that neither SemVer nor PEP 440 accept, such as
//! `1.7.1.3` or `2024.05.final`.

use std::cmp::Ordering;
use std::fmt;

use super::Segment;

/// A numeric first segment followed by one or more alphanumeric segments.
///
/// Numeric segments remember their written width so `2024.05` renders back
/// with its leading zero. Width takes no part in equality or ordering.
#[derive(Debug, Clone)]
pub struct NPartVersion {
    segments: Vec<Segment>,
    widths: Vec<usize>,
}

impl NPartVersion {
    /// Parse a dotted version. At least two segments are required and the
    /// first must be numeric.
    pub fn parse(text: &str) -> Option<Self> {
        let mut segments = Vec::new();
        let mut widths = Vec::new();
        for piece in text.split('.') {
            if piece.is_empty() || !piece.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return None;
            }
            let segment = if piece.bytes().all(|b| b.is_ascii_digit()) {
                Segment::Num(piece.parse().ok()?)
            } else {
                Segment::Tag(piece.to_string())
            };
            segments.push(segment);
            widths.push(piece.len());
        }

        if segments.len() < 2 || !matches!(segments.first(), Some(Segment::Num(_))) {
            return None;
        }
        Some(Self { segments, widths })
    }

    /// All segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The leading run of numeric segments.
    pub fn release(&self) -> Vec<u64> {
        self.segments
            .iter()
            .map_while(|s| match s {
                Segment::Num(n) => Some(*n),
                Segment::Tag(_) => None,
            })
            .collect()
    }

    /// Same version with the last numeric segment incremented, keeping its
    /// zero padding. `None` when that segment is already `u64::MAX`.
    pub fn increment_last_numeric(&self) -> Option<Self> {
        let mut next = self.clone();
        if let Some(Segment::Num(n)) = next
            .segments
            .iter_mut()
            .rev()
            .find(|s| matches!(s, Segment::Num(_)))
        {
            *n = n.checked_add(1)?;
        }
        Some(next)
    }
}

impl PartialEq for NPartVersion {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for NPartVersion {}

impl Ord for NPartVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments.cmp(&other.segments)
    }
}

impl PartialOrd for NPartVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NPartVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .segments
            .iter()
            .zip(&self.widths)
            .map(|(segment, &width)| match segment {
                Segment::Num(n) => format!("{n:0width$}"),
                Segment::Tag(t) => t.clone(),
            })
            .collect();
        f.write_str(&parts.join("."))
    }
}
