//! PEP 440 versions.
//!
//! Accepts the lenient spellings that PEP 440 normalizes (`1.0-alpha.1`,
//! `1.0c2`, `1.0-r3`, `1.0.dev`) and renders the normalized form.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// The pattern from the PEP 440 appendix, anchored and without the `v` prefix
/// (the engine strips that before any grammar sees the string).
static PEP440_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        ^
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?P<pre>
            [-_.]?
            (?P<pre_l>alpha|beta|preview|pre|rc|a|b|c)
            [-_.]?
            (?P<pre_n>[0-9]+)?
        )?
        (?P<post>
            (?:-(?P<post_n1>[0-9]+))
            |
            (?:
                [-_.]?
                (?P<post_l>post|rev|r)
                [-_.]?
                (?P<post_n2>[0-9]+)?
            )
        )?
        (?P<dev>
            [-_.]?
            dev
            [-_.]?
            (?P<dev_n>[0-9]+)?
        )?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        $",
    )
    .expect("PEP 440 pattern is valid")
});

/// Pre-release phase, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreTag {
    /// `a`, `alpha`
    Alpha,
    /// `b`, `beta`
    Beta,
    /// `rc`, `c`, `pre`, `preview`
    Rc,
}

impl PreTag {
    fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => Some(Self::Alpha),
            "b" | "beta" => Some(Self::Beta),
            "rc" | "c" | "pre" | "preview" => Some(Self::Rc),
            _ => None,
        }
    }

    /// Normalized spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "a",
            Self::Beta => "b",
            Self::Rc => "rc",
        }
    }
}

/// One dot-separated piece of a local version label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocalPart {
    /// Alphanumeric parts sort before numeric ones.
    Text(String),
    /// Numeric part.
    Number(u64),
}

impl fmt::Display for LocalPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A parsed PEP 440 version.
#[derive(Debug, Clone)]
pub struct Pep440Version {
    /// Epoch (`N!`), zero when absent.
    pub epoch: u64,
    /// Release segment, at least one number.
    pub release: Vec<u64>,
    /// Pre-release phase and number.
    pub pre: Option<(PreTag, u64)>,
    /// Post-release number.
    pub post: Option<u64>,
    /// Development release number.
    pub dev: Option<u64>,
    /// Local version label.
    pub local: Option<Vec<LocalPart>>,
}

fn number(caps: &regex::Captures<'_>, name: &str) -> Option<Option<u64>> {
    match caps.name(name) {
        Some(m) => m.as_str().parse().ok().map(Some),
        None => Some(None),
    }
}

impl Pep440Version {
    /// Parse a PEP 440 version. Returns `None` on anything the grammar
    /// rejects, including numbers that overflow `u64`.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = PEP440_RE.captures(text)?;

        let epoch = number(&caps, "epoch")?.unwrap_or(0);
        let release = caps
            .name("release")?
            .as_str()
            .split('.')
            .map(str::parse)
            .collect::<Result<Vec<u64>, _>>()
            .ok()?;

        let pre = match caps.name("pre_l") {
            Some(label) => {
                let tag = PreTag::from_label(label.as_str())?;
                Some((tag, number(&caps, "pre_n")?.unwrap_or(0)))
            }
            None => None,
        };

        let post = if caps.name("post").is_some() {
            let n = number(&caps, "post_n1")?.or(number(&caps, "post_n2")?);
            Some(n.unwrap_or(0))
        } else {
            None
        };

        let dev = if caps.name("dev").is_some() {
            Some(number(&caps, "dev_n")?.unwrap_or(0))
        } else {
            None
        };

        let local = caps.name("local").map(|m| {
            m.as_str()
                .split(['-', '_', '.'])
                .map(|part| match part.parse::<u64>() {
                    Ok(n) if part.bytes().all(|b| b.is_ascii_digit()) => LocalPart::Number(n),
                    _ => LocalPart::Text(part.to_ascii_lowercase()),
                })
                .collect()
        });

        Some(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    /// Whether any pre, post, dev or local qualifier is present.
    pub const fn has_qualifiers(&self) -> bool {
        self.pre.is_some() || self.post.is_some() || self.dev.is_some() || self.local.is_some()
    }

    /// Same version with the development counter bumped (`1.2` → `1.2.dev0`,
    /// `1.2.dev3` → `1.2.dev4`). `None` when the counter would overflow.
    pub fn bump_dev(&self) -> Option<Self> {
        let dev = match self.dev {
            Some(n) => n.checked_add(1)?,
            None => 0,
        };
        Some(Self {
            dev: Some(dev),
            ..self.clone()
        })
    }

    fn trimmed_release(&self) -> &[u64] {
        let keep = self
            .release
            .iter()
            .rposition(|&n| n != 0)
            .map_or(0, |i| i + 1);
        &self.release[..keep]
    }

    fn pre_key(&self) -> PreKey {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => PreKey::DevOnly,
            (Some((tag, n)), _, _) => PreKey::Pre(tag, n),
            (None, _, _) => PreKey::Final,
        }
    }

    const fn dev_key(&self) -> (u8, u64) {
        match self.dev {
            Some(n) => (0, n),
            None => (1, 0),
        }
    }
}

/// Sort position of the pre-release part; a bare dev release sorts before
/// every pre-release of the same release.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PreKey {
    DevOnly,
    Pre(PreTag, u64),
    Final,
}

impl Ord for Pep440Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.trimmed_release().cmp(other.trimmed_release()))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl PartialOrd for Pep440Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Pep440Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pep440Version {}

impl fmt::Display for Pep440Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        f.write_str(&release.join("."))?;
        if let Some((tag, n)) = self.pre {
            write!(f, "{}{n}", tag.as_str())?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{n}")?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{n}")?;
        }
        if let Some(ref local) = self.local {
            let parts: Vec<String> = local.iter().map(ToString::to_string).collect();
            write!(f, "+{}", parts.join("."))?;
        }
        Ok(())
    }
}
