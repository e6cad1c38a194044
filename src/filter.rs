use regex::Regex;

use crate::client::KeyDetail;
use crate::error::{Error, Result};

/// Pattern used when no patterns are given.
pub const MATCH_ALL: &str = ".*";

/// Ordered set of key-name patterns. A name matches when any pattern finds a
/// match anywhere in it.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compile `patterns`; an empty list yields the match-everything set.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self::default());
        }
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.first_match(name).is_some()
    }

    /// The first pattern, in the order given, that matches `name`.
    pub fn first_match(&self, name: &str) -> Option<&Regex> {
        self.patterns.iter().find(|p| p.is_match(name))
    }

    pub fn as_strs(&self) -> Vec<&str> {
        self.patterns.iter().map(Regex::as_str).collect()
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self {
            patterns: vec![Regex::new(MATCH_ALL).expect("match-all pattern compiles")],
        }
    }
}

/// Parse a cachedump size spec such as `"1024 b"` into bytes.
pub fn parse_size(key: &str, spec: &str) -> Result<u64> {
    spec.strip_suffix(" b")
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| Error::MalformedSize {
            key: key.to_string(),
            raw: spec.to_string(),
        })
}

/// Sizes of the keys in `details` whose name matches `patterns`, in listing order.
///
/// Scanning stops once `limit` matches have been collected; a `limit` of 0
/// scans everything. Each matching key contributes one size even when several
/// patterns match it. Sizes of non-matching keys are never inspected.
pub fn collect_sizes(
    details: &[KeyDetail],
    patterns: &PatternSet,
    limit: usize,
    verbose: bool,
) -> Result<Vec<u64>> {
    let mut sizes = Vec::new();

    for detail in details {
        if limit > 0 && sizes.len() >= limit {
            break;
        }
        let Some(pattern) = patterns.first_match(&detail.name) else {
            continue;
        };

        let size = parse_size(&detail.name, &detail.size)?;
        if verbose {
            tracing::info!(
                key = %detail.name,
                size = %detail.size,
                idle = %detail.idle,
                pattern = pattern.as_str(),
                "Matched key"
            );
        }
        sizes.push(size);
    }

    Ok(sizes)
}
