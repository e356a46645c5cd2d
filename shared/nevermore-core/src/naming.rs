//! Directory naming conventions: `<number>-<slug>` and natural ordering

use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

fn leading_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)").expect("valid leading-digits pattern"))
}

fn numbered_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)-(.+)$").expect("valid numbered-name pattern"))
}

/// Sort key for lesson and section directory names.
///
/// Names with a leading integer sort by that integer; names without one
/// sort after every numbered name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NaturalKey(Option<u64>);

impl NaturalKey {
    /// Leading number, if the name had one
    pub fn number(&self) -> Option<u64> {
        self.0
    }
}

impl Ord for NaturalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for NaturalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Extract the natural sort key from a directory name
pub fn natural_key(name: &str) -> NaturalKey {
    let number = leading_digits()
        .captures(name)
        .and_then(|caps| caps.get(1))
        // Prefixes too long for u64 still sort before unnumbered names
        .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX));
    NaturalKey(number)
}

/// Sort names by natural key, falling back to plain name order on ties
pub fn sort_naturally(names: &mut [String]) {
    names.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)).then_with(|| a.cmp(b)));
}

/// Split `<number>-<slug>` into its parts
pub fn split_numbered_name(name: &str) -> Option<(u64, &str)> {
    let caps = numbered_name().captures(name)?;
    let number = caps.get(1)?.as_str().parse().ok()?;
    let slug = caps.get(2)?.as_str();
    Some((number, slug))
}
