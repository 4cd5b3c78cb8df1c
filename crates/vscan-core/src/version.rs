//! Version parsing, ordering, and range matching.
//!
//! Advisory databases describe affected versions as free-form specs: an
//! exact version ("2.4.41"), an inclusive interval ("8.4.0 - 8.4.16"), or
//! an open bound (">= 9.0", "<= 1.1.1k"). Comparison works on the numeric
//! components extracted left-to-right, so "Server 2019" and "1.2.3-rc1"
//! still order sensibly.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static INTERVAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\d][\d.]*)\s+-\s+([\d][\d.]*)$").expect("valid regex"));

/// Extract the numeric components of a version string.
///
/// "8.4.0" → [8, 4, 0]; "Server 2019" → [2019]; "no digits" → [].
pub fn components(version: &str) -> Vec<u64> {
    let mut parts = Vec::new();
    let mut current: Option<u64> = None;

    for ch in version.chars() {
        if let Some(digit) = ch.to_digit(10) {
            let acc = current.unwrap_or(0);
            current = Some(acc.saturating_mul(10).saturating_add(u64::from(digit)));
        } else if let Some(value) = current.take() {
            parts.push(value);
        }
    }
    if let Some(value) = current {
        parts.push(value);
    }
    parts
}

/// Order two component lists. A shorter list that is a prefix of a longer
/// one orders before it ("1.2" < "1.2.0").
pub fn compare(a: &[u64], b: &[u64]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// A parsed version spec from an advisory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VersionReq {
    /// Matched by equality against the probe version (string or numeric).
    Exact(String),
    /// Inclusive interval.
    Between(Vec<u64>, Vec<u64>),
    AtLeast(Vec<u64>),
    AtMost(Vec<u64>),
}

impl VersionReq {
    /// Parse a spec string. Anything that is not a recognized range form
    /// becomes an exact (opaque) spec.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();

        if let Some(rest) = spec.strip_prefix(">=") {
            let lo = components(rest);
            if !lo.is_empty() {
                return VersionReq::AtLeast(lo);
            }
        }
        if let Some(rest) = spec.strip_prefix("<=") {
            let hi = components(rest);
            if !hi.is_empty() {
                return VersionReq::AtMost(hi);
            }
        }
        if let Some(caps) = INTERVAL_RE.captures(spec) {
            let lo = components(&caps[1]);
            let hi = components(&caps[2]);
            if !lo.is_empty() && !hi.is_empty() {
                return VersionReq::Between(lo, hi);
            }
        }

        VersionReq::Exact(spec.to_string())
    }

    /// Does `version` fall inside this spec?
    pub fn matches(&self, version: &str) -> bool {
        let probe = components(version);

        match self {
            VersionReq::Exact(spec) => {
                if spec == version {
                    return true;
                }
                if !probe.is_empty() && components(spec) == probe {
                    return true;
                }
                // "12 (build 4567)" still matches a probe of "12", but the
                // prefix must end at a component boundary so "1.2" does not
                // match specs starting with "1.20".
                match spec.strip_prefix(version) {
                    Some(rest) => !version.is_empty() && !rest.starts_with(|c: char| c.is_ascii_digit()),
                    None => false,
                }
            }
            VersionReq::Between(lo, hi) => {
                !probe.is_empty()
                    && compare(lo, &probe) != Ordering::Greater
                    && compare(&probe, hi) != Ordering::Greater
            }
            VersionReq::AtLeast(lo) => !probe.is_empty() && compare(&probe, lo) != Ordering::Less,
            VersionReq::AtMost(hi) => !probe.is_empty() && compare(&probe, hi) != Ordering::Greater,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_extracts_digit_runs() {
        assert_eq!(components("8.4.0"), vec![8, 4, 0]);
        assert_eq!(components("Server 2019"), vec![2019]);
        assert_eq!(components("1.2.3-rc1"), vec![1, 2, 3, 1]);
        assert_eq!(components("unknown"), Vec::<u64>::new());
    }

    #[test]
    fn compare_orders_numerically() {
        assert_eq!(compare(&[8, 4, 0], &[8, 4, 16]), Ordering::Less);
        assert_eq!(compare(&[9, 0], &[8, 99, 99]), Ordering::Greater);
        assert_eq!(compare(&[1, 2], &[1, 2]), Ordering::Equal);
    }

    #[test]
    fn compare_prefix_orders_before_longer() {
        assert_eq!(compare(&[1, 2], &[1, 2, 0]), Ordering::Less);
        assert_eq!(compare(&[1, 2, 0], &[1, 2]), Ordering::Greater);
    }

    #[test]
    fn parse_interval() {
        let req = VersionReq::parse("8.4.0 - 8.4.16");
        assert_eq!(req, VersionReq::Between(vec![8, 4, 0], vec![8, 4, 16]));
        assert!(req.matches("8.4.7"));
        assert!(req.matches("8.4.0"));
        assert!(req.matches("8.4.16"));
        assert!(!req.matches("8.4.17"));
        assert!(!req.matches("8.3.99"));
    }

    #[test]
    fn parse_open_bounds() {
        let lo = VersionReq::parse(">= 9.0");
        assert!(lo.matches("9.0"));
        assert!(lo.matches("10.1"));
        assert!(!lo.matches("8.99"));

        let hi = VersionReq::parse("<= 1.1.1");
        assert!(hi.matches("1.1.1"));
        assert!(hi.matches("0.9"));
        assert!(!hi.matches("1.2"));
    }

    #[test]
    fn exact_matches_string_and_numeric() {
        let req = VersionReq::parse("2.4.41");
        assert!(req.matches("2.4.41"));
        assert!(req.matches("v2.4.41"));
        assert!(!req.matches("2.4.42"));
    }

    #[test]
    fn exact_prefix_must_end_at_boundary() {
        let req = VersionReq::parse("12 (build 4567)");
        assert!(req.matches("12"));

        let req = VersionReq::parse("1.20");
        assert!(!req.matches("1.2"));
    }

    #[test]
    fn hyphenated_version_is_not_an_interval() {
        // A dash without surrounding spaces stays an exact spec.
        let req = VersionReq::parse("1.2.3-4");
        assert_eq!(req, VersionReq::Exact("1.2.3-4".to_string()));
    }

    #[test]
    fn ranges_never_match_non_numeric_probes() {
        let req = VersionReq::parse(">= 1.0");
        assert!(!req.matches("unknown"));
    }
}
