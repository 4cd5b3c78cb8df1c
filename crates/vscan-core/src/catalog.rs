//! Advisory catalog — the software → version → vulnerability tree.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::VersionReq;

/// Severity of an advisory, ordered from least to most severe so that
/// `max()` yields the worst one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parse the leading keyword of a free-form severity text.
    pub fn parse(text: &str) -> Self {
        let text = text.trim().to_lowercase();
        for (keyword, level) in [
            ("critical", Severity::Critical),
            ("high", Severity::High),
            ("medium", Severity::Medium),
            ("low", Severity::Low),
        ] {
            if text.starts_with(keyword) {
                return level;
            }
        }
        Severity::Unknown
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One advisory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub advisory_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cve_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvss_v2: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvss_v3: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvss_v4: Option<f32>,
    #[serde(default)]
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwe_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default)]
    pub exploit_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

/// Advisories affecting one version spec of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionEntry {
    pub spec: String,
    pub req: VersionReq,
    pub vulnerabilities: Vec<Vulnerability>,
}

impl VersionEntry {
    fn new(spec: &str) -> Self {
        Self {
            spec: spec.to_string(),
            req: VersionReq::parse(spec),
            vulnerabilities: Vec::new(),
        }
    }

    /// Add an advisory unless one with the same id is already present.
    pub fn push_unique(&mut self, vuln: Vulnerability) {
        if !self
            .vulnerabilities
            .iter()
            .any(|v| v.advisory_id == vuln.advisory_id)
        {
            self.vulnerabilities.push(vuln);
        }
    }
}

/// A product with its known version specs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Software {
    pub name: String,
    pub vendor: String,
    pub kind: String,
    pub versions: BTreeMap<String, VersionEntry>,
}

impl Software {
    pub fn version_entry(&mut self, spec: &str) -> &mut VersionEntry {
        self.versions
            .entry(spec.to_string())
            .or_insert_with(|| VersionEntry::new(spec))
    }

    pub fn all_vulnerabilities(&self) -> impl Iterator<Item = &Vulnerability> {
        self.versions.values().flat_map(|v| v.vulnerabilities.iter())
    }
}

/// Aggregate counts over a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub software: usize,
    pub versions: usize,
    pub advisories: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unknown: usize,
}

/// The full advisory tree: root → software → version → vulnerability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    software: BTreeMap<String, Software>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or fetch a product. Vendor and kind stick from the first record
    /// that supplies them.
    pub fn add_software(&mut self, name: &str, vendor: &str, kind: &str) -> &mut Software {
        let entry = self
            .software
            .entry(name.to_string())
            .or_insert_with(|| Software {
                name: name.to_string(),
                vendor: String::new(),
                kind: String::new(),
                versions: BTreeMap::new(),
            });
        if entry.vendor.is_empty() && !vendor.is_empty() {
            entry.vendor = vendor.to_string();
        }
        if entry.kind.is_empty() && !kind.is_empty() {
            entry.kind = kind.to_string();
        }
        entry
    }

    pub fn add_vulnerability(
        &mut self,
        software: &str,
        version_spec: &str,
        vuln: Vulnerability,
        vendor: &str,
        kind: &str,
    ) {
        self.add_software(software, vendor, kind)
            .version_entry(version_spec)
            .push_unique(vuln);
    }

    pub fn get(&self, name: &str) -> Option<&Software> {
        self.software.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Software> {
        self.software.values()
    }

    pub fn is_empty(&self) -> bool {
        self.software.is_empty()
    }

    /// Advisories affecting `software` at `version`.
    ///
    /// With a version, the exact version-spec entry wins; otherwise every
    /// range entry containing the version contributes. Without a version,
    /// all advisories for the product are returned.
    pub fn find(&self, software: &str, version: Option<&str>) -> Vec<&Vulnerability> {
        let Some(sw) = self.software.get(software) else {
            return Vec::new();
        };

        match version {
            None => sw.all_vulnerabilities().collect(),
            Some(version) => {
                if let Some(entry) = sw.versions.get(version) {
                    return entry.vulnerabilities.iter().collect();
                }
                sw.versions
                    .values()
                    .filter(|entry| entry.req.matches(version))
                    .flat_map(|entry| entry.vulnerabilities.iter())
                    .collect()
            }
        }
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats {
            software: self.software.len(),
            ..CatalogStats::default()
        };

        for sw in self.software.values() {
            stats.versions += sw.versions.len();
            for vuln in sw.all_vulnerabilities() {
                stats.advisories += 1;
                match vuln.severity {
                    Severity::Critical => stats.critical += 1,
                    Severity::High => stats.high += 1,
                    Severity::Medium => stats.medium += 1,
                    Severity::Low => stats.low += 1,
                    Severity::Unknown => stats.unknown += 1,
                }
            }
        }
        stats
    }
}
