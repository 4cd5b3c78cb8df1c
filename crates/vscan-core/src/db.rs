//! Advisory database loading and the on-disk catalog cache.
//!
//! The database is a JSON array of flat records, one per (software,
//! version spec, advisory) row. Parsing a large feed is the slow part of
//! startup, so the built catalog is cached as JSON next to the data and
//! reused until cleared.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::catalog::{Catalog, Severity, Vulnerability};
use crate::error::CoreError;

static CVE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"CVE-\d{4}-\d+").expect("valid regex"));
static CWE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"CWE-\d+").expect("valid regex"));

/// One row of the advisory feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub advisory_id: String,
    #[serde(default)]
    pub software: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Free-form severity text; only the leading keyword is significant.
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub cvss_v2: Option<f32>,
    #[serde(default)]
    pub cvss_v3: Option<f32>,
    #[serde(default)]
    pub cvss_v4: Option<f32>,
    #[serde(default)]
    pub class: String,
    /// Free-form cross-reference field; a CVE id is extracted if present.
    #[serde(default)]
    pub references: String,
    /// Free-form CWE field; a CWE id is extracted if present.
    #[serde(default)]
    pub cwe: String,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub exploit_available: bool,
    #[serde(default)]
    pub remediation: Option<String>,
}

/// Extract a `CVE-YYYY-NNNN` id out of a free-form reference field.
pub fn extract_cve(field: &str) -> Option<String> {
    CVE_RE.find(field).map(|m| m.as_str().to_string())
}

/// Extract a `CWE-NNN` id out of a free-form field.
pub fn extract_cwe(field: &str) -> Option<String> {
    CWE_RE.find(field).map(|m| m.as_str().to_string())
}

/// Counters from one catalog build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub processed: usize,
    pub skipped: usize,
}

fn record_to_vulnerability(record: &Record) -> Vulnerability {
    Vulnerability {
        advisory_id: record.advisory_id.clone(),
        cve_id: extract_cve(&record.references),
        name: record.name.clone(),
        description: record.description.clone(),
        severity: Severity::parse(&record.severity),
        cvss_v2: record.cvss_v2,
        cvss_v3: record.cvss_v3,
        cvss_v4: record.cvss_v4,
        class: record.class.clone(),
        cwe_id: extract_cwe(&record.cwe),
        published: record.published.clone(),
        exploit_available: record.exploit_available,
        remediation: record.remediation.clone(),
    }
}

/// Build a catalog from feed records. Records without an advisory id or a
/// software name are skipped and counted.
pub fn build_catalog(records: &[Record]) -> (Catalog, LoadStats) {
    let mut catalog = Catalog::new();
    let mut stats = LoadStats::default();

    for record in records {
        if record.advisory_id.trim().is_empty() || record.software.trim().is_empty() {
            stats.skipped += 1;
            continue;
        }
        let version = match record.version.trim() {
            "" => "unknown",
            spec => spec,
        };
        catalog.add_vulnerability(
            record.software.trim(),
            version,
            record_to_vulnerability(record),
            record.vendor.trim(),
            record.kind.trim(),
        );
        stats.processed += 1;
    }

    (catalog, stats)
}

/// Read and parse a feed file.
pub fn load_records(path: &Path) -> Result<Vec<Record>, CoreError> {
    let data = fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
    Ok(serde_json::from_str(&data)?)
}

/// Loads advisory feeds and manages the parsed-catalog cache.
pub struct DataLoader {
    cache_dir: PathBuf,
}

impl DataLoader {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    fn cache_path(&self) -> PathBuf {
        self.cache_dir.join("catalog.json")
    }

    /// Load a catalog from `db_path`, going through the cache when allowed.
    ///
    /// A stale cache is possible if the feed changes without the cache
    /// being cleared; pass `use_cache = false` (or call [`clear_cache`])
    /// to force a rebuild.
    ///
    /// [`clear_cache`]: DataLoader::clear_cache
    pub fn load(&self, db_path: &Path, use_cache: bool) -> Result<Catalog, CoreError> {
        let cache_path = self.cache_path();

        if use_cache && cache_path.is_file() {
            match self.load_cached(&cache_path) {
                Ok(catalog) => {
                    info!(cache = %cache_path.display(), "catalog loaded from cache");
                    return Ok(catalog);
                }
                Err(err) => {
                    warn!(cache = %cache_path.display(), %err, "ignoring unreadable cache");
                }
            }
        }

        let records = load_records(db_path)?;
        let (catalog, stats) = build_catalog(&records);
        info!(
            db = %db_path.display(),
            processed = stats.processed,
            skipped = stats.skipped,
            "advisory database loaded"
        );

        if use_cache {
            if let Err(err) = self.store_cache(&catalog) {
                warn!(%err, "could not write catalog cache");
            }
        }

        Ok(catalog)
    }

    fn load_cached(&self, cache_path: &Path) -> Result<Catalog, CoreError> {
        let data = fs::read_to_string(cache_path).map_err(|e| CoreError::io(cache_path, e))?;
        Ok(serde_json::from_str(&data)?)
    }

    fn store_cache(&self, catalog: &Catalog) -> Result<(), CoreError> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| CoreError::io(&self.cache_dir, e))?;
        let cache_path = self.cache_path();
        let data = serde_json::to_string(catalog)?;
        fs::write(&cache_path, data).map_err(|e| CoreError::io(&cache_path, e))?;
        info!(cache = %cache_path.display(), "catalog cache written");
        Ok(())
    }

    pub fn clear_cache(&self) -> Result<(), CoreError> {
        let cache_path = self.cache_path();
        if cache_path.is_file() {
            fs::remove_file(&cache_path).map_err(|e| CoreError::io(&cache_path, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn feed_json() -> &'static str {
        r#"[
            {
                "advisory_id": "ADV-2014-0001",
                "software": "Firefox",
                "vendor": "Mozilla",
                "kind": "browser",
                "version": "12",
                "name": "Use-after-free in layout",
                "severity": "Critical (network, no auth)",
                "references": "see also CVE-2011-4859 and vendor notes",
                "cwe": "CWE-416: use after free",
                "exploit_available": true
            },
            {
                "advisory_id": "",
                "software": "Firefox",
                "version": "13"
            },
            {
                "advisory_id": "ADV-2014-0002",
                "software": "",
                "version": "1.0"
            },
            {
                "advisory_id": "ADV-2014-0003",
                "software": "PostgreSQL",
                "version": "8.4.0 - 8.4.16",
                "severity": "High"
            }
        ]"#
    }

    fn write_feed(dir: &Path) -> PathBuf {
        let path = dir.join("feed.json");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(feed_json().as_bytes()).unwrap();
        path
    }

    #[test]
    fn extract_cve_and_cwe_from_free_text() {
        assert_eq!(
            extract_cve("other ids: CVE-2011-4859, OSVDB-123").as_deref(),
            Some("CVE-2011-4859")
        );
        assert_eq!(extract_cve("nothing here"), None);
        assert_eq!(extract_cwe("CWE-119 buffer overflow").as_deref(), Some("CWE-119"));
        assert_eq!(extract_cwe(""), None);
    }

    #[test]
    fn build_catalog_skips_incomplete_records() {
        let records: Vec<Record> = serde_json::from_str(feed_json()).unwrap();
        let (catalog, stats) = build_catalog(&records);

        assert_eq!(stats.processed, 2);
        assert_eq!(stats.skipped, 2);

        let hits = catalog.find("Firefox", Some("12"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].severity, Severity::Critical);
        assert_eq!(hits[0].cve_id.as_deref(), Some("CVE-2011-4859"));
        assert_eq!(hits[0].cwe_id.as_deref(), Some("CWE-416"));
        assert!(hits[0].exploit_available);
    }

    #[test]
    fn blank_version_becomes_unknown() {
        let records: Vec<Record> = serde_json::from_str(
            r#"[{"advisory_id": "ADV-1", "software": "Thing", "version": "  "}]"#,
        )
        .unwrap();
        let (catalog, _) = build_catalog(&records);
        assert_eq!(catalog.get("Thing").unwrap().versions.len(), 1);
        assert!(catalog.get("Thing").unwrap().versions.contains_key("unknown"));
    }

    #[test]
    fn loader_round_trips_through_cache() {
        let dir = tempfile::tempdir().unwrap();
        let feed = write_feed(dir.path());
        let loader = DataLoader::new(dir.path().join("cache"));

        let first = loader.load(&feed, true).unwrap();
        assert_eq!(first.stats().advisories, 2);

        // Remove the feed; a cached load must still succeed.
        fs::remove_file(&feed).unwrap();
        let second = loader.load(&feed, true).unwrap();
        assert_eq!(second.stats().advisories, 2);
    }

    #[test]
    fn loader_without_cache_reparses() {
        let dir = tempfile::tempdir().unwrap();
        let feed = write_feed(dir.path());
        let loader = DataLoader::new(dir.path().join("cache"));

        loader.load(&feed, true).unwrap();
        fs::remove_file(&feed).unwrap();
        assert!(loader.load(&feed, false).is_err());
    }

    #[test]
    fn clear_cache_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let feed = write_feed(dir.path());
        let loader = DataLoader::new(dir.path().join("cache"));

        loader.load(&feed, true).unwrap();
        loader.clear_cache().unwrap();
        fs::remove_file(&feed).unwrap();
        assert!(loader.load(&feed, true).is_err());
    }

    #[test]
    fn load_records_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_records(&path).is_err());
    }
}
