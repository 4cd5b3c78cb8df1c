//! Scan orchestrator with progress tracking for both CLI and GUI use.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::catalog::{Catalog, Severity, Vulnerability};
use crate::detect::{is_executable, is_ignorable, SoftwareDetector, SKIPPED_DIRS};
use crate::inventory::InstalledPackage;

/// Configuration for a filesystem scan run.
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    pub target_paths: Vec<PathBuf>,
    pub executables_only: bool,
}

/// Atomic progress tracking — no Mutex contention with the GUI thread.
pub struct ScanProgress {
    pub total_items: AtomicUsize,
    pub scanned_items: AtomicUsize,
    pub vulnerable_count: AtomicUsize,
    pub error_count: AtomicUsize,
    pub cancel: AtomicBool,
}

impl ScanProgress {
    pub fn new() -> Self {
        Self {
            total_items: AtomicUsize::new(0),
            scanned_items: AtomicUsize::new(0),
            vulnerable_count: AtomicUsize::new(0),
            error_count: AtomicUsize::new(0),
            cancel: AtomicBool::new(false),
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// One analyzed item: a file on disk or an installed package.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osv_ids: Option<Vec<String>>,
}

impl Finding {
    pub fn clean(path: PathBuf) -> Self {
        Self {
            path,
            software: None,
            version: None,
            sha256: None,
            vulnerabilities: Vec::new(),
            error: None,
            osv_ids: None,
        }
    }

    pub fn is_vulnerable(&self) -> bool {
        !self.vulnerabilities.is_empty()
    }

    pub fn worst_severity(&self) -> Option<Severity> {
        self.vulnerabilities.iter().map(|v| v.severity).max()
    }

    pub fn severity_count(&self, severity: Severity) -> usize {
        self.vulnerabilities
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }
}

/// Compute the SHA-256 digest of a file.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    use sha2::{Digest, Sha256};

    let data = std::fs::read(path)?;
    let hash = Sha256::digest(&data);
    Ok(format!("{:x}", hash))
}

/// Collect all candidate files from the given paths (expanding
/// directories), skipping ignorable entries and vendor directories.
pub fn collect_files(paths: &[PathBuf], executables_only: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let wanted = |p: &Path| -> bool {
        if is_ignorable(p) {
            return false;
        }
        !executables_only || is_executable(p)
    };

    for path in paths {
        if path.is_file() {
            if wanted(path) {
                files.push(path.clone());
            }
        } else if path.is_dir() {
            let walker = WalkDir::new(path).follow_links(false).into_iter();
            for entry in walker
                .filter_entry(|e| {
                    // The explicitly targeted root is never pruned.
                    if e.depth() == 0 {
                        return true;
                    }
                    let name = e.file_name().to_string_lossy();
                    !(e.file_type().is_dir()
                        && (name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())))
                })
                .flatten()
            {
                let p = entry.into_path();
                if p.is_file() && wanted(&p) {
                    files.push(p);
                }
            }
        }
    }

    files
}

fn check_file(catalog: &Catalog, detector: &SoftwareDetector, path: PathBuf) -> Finding {
    let path_str = path.to_string_lossy().into_owned();
    let Some(detection) = detector.detect(&path_str) else {
        return Finding::clean(path);
    };

    let vulnerabilities: Vec<Vulnerability> = catalog
        .find(detection.software, detection.version.as_deref())
        .into_iter()
        .cloned()
        .collect();

    let mut finding = Finding {
        path,
        software: Some(detection.software.to_string()),
        version: detection.version,
        sha256: None,
        vulnerabilities,
        error: None,
        osv_ids: None,
    };

    if finding.is_vulnerable() {
        match sha256_file(&finding.path) {
            Ok(digest) => finding.sha256 = Some(digest),
            Err(e) => finding.error = Some(format!("cannot hash file: {e}")),
        }
    }

    finding
}

/// Run a full filesystem scan with progress tracking. Blocking — call
/// from a background thread.
pub fn run_scan(
    catalog: &Catalog,
    config: &ScanConfig,
    progress: &Arc<ScanProgress>,
) -> Vec<Finding> {
    let detector = SoftwareDetector::new();

    let files = collect_files(&config.target_paths, config.executables_only);
    progress.total_items.store(files.len(), Ordering::Relaxed);
    debug!(files = files.len(), "scan targets collected");

    files
        .into_par_iter()
        .filter_map(|path| {
            if progress.cancel.load(Ordering::Relaxed) {
                return None;
            }

            let finding = check_file(catalog, &detector, path);
            if finding.is_vulnerable() {
                progress.vulnerable_count.fetch_add(1, Ordering::Relaxed);
            }
            if finding.error.is_some() {
                progress.error_count.fetch_add(1, Ordering::Relaxed);
            }
            progress.scanned_items.fetch_add(1, Ordering::Relaxed);
            Some(finding)
        })
        .collect()
}

/// Match an installed-package inventory against the catalog.
///
/// Direct name hits are tried first, then a case-insensitive substring
/// match over the catalog's product names.
pub fn scan_inventory(catalog: &Catalog, packages: &[InstalledPackage]) -> Vec<Finding> {
    packages
        .iter()
        .map(|pkg| {
            let mut vulnerabilities: Vec<Vulnerability> = catalog
                .find(&pkg.name, Some(&pkg.version))
                .into_iter()
                .cloned()
                .collect();
            let mut matched: Option<String> =
                (!vulnerabilities.is_empty()).then(|| pkg.name.clone());

            if vulnerabilities.is_empty() {
                let needle = pkg.name.to_lowercase();
                for sw in catalog.iter() {
                    let hay = sw.name.to_lowercase();
                    if hay.contains(&needle) || needle.contains(&hay) {
                        vulnerabilities = catalog
                            .find(&sw.name, Some(&pkg.version))
                            .into_iter()
                            .cloned()
                            .collect();
                        if !vulnerabilities.is_empty() {
                            matched = Some(sw.name.clone());
                            break;
                        }
                    }
                }
            }

            Finding {
                path: PathBuf::from(format!("{}:{}", pkg.origin, pkg.name)),
                software: matched.or_else(|| Some(pkg.name.clone())),
                version: Some(pkg.version.clone()),
                sha256: None,
                vulnerabilities,
                error: None,
                osv_ids: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Severity;
    use std::fs;

    fn test_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.add_vulnerability(
            "Firefox",
            "12",
            crate::catalog::Vulnerability {
                advisory_id: "ADV-1".into(),
                cve_id: None,
                name: "old firefox bug".into(),
                description: String::new(),
                severity: Severity::High,
                cvss_v2: None,
                cvss_v3: None,
                cvss_v4: None,
                class: String::new(),
                cwe_id: None,
                published: None,
                exploit_available: false,
                remediation: None,
            },
            "Mozilla",
            "browser",
        );
        catalog
    }

    #[test]
    fn sha256_of_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data");
        fs::write(&path, b"hello world").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn sha256_missing_file_errors() {
        assert!(sha256_file(Path::new("/nonexistent/file")).is_err());
    }

    #[test]
    fn collect_skips_vendor_dirs_and_safe_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/dep.js"), b"x").unwrap();
        fs::write(dir.path().join("README.md"), b"x").unwrap();
        fs::write(dir.path().join("tool.exe"), b"MZ\x90\x00").unwrap();

        let files = collect_files(&[dir.path().to_path_buf()], false);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["tool.exe"]);
    }

    #[test]
    fn collect_executables_only_filters_by_magic() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("daemon"), b"\x7fELF\x02\x01\x01\x00").unwrap();
        fs::write(dir.path().join("data.dat"), b"not a binary").unwrap();

        let files = collect_files(&[dir.path().to_path_buf()], true);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("daemon"));
    }

    #[test]
    fn run_scan_flags_known_vulnerable_layout() {
        let dir = tempfile::tempdir().unwrap();
        let ff_dir = dir.path().join("firefox-12");
        fs::create_dir(&ff_dir).unwrap();
        fs::write(ff_dir.join("firefox.exe"), b"MZ\x90\x00").unwrap();
        fs::write(dir.path().join("unrelated.exe"), b"MZ\x90\x00").unwrap();

        let catalog = test_catalog();
        let config = ScanConfig {
            target_paths: vec![dir.path().to_path_buf()],
            executables_only: false,
        };
        let progress = Arc::new(ScanProgress::new());
        let findings = run_scan(&catalog, &config, &progress);

        assert_eq!(progress.total_items.load(Ordering::Relaxed), 2);
        assert_eq!(progress.scanned_items.load(Ordering::Relaxed), 2);
        assert_eq!(progress.vulnerable_count.load(Ordering::Relaxed), 1);

        let hit = findings.iter().find(|f| f.is_vulnerable()).unwrap();
        assert_eq!(hit.software.as_deref(), Some("Firefox"));
        assert_eq!(hit.version.as_deref(), Some("12"));
        assert_eq!(hit.worst_severity(), Some(Severity::High));
        assert!(hit.sha256.is_some());
    }

    #[test]
    fn run_scan_honors_cancel() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tool.exe"), b"MZ\x90\x00").unwrap();

        let catalog = test_catalog();
        let config = ScanConfig {
            target_paths: vec![dir.path().to_path_buf()],
            executables_only: false,
        };
        let progress = Arc::new(ScanProgress::new());
        progress.cancel.store(true, Ordering::Relaxed);

        let findings = run_scan(&catalog, &config, &progress);
        assert!(findings.is_empty());
    }

    #[test]
    fn inventory_scan_matches_by_substring() {
        let catalog = test_catalog();
        let packages = vec![
            InstalledPackage {
                name: "firefox".into(),
                version: "12".into(),
                origin: "dpkg".into(),
            },
            InstalledPackage {
                name: "coreutils".into(),
                version: "9.4".into(),
                origin: "dpkg".into(),
            },
        ];

        let findings = scan_inventory(&catalog, &packages);
        assert_eq!(findings.len(), 2);

        let ff = &findings[0];
        assert!(ff.is_vulnerable());
        assert_eq!(ff.software.as_deref(), Some("Firefox"));
        assert_eq!(ff.path, PathBuf::from("dpkg:firefox"));

        assert!(!findings[1].is_vulnerable());
    }
}
