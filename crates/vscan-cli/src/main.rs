//! Vulnerability Scanner CLI - checks files and installed packages
//! against an advisory database.
//!
//! Usage:
//!   vscan /path/to/scan --db advisories.json
//!   vscan /opt /usr/local --db advisories.json --executables-only --format json
//!   vscan --inventory --db advisories.json --html-report report.html
//!   vscan /path/to/scan --db advisories.json --osv --json-report report.json

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vscan_core::db::DataLoader;
use vscan_core::inventory::list_installed;
use vscan_core::osv::OsvClient;
use vscan_core::report::{print_results, write_html_report, write_json_report, OutputFormat};
use vscan_core::scan::{run_scan, scan_inventory, Finding, ScanConfig, ScanProgress};

#[derive(Parser)]
#[command(name = "vscan")]
#[command(about = "Software vulnerability scanner")]
struct Cli {
    /// Paths to scan (files or directories)
    #[arg(required_unless_present = "inventory")]
    paths: Vec<PathBuf>,

    /// Path to the advisory database (JSON)
    #[arg(short, long)]
    db: PathBuf,

    /// Directory for the parsed-catalog cache
    #[arg(long, default_value = "cache")]
    cache_dir: PathBuf,

    /// Rebuild the catalog even if a cache exists
    #[arg(long)]
    no_cache: bool,

    /// Only scan executable files (PE/ELF/Mach-O/scripts)
    #[arg(long)]
    executables_only: bool,

    /// Scan the installed-package inventory instead of filesystem paths
    #[arg(long)]
    inventory: bool,

    /// Cross-reference vulnerable findings against OSV.dev
    #[arg(long)]
    osv: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Write a JSON report to this path
    #[arg(long)]
    json_report: Option<PathBuf>,

    /// Write an HTML report to this path
    #[arg(long)]
    html_report: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    eprintln!("[*] Loading advisory database from {}...", cli.db.display());
    let loader = DataLoader::new(&cli.cache_dir);
    let catalog = loader
        .load(&cli.db, !cli.no_cache)
        .context("could not load advisory database")?;

    let stats = catalog.stats();
    eprintln!(
        "[*] Catalog ready: {} products, {} versions, {} advisories ({} critical, {} high)",
        stats.software, stats.versions, stats.advisories, stats.critical, stats.high
    );

    let progress = Arc::new(ScanProgress::new());

    let mut findings = if cli.inventory {
        eprintln!("[*] Querying installed packages...");
        let packages = list_installed().context("could not list installed packages")?;
        eprintln!("[*] Found {} installed packages", packages.len());
        scan_inventory(&catalog, &packages)
    } else {
        let config = ScanConfig {
            target_paths: cli.paths,
            executables_only: cli.executables_only,
        };
        eprintln!("[*] Scanning...");
        let findings = run_scan(&catalog, &config, &progress);
        eprintln!(
            "[*] Scanned {} files",
            progress.scanned_items.load(Ordering::Relaxed)
        );
        findings
    };

    if findings.is_empty() {
        eprintln!("[*] Nothing to analyze.");
        return Ok(());
    }

    if cli.osv {
        eprintln!("[*] Cross-referencing vulnerable findings with OSV.dev...");
        cross_reference(&mut findings);
    }

    print_results(&findings, cli.format);

    if let Some(path) = &cli.json_report {
        write_json_report(path, &findings).context("could not write JSON report")?;
        eprintln!("[*] JSON report written to {}", path.display());
    }
    if let Some(path) = &cli.html_report {
        write_html_report(path, &findings, "Vulnerability Scan Report")
            .context("could not write HTML report")?;
        eprintln!("[*] HTML report written to {}", path.display());
    }

    Ok(())
}

/// Attach OSV advisory ids to vulnerable findings. Lookup failures are
/// recorded on the finding instead of aborting the run.
fn cross_reference(findings: &mut [Finding]) {
    let mut client = OsvClient::new();

    for finding in findings.iter_mut().filter(|f| f.is_vulnerable()) {
        let (Some(software), Some(version)) = (&finding.software, &finding.version) else {
            continue;
        };
        match client.query(software, version) {
            Ok(ids) => finding.osv_ids = Some(ids),
            Err(e) => finding.error = Some(format!("OSV lookup failed: {e:#}")),
        }
    }
}
