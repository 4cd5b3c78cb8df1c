//! Application state and scan management.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use vscan_core::db::DataLoader;
use vscan_core::inventory::list_installed;
use vscan_core::osv::OsvClient;
use vscan_core::scan::{run_scan, scan_inventory, Finding, ScanConfig, ScanProgress};

/// Application state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Complete,
}

/// What the scan thread should look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSource {
    Paths,
    Inventory,
}

pub struct ScannerApp {
    // Configuration
    pub db_path: Option<PathBuf>,
    pub cache_dir: PathBuf,
    pub target_paths: Vec<PathBuf>,
    pub source: ScanSource,
    pub executables_only: bool,
    pub osv: bool,

    // State
    pub state: ScanState,
    pub progress: Arc<ScanProgress>,
    pub findings: Vec<Finding>,
    pub error_message: Option<String>,
    pub scan_duration: Option<f32>,
    pub filter_text: String,

    // Communication
    result_rx: Option<mpsc::Receiver<ScanOutcome>>,
}

enum ScanOutcome {
    Success(Vec<Finding>, f32),
    Error(String),
}

impl ScannerApp {
    pub fn new() -> Self {
        Self {
            db_path: None,
            cache_dir: PathBuf::from("cache"),
            target_paths: Vec::new(),
            source: ScanSource::Paths,
            executables_only: false,
            osv: false,
            state: ScanState::Idle,
            progress: Arc::new(ScanProgress::new()),
            findings: Vec::new(),
            error_message: None,
            scan_duration: None,
            filter_text: String::new(),
            result_rx: None,
        }
    }

    pub fn start_scan(&mut self) {
        let Some(db_path) = self.db_path.clone() else {
            self.error_message = Some("No advisory database selected".into());
            return;
        };
        if self.source == ScanSource::Paths && self.target_paths.is_empty() {
            self.error_message = Some("No scan targets added".into());
            return;
        }

        self.error_message = None;
        self.findings.clear();
        self.scan_duration = None;
        self.state = ScanState::Scanning;
        self.progress = Arc::new(ScanProgress::new());

        let config = ScanConfig {
            target_paths: self.target_paths.clone(),
            executables_only: self.executables_only,
        };
        let cache_dir = self.cache_dir.clone();
        let source = self.source;
        let osv = self.osv;

        let progress = Arc::clone(&self.progress);
        let (tx, rx) = mpsc::channel();
        self.result_rx = Some(rx);

        std::thread::spawn(move || {
            let start = Instant::now();

            let catalog = match DataLoader::new(cache_dir).load(&db_path, true) {
                Ok(catalog) => catalog,
                Err(e) => {
                    let _ = tx.send(ScanOutcome::Error(format!("{e}")));
                    return;
                }
            };

            let mut findings = match source {
                ScanSource::Paths => run_scan(&catalog, &config, &progress),
                ScanSource::Inventory => match list_installed() {
                    Ok(packages) => {
                        progress
                            .total_items
                            .store(packages.len(), Ordering::Relaxed);
                        scan_inventory(&catalog, &packages)
                    }
                    Err(e) => {
                        let _ = tx.send(ScanOutcome::Error(format!("{e}")));
                        return;
                    }
                },
            };

            if osv {
                let mut client = OsvClient::new();
                for finding in findings.iter_mut().filter(|f| f.is_vulnerable()) {
                    let (Some(software), Some(version)) = (&finding.software, &finding.version)
                    else {
                        continue;
                    };
                    match client.query(software, version) {
                        Ok(ids) => finding.osv_ids = Some(ids),
                        Err(e) => finding.error = Some(format!("OSV lookup failed: {e:#}")),
                    }
                }
            }

            let duration = start.elapsed().as_secs_f32();
            let _ = tx.send(ScanOutcome::Success(findings, duration));
        });
    }

    pub fn cancel_scan(&self) {
        self.progress.cancel.store(true, Ordering::Relaxed);
    }

    /// Poll for completion — called each frame.
    pub fn poll(&mut self) {
        if let Some(rx) = &self.result_rx {
            if let Ok(outcome) = rx.try_recv() {
                match outcome {
                    ScanOutcome::Success(findings, duration) => {
                        self.findings = findings;
                        self.scan_duration = Some(duration);
                        self.state = ScanState::Complete;
                    }
                    ScanOutcome::Error(msg) => {
                        self.error_message = Some(msg);
                        self.state = ScanState::Idle;
                    }
                }
                self.result_rx = None;
            }
        }
    }

    pub fn scanned_count(&self) -> usize {
        self.progress.scanned_items.load(Ordering::Relaxed)
    }

    pub fn total_count(&self) -> usize {
        self.progress.total_items.load(Ordering::Relaxed)
    }

    pub fn vulnerable_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_vulnerable()).count()
    }
}

impl eframe::App for ScannerApp {
    fn update(&mut self, ctx: &eframe::egui::Context, _frame: &mut eframe::Frame) {
        self.poll();

        // Request repaint during scanning for progress updates
        if self.state == ScanState::Scanning {
            ctx.request_repaint();
        }

        crate::ui::sidebar::draw_sidebar(ctx, self);
        crate::ui::scan_view::draw_scan_view(ctx, self);
    }
}
