//! Output formatting and report generation for scan results.

use std::fs;
use std::path::Path;

use serde_json::json;

use crate::catalog::Severity;
use crate::error::CoreError;
use crate::scan::Finding;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {s}. Use 'text' or 'json'.")),
        }
    }
}

/// Per-severity advisory totals over a set of findings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityTotals {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unknown: usize,
    pub total: usize,
}

pub fn severity_totals(findings: &[Finding]) -> SeverityTotals {
    let mut totals = SeverityTotals::default();
    for finding in findings {
        for vuln in &finding.vulnerabilities {
            totals.total += 1;
            match vuln.severity {
                Severity::Critical => totals.critical += 1,
                Severity::High => totals.high += 1,
                Severity::Medium => totals.medium += 1,
                Severity::Low => totals.low += 1,
                Severity::Unknown => totals.unknown += 1,
            }
        }
    }
    totals
}

pub fn print_results(findings: &[Finding], format: OutputFormat) {
    match format {
        OutputFormat::Text => print_text(findings),
        OutputFormat::Json => print_json(findings),
    }
}

fn print_text(findings: &[Finding]) {
    let vulnerable: Vec<_> = findings.iter().filter(|f| f.is_vulnerable()).collect();
    let errors: Vec<_> = findings.iter().filter(|f| f.error.is_some()).collect();
    let totals = severity_totals(findings);

    println!("\n{}", "=".repeat(70));
    println!("SCAN RESULTS");
    println!("{}", "=".repeat(70));

    if !vulnerable.is_empty() {
        println!("\nVULNERABLE ITEMS ({}):", vulnerable.len());
        for f in &vulnerable {
            let severity = f.worst_severity().unwrap_or(Severity::Unknown);
            print!(
                "  [{:>8}] {} -- {} {}",
                severity,
                f.path.display(),
                f.software.as_deref().unwrap_or("?"),
                f.version.as_deref().unwrap_or("unknown"),
            );
            print!("  ({} advisories)", f.vulnerabilities.len());
            if let Some(ids) = &f.osv_ids {
                print!("  [OSV: {}]", ids.len());
            }
            println!();
        }
    }

    if !errors.is_empty() {
        println!("\nERRORS ({}):", errors.len());
        for f in &errors {
            let err = f.error.as_deref().unwrap_or("unknown");
            println!("  [ERR ] {} -- {}", f.path.display(), err);
        }
    }

    println!("\nSUMMARY:");
    println!("  Items analyzed:    {}", findings.len());
    println!("  Vulnerable:        {}", vulnerable.len());
    println!("  Total advisories:  {}", totals.total);
    println!("    Critical:        {}", totals.critical);
    println!("    High:            {}", totals.high);
    println!("    Medium:          {}", totals.medium);
    println!("    Low:             {}", totals.low);
    println!("  Errors:            {}", errors.len());
    println!("{}", "=".repeat(70));
}

fn print_json(findings: &[Finding]) {
    let totals = severity_totals(findings);
    let output = json!({
        "results": findings,
        "summary": {
            "total": findings.len(),
            "vulnerable": findings.iter().filter(|f| f.is_vulnerable()).count(),
            "advisories": totals.total,
            "critical": totals.critical,
            "high": totals.high,
            "medium": totals.medium,
            "low": totals.low,
            "errors": findings.iter().filter(|f| f.error.is_some()).count(),
        }
    });
    println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
}

fn report_body(findings: &[Finding]) -> serde_json::Value {
    let vulnerable: Vec<_> = findings.iter().filter(|f| f.is_vulnerable()).collect();
    let totals = severity_totals(findings);

    json!({
        "metadata": {
            "scan_date": chrono::Local::now().to_rfc3339(),
            "items_analyzed": findings.len(),
            "vulnerable_items": vulnerable.len(),
            "total_advisories": totals.total,
            "critical_advisories": totals.critical,
            "high_advisories": totals.high,
            "medium_advisories": totals.medium,
            "low_advisories": totals.low,
        },
        "all_items": findings.iter().map(|f| json!({
            "path": f.path,
            "software": f.software,
            "version": f.version,
            "advisories": f.vulnerabilities.len(),
            "status": if f.is_vulnerable() { "vulnerable" } else { "clean" },
        })).collect::<Vec<_>>(),
        "findings": vulnerable,
    })
}

fn create_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
        }
    }
    Ok(())
}

/// Write the machine-readable report.
pub fn write_json_report(path: &Path, findings: &[Finding]) -> Result<(), CoreError> {
    create_parent_dirs(path)?;
    let body = serde_json::to_string_pretty(&report_body(findings))?;
    fs::write(path, body).map_err(|e| CoreError::io(path, e))
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Write a self-contained HTML report.
pub fn write_html_report(path: &Path, findings: &[Finding], title: &str) -> Result<(), CoreError> {
    create_parent_dirs(path)?;

    let vulnerable: Vec<_> = findings.iter().filter(|f| f.is_vulnerable()).collect();
    let totals = severity_totals(findings);
    let scan_date = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

    let mut rows = String::new();
    for finding in &vulnerable {
        let severity = finding.worst_severity().unwrap_or(Severity::Unknown);
        rows.push_str(&format!(
            "      <tr>\n        <td class=\"mono\">{}</td>\n        <td>{}</td>\n        \
             <td>{}</td>\n        <td class=\"sev {}\">{}</td>\n        <td>{}</td>\n      </tr>\n",
            html_escape(&finding.path.display().to_string()),
            html_escape(finding.software.as_deref().unwrap_or("?")),
            html_escape(finding.version.as_deref().unwrap_or("unknown")),
            severity,
            severity,
            finding.vulnerabilities.len(),
        ));
    }
    if vulnerable.is_empty() {
        rows.push_str("      <tr><td colspan=\"5\">No vulnerable items found.</td></tr>\n");
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>
    * {{ margin: 0; padding: 0; box-sizing: border-box; }}
    body {{ font-family: 'Segoe UI', Tahoma, sans-serif; background: #f5f5f5; color: #333; }}
    .container {{ max-width: 1200px; margin: 0 auto; padding: 20px; }}
    header {{ background: #2b3a55; color: white; padding: 24px; border-radius: 8px; margin-bottom: 24px; }}
    header h1 {{ font-size: 1.8em; margin-bottom: 4px; }}
    header .date {{ opacity: 0.8; font-size: 0.9em; }}
    .stats {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 12px; margin-top: 16px; }}
    .stat-box {{ background: rgba(255, 255, 255, 0.15); padding: 12px; border-radius: 5px; }}
    .stat-box .label {{ font-size: 0.85em; opacity: 0.9; }}
    .stat-box .value {{ font-size: 1.6em; font-weight: bold; }}
    table {{ width: 100%; border-collapse: collapse; background: white; border-radius: 6px; overflow: hidden; }}
    th, td {{ padding: 8px 12px; text-align: left; border-bottom: 1px solid #e5e5e5; }}
    th {{ background: #eef1f6; }}
    .mono {{ font-family: monospace; font-size: 0.9em; }}
    .sev {{ font-weight: bold; text-transform: uppercase; }}
    .sev.critical {{ color: #b71c1c; }}
    .sev.high {{ color: #d84315; }}
    .sev.medium {{ color: #b8860b; }}
    .sev.low {{ color: #1565c0; }}
    .sev.unknown {{ color: #757575; }}
  </style>
</head>
<body>
  <div class="container">
    <header>
      <h1>{title}</h1>
      <div class="date">Generated {scan_date}</div>
      <div class="stats">
        <div class="stat-box"><div class="label">Items analyzed</div><div class="value">{analyzed}</div></div>
        <div class="stat-box"><div class="label">Vulnerable</div><div class="value">{vulnerable}</div></div>
        <div class="stat-box"><div class="label">Advisories</div><div class="value">{advisories}</div></div>
        <div class="stat-box"><div class="label">Critical</div><div class="value">{critical}</div></div>
        <div class="stat-box"><div class="label">High</div><div class="value">{high}</div></div>
      </div>
    </header>
    <table>
      <tr><th>Path</th><th>Software</th><th>Version</th><th>Severity</th><th>Advisories</th></tr>
{rows}    </table>
  </div>
</body>
</html>
"#,
        title = html_escape(title),
        scan_date = scan_date,
        analyzed = findings.len(),
        vulnerable = vulnerable.len(),
        advisories = totals.total,
        critical = totals.critical,
        high = totals.high,
        rows = rows,
    );

    fs::write(path, html).map_err(|e| CoreError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Vulnerability;
    use std::path::PathBuf;

    fn vulnerable_finding(severity: Severity) -> Finding {
        Finding {
            path: PathBuf::from("/opt/firefox-12/firefox"),
            software: Some("Firefox".into()),
            version: Some("12".into()),
            sha256: Some("ab".repeat(32)),
            vulnerabilities: vec![Vulnerability {
                advisory_id: "ADV-1".into(),
                cve_id: Some("CVE-2011-4859".into()),
                name: "bad <bug>".into(),
                description: String::new(),
                severity,
                cvss_v2: None,
                cvss_v3: None,
                cvss_v4: None,
                class: String::new(),
                cwe_id: None,
                published: None,
                exploit_available: false,
                remediation: None,
            }],
            error: None,
            osv_ids: None,
        }
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn totals_count_per_severity() {
        let findings = vec![
            vulnerable_finding(Severity::Critical),
            vulnerable_finding(Severity::High),
            Finding::clean(PathBuf::from("/bin/true")),
        ];
        let totals = severity_totals(&findings);
        assert_eq!(totals.total, 2);
        assert_eq!(totals.critical, 1);
        assert_eq!(totals.high, 1);
        assert_eq!(totals.medium, 0);
    }

    #[test]
    fn json_report_structure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/report.json");

        let findings = vec![
            vulnerable_finding(Severity::High),
            Finding::clean(PathBuf::from("/bin/true")),
        ];
        write_json_report(&path, &findings).unwrap();

        let body: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(body["metadata"]["items_analyzed"], 2);
        assert_eq!(body["metadata"]["vulnerable_items"], 1);
        assert_eq!(body["metadata"]["high_advisories"], 1);
        assert_eq!(body["all_items"].as_array().unwrap().len(), 2);
        assert_eq!(body["all_items"][1]["status"], "clean");
        assert_eq!(body["findings"].as_array().unwrap().len(), 1);
        assert_eq!(body["findings"][0]["software"], "Firefox");
        assert!(body["findings"][0]["sha256"].is_string());
    }

    #[test]
    fn html_report_contains_findings_and_escapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");

        let findings = vec![vulnerable_finding(Severity::Critical)];
        write_html_report(&path, &findings, "Scan <Report>").unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("Firefox"));
        assert!(html.contains("class=\"sev critical\""));
        assert!(html.contains("Scan &lt;Report&gt;"));
        assert!(!html.contains("Scan <Report>"));
    }

    #[test]
    fn html_report_without_findings_has_placeholder_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");

        write_html_report(&path, &[], "Scan Report").unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("No vulnerable items found."));
    }
}
