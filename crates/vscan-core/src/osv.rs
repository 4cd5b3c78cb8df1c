//! OSV.dev API client for cross-referencing scan results.
//!
//! Uses the OSV v1 query API to look up a package name + version and
//! collect the matching advisory ids. No API key is required; a built-in
//! minimum interval between requests keeps the client polite. Lookups
//! are strictly optional — scanning never needs the network.

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

const OSV_API_BASE: &str = "https://api.osv.dev/v1";

/// Minimum interval between API calls.
const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct OsvClient {
    client: reqwest::blocking::Client,
    last_request: Option<Instant>,
}

impl OsvClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            last_request: None,
        }
    }

    /// Enforce rate limiting by sleeping if needed.
    fn rate_limit(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < RATE_LIMIT_INTERVAL {
                std::thread::sleep(RATE_LIMIT_INTERVAL - elapsed);
            }
        }
        self.last_request = Some(Instant::now());
    }

    /// Look up a package + version. Returns the advisory ids OSV knows
    /// for that version; an empty list means OSV has nothing on record.
    pub fn query(&mut self, package: &str, version: &str) -> Result<Vec<String>> {
        self.rate_limit();

        let url = format!("{OSV_API_BASE}/query");
        let body = serde_json::json!({
            "package": { "name": package },
            "version": version,
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .context("OSV API request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            bail!("OSV API error (HTTP {status}): {body}");
        }

        let json: serde_json::Value = resp.json().context("Failed to parse OSV response")?;
        Ok(parse_osv_response(&json))
    }
}

impl Default for OsvClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull the advisory ids out of an OSV v1 query response.
pub fn parse_osv_response(json: &serde_json::Value) -> Vec<String> {
    let mut ids: Vec<String> = json["vulns"]
        .as_array()
        .map(|vulns| {
            vulns
                .iter()
                .filter_map(|v| v["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    ids.sort();
    ids.dedup();
    ids
}
