//! Installed-package inventory via the system package manager.
//!
//! Queries `dpkg-query` first and falls back to `rpm`. Either tool's
//! output is a name/version pair per line, tab-separated. On systems with
//! neither manager the query fails with [`CoreError::Inventory`] and the
//! caller decides how loudly to report that.

use std::process::Command;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::CoreError;

/// One entry of the system package inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    /// Which manager reported the package ("dpkg" or "rpm").
    pub origin: String,
}

/// Parse `name\tversion` lines into packages. Lines without both fields
/// are dropped.
pub fn parse_package_lines(output: &str, origin: &str) -> Vec<InstalledPackage> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let name = fields.next()?.trim();
            let version = fields.next()?.trim();
            if name.is_empty() || version.is_empty() {
                return None;
            }
            Some(InstalledPackage {
                name: name.to_string(),
                version: version.to_string(),
                origin: origin.to_string(),
            })
        })
        .collect()
}

fn query(program: &str, args: &[&str], origin: &str) -> Option<Vec<InstalledPackage>> {
    let output = match Command::new(program).args(args).output() {
        Ok(output) => output,
        Err(e) => {
            debug!(program, %e, "package manager not usable");
            return None;
        }
    };
    if !output.status.success() {
        debug!(program, status = %output.status, "package manager query failed");
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Some(parse_package_lines(&stdout, origin))
}

/// List installed packages from the first usable package manager.
pub fn list_installed() -> Result<Vec<InstalledPackage>, CoreError> {
    if let Some(packages) = query(
        "dpkg-query",
        &["-W", "-f", "${Package}\\t${Version}\\n"],
        "dpkg",
    ) {
        info!(count = packages.len(), "inventory listed via dpkg");
        return Ok(packages);
    }
    if let Some(packages) = query("rpm", &["-qa", "--qf", "%{NAME}\\t%{VERSION}\\n"], "rpm") {
        info!(count = packages.len(), "inventory listed via rpm");
        return Ok(packages);
    }
    Err(CoreError::Inventory(
        "no supported package manager found (tried dpkg-query, rpm)".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tab_separated_lines() {
        let out = "openssl\t3.0.13\nfirefox\t115.0\n";
        let packages = parse_package_lines(out, "dpkg");
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "openssl");
        assert_eq!(packages[0].version, "3.0.13");
        assert_eq!(packages[0].origin, "dpkg");
    }

    #[test]
    fn drops_incomplete_lines() {
        let out = "good\t1.0\nno-version\n\t2.0\n\n";
        let packages = parse_package_lines(out, "rpm");
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "good");
    }

    #[test]
    fn empty_output_is_empty_inventory() {
        assert!(parse_package_lines("", "dpkg").is_empty());
    }
}
