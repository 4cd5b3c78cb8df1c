//! File triage and software identification.
//!
//! Identification is signature-driven: an ordered table of path regexes
//! maps a file to a product name and kind, and a second set of patterns
//! pulls a version out of the path. Triage (executable or not, worth
//! scanning or not) combines extension sets with magic-number sniffing.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static FILENAME_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v?(\d+(?:\.\d+)+)").expect("valid regex"));

const EXECUTABLE_EXTENSIONS: &[&str] = &[
    "exe", "sys", "scr", "msi", "cab", "elf", "so", "sh", "bin", "deb", "rpm", "jar", "class",
    "py", "pyc", "js",
];

const SAFE_EXTENSIONS: &[&str] = &[
    "txt", "log", "md", "json", "xml", "html", "css", "jpg", "jpeg", "png", "gif", "bmp", "svg",
    "mp3", "mp4", "wav", "avi",
];

/// Directories that never contain interesting targets.
pub const SKIPPED_DIRS: &[&str] = &[
    ".git",
    ".venv",
    ".vscode",
    "__pycache__",
    "node_modules",
    "target",
];

/// Coarse file type from the leading magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    WindowsExe,
    Elf,
    MachO,
    Script,
    Archive,
}

/// Sniff the file type from up to 8 leading bytes. `None` for unreadable,
/// short, or unrecognized files.
pub fn sniff_kind(path: &Path) -> Option<FileKind> {
    let mut header = [0u8; 8];
    let mut file = File::open(path).ok()?;
    let n = file.read(&mut header).ok()?;
    if n < 4 {
        return None;
    }
    let header = &header[..n];

    if header.starts_with(b"MZ") {
        return Some(FileKind::WindowsExe);
    }
    if header.starts_with(b"\x7fELF") {
        return Some(FileKind::Elf);
    }
    if header.starts_with(b"#!") {
        return Some(FileKind::Script);
    }
    if header.starts_with(b"PK\x03\x04") || header.starts_with(b"\x1f\x8b") {
        return Some(FileKind::Archive);
    }
    let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    if matches!(magic, 0xfeedface | 0xfeedfacf | 0xcafebabe | 0xbebafeca) {
        return Some(FileKind::MachO);
    }
    None
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Is this file worth checking? Executable extension, or executable magic.
pub fn is_executable(path: &Path) -> bool {
    if let Some(ext) = extension_of(path) {
        if EXECUTABLE_EXTENSIONS.contains(&ext.as_str()) {
            return true;
        }
    }
    matches!(
        sniff_kind(path),
        Some(FileKind::WindowsExe | FileKind::Elf | FileKind::MachO | FileKind::Script)
    )
}

/// Files the scanner skips outright: media/document extensions, hidden
/// entries, and vendor directories.
pub fn is_ignorable(path: &Path) -> bool {
    if let Some(ext) = extension_of(path) {
        if SAFE_EXTENSIONS.contains(&ext.as_str()) {
            return true;
        }
    }
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

/// Product identified from a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub software: &'static str,
    pub kind: &'static str,
    pub version: Option<String>,
}

// Ordered: product-specific signatures before the generic OS fallbacks.
const SIGNATURES: &[(&str, &str, &str)] = &[
    (r"(?i)firefox", "Firefox", "browser"),
    (r"(?i)chromium", "Chromium", "browser"),
    (r"(?i)chrome", "Google Chrome", "browser"),
    (r"(?i)opera", "Opera", "browser"),
    (r"(?i)python", "Python", "interpreter"),
    (r"(?i)jdk|jre|java", "Java Runtime", "interpreter"),
    (r"(?i)node", "Node.js", "interpreter"),
    (r"(?i)php", "PHP", "interpreter"),
    (r"(?i)adobe.?reader", "Adobe Reader", "application"),
    (r"(?i)7-?zip|7z\.exe", "7-Zip", "application"),
    (r"(?i)notepad\+\+", "Notepad++", "application"),
    (r"(?i)apache|httpd", "Apache", "web_server"),
    (r"(?i)nginx", "Nginx", "web_server"),
    (r"(?i)inetpub|inetsrv", "IIS", "web_server"),
    (r"(?i)mysql", "MySQL", "database"),
    (r"(?i)postgres|libpq", "PostgreSQL", "database"),
    (r"(?i)mongod?b?\b", "MongoDB", "database"),
    (r"(?i)openssl", "OpenSSL", "library"),
    (r"(?i)\bgit(\.exe)?\b", "Git", "vcs"),
    (r"(?i)docker", "Docker", "container"),
    // Generic OS paths last.
    (r"(?i)c:\\windows|program files", "Windows", "operating_system"),
    (r"^/usr/(bin|lib|sbin)/|^/lib/|^/etc/", "Linux", "operating_system"),
];

// Product-specific version idioms, tried before the generic patterns.
const PRODUCT_VERSION_PATTERNS: &[(&str, &str)] = &[
    (r"(?i)python", r"(?i)python[\\/ _-]?(\d)(\d)\b"),
    (r"(?i)jdk", r"(?i)jdk[_-]?(\d+(?:\.\d+)*)"),
    (r"(?i)firefox", r"(?i)firefox[ _-]?(\d+(?:\.\d+)*)"),
    (r"(?i)chrome", r"(?i)chrome[ _-]?(\d+(?:\.\d+)*)"),
];

const GENERIC_VERSION_PATTERNS: &[&str] = &[
    // \Product\1.2.3\ or /product/1.2.3/
    r"[\\/](\d+(?:\.\d+)+)[\\/]",
    // name-v1.2.3 or name_1.2.3
    r"[_-]v?(\d+(?:\.\d+)+)",
];

/// Identifies software name, kind, and version from filesystem paths.
pub struct SoftwareDetector {
    signatures: Vec<(Regex, &'static str, &'static str)>,
    product_versions: Vec<(Regex, Regex)>,
    generic_versions: Vec<Regex>,
}

impl SoftwareDetector {
    pub fn new() -> Self {
        Self {
            signatures: SIGNATURES
                .iter()
                .map(|(pat, name, kind)| (Regex::new(pat).expect("valid regex"), *name, *kind))
                .collect(),
            product_versions: PRODUCT_VERSION_PATTERNS
                .iter()
                .map(|(product, version)| {
                    (
                        Regex::new(product).expect("valid regex"),
                        Regex::new(version).expect("valid regex"),
                    )
                })
                .collect(),
            generic_versions: GENERIC_VERSION_PATTERNS
                .iter()
                .map(|pat| Regex::new(pat).expect("valid regex"))
                .collect(),
        }
    }

    /// First signature hit wins, so specific products shadow the OS
    /// fallbacks.
    pub fn identify(&self, path: &str) -> Option<(&'static str, &'static str)> {
        self.signatures
            .iter()
            .find(|(re, _, _)| re.is_match(path))
            .map(|(_, name, kind)| (*name, *kind))
    }

    pub fn version_from_path(&self, path: &str) -> Option<String> {
        for (product, version) in &self.product_versions {
            if !product.is_match(path) {
                continue;
            }
            if let Some(caps) = version.captures(path) {
                // Two capture groups means a squashed form like "python27".
                if let (Some(major), Some(minor)) = (caps.get(1), caps.get(2)) {
                    return Some(format!("{}.{}", major.as_str(), minor.as_str()));
                }
                return Some(caps[1].to_string());
            }
        }

        for re in &self.generic_versions {
            if let Some(caps) = re.captures(path) {
                return Some(caps[1].to_string());
            }
        }

        // Last resort: a version-like token in the file name.
        let name = Path::new(path).file_name()?.to_string_lossy();
        FILENAME_VERSION_RE
            .captures(&name)
            .map(|caps| caps[1].to_string())
    }

    /// Identify the product and pull a version when one is recognizable.
    pub fn detect(&self, path: &str) -> Option<Detection> {
        let (software, kind) = self.identify(path)?;
        Some(Detection {
            software,
            kind,
            version: self.version_from_path(path),
        })
    }
}

impl Default for SoftwareDetector {
    fn default() -> Self {
        Self::new()
    }
}
