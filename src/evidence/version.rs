//! Version Resolver
//!
//! Suggests the next evidence version when files are uploaded against an
//! existing group. Same files bump the patch, anything else bumps the major.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConsoleError;

lazy_static! {
    static ref SEMVER: Regex = Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").unwrap();
    static ref KNOWN_EXTENSION: Regex = Regex::new(r"(?i)\.(pdf|png|jpg|jpeg|gif)$").unwrap();
}

/// Used whenever the previous version cannot be parsed.
pub const DEFAULT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVer {
    pub const INITIAL: SemVer = SemVer { major: 1, minor: 0, patch: 0 };

    /// Strict `MAJOR.MINOR.PATCH`; no whitespace, prefixes, or suffixes.
    pub fn parse(input: &str) -> Option<Self> {
        let caps = SEMVER.captures(input)?;
        Some(Self {
            major: caps[1].parse().ok()?,
            minor: caps[2].parse().ok()?,
            patch: caps[3].parse().ok()?,
        })
    }

    pub fn bump(self, kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Patch => Self { patch: self.patch.saturating_add(1), ..self },
            ChangeKind::Major => Self { major: self.major.saturating_add(1), minor: 0, patch: 0 },
        }
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl TryFrom<String> for SemVer {
    type Error = ConsoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SemVer::parse(&value).ok_or_else(|| {
            ConsoleError::validation("version", format!("'{}' is not MAJOR.MINOR.PATCH", value))
        })
    }
}

impl From<SemVer> for String {
    fn from(version: SemVer) -> Self {
        version.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Same content re-uploaded.
    Patch,
    /// Content changed.
    Major,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResolution {
    pub version: String,
    pub is_auto: bool,
    pub reason: String,
    pub kind: ChangeKind,
}

/// Lower-case, trim, and drop one trailing image/pdf extension.
pub fn normalize_file_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let trimmed = lowered.trim();
    KNOWN_EXTENSION.replace(trimmed, "").into_owned()
}

fn sorted_normalized<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = names.iter().map(|n| normalize_file_name(n.as_ref())).collect();
    normalized.sort();
    normalized
}

/// Equal count, and the independently sorted normalized lists match.
pub fn same_files<A: AsRef<str>, B: AsRef<str>>(previous: &[A], new: &[B]) -> bool {
    previous.len() == new.len() && sorted_normalized(previous) == sorted_normalized(new)
}

/// Falls back to `1.0.0` for any input that is not `MAJOR.MINOR.PATCH`,
/// whichever bump was requested.
pub fn increment_version(version: &str, kind: ChangeKind) -> String {
    match SemVer::parse(version) {
        Some(parsed) => parsed.bump(kind).to_string(),
        None => DEFAULT_VERSION.to_string(),
    }
}

pub fn resolve_next_version<A: AsRef<str>, B: AsRef<str>>(
    latest_version: &str,
    latest_file_names: &[A],
    new_files: &[B],
) -> VersionResolution {
    if same_files(latest_file_names, new_files) {
        let version = increment_version(latest_version, ChangeKind::Patch);
        let names = sorted_normalized(new_files).join(", ");
        VersionResolution {
            reason: format!(
                "Same file names detected ({}): version {} -> {}",
                names, latest_version, version
            ),
            version,
            is_auto: true,
            kind: ChangeKind::Patch,
        }
    } else {
        let version = increment_version(latest_version, ChangeKind::Major);
        VersionResolution {
            reason: format!(
                "Files changed from [{}] to [{}]: version {} -> {}",
                sorted_normalized(latest_file_names).join(", "),
                sorted_normalized(new_files).join(", "),
                latest_version,
                version
            ),
            version,
            is_auto: true,
            kind: ChangeKind::Major,
        }
    }
}
