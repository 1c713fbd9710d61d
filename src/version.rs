//! Version extraction and compatibility gating.
//!
//! The orchestration commands and their output shapes are coupled to one
//! known-good tool version, so the gate is strict equality rather than a
//! range check: older and newer both report as unsupported.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// The single tool version this layer is known to work against.
pub const SUPPORTED_VERSION: ToolVersion = ToolVersion {
    major: 0,
    minor: 6,
    patch: 0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ToolVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl ToolVersion {
    pub fn is_supported(&self) -> bool {
        *self == SUPPORTED_VERSION
    }
}

fn banner_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"version\s+v?(\d+)\.(\d+)(?:\.(\d+))?").unwrap())
}

/// Extract a `major.minor.patch` candidate from a free-text version banner.
///
/// Primary: match the `version X.Y[.Z]` phrase anywhere in the text.
/// Fallback: scan whitespace tokens for one shaped like a dotted version.
/// Missing trailing components are treated as zero.
pub fn extract_version(banner: &str) -> Option<ToolVersion> {
    if let Some(captures) = banner_pattern().captures(banner) {
        return Some(ToolVersion {
            major: captures[1].parse().ok()?,
            minor: captures[2].parse().ok()?,
            patch: captures
                .get(3)
                .map_or(Some(0), |m| m.as_str().parse().ok())?,
        });
    }

    banner
        .split_whitespace()
        .find_map(|token| parse_dotted(token.trim_start_matches('v')))
}

fn parse_dotted(token: &str) -> Option<ToolVersion> {
    let mut parts = token.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = match parts.next() {
        Some(part) => part.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(ToolVersion { major, minor, patch })
}
