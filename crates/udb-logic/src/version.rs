//! Extension versions and version-requirement operators.
//!
//! Wraps the `semver` crate. Specification versions are frequently written
//! with two components (`"2.1"`), so parsing pads missing components with
//! zeros before handing off to semver.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A parsed extension version.
pub type Version = semver::Version;

/// Comparison operator of an extension version requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VersionOp {
    /// `=`
    Eq,
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `<`
    Lt,
    /// `~>`: at least the given version, within the same major version.
    Compatible,
}

impl VersionOp {
    /// The operator glyph used in declarative requirement strings.
    pub fn symbol(&self) -> &'static str {
        match self {
            VersionOp::Eq => "=",
            VersionOp::Ge => ">=",
            VersionOp::Gt => ">",
            VersionOp::Le => "<=",
            VersionOp::Lt => "<",
            VersionOp::Compatible => "~>",
        }
    }

    /// Whether `candidate` satisfies `self base`.
    pub fn matches(&self, candidate: &Version, base: &Version) -> bool {
        match self {
            VersionOp::Eq => candidate == base,
            VersionOp::Ge => candidate >= base,
            VersionOp::Gt => candidate > base,
            VersionOp::Le => candidate <= base,
            VersionOp::Lt => candidate < base,
            VersionOp::Compatible => candidate >= base && candidate.major == base.major,
        }
    }
}

impl fmt::Display for VersionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for VersionOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" | "==" => Ok(VersionOp::Eq),
            ">=" => Ok(VersionOp::Ge),
            ">" => Ok(VersionOp::Gt),
            "<=" => Ok(VersionOp::Le),
            "<" => Ok(VersionOp::Lt),
            "~>" => Ok(VersionOp::Compatible),
            other => Err(format!("unknown version operator '{other}'")),
        }
    }
}

/// Parse a version string like `"1.2.3"` or `"2.1"`.
pub fn parse_version(s: &str) -> Result<Version, semver::Error> {
    let s = s.trim();
    let (core, suffix) = match s.find(['-', '+']) {
        Some(idx) => s.split_at(idx),
        None => (s, ""),
    };
    let parts = core.split('.').count();
    let padded = match parts {
        1 => format!("{core}.0.0{suffix}"),
        2 => format!("{core}.0{suffix}"),
        _ => s.to_string(),
    };
    Version::parse(&padded)
}

/// Parse a requirement like `">= 1.0"`, `"~> 2.1"`, or a bare `"1.0"`
/// (which means exactly that version).
pub fn parse_requirement(s: &str) -> Result<(VersionOp, Version), RequirementError> {
    let s = s.trim();
    let op_len = s
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| RequirementError::MissingVersion(s.to_string()))?;
    let (op_str, version_str) = s.split_at(op_len);
    let op_str = op_str.trim();
    let op = if op_str.is_empty() {
        VersionOp::Eq
    } else {
        op_str
            .parse::<VersionOp>()
            .map_err(RequirementError::UnknownOperator)?
    };
    let version = parse_version(version_str).map_err(RequirementError::Version)?;
    Ok((op, version))
}

/// Why a requirement string could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum RequirementError {
    #[error("requirement '{0}' has no version")]
    MissingVersion(String),

    #[error("{0}")]
    UnknownOperator(String),

    #[error("invalid version: {0}")]
    Version(#[from] semver::Error),
}
