//! The specification database seen by the condition compiler.
//!
//! Expansion needs three facts from the database: which concrete versions
//! of an extension exist, what each version requires, and what a parameter
//! requires in order to be defined at all.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use udb_logic::{parse_version, Version};

use crate::clause::Clause;
use crate::error::Result;

/// Source of extension and parameter facts.
pub trait SpecDatabase: Send + Sync {
    /// Every defined version of extension `name`, ascending. Empty when the
    /// extension is unknown.
    fn extension_versions(&self, name: &str) -> Vec<Version>;

    /// What extension `name` at exactly `version` requires, if anything.
    fn extension_requirements(&self, name: &str, version: &Version) -> Option<Clause>;

    /// What must hold for parameter `name` to be defined, if anything.
    fn parameter_requirements(&self, name: &str) -> Option<Clause>;
}

/// A database held entirely in memory.
///
/// The JSON form is:
///
/// ```json
/// {
///   "extensions": {
///     "Zcd": { "versions": { "1.0": { "requires": { "extension": { "name": "D" } } } } }
///   },
///   "parameters": {
///     "MTVAL_WIDTH": { "requires": { "extension": { "name": "Sm" } } }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    extensions: BTreeMap<String, BTreeMap<Version, Option<Clause>>>,
    parameters: BTreeMap<String, Clause>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDatabase {
    #[serde(default)]
    extensions: BTreeMap<String, RawExtension>,
    #[serde(default)]
    parameters: BTreeMap<String, RawParameter>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExtension {
    versions: BTreeMap<String, RawVersion>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawVersion {
    #[serde(default)]
    requires: Option<Clause>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawParameter {
    requires: Clause,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a version of an extension, with its requirement if it has one.
    pub fn with_extension(
        mut self,
        name: impl Into<String>,
        version: Version,
        requires: Option<Clause>,
    ) -> Self {
        self.extensions
            .entry(name.into())
            .or_default()
            .insert(version, requires);
        self
    }

    /// Add a parameter that is only defined when `requires` holds.
    pub fn with_parameter(mut self, name: impl Into<String>, requires: Clause) -> Self {
        self.parameters.insert(name.into(), requires);
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: RawDatabase = serde_json::from_str(text)?;
        let mut db = Self::new();
        for (name, ext) in raw.extensions {
            for (version, body) in ext.versions {
                db = db.with_extension(name.clone(), parse_version(&version)?, body.requires);
            }
        }
        for (name, param) in raw.parameters {
            db = db.with_parameter(name, param.requires);
        }
        Ok(db)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

impl SpecDatabase for InMemoryDatabase {
    fn extension_versions(&self, name: &str) -> Vec<Version> {
        self.extensions
            .get(name)
            .map(|versions| versions.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn extension_requirements(&self, name: &str, version: &Version) -> Option<Clause> {
        self.extensions.get(name)?.get(version)?.clone()
    }

    fn parameter_requirements(&self, name: &str) -> Option<Clause> {
        self.parameters.get(name).cloned()
    }
}
