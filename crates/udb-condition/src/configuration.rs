//! What a configuration knows, and how it answers term queries.
//!
//! A fully specified configuration lists everything it implements, so any
//! fact it does not mention is false. A partially specified one lists what
//! is mandatory and what is prohibited; everything in between is unknown.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use udb_logic::{
    ExtensionFact, ExtensionTerm, ParamValue, SatisfiedResult, Term, Version, Xlen,
};

use crate::database::SpecDatabase;
use crate::error::Result;

const BOTH_XLENS: [Xlen; 2] = [Xlen::Rv32, Xlen::Rv64];

/// A fully specified configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullConfig {
    /// Implemented extensions and their versions.
    #[serde(default)]
    pub extensions: BTreeMap<String, Version>,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
    /// `None` when the hart can run at either width.
    #[serde(default)]
    pub xlen: Option<Xlen>,
}

/// A partially specified configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialConfig {
    #[serde(default)]
    pub mandatory: Vec<ExtensionTerm>,
    #[serde(default)]
    pub prohibited: Vec<ExtensionTerm>,
    /// Parameters whose value is already fixed.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
    /// XLENs still possible; empty means either.
    #[serde(default)]
    pub possible_xlens: Vec<Xlen>,
}

/// Knowledge about a target, used for three-valued evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Configuration {
    /// Nothing is known.
    #[default]
    Unconfigured,
    Partial(PartialConfig),
    Full(FullConfig),
}

impl Configuration {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Configuration::Unconfigured => "unconfigured",
            Configuration::Partial(_) => "partial",
            Configuration::Full(_) => "full",
        }
    }

    /// The value of one term under this configuration.
    pub fn evaluate_term(&self, term: &Term, db: &dyn SpecDatabase) -> SatisfiedResult {
        match self {
            Configuration::Unconfigured => SatisfiedResult::Maybe,
            Configuration::Full(cfg) => cfg.evaluate_term(term),
            Configuration::Partial(cfg) => cfg.evaluate_term(term, db),
        }
    }

    /// The known value of parameter `name`, if any.
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        match self {
            Configuration::Unconfigured => None,
            Configuration::Partial(cfg) => cfg.params.get(name),
            Configuration::Full(cfg) => cfg.params.get(name),
        }
    }
}

impl FullConfig {
    fn evaluate_term(&self, term: &Term) -> SatisfiedResult {
        match term {
            Term::Extension(ext) => {
                let fact = match self.extensions.get(&ext.name) {
                    Some(version) => ExtensionFact::Implemented(version),
                    None => ExtensionFact::Absent,
                };
                ext.evaluate(fact)
            }
            Term::Parameter(param) => match self.params.get(&param.name) {
                Some(value) => param.evaluate(Some(value)),
                None => SatisfiedResult::No,
            },
            Term::Xlen(xlen) => match self.xlen {
                Some(fixed) => xlen.evaluate(&[fixed]),
                None => xlen.evaluate(&BOTH_XLENS),
            },
            Term::Free(_) => SatisfiedResult::Maybe,
        }
    }
}

impl PartialConfig {
    fn evaluate_term(&self, term: &Term, db: &dyn SpecDatabase) -> SatisfiedResult {
        match term {
            Term::Extension(ext) => self.evaluate_extension(ext, db),
            Term::Parameter(param) => param.evaluate(self.params.get(&param.name)),
            Term::Xlen(xlen) if self.possible_xlens.is_empty() => xlen.evaluate(&BOTH_XLENS),
            Term::Xlen(xlen) => xlen.evaluate(&self.possible_xlens),
            Term::Free(_) => SatisfiedResult::Maybe,
        }
    }

    fn evaluate_extension(&self, ext: &ExtensionTerm, db: &dyn SpecDatabase) -> SatisfiedResult {
        let known = db.extension_versions(&ext.name);
        if known.is_empty() {
            // no version list to reason over; only syntactic matches count
            if self.mandatory.contains(ext) {
                return SatisfiedResult::Yes;
            }
            if self.prohibited.contains(ext) {
                return SatisfiedResult::No;
            }
            return SatisfiedResult::Maybe;
        }

        let wanted = ext.satisfying_versions(&known);
        if wanted.is_empty() {
            return SatisfiedResult::No;
        }
        let same_name = |list: &[ExtensionTerm]| -> Vec<Vec<Version>> {
            list.iter()
                .filter(|other| other.name == ext.name)
                .map(|other| other.satisfying_versions(&known))
                .collect()
        };

        for allowed in same_name(&self.mandatory) {
            if allowed.is_empty() {
                continue;
            }
            if allowed.iter().all(|v| wanted.contains(v)) {
                return SatisfiedResult::Yes;
            }
            if allowed.iter().all(|v| !wanted.contains(v)) {
                return SatisfiedResult::No;
            }
        }
        for banned in same_name(&self.prohibited) {
            if wanted.iter().all(|v| banned.contains(v)) {
                return SatisfiedResult::No;
            }
        }
        SatisfiedResult::Maybe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryDatabase;
    use udb_logic::{ParamComparison, ParamScope, ParameterTerm, VersionOp};

    fn db() -> InMemoryDatabase {
        InMemoryDatabase::new()
            .with_extension("A", Version::new(1, 0, 0), None)
            .with_extension("A", Version::new(2, 0, 0), None)
            .with_extension("B", Version::new(1, 0, 0), None)
    }

    fn ext(name: &str, op: VersionOp, major: u64) -> Term {
        Term::Extension(ExtensionTerm::new(name, op, Version::new(major, 0, 0)))
    }

    fn param_eq(name: &str, value: i64) -> Term {
        Term::Parameter(ParameterTerm::new(
            name,
            ParamScope::Value,
            ParamComparison::Equal(ParamValue::Int(value)),
        ))
    }

    #[test]
    fn unconfigured_is_always_maybe() {
        let cfg = Configuration::Unconfigured;
        assert_eq!(cfg.evaluate_term(&ext("A", VersionOp::Ge, 0), &db()), SatisfiedResult::Maybe);
        assert_eq!(cfg.evaluate_term(&Term::Xlen(Xlen::Rv64), &db()), SatisfiedResult::Maybe);
    }

    #[test]
    fn full_config_treats_missing_facts_as_false() {
        let cfg = Configuration::Full(FullConfig {
            extensions: [("A".to_string(), Version::new(2, 0, 0))].into(),
            params: [("MXLEN".to_string(), ParamValue::Int(64))].into(),
            xlen: Some(Xlen::Rv64),
        });
        let db = db();
        assert_eq!(cfg.evaluate_term(&ext("A", VersionOp::Ge, 2), &db), SatisfiedResult::Yes);
        assert_eq!(cfg.evaluate_term(&ext("A", VersionOp::Eq, 1), &db), SatisfiedResult::No);
        assert_eq!(cfg.evaluate_term(&ext("B", VersionOp::Ge, 0), &db), SatisfiedResult::No);
        assert_eq!(cfg.evaluate_term(&param_eq("MXLEN", 64), &db), SatisfiedResult::Yes);
        assert_eq!(cfg.evaluate_term(&param_eq("SXLEN", 64), &db), SatisfiedResult::No);
        assert_eq!(cfg.evaluate_term(&Term::Xlen(Xlen::Rv32), &db), SatisfiedResult::No);
    }

    #[test]
    fn partial_config_version_reasoning() {
        let cfg = Configuration::Partial(PartialConfig {
            mandatory: vec![ExtensionTerm::new("A", VersionOp::Ge, Version::new(2, 0, 0))],
            prohibited: vec![ExtensionTerm::any("B")],
            ..PartialConfig::default()
        });
        let db = db();
        assert_eq!(cfg.evaluate_term(&ext("A", VersionOp::Ge, 1), &db), SatisfiedResult::Yes);
        assert_eq!(cfg.evaluate_term(&ext("A", VersionOp::Eq, 1), &db), SatisfiedResult::No);
        assert_eq!(cfg.evaluate_term(&ext("B", VersionOp::Ge, 0), &db), SatisfiedResult::No);
        // no such version exists
        assert_eq!(cfg.evaluate_term(&ext("B", VersionOp::Ge, 5), &db), SatisfiedResult::No);
        assert_eq!(cfg.evaluate_term(&param_eq("MXLEN", 64), &db), SatisfiedResult::Maybe);
        assert_eq!(cfg.evaluate_term(&Term::Xlen(Xlen::Rv32), &db), SatisfiedResult::Maybe);
    }

    #[test]
    fn partial_config_without_version_list() {
        let cfg = PartialConfig {
            mandatory: vec![ExtensionTerm::any("Q")],
            possible_xlens: vec![Xlen::Rv64],
            ..PartialConfig::default()
        };
        let empty = InMemoryDatabase::new();
        let q = Term::Extension(ExtensionTerm::any("Q"));
        assert_eq!(cfg.evaluate_term(&q, &empty), SatisfiedResult::Yes);
        assert_eq!(cfg.evaluate_term(&Term::Xlen(Xlen::Rv64), &empty), SatisfiedResult::Yes);
        assert_eq!(cfg.evaluate_term(&Term::Xlen(Xlen::Rv32), &empty), SatisfiedResult::No);
    }

    #[test]
    fn loads_from_json() {
        let cfg = Configuration::from_json_str(
            r#"{ "type": "full", "extensions": { "A": "1.0.0" }, "xlen": "Rv64" }"#,
        )
        .unwrap();
        assert_eq!(cfg.kind(), "full");
        assert_eq!(
            cfg.evaluate_term(&ext("A", VersionOp::Eq, 1), &db()),
            SatisfiedResult::Yes
        );
        assert_eq!(Configuration::from_json_str(r#"{ "type": "unconfigured" }"#).unwrap(), Configuration::Unconfigured);
    }
}
