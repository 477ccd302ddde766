//! Declarative clause trees.
//!
//! Conditions are written as nested mappings. Each mapping holds exactly one
//! clause key, except `if`, which is always paired with `then`. Parsing is
//! strict: an unknown key or a mis-shaped body is an error, never ignored.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use udb_logic::{parse_requirement, ParamComparison, ParamScope, ParamValue, ParameterTerm, Xlen};

use crate::error::{ConditionError, Result};

/// One node of a declarative condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Clause {
    /// Literal `true` / `false`.
    Bool(bool),
    AllOf(Vec<Clause>),
    AnyOf(Vec<Clause>),
    /// Exactly one of the listed clauses holds.
    OneOf(Vec<Clause>),
    /// None of the listed clauses hold.
    NoneOf(Vec<Clause>),
    Not(Box<Clause>),
    If {
        condition: Box<Clause>,
        then: Box<Clause>,
    },
    /// Extension `name` is implemented, at a version satisfying `version`
    /// when one is given.
    Extension {
        name: String,
        version: Option<String>,
    },
    Param(ParameterTerm),
    Xlen(Xlen),
}

impl Clause {
    /// Any version of extension `name`.
    pub fn extension(name: impl Into<String>) -> Self {
        Clause::Extension {
            name: name.into(),
            version: None,
        }
    }

    /// Extension `name` at a version satisfying `requirement`, e.g. `">= 1.0"`.
    pub fn extension_version(name: impl Into<String>, requirement: impl Into<String>) -> Self {
        Clause::Extension {
            name: name.into(),
            version: Some(requirement.into()),
        }
    }

    pub fn negate(clause: Clause) -> Self {
        Clause::Not(Box::new(clause))
    }

    pub fn implies(condition: Clause, then: Clause) -> Self {
        Clause::If {
            condition: Box::new(condition),
            then: Box::new(then),
        }
    }

    /// Parse a clause from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Parse a clause from an already-decoded value.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(Clause::Bool(*b)),
            Value::Object(map) => Self::from_map(map),
            other => Err(ConditionError::MalformedClause(format!(
                "expected a mapping or boolean, got {other}"
            ))),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Result<Self> {
        if map.contains_key("if") || map.contains_key("then") {
            return Self::from_if(map);
        }
        let mut entries = map.iter();
        let (key, body) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            (None, _) => {
                return Err(ConditionError::MalformedClause(
                    "empty clause mapping".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                return Err(ConditionError::MalformedClause(format!(
                    "clause has more than one key: {}",
                    keys.join(", ")
                )));
            }
        };
        match key.as_str() {
            "allOf" => Ok(Clause::AllOf(clause_list(key, body)?)),
            "anyOf" => Ok(Clause::AnyOf(clause_list(key, body)?)),
            "oneOf" => Ok(Clause::OneOf(clause_list(key, body)?)),
            "noneOf" => Ok(Clause::NoneOf(clause_list(key, body)?)),
            "not" => Ok(Clause::negate(Self::from_value(body)?)),
            "extension" => extension_clause(body),
            "param" => param_clause(body),
            "xlen" => xlen_clause(body),
            other => Err(ConditionError::UnknownClauseKey(other.to_string())),
        }
    }

    fn from_if(map: &Map<String, Value>) -> Result<Self> {
        if let Some(key) = map.keys().find(|k| *k != "if" && *k != "then") {
            return Err(ConditionError::UnknownClauseKey(key.clone()));
        }
        let condition = map
            .get("if")
            .ok_or_else(|| ConditionError::MalformedClause("'then' without 'if'".to_string()))?;
        let then = map
            .get("then")
            .ok_or_else(|| ConditionError::MalformedClause("'if' without 'then'".to_string()))?;
        Ok(Clause::implies(
            Self::from_value(condition)?,
            Self::from_value(then)?,
        ))
    }

    /// The declarative mapping form of this clause.
    pub fn to_value(&self) -> Value {
        let list = |cs: &[Clause]| Value::Array(cs.iter().map(Clause::to_value).collect());
        match self {
            Clause::Bool(b) => Value::Bool(*b),
            Clause::AllOf(cs) => json!({ "allOf": list(cs) }),
            Clause::AnyOf(cs) => json!({ "anyOf": list(cs) }),
            Clause::OneOf(cs) => json!({ "oneOf": list(cs) }),
            Clause::NoneOf(cs) => json!({ "noneOf": list(cs) }),
            Clause::Not(c) => json!({ "not": c.to_value() }),
            Clause::If { condition, then } => {
                json!({ "if": condition.to_value(), "then": then.to_value() })
            }
            Clause::Extension { name, version } => {
                let mut body = Map::new();
                body.insert("name".into(), json!(name));
                if let Some(version) = version {
                    body.insert("version".into(), json!(version));
                }
                json!({ "extension": Value::Object(body) })
            }
            Clause::Param(param) => param.to_declarative(),
            Clause::Xlen(xlen) => json!({ "xlen": xlen.bits() }),
        }
    }
}

fn clause_list(key: &str, body: &Value) -> Result<Vec<Clause>> {
    let items = body
        .as_array()
        .ok_or_else(|| ConditionError::MalformedClause(format!("'{key}' expects a list")))?;
    if items.is_empty() {
        return Err(ConditionError::MalformedClause(format!(
            "'{key}' needs at least one clause"
        )));
    }
    items.iter().map(Clause::from_value).collect()
}

fn extension_clause(body: &Value) -> Result<Clause> {
    let map = body
        .as_object()
        .ok_or_else(|| ConditionError::MalformedClause("'extension' expects a mapping".into()))?;
    if let Some(key) = map.keys().find(|k| *k != "name" && *k != "version") {
        return Err(ConditionError::UnknownClauseKey(format!("extension.{key}")));
    }
    let name = map
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ConditionError::MalformedClause("extension needs a string 'name'".into()))?;
    let version = match map.get("version") {
        None => None,
        Some(Value::String(requirement)) => {
            parse_requirement(requirement).map_err(|source| ConditionError::InvalidVersion {
                requirement: requirement.clone(),
                source,
            })?;
            Some(requirement.clone())
        }
        Some(other) => {
            return Err(ConditionError::MalformedClause(format!(
                "extension version must be a string, got {other}"
            )))
        }
    };
    Ok(Clause::Extension {
        name: name.to_string(),
        version,
    })
}

fn param_clause(body: &Value) -> Result<Clause> {
    let map = body
        .as_object()
        .ok_or_else(|| ConditionError::MalformedClause("'param' expects a mapping".into()))?;
    let name = map
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ConditionError::MalformedClause("param needs a string 'name'".into()))?;

    let mut scope = ParamScope::Value;
    let mut comparison = None;
    for (key, value) in map {
        match key.as_str() {
            "name" => {}
            "index" => {
                let index = value
                    .as_u64()
                    .and_then(|i| usize::try_from(i).ok())
                    .ok_or_else(|| {
                        ConditionError::MalformedClause(format!(
                            "param index must be a non-negative integer, got {value}"
                        ))
                    })?;
                set_scope(&mut scope, ParamScope::Index(index))?;
            }
            "size" => match value {
                Value::Bool(true) => set_scope(&mut scope, ParamScope::Size)?,
                other => {
                    return Err(ConditionError::MalformedClause(format!(
                        "param size must be true, got {other}"
                    )))
                }
            },
            other => {
                if comparison.replace(param_comparison(other, value)?).is_some() {
                    return Err(ConditionError::MalformedClause(format!(
                        "param '{name}' has more than one comparison"
                    )));
                }
            }
        }
    }
    let comparison = comparison.ok_or_else(|| {
        ConditionError::MalformedClause(format!("param '{name}' has no comparison"))
    })?;
    Ok(Clause::Param(ParameterTerm::new(name, scope, comparison)))
}

fn set_scope(scope: &mut ParamScope, new: ParamScope) -> Result<()> {
    if *scope != ParamScope::Value {
        return Err(ConditionError::MalformedClause(
            "param cannot have both 'index' and 'size'".to_string(),
        ));
    }
    *scope = new;
    Ok(())
}

fn param_comparison(key: &str, value: &Value) -> Result<ParamComparison> {
    let int = || {
        value.as_i64().ok_or_else(|| {
            ConditionError::MalformedClause(format!("'{key}' expects an integer, got {value}"))
        })
    };
    let operand = || serde_json::from_value::<ParamValue>(value.clone()).map_err(ConditionError::from);
    match key {
        "equal" => Ok(ParamComparison::Equal(operand()?)),
        "not_equal" => Ok(ParamComparison::NotEqual(operand()?)),
        "less_than" => Ok(ParamComparison::LessThan(int()?)),
        "greater_than" => Ok(ParamComparison::GreaterThan(int()?)),
        "less_than_or_equal" => Ok(ParamComparison::LessThanOrEqual(int()?)),
        "greater_than_or_equal" => Ok(ParamComparison::GreaterThanOrEqual(int()?)),
        "includes" => Ok(ParamComparison::Includes(operand()?)),
        "oneOf" => match value {
            Value::Array(items) => Ok(ParamComparison::OneOf(
                items
                    .iter()
                    .map(|item| serde_json::from_value::<ParamValue>(item.clone()))
                    .collect::<std::result::Result<_, _>>()?,
            )),
            other => Err(ConditionError::MalformedClause(format!(
                "'oneOf' expects a list of values, got {other}"
            ))),
        },
        other => Err(ConditionError::UnknownClauseKey(format!("param.{other}"))),
    }
}

fn xlen_clause(body: &Value) -> Result<Clause> {
    let bits = body.as_i64().ok_or_else(|| {
        ConditionError::MalformedClause(format!("'xlen' expects an integer, got {body}"))
    })?;
    Xlen::from_bits(bits)
        .map(Clause::Xlen)
        .ok_or(ConditionError::InvalidXlen(bits))
}

impl TryFrom<Value> for Clause {
    type Error = ConditionError;

    fn try_from(value: Value) -> Result<Self> {
        Clause::from_value(&value)
    }
}

impl From<Clause> for Value {
    fn from(clause: Clause) -> Self {
        clause.to_value()
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Clause> {
        Clause::from_json_str(text)
    }

    #[test]
    fn parses_nested_junctions() {
        let clause = parse(
            r#"{ "allOf": [
                { "extension": { "name": "Zba" } },
                { "anyOf": [ { "extension": { "name": "Zbb", "version": ">= 1.0" } }, { "xlen": 64 } ] },
                { "not": { "extension": { "name": "Zbc" } } }
            ] }"#,
        )
        .unwrap();
        assert_eq!(
            clause,
            Clause::AllOf(vec![
                Clause::extension("Zba"),
                Clause::AnyOf(vec![
                    Clause::extension_version("Zbb", ">= 1.0"),
                    Clause::Xlen(Xlen::Rv64),
                ]),
                Clause::negate(Clause::extension("Zbc")),
            ])
        );
    }

    #[test]
    fn parses_if_then_and_literals() {
        let clause = parse(r#"{ "if": { "xlen": 32 }, "then": false }"#).unwrap();
        assert_eq!(
            clause,
            Clause::implies(Clause::Xlen(Xlen::Rv32), Clause::Bool(false))
        );
        assert_eq!(parse("true").unwrap(), Clause::Bool(true));
    }

    #[test]
    fn parses_param_scopes() {
        let clause = parse(r#"{ "param": { "name": "PMP_GRAIN", "less_than": 4, "index": 2 } }"#).unwrap();
        assert_eq!(
            clause,
            Clause::Param(ParameterTerm::new(
                "PMP_GRAIN",
                ParamScope::Index(2),
                ParamComparison::LessThan(4)
            ))
        );
        let size = parse(r#"{ "param": { "name": "HPM", "size": true, "equal": 29 } }"#).unwrap();
        assert!(matches!(size, Clause::Param(ref p) if p.scope == ParamScope::Size));
        let one_of = parse(r#"{ "param": { "name": "MXLEN", "oneOf": [64, 32] } }"#).unwrap();
        assert_eq!(
            one_of,
            Clause::Param(ParameterTerm::new(
                "MXLEN",
                ParamScope::Value,
                ParamComparison::OneOf(vec![ParamValue::Int(32), ParamValue::Int(64)])
            ))
        );
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            parse(r#"{ "someOf": [true] }"#),
            Err(ConditionError::UnknownClauseKey(k)) if k == "someOf"
        ));
        assert!(matches!(
            parse(r#"{ "extension": { "name": "A", "ver": "1.0" } }"#),
            Err(ConditionError::UnknownClauseKey(_))
        ));
        assert!(matches!(
            parse(r#"{ "param": { "name": "P", "about": 3 } }"#),
            Err(ConditionError::UnknownClauseKey(_))
        ));
        assert!(matches!(
            parse(r#"{ "if": true, "then": true, "else": false }"#),
            Err(ConditionError::UnknownClauseKey(k)) if k == "else"
        ));
    }

    #[test]
    fn rejects_malformed_shapes() {
        assert!(matches!(parse(r#"{ "allOf": [] }"#), Err(ConditionError::MalformedClause(_))));
        assert!(matches!(parse(r#"{ "if": true }"#), Err(ConditionError::MalformedClause(_))));
        assert!(matches!(
            parse(r#"{ "not": true, "xlen": 32 }"#),
            Err(ConditionError::MalformedClause(_))
        ));
        assert!(matches!(
            parse(r#"{ "param": { "name": "P", "equal": 1, "not_equal": 2 } }"#),
            Err(ConditionError::MalformedClause(_))
        ));
        assert!(matches!(
            parse(r#"{ "param": { "name": "P", "equal": 1, "index": 0, "size": true } }"#),
            Err(ConditionError::MalformedClause(_))
        ));
        assert!(matches!(parse("3"), Err(ConditionError::MalformedClause(_))));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(parse(r#"{ "xlen": 128 }"#), Err(ConditionError::InvalidXlen(128))));
        assert!(matches!(
            parse(r#"{ "extension": { "name": "A", "version": "=> 1.0" } }"#),
            Err(ConditionError::InvalidVersion { .. })
        ));
        assert!(matches!(
            parse(r#"{ "param": { "name": "P", "less_than": "four" } }"#),
            Err(ConditionError::MalformedClause(_))
        ));
    }

    #[test]
    fn serde_uses_declarative_form() {
        let text = r#"{"if":{"extension":{"name":"Zca"}},"then":{"noneOf":[{"xlen":32},{"param":{"name":"P","equal":true}}]}}"#;
        let clause: Clause = serde_json::from_str(text).unwrap();
        let back = serde_json::to_string(&clause).unwrap();
        let reparsed: Value = serde_json::from_str(&back).unwrap();
        let original: Value = serde_json::from_str(text).unwrap();
        assert_eq!(reparsed, original);
        assert!(serde_json::from_str::<Clause>(r#"{"bogus":1}"#).is_err());
    }
}
