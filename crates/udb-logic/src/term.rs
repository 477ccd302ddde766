//! Terminal predicates of a logic tree.
//!
//! Four kinds of leaf exist: an extension-version requirement, a parameter
//! comparison, an XLEN fact, and a synthetic free variable introduced by the
//! Tseytin transformation. Terms are plain values: equality, ordering, and
//! hashing are structural, so they can be deduplicated and used as map keys.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{LogicError, Result};
use crate::node::LogicNode;
use crate::satisfied::SatisfiedResult;
use crate::version::{Version, VersionOp};

/// A leaf predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Extension(ExtensionTerm),
    Parameter(ParameterTerm),
    Xlen(Xlen),
    Free(FreeTerm),
}

impl Term {
    /// Whether the term is a synthetic Tseytin variable.
    pub fn is_free(&self) -> bool {
        matches!(self, Term::Free(_))
    }

    pub fn as_extension(&self) -> Option<&ExtensionTerm> {
        match self {
            Term::Extension(ext) => Some(ext),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&ParameterTerm> {
        match self {
            Term::Parameter(param) => Some(param),
            _ => None,
        }
    }

    /// Declarative clause form of this term.
    pub fn to_declarative(&self) -> Result<Value> {
        match self {
            Term::Extension(ext) => Ok(ext.to_declarative()),
            Term::Parameter(param) => Ok(param.to_declarative()),
            Term::Xlen(xlen) => Ok(json!({ "xlen": xlen.bits() })),
            Term::Free(_) => Err(LogicError::FreeTermLeak),
        }
    }

    /// A name usable as a variable identifier in C or equation output.
    pub fn identifier(&self) -> String {
        let raw = match self {
            Term::Extension(ext) => format!(
                "{}_{}_{}",
                ext.name,
                op_mnemonic(ext.op),
                ext.version
            ),
            Term::Parameter(param) => param.identifier(),
            Term::Xlen(xlen) => format!("XLEN{}", xlen.bits()),
            Term::Free(free) => format!("t{}", free.0),
        };
        raw.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Extension(ext) => write!(f, "{ext}"),
            Term::Parameter(param) => write!(f, "{param}"),
            Term::Xlen(xlen) => write!(f, "xlen()=={}", xlen.bits()),
            Term::Free(free) => write!(f, "t{}", free.0),
        }
    }
}

impl From<ExtensionTerm> for Term {
    fn from(value: ExtensionTerm) -> Self {
        Term::Extension(value)
    }
}

impl From<ParameterTerm> for Term {
    fn from(value: ParameterTerm) -> Self {
        Term::Parameter(value)
    }
}

impl From<Xlen> for Term {
    fn from(value: Xlen) -> Self {
        Term::Xlen(value)
    }
}

fn op_mnemonic(op: VersionOp) -> &'static str {
    match op {
        VersionOp::Eq => "eq",
        VersionOp::Ge => "ge",
        VersionOp::Gt => "gt",
        VersionOp::Le => "le",
        VersionOp::Lt => "lt",
        VersionOp::Compatible => "compat",
    }
}

// ---------------------------------------------------------------------------
// Extension terms
// ---------------------------------------------------------------------------

/// "Extension `name` is implemented at a version satisfying `op version`."
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExtensionTerm {
    pub name: String,
    pub op: VersionOp,
    pub version: Version,
}

/// What a configuration knows about one extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionFact<'a> {
    Implemented(&'a Version),
    Absent,
    Unknown,
}

impl ExtensionTerm {
    pub fn new(name: impl Into<String>, op: VersionOp, version: Version) -> Self {
        Self {
            name: name.into(),
            op,
            version,
        }
    }

    /// Any version of the extension (`>= 0`).
    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, VersionOp::Ge, Version::new(0, 0, 0))
    }

    /// Exactly `version`.
    pub fn exact(name: impl Into<String>, version: Version) -> Self {
        Self::new(name, VersionOp::Eq, version)
    }

    pub fn is_exact(&self) -> bool {
        self.op == VersionOp::Eq
    }

    /// Whether a concrete version satisfies this requirement.
    pub fn matches(&self, version: &Version) -> bool {
        self.op.matches(version, &self.version)
    }

    /// The subset of `available` satisfying this requirement, ascending.
    pub fn satisfying_versions(&self, available: &[Version]) -> Vec<Version> {
        let mut matching: Vec<Version> = available
            .iter()
            .filter(|v| self.matches(v))
            .cloned()
            .collect();
        matching.sort();
        matching.dedup();
        matching
    }

    /// Lowest version in `available` satisfying this requirement.
    pub fn min_version(&self, available: &[Version]) -> Option<Version> {
        self.satisfying_versions(available).into_iter().next()
    }

    /// Highest version in `available` satisfying this requirement.
    pub fn max_version(&self, available: &[Version]) -> Option<Version> {
        self.satisfying_versions(available).into_iter().last()
    }

    /// Requirement string as written in declarative clauses, e.g. `">= 1.0.0"`.
    pub fn requirement(&self) -> String {
        format!("{} {}", self.op, self.version)
    }

    pub fn evaluate(&self, fact: ExtensionFact<'_>) -> SatisfiedResult {
        match fact {
            ExtensionFact::Implemented(version) => self.matches(version).into(),
            ExtensionFact::Absent => SatisfiedResult::No,
            ExtensionFact::Unknown => SatisfiedResult::Maybe,
        }
    }

    pub fn to_declarative(&self) -> Value {
        json!({ "extension": { "name": self.name, "version": self.requirement() } })
    }
}

impl fmt::Display for ExtensionTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, self.op, self.version)
    }
}

// ---------------------------------------------------------------------------
// Parameter terms
// ---------------------------------------------------------------------------

/// A configuration parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Array(Vec<ParamValue>),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Str(s) => write!(f, "'{s}'"),
            ParamValue::Array(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// The comparison a parameter term asserts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParamComparison {
    Equal(ParamValue),
    NotEqual(ParamValue),
    LessThan(i64),
    GreaterThan(i64),
    LessThanOrEqual(i64),
    GreaterThanOrEqual(i64),
    Includes(ParamValue),
    OneOf(Vec<ParamValue>),
}

impl ParamComparison {
    /// Declarative key for this comparison.
    pub fn key(&self) -> &'static str {
        match self {
            ParamComparison::Equal(_) => "equal",
            ParamComparison::NotEqual(_) => "not_equal",
            ParamComparison::LessThan(_) => "less_than",
            ParamComparison::GreaterThan(_) => "greater_than",
            ParamComparison::LessThanOrEqual(_) => "less_than_or_equal",
            ParamComparison::GreaterThanOrEqual(_) => "greater_than_or_equal",
            ParamComparison::Includes(_) => "includes",
            ParamComparison::OneOf(_) => "oneOf",
        }
    }

    /// Whether a concrete value satisfies the comparison.
    pub fn test(&self, value: &ParamValue) -> bool {
        match self {
            ParamComparison::Equal(v) => value == v,
            ParamComparison::NotEqual(v) => value != v,
            ParamComparison::LessThan(n) => value.as_int().is_some_and(|x| x < *n),
            ParamComparison::GreaterThan(n) => value.as_int().is_some_and(|x| x > *n),
            ParamComparison::LessThanOrEqual(n) => value.as_int().is_some_and(|x| x <= *n),
            ParamComparison::GreaterThanOrEqual(n) => value.as_int().is_some_and(|x| x >= *n),
            ParamComparison::Includes(v) => match value {
                ParamValue::Array(items) => items.contains(v),
                _ => false,
            },
            ParamComparison::OneOf(vs) => vs.contains(value),
        }
    }

    /// The closed integer interval of values this comparison admits, if it
    /// is an ordering comparison (or equality with an integer).
    fn interval(&self) -> Option<Interval> {
        let n = |v: i64| i128::from(v);
        match self {
            ParamComparison::Equal(ParamValue::Int(v)) => Some(Interval::new(n(*v), n(*v))),
            ParamComparison::LessThan(v) => Some(Interval::new(i128::MIN, n(*v) - 1)),
            ParamComparison::LessThanOrEqual(v) => Some(Interval::new(i128::MIN, n(*v))),
            ParamComparison::GreaterThan(v) => Some(Interval::new(n(*v) + 1, i128::MAX)),
            ParamComparison::GreaterThanOrEqual(v) => Some(Interval::new(n(*v), i128::MAX)),
            _ => None,
        }
    }

    /// The finite set of values this comparison admits, if it has one.
    fn finite_values(&self) -> Option<Vec<ParamValue>> {
        match self {
            ParamComparison::Equal(v) => Some(vec![v.clone()]),
            ParamComparison::OneOf(vs) => Some(vs.clone()),
            _ => None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            ParamComparison::Equal(_) => "==",
            ParamComparison::NotEqual(_) => "!=",
            ParamComparison::LessThan(_) => "<",
            ParamComparison::GreaterThan(_) => ">",
            ParamComparison::LessThanOrEqual(_) => "<=",
            ParamComparison::GreaterThanOrEqual(_) => ">=",
            ParamComparison::Includes(_) => " includes ",
            ParamComparison::OneOf(_) => " in ",
        }
    }

    fn operand(&self) -> String {
        match self {
            ParamComparison::Equal(v)
            | ParamComparison::NotEqual(v)
            | ParamComparison::Includes(v) => v.to_string(),
            ParamComparison::LessThan(n)
            | ParamComparison::GreaterThan(n)
            | ParamComparison::LessThanOrEqual(n)
            | ParamComparison::GreaterThanOrEqual(n) => n.to_string(),
            ParamComparison::OneOf(vs) => ParamValue::Array(vs.clone()).to_string(),
        }
    }

    fn operand_value(&self) -> Value {
        match self {
            ParamComparison::Equal(v)
            | ParamComparison::NotEqual(v)
            | ParamComparison::Includes(v) => param_value_to_json(v),
            ParamComparison::LessThan(n)
            | ParamComparison::GreaterThan(n)
            | ParamComparison::LessThanOrEqual(n)
            | ParamComparison::GreaterThanOrEqual(n) => json!(n),
            ParamComparison::OneOf(vs) => Value::Array(vs.iter().map(param_value_to_json).collect()),
        }
    }
}

fn param_value_to_json(value: &ParamValue) -> Value {
    match value {
        ParamValue::Bool(b) => json!(b),
        ParamValue::Int(n) => json!(n),
        ParamValue::Str(s) => json!(s),
        ParamValue::Array(items) => Value::Array(items.iter().map(param_value_to_json).collect()),
    }
}

#[derive(Debug, Clone, Copy)]
struct Interval {
    lo: i128,
    hi: i128,
}

impl Interval {
    fn new(lo: i128, hi: i128) -> Self {
        Self { lo, hi }
    }

    fn contains(&self, v: i128) -> bool {
        self.lo <= v && v <= self.hi
    }

    fn within(&self, other: &Interval) -> bool {
        other.lo <= self.lo && self.hi <= other.hi
    }

    fn disjoint(&self, other: &Interval) -> bool {
        self.hi < other.lo || other.hi < self.lo
    }
}

/// Which part of a parameter value a term compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParamScope {
    /// The whole value.
    Value,
    /// One element of an array-valued parameter.
    Index(usize),
    /// The length of an array-valued parameter.
    Size,
}

/// "Parameter `name` (scoped by `scope`) satisfies `comparison`."
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParameterTerm {
    pub name: String,
    pub scope: ParamScope,
    pub comparison: ParamComparison,
}

impl ParameterTerm {
    /// Build a term, normalizing `oneOf` lists so that equal comparisons
    /// compare equal.
    pub fn new(name: impl Into<String>, scope: ParamScope, comparison: ParamComparison) -> Self {
        let comparison = match comparison {
            ParamComparison::OneOf(mut vs) => {
                vs.sort();
                vs.dedup();
                ParamComparison::OneOf(vs)
            }
            other => other,
        };
        Self {
            name: name.into(),
            scope,
            comparison,
        }
    }

    /// The logically inverted term, when a simple syntactic inverse exists.
    pub fn negate(&self) -> Result<ParameterTerm> {
        let inverted = match &self.comparison {
            ParamComparison::Equal(v) => ParamComparison::NotEqual(v.clone()),
            ParamComparison::NotEqual(v) => ParamComparison::Equal(v.clone()),
            ParamComparison::LessThan(n) => ParamComparison::GreaterThanOrEqual(*n),
            ParamComparison::GreaterThanOrEqual(n) => ParamComparison::LessThan(*n),
            ParamComparison::GreaterThan(n) => ParamComparison::LessThanOrEqual(*n),
            ParamComparison::LessThanOrEqual(n) => ParamComparison::GreaterThan(*n),
            ParamComparison::Includes(_) | ParamComparison::OneOf(_) => {
                return Err(LogicError::NoSimpleNegation(self.to_string()))
            }
        };
        Ok(ParameterTerm::new(self.name.clone(), self.scope, inverted))
    }

    /// Evaluate against the parameter's value, if known.
    pub fn evaluate(&self, value: Option<&ParamValue>) -> SatisfiedResult {
        let Some(value) = value else {
            return SatisfiedResult::Maybe;
        };
        let scoped = match (self.scope, value) {
            (ParamScope::Value, v) => Some(v.clone()),
            (ParamScope::Index(i), ParamValue::Array(items)) => items.get(i).cloned(),
            (ParamScope::Size, ParamValue::Array(items)) => {
                i64::try_from(items.len()).ok().map(ParamValue::Int)
            }
            _ => None,
        };
        match scoped {
            Some(v) => self.comparison.test(&v).into(),
            None => SatisfiedResult::No,
        }
    }

    /// Statically derivable implication between two comparisons on the same
    /// parameter: `self -> other` or `self -> !other`.
    pub fn relation_to(&self, other: &ParameterTerm) -> Option<LogicNode> {
        if self.name != other.name || self.scope != other.scope || self == other {
            return None;
        }
        let implies_other = self.implies(other)?;
        let lhs = LogicNode::term(self.clone());
        let rhs = LogicNode::term(other.clone());
        if implies_other {
            Some(LogicNode::implies(lhs, rhs))
        } else {
            Some(LogicNode::implies(lhs, LogicNode::not(rhs)))
        }
    }

    /// `Some(true)` if self always implies other, `Some(false)` if self
    /// always implies not-other, `None` if neither is derivable.
    fn implies(&self, other: &ParameterTerm) -> Option<bool> {
        let ours = &self.comparison;
        let theirs = &other.comparison;

        if let Some(values) = ours.finite_values() {
            if values.is_empty() {
                return None;
            }
            let hits = values.iter().filter(|v| theirs.test(v)).count();
            return if hits == values.len() {
                Some(true)
            } else if hits == 0 {
                Some(false)
            } else {
                None
            };
        }

        if let Some(range) = ours.interval() {
            if let Some(their_range) = theirs.interval() {
                if range.within(&their_range) {
                    return Some(true);
                }
                if range.disjoint(&their_range) {
                    return Some(false);
                }
                return None;
            }
            return match theirs {
                ParamComparison::NotEqual(ParamValue::Int(w)) if !range.contains(i128::from(*w)) => {
                    Some(true)
                }
                ParamComparison::OneOf(ws)
                    if ws
                        .iter()
                        .all(|w| w.as_int().map_or(true, |w| !range.contains(i128::from(w)))) =>
                {
                    Some(false)
                }
                _ => None,
            };
        }

        match (ours, theirs) {
            (ParamComparison::NotEqual(v), ParamComparison::Equal(w)) if v == w => Some(false),
            _ => None,
        }
    }

    fn identifier(&self) -> String {
        let scope = match self.scope {
            ParamScope::Value => String::new(),
            ParamScope::Index(i) => format!("_{i}"),
            ParamScope::Size => "_size".to_string(),
        };
        format!(
            "{}{}_{}_{}",
            self.name,
            scope,
            self.comparison.key(),
            self.comparison.operand()
        )
    }

    pub fn to_declarative(&self) -> Value {
        let mut body = serde_json::Map::new();
        body.insert("name".into(), json!(self.name));
        body.insert(self.comparison.key().into(), self.comparison.operand_value());
        match self.scope {
            ParamScope::Value => {}
            ParamScope::Index(i) => {
                body.insert("index".into(), json!(i));
            }
            ParamScope::Size => {
                body.insert("size".into(), json!(true));
            }
        }
        json!({ "param": Value::Object(body) })
    }
}

impl fmt::Display for ParameterTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            ParamScope::Value => write!(f, "{}", self.name)?,
            ParamScope::Index(i) => write!(f, "{}[{i}]", self.name)?,
            ParamScope::Size => write!(f, "len({})", self.name)?,
        }
        write!(f, "{}{}", self.comparison.symbol(), self.comparison.operand())
    }
}

// ---------------------------------------------------------------------------
// XLEN and free terms
// ---------------------------------------------------------------------------

/// Base integer register width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Xlen {
    Rv32,
    Rv64,
}

impl Xlen {
    pub fn bits(&self) -> u32 {
        match self {
            Xlen::Rv32 => 32,
            Xlen::Rv64 => 64,
        }
    }

    pub fn from_bits(bits: i64) -> Option<Self> {
        match bits {
            32 => Some(Xlen::Rv32),
            64 => Some(Xlen::Rv64),
            _ => None,
        }
    }

    /// Evaluate against the set of XLENs a configuration may use.
    pub fn evaluate(&self, possible: &[Xlen]) -> SatisfiedResult {
        if !possible.contains(self) {
            SatisfiedResult::No
        } else if possible.len() == 1 {
            SatisfiedResult::Yes
        } else {
            SatisfiedResult::Maybe
        }
    }
}

static NEXT_FREE_TERM: AtomicU64 = AtomicU64::new(0);

/// Opaque synthetic variable with no domain meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FreeTerm(u64);

impl FreeTerm {
    /// Allocate a process-unique free term.
    pub fn fresh() -> Self {
        FreeTerm(NEXT_FREE_TERM.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(cmp: ParamComparison) -> ParameterTerm {
        ParameterTerm::new("P", ParamScope::Value, cmp)
    }

    #[test]
    fn extension_range_versions() {
        let available = vec![
            Version::new(1, 0, 0),
            Version::new(1, 1, 0),
            Version::new(2, 0, 0),
        ];
        let term = ExtensionTerm::new("Zba", VersionOp::Ge, Version::new(1, 1, 0));
        assert_eq!(
            term.satisfying_versions(&available),
            vec![Version::new(1, 1, 0), Version::new(2, 0, 0)]
        );
        assert_eq!(term.min_version(&available), Some(Version::new(1, 1, 0)));
        assert_eq!(term.max_version(&available), Some(Version::new(2, 0, 0)));

        let lt = ExtensionTerm::new("Zba", VersionOp::Lt, Version::new(1, 0, 0));
        assert!(lt.satisfying_versions(&available).is_empty());
    }

    #[test]
    fn extension_evaluation() {
        let term = ExtensionTerm::new("A", VersionOp::Ge, Version::new(1, 0, 0));
        let v = Version::new(1, 2, 0);
        assert_eq!(term.evaluate(ExtensionFact::Implemented(&v)), SatisfiedResult::Yes);
        assert_eq!(term.evaluate(ExtensionFact::Absent), SatisfiedResult::No);
        assert_eq!(term.evaluate(ExtensionFact::Unknown), SatisfiedResult::Maybe);
    }

    #[test]
    fn terms_are_structurally_equal() {
        let a = ExtensionTerm::exact("A", Version::new(1, 0, 0));
        let b = ExtensionTerm::exact("A", Version::new(1, 0, 0));
        assert_eq!(Term::from(a), Term::from(b));

        let p = param(ParamComparison::OneOf(vec![ParamValue::Int(2), ParamValue::Int(1)]));
        let q = param(ParamComparison::OneOf(vec![ParamValue::Int(1), ParamValue::Int(2)]));
        assert_eq!(p, q);
    }

    #[test]
    fn parameter_negation() {
        let lt = param(ParamComparison::LessThan(5));
        assert_eq!(lt.negate().unwrap().comparison, ParamComparison::GreaterThanOrEqual(5));
        let eq = param(ParamComparison::Equal(ParamValue::Bool(true)));
        assert_eq!(
            eq.negate().unwrap().comparison,
            ParamComparison::NotEqual(ParamValue::Bool(true))
        );
        let inc = param(ParamComparison::Includes(ParamValue::Int(3)));
        assert!(matches!(inc.negate(), Err(LogicError::NoSimpleNegation(_))));
    }

    #[test]
    fn parameter_evaluation_with_scopes() {
        let arr = ParamValue::Array(vec![ParamValue::Int(4), ParamValue::Int(8)]);
        let idx = ParameterTerm::new("A", ParamScope::Index(1), ParamComparison::Equal(ParamValue::Int(8)));
        assert_eq!(idx.evaluate(Some(&arr)), SatisfiedResult::Yes);
        let size = ParameterTerm::new("A", ParamScope::Size, ParamComparison::GreaterThan(2));
        assert_eq!(size.evaluate(Some(&arr)), SatisfiedResult::No);
        let inc = ParameterTerm::new("A", ParamScope::Value, ParamComparison::Includes(ParamValue::Int(4)));
        assert_eq!(inc.evaluate(Some(&arr)), SatisfiedResult::Yes);
        assert_eq!(inc.evaluate(None), SatisfiedResult::Maybe);
    }

    #[test]
    fn less_than_implies_less_or_equal() {
        let lt = param(ParamComparison::LessThan(5));
        let le = param(ParamComparison::LessThanOrEqual(5));
        let rel = lt.relation_to(&le).unwrap();
        assert_eq!(rel, LogicNode::implies(LogicNode::term(lt), LogicNode::term(le)));
    }

    #[test]
    fn equal_implies_not_equal_other_value() {
        let eq5 = param(ParamComparison::Equal(ParamValue::Int(5)));
        let ne6 = param(ParamComparison::NotEqual(ParamValue::Int(6)));
        let rel = eq5.relation_to(&ne6).unwrap();
        assert_eq!(rel, LogicNode::implies(LogicNode::term(eq5.clone()), LogicNode::term(ne6)));

        let eq6 = param(ParamComparison::Equal(ParamValue::Int(6)));
        let rel = eq5.relation_to(&eq6).unwrap();
        assert_eq!(
            rel,
            LogicNode::implies(LogicNode::term(eq5), LogicNode::not(LogicNode::term(eq6)))
        );
    }

    #[test]
    fn unrelated_comparisons_have_no_relation() {
        let gt = param(ParamComparison::GreaterThan(2));
        let lt = param(ParamComparison::LessThan(10));
        assert!(gt.relation_to(&lt).is_none());

        let other = ParameterTerm::new("Q", ParamScope::Value, ParamComparison::LessThan(1));
        assert!(gt.relation_to(&other).is_none());
    }

    #[test]
    fn disjoint_ranges_exclude_each_other() {
        let lt = param(ParamComparison::LessThan(3));
        let ge = param(ParamComparison::GreaterThanOrEqual(3));
        let rel = lt.relation_to(&ge).unwrap();
        assert_eq!(
            rel,
            LogicNode::implies(LogicNode::term(lt), LogicNode::not(LogicNode::term(ge)))
        );
    }

    #[test]
    fn xlen_evaluation() {
        assert_eq!(Xlen::Rv32.evaluate(&[Xlen::Rv32]), SatisfiedResult::Yes);
        assert_eq!(Xlen::Rv32.evaluate(&[Xlen::Rv64]), SatisfiedResult::No);
        assert_eq!(Xlen::Rv64.evaluate(&[Xlen::Rv32, Xlen::Rv64]), SatisfiedResult::Maybe);
    }

    #[test]
    fn free_terms_are_unique() {
        assert_ne!(FreeTerm::fresh(), FreeTerm::fresh());
        assert!(Term::Free(FreeTerm::fresh()).to_declarative().is_err());
    }

    #[test]
    fn declarative_form() {
        let term = ExtensionTerm::new("Zba", VersionOp::Ge, Version::new(1, 0, 0));
        assert_eq!(
            term.to_declarative(),
            json!({"extension": {"name": "Zba", "version": ">= 1.0.0"}})
        );
        let p = ParameterTerm::new("MXLEN", ParamScope::Value, ParamComparison::Equal(ParamValue::Int(64)));
        assert_eq!(p.to_declarative(), json!({"param": {"name": "MXLEN", "equal": 64}}));
    }
}
