//! The immutable logic tree.
//!
//! A [`LogicNode`] is a cheaply clonable handle to a shared, never-mutated
//! node. Because a node's meaning is fully determined by its children,
//! derived attributes (term set, CNF shape, content hash, equisatisfiable
//! CNF, satisfiability) are computed at most once per node and kept in
//! `OnceLock` slots alongside it.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::error::{LogicError, Result};
use crate::hash::{tagged_hash, ContentHash};
use crate::term::{Term, Xlen};

/// Connective of an interior node, used by the checked constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    Not,
    And,
    Or,
    /// Exactly one child holds.
    Xor,
    /// No child holds (n-ary NOR, declarative `noneOf`).
    Nor,
    /// Material implication, antecedent first.
    If,
}

impl Connective {
    pub fn name(&self) -> &'static str {
        match self {
            Connective::Not => "not",
            Connective::And => "and",
            Connective::Or => "or",
            Connective::Xor => "xor",
            Connective::Nor => "none",
            Connective::If => "if",
        }
    }
}

/// Shape of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    True,
    False,
    Term(Term),
    Not(LogicNode),
    And(Vec<LogicNode>),
    Or(Vec<LogicNode>),
    Xor(Vec<LogicNode>),
    Nor(Vec<LogicNode>),
    If(LogicNode, LogicNode),
}

/// A literal: a term or its negation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub term: Term,
    pub positive: bool,
}

impl Literal {
    pub fn positive(term: Term) -> Self {
        Self {
            term,
            positive: true,
        }
    }

    pub fn negative(term: Term) -> Self {
        Self {
            term,
            positive: false,
        }
    }

    pub fn negated(&self) -> Self {
        Self {
            term: self.term.clone(),
            positive: !self.positive,
        }
    }

    pub fn to_node(&self) -> LogicNode {
        let leaf = LogicNode::term(self.term.clone());
        if self.positive {
            leaf
        } else {
            LogicNode::not(leaf)
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct NodeCache {
    terms: OnceLock<Vec<Term>>,
    literals: OnceLock<Vec<Term>>,
    is_cnf: OnceLock<bool>,
    is_nested_cnf: OnceLock<bool>,
    hash: OnceLock<ContentHash>,
    pub(crate) equisat_cnf: OnceLock<LogicNode>,
    /// Only verdicts found by enumeration, which hold for every engine.
    pub(crate) satisfiable: OnceLock<bool>,
}

#[derive(Debug)]
struct Inner {
    kind: NodeKind,
    cache: NodeCache,
}

/// Handle to an immutable logic tree node.
#[derive(Clone)]
pub struct LogicNode(Arc<Inner>);

impl LogicNode {
    fn from_kind(kind: NodeKind) -> Self {
        LogicNode(Arc::new(Inner {
            kind,
            cache: NodeCache::default(),
        }))
    }

    // --- Constants ---

    /// The shared `True` node.
    pub fn always_true() -> Self {
        static NODE: OnceLock<LogicNode> = OnceLock::new();
        NODE.get_or_init(|| LogicNode::from_kind(NodeKind::True))
            .clone()
    }

    /// The shared `False` node.
    pub fn always_false() -> Self {
        static NODE: OnceLock<LogicNode> = OnceLock::new();
        NODE.get_or_init(|| LogicNode::from_kind(NodeKind::False))
            .clone()
    }

    pub fn constant(value: bool) -> Self {
        if value {
            Self::always_true()
        } else {
            Self::always_false()
        }
    }

    /// The shared `XLEN == 32` term node.
    pub fn xlen32() -> Self {
        static NODE: OnceLock<LogicNode> = OnceLock::new();
        NODE.get_or_init(|| LogicNode::from_kind(NodeKind::Term(Term::Xlen(Xlen::Rv32))))
            .clone()
    }

    /// The shared `XLEN == 64` term node.
    pub fn xlen64() -> Self {
        static NODE: OnceLock<LogicNode> = OnceLock::new();
        NODE.get_or_init(|| LogicNode::from_kind(NodeKind::Term(Term::Xlen(Xlen::Rv64))))
            .clone()
    }

    // --- Constructors ---

    pub fn term(term: impl Into<Term>) -> Self {
        match term.into() {
            Term::Xlen(Xlen::Rv32) => Self::xlen32(),
            Term::Xlen(Xlen::Rv64) => Self::xlen64(),
            other => LogicNode::from_kind(NodeKind::Term(other)),
        }
    }

    pub fn not(child: LogicNode) -> Self {
        LogicNode::from_kind(NodeKind::Not(child))
    }

    /// Conjunction. No children gives `True`, one child is returned as is.
    pub fn and(mut children: Vec<LogicNode>) -> Self {
        match children.len() {
            0 => Self::always_true(),
            1 => children.remove(0),
            _ => LogicNode::from_kind(NodeKind::And(children)),
        }
    }

    /// Disjunction. No children gives `False`, one child is returned as is.
    pub fn or(mut children: Vec<LogicNode>) -> Self {
        match children.len() {
            0 => Self::always_false(),
            1 => children.remove(0),
            _ => LogicNode::from_kind(NodeKind::Or(children)),
        }
    }

    /// Exactly-one. No children gives `False`, one child is returned as is.
    pub fn xor(mut children: Vec<LogicNode>) -> Self {
        match children.len() {
            0 => Self::always_false(),
            1 => children.remove(0),
            _ => LogicNode::from_kind(NodeKind::Xor(children)),
        }
    }

    /// None-of. No children gives `True`, one child is negated.
    pub fn nor(mut children: Vec<LogicNode>) -> Self {
        match children.len() {
            0 => Self::always_true(),
            1 => Self::not(children.remove(0)),
            _ => LogicNode::from_kind(NodeKind::Nor(children)),
        }
    }

    /// Material implication `antecedent -> consequent`.
    pub fn implies(antecedent: LogicNode, consequent: LogicNode) -> Self {
        LogicNode::from_kind(NodeKind::If(antecedent, consequent))
    }

    /// Biconditional, encoded as a pair of implications.
    pub fn iff(lhs: LogicNode, rhs: LogicNode) -> Self {
        Self::and(vec![
            Self::implies(lhs.clone(), rhs.clone()),
            Self::implies(rhs, lhs),
        ])
    }

    /// Checked constructor enforcing each connective's arity exactly.
    pub fn try_new(connective: Connective, mut children: Vec<LogicNode>) -> Result<Self> {
        let malformed = |expected: &'static str, actual: usize| LogicError::MalformedNode {
            kind: connective.name(),
            expected,
            actual,
        };
        let n = children.len();
        match connective {
            Connective::Not if n == 1 => Ok(Self::not(children.remove(0))),
            Connective::Not => Err(malformed("exactly 1", n)),
            Connective::If if n == 2 => {
                let consequent = children.remove(1);
                let antecedent = children.remove(0);
                Ok(Self::implies(antecedent, consequent))
            }
            Connective::If => Err(malformed("exactly 2", n)),
            _ if n < 2 => Err(malformed("at least 2", n)),
            Connective::And => Ok(LogicNode::from_kind(NodeKind::And(children))),
            Connective::Or => Ok(LogicNode::from_kind(NodeKind::Or(children))),
            Connective::Xor => Ok(LogicNode::from_kind(NodeKind::Xor(children))),
            Connective::Nor => Ok(LogicNode::from_kind(NodeKind::Nor(children))),
        }
    }

    // --- Accessors ---

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    pub(crate) fn cache(&self) -> &NodeCache {
        &self.0.cache
    }

    /// Direct children, in order.
    pub fn children(&self) -> Vec<&LogicNode> {
        match self.kind() {
            NodeKind::True | NodeKind::False | NodeKind::Term(_) => Vec::new(),
            NodeKind::Not(child) => vec![child],
            NodeKind::And(cs) | NodeKind::Or(cs) | NodeKind::Xor(cs) | NodeKind::Nor(cs) => {
                cs.iter().collect()
            }
            NodeKind::If(a, b) => vec![a, b],
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self.kind(), NodeKind::True)
    }

    pub fn is_false(&self) -> bool {
        matches!(self.kind(), NodeKind::False)
    }

    pub fn is_constant(&self) -> bool {
        self.is_true() || self.is_false()
    }

    /// The literal this node represents, if it is a term or a negated term.
    pub fn as_literal(&self) -> Option<Literal> {
        match self.kind() {
            NodeKind::Term(t) => Some(Literal::positive(t.clone())),
            NodeKind::Not(child) => match child.kind() {
                NodeKind::Term(t) => Some(Literal::negative(t.clone())),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        self.as_literal().is_some()
    }

    /// Distinct terms in the tree, sorted.
    pub fn terms(&self) -> &[Term] {
        self.cache().terms.get_or_init(|| {
            let set: BTreeSet<Term> = self.literals().iter().cloned().collect();
            set.into_iter().collect()
        })
    }

    /// Every term occurrence in the tree (a multiset), in traversal order.
    pub fn literals(&self) -> &[Term] {
        self.cache().literals.get_or_init(|| match self.kind() {
            NodeKind::Term(t) => vec![t.clone()],
            _ => self
                .children()
                .into_iter()
                .flat_map(|c| c.literals().iter().cloned())
                .collect(),
        })
    }

    pub fn term_count(&self) -> usize {
        self.terms().len()
    }

    pub fn literal_count(&self) -> usize {
        self.literals().len()
    }

    /// Whether any synthetic term occurs in the tree.
    pub fn has_free_terms(&self) -> bool {
        self.terms().iter().any(Term::is_free)
    }

    // --- Shape predicates ---

    /// Flat conjunction of disjunctions of literals (constants included).
    pub fn is_cnf(&self) -> bool {
        *self.cache().is_cnf.get_or_init(|| match self.kind() {
            NodeKind::True | NodeKind::False => true,
            NodeKind::And(cs) => cs.iter().all(|c| c.is_flat_group(false)),
            _ => self.is_flat_group(false),
        })
    }

    /// Flat disjunction of conjunctions of literals (constants included).
    pub fn is_dnf(&self) -> bool {
        match self.kind() {
            NodeKind::True | NodeKind::False => true,
            NodeKind::Or(cs) => cs.iter().all(|c| c.is_flat_group(true)),
            _ => self.is_flat_group(true),
        }
    }

    /// CNF up to flattening: nested `And`s over nested `Or`s over literals.
    pub fn is_nested_cnf(&self) -> bool {
        *self.cache().is_nested_cnf.get_or_init(|| match self.kind() {
            NodeKind::True | NodeKind::False => true,
            NodeKind::And(cs) => cs.iter().all(LogicNode::is_nested_cnf),
            _ => self.is_nested_group(false),
        })
    }

    /// DNF up to flattening.
    pub fn is_nested_dnf(&self) -> bool {
        match self.kind() {
            NodeKind::True | NodeKind::False => true,
            NodeKind::Or(cs) => cs.iter().all(LogicNode::is_nested_dnf),
            _ => self.is_nested_group(true),
        }
    }

    /// A literal, or an `And` (when `conjunction`) / `Or` of literals.
    fn is_flat_group(&self, conjunction: bool) -> bool {
        if self.is_literal() {
            return true;
        }
        match (self.kind(), conjunction) {
            (NodeKind::And(cs), true) | (NodeKind::Or(cs), false) => {
                cs.iter().all(LogicNode::is_literal)
            }
            _ => false,
        }
    }

    fn is_nested_group(&self, conjunction: bool) -> bool {
        if self.is_literal() {
            return true;
        }
        match (self.kind(), conjunction) {
            (NodeKind::And(cs), true) | (NodeKind::Or(cs), false) => {
                cs.iter().all(|c| c.is_nested_group(conjunction))
            }
            _ => false,
        }
    }

    /// Clauses of a CNF tree. `True` has no clauses; `False` has one empty
    /// clause. Returns `None` if the tree is not in CNF.
    pub fn cnf_clauses(&self) -> Option<Vec<Vec<Literal>>> {
        if !self.is_cnf() {
            return None;
        }
        Some(self.groups(false))
    }

    /// Cubes of a DNF tree. `False` has no cubes; `True` has one empty cube.
    pub fn dnf_cubes(&self) -> Option<Vec<Vec<Literal>>> {
        if !self.is_dnf() {
            return None;
        }
        Some(self.groups(true))
    }

    fn groups(&self, dnf: bool) -> Vec<Vec<Literal>> {
        let group = |n: &LogicNode| -> Vec<Literal> {
            match n.as_literal() {
                Some(lit) => vec![lit],
                None => n.children().into_iter().filter_map(LogicNode::as_literal).collect(),
            }
        };
        match (self.kind(), dnf) {
            (NodeKind::True, false) | (NodeKind::False, true) => Vec::new(),
            (NodeKind::False, false) | (NodeKind::True, true) => vec![Vec::new()],
            (NodeKind::And(cs), false) | (NodeKind::Or(cs), true) => cs.iter().map(group).collect(),
            _ => vec![group(self)],
        }
    }

    /// Build a CNF tree from clauses.
    pub fn from_clauses(clauses: &[Vec<Literal>]) -> Self {
        Self::and(
            clauses
                .iter()
                .map(|c| Self::or(c.iter().map(Literal::to_node).collect()))
                .collect(),
        )
    }

    /// Build a DNF tree from cubes.
    pub fn from_cubes(cubes: &[Vec<Literal>]) -> Self {
        Self::or(
            cubes
                .iter()
                .map(|c| Self::and(c.iter().map(Literal::to_node).collect()))
                .collect(),
        )
    }

    // --- Hashing ---

    /// Structural SHA-256 hash, computed once.
    pub fn content_hash(&self) -> ContentHash {
        *self.cache().hash.get_or_init(|| {
            let (tag, children): (&str, Vec<&LogicNode>) = match self.kind() {
                NodeKind::True => return tagged_hash("true", []),
                NodeKind::False => return tagged_hash("false", []),
                NodeKind::Term(t) => {
                    let repr = format!("{t:?}");
                    return tagged_hash("term", [repr.as_bytes()]);
                }
                NodeKind::Not(_) => ("not", self.children()),
                NodeKind::And(_) => ("and", self.children()),
                NodeKind::Or(_) => ("or", self.children()),
                NodeKind::Xor(_) => ("xor", self.children()),
                NodeKind::Nor(_) => ("none", self.children()),
                NodeKind::If(_, _) => ("if", self.children()),
            };
            let hashes: Vec<ContentHash> = children.iter().map(|c| c.content_hash()).collect();
            tagged_hash(tag, hashes.iter().map(|h| h.as_slice()))
        })
    }
}

impl PartialEq for LogicNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.kind() == other.kind()
    }
}

impl Eq for LogicNode {}

impl Hash for LogicNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
    }
}

impl PartialOrd for LogicNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogicNode {
    fn cmp(&self, other: &Self) -> Ordering {
        if Arc::ptr_eq(&self.0, &other.0) {
            return Ordering::Equal;
        }
        self.kind().cmp(other.kind())
    }
}

impl fmt::Debug for LogicNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind().fmt(f)
    }
}

impl From<Term> for LogicNode {
    fn from(term: Term) -> Self {
        LogicNode::term(term)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::term::ExtensionTerm;
    use crate::version::Version;

    /// Exact-version term node for a named extension, used across test modules.
    pub(crate) fn ext(name: &str) -> LogicNode {
        LogicNode::term(ExtensionTerm::exact(name, Version::new(1, 0, 0)))
    }

    #[test]
    fn constants_are_shared() {
        let a = LogicNode::always_true();
        let b = LogicNode::always_true();
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert!(LogicNode::always_false().is_false());
        assert_eq!(LogicNode::term(Xlen::Rv64), LogicNode::xlen64());
    }

    #[test]
    fn smart_constructors_collapse() {
        assert!(LogicNode::and(vec![]).is_true());
        assert!(LogicNode::or(vec![]).is_false());
        assert_eq!(LogicNode::and(vec![ext("A")]), ext("A"));
        assert_eq!(LogicNode::nor(vec![ext("A")]), LogicNode::not(ext("A")));
    }

    #[test]
    fn checked_constructor_enforces_arity() {
        assert!(LogicNode::try_new(Connective::And, vec![ext("A")]).is_err());
        assert!(LogicNode::try_new(Connective::Not, vec![ext("A"), ext("B")]).is_err());
        assert!(LogicNode::try_new(Connective::If, vec![ext("A")]).is_err());
        let ok = LogicNode::try_new(Connective::If, vec![ext("A"), ext("B")]).unwrap();
        assert_eq!(ok, LogicNode::implies(ext("A"), ext("B")));
    }

    #[test]
    fn terms_and_literals() {
        let n = LogicNode::and(vec![
            ext("A"),
            LogicNode::or(vec![LogicNode::not(ext("A")), ext("B")]),
        ]);
        assert_eq!(n.term_count(), 2);
        assert_eq!(n.literal_count(), 3);
    }

    #[test]
    fn cnf_shape_detection() {
        let cnf = LogicNode::and(vec![
            LogicNode::or(vec![ext("A"), LogicNode::not(ext("B"))]),
            ext("C"),
        ]);
        assert!(cnf.is_cnf());
        assert!(cnf.is_nested_cnf());
        assert!(!cnf.is_dnf());

        let nested = LogicNode::and(vec![
            LogicNode::and(vec![ext("A"), ext("B")]),
            LogicNode::or(vec![LogicNode::or(vec![ext("C"), ext("D")]), ext("E")]),
        ]);
        assert!(!nested.is_cnf());
        assert!(nested.is_nested_cnf());

        let not_cnf = LogicNode::or(vec![LogicNode::and(vec![ext("A"), ext("B")]), ext("C")]);
        assert!(!not_cnf.is_cnf());
        assert!(!not_cnf.is_nested_cnf());
        assert!(not_cnf.is_dnf());
    }

    #[test]
    fn clause_extraction() {
        let cnf = LogicNode::and(vec![
            LogicNode::or(vec![ext("A"), LogicNode::not(ext("B"))]),
            ext("C"),
        ]);
        let clauses = cnf.cnf_clauses().unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].len(), 2);
        assert!(!clauses[0][1].positive);
        assert_eq!(LogicNode::from_clauses(&clauses), cnf);

        assert_eq!(LogicNode::always_false().cnf_clauses().unwrap(), vec![Vec::new()]);
        assert!(LogicNode::always_true().cnf_clauses().unwrap().is_empty());
    }

    #[test]
    fn structural_equality_and_hash() {
        let a = LogicNode::and(vec![ext("A"), ext("B")]);
        let b = LogicNode::and(vec![ext("A"), ext("B")]);
        assert_eq!(a, b);
        assert_eq!(a.content_hash(), b.content_hash());
        let c = LogicNode::or(vec![ext("A"), ext("B")]);
        assert_ne!(a.content_hash(), c.content_hash());
    }
}
