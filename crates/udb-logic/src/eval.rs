//! Three-valued and boolean evaluation of logic trees.

use std::collections::BTreeMap;

use crate::node::{LogicNode, NodeKind};
use crate::satisfied::SatisfiedResult;
use crate::term::Term;

/// A total (or partial) boolean assignment of terms.
pub type Assignment = BTreeMap<Term, bool>;

impl LogicNode {
    /// Evaluate the tree, asking `leaf` for the value of each term.
    ///
    /// Connectives combine child results under three-valued rules, so the
    /// same tree can be evaluated under fully or partially known facts.
    pub fn evaluate<F>(&self, leaf: &F) -> SatisfiedResult
    where
        F: Fn(&Term) -> SatisfiedResult,
    {
        match self.kind() {
            NodeKind::True => SatisfiedResult::Yes,
            NodeKind::False => SatisfiedResult::No,
            NodeKind::Term(term) => leaf(term),
            NodeKind::Not(child) => !child.evaluate(leaf),
            NodeKind::And(cs) => SatisfiedResult::all(cs.iter().map(|c| c.evaluate(leaf))),
            NodeKind::Or(cs) => SatisfiedResult::any(cs.iter().map(|c| c.evaluate(leaf))),
            NodeKind::Nor(cs) => SatisfiedResult::none(cs.iter().map(|c| c.evaluate(leaf))),
            NodeKind::Xor(cs) => {
                SatisfiedResult::exactly_one(cs.iter().map(|c| c.evaluate(leaf)))
            }
            NodeKind::If(a, b) => a.evaluate(leaf).implies(b.evaluate(leaf)),
        }
    }

    /// Evaluate under a concrete assignment. Unassigned terms are false.
    pub fn evaluate_assignment(&self, assignment: &Assignment) -> bool {
        match self.kind() {
            NodeKind::True => true,
            NodeKind::False => false,
            NodeKind::Term(term) => assignment.get(term).copied().unwrap_or(false),
            NodeKind::Not(child) => !child.evaluate_assignment(assignment),
            NodeKind::And(cs) => cs.iter().all(|c| c.evaluate_assignment(assignment)),
            NodeKind::Or(cs) => cs.iter().any(|c| c.evaluate_assignment(assignment)),
            NodeKind::Nor(cs) => !cs.iter().any(|c| c.evaluate_assignment(assignment)),
            NodeKind::Xor(cs) => {
                cs.iter().filter(|c| c.evaluate_assignment(assignment)).count() == 1
            }
            NodeKind::If(a, b) => !a.evaluate_assignment(assignment) || b.evaluate_assignment(assignment),
        }
    }

    /// Replace every term `leaf` resolves to Yes or No with the matching
    /// constant, then simplify. Unresolved terms are kept.
    pub fn partial_evaluate<F>(&self, leaf: &F) -> LogicNode
    where
        F: Fn(&Term) -> SatisfiedResult,
    {
        self.substitute(leaf).reduce()
    }

    fn substitute<F>(&self, leaf: &F) -> LogicNode
    where
        F: Fn(&Term) -> SatisfiedResult,
    {
        let map = |cs: &[LogicNode]| cs.iter().map(|c| c.substitute(leaf)).collect::<Vec<_>>();
        match self.kind() {
            NodeKind::True | NodeKind::False => self.clone(),
            NodeKind::Term(term) => match leaf(term) {
                SatisfiedResult::Yes => LogicNode::always_true(),
                SatisfiedResult::No => LogicNode::always_false(),
                SatisfiedResult::Maybe => self.clone(),
            },
            NodeKind::Not(child) => LogicNode::not(child.substitute(leaf)),
            NodeKind::And(cs) => LogicNode::and(map(cs)),
            NodeKind::Or(cs) => LogicNode::or(map(cs)),
            NodeKind::Xor(cs) => LogicNode::xor(map(cs)),
            NodeKind::Nor(cs) => LogicNode::nor(map(cs)),
            NodeKind::If(a, b) => LogicNode::implies(a.substitute(leaf), b.substitute(leaf)),
        }
    }

    /// Every total assignment of this tree's terms, in binary counting
    /// order over the sorted term list (the first term is the most
    /// significant bit).
    pub fn assignments(&self) -> impl Iterator<Item = Assignment> + '_ {
        assignments_of(self.terms())
    }
}

/// Every total assignment of `terms`, most significant bit first.
pub fn assignments_of(terms: &[Term]) -> impl Iterator<Item = Assignment> + '_ {
    let n = terms.len();
    (0..1u64 << n).map(move |bits| {
        terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), (bits >> (n - 1 - i)) & 1 == 1))
            .collect()
    })
}
