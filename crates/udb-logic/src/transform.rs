//! Rewrites: flattening, local simplification, negation normal form,
//! binary grouping, equivalent CNF/DNF, and the Tseytin encoding.
//!
//! Every rewrite returns a new tree; inputs are never modified.

use std::collections::BTreeSet;

use crate::error::{LogicError, Result};
use crate::node::{Literal, LogicNode, NodeKind};
use crate::term::{FreeTerm, Term};

/// Clause budget for distribution-based normal forms.
pub const DEFAULT_CNF_EXPLOSION_LIMIT: usize = 10;

impl LogicNode {
    /// Merge directly nested `And`s into their parent `And` (and likewise
    /// for `Or`), recursively.
    pub fn flatten(&self) -> LogicNode {
        match self.kind() {
            NodeKind::True | NodeKind::False | NodeKind::Term(_) => self.clone(),
            NodeKind::Not(c) => LogicNode::not(c.flatten()),
            NodeKind::And(cs) => LogicNode::and(splice(cs.iter().map(LogicNode::flatten), true)),
            NodeKind::Or(cs) => LogicNode::or(splice(cs.iter().map(LogicNode::flatten), false)),
            NodeKind::Xor(cs) => LogicNode::xor(cs.iter().map(LogicNode::flatten).collect()),
            NodeKind::Nor(cs) => LogicNode::nor(cs.iter().map(LogicNode::flatten).collect()),
            NodeKind::If(a, b) => LogicNode::implies(a.flatten(), b.flatten()),
        }
    }

    /// Cheap local simplification.
    ///
    /// Removes constants from connectives, collapses a conjunction holding
    /// both `x` and `!x` to `False` (dually for disjunctions), removes
    /// duplicated children, folds `If` with a constant side, and eliminates
    /// double negation.
    pub fn reduce(&self) -> LogicNode {
        match self.kind() {
            NodeKind::True | NodeKind::False | NodeKind::Term(_) => self.clone(),
            NodeKind::Not(c) => negate_reduced(c.reduce()),
            NodeKind::And(cs) => reduce_junction(cs.iter().map(LogicNode::reduce), true),
            NodeKind::Or(cs) => reduce_junction(cs.iter().map(LogicNode::reduce), false),
            NodeKind::Xor(cs) => reduce_xor(cs.iter().map(LogicNode::reduce).collect()),
            NodeKind::Nor(cs) => {
                let mut kept = Vec::new();
                for c in cs.iter().map(LogicNode::reduce) {
                    if c.is_true() {
                        return LogicNode::always_false();
                    }
                    if !c.is_false() && !kept.contains(&c) {
                        kept.push(c);
                    }
                }
                match kept.len() {
                    0 => LogicNode::always_true(),
                    1 => negate_reduced(kept.remove(0)),
                    _ => LogicNode::nor(kept),
                }
            }
            NodeKind::If(a, b) => {
                let (a, b) = (a.reduce(), b.reduce());
                if a.is_true() {
                    b
                } else if a.is_false() || b.is_true() || a == b {
                    LogicNode::always_true()
                } else if b.is_false() {
                    negate_reduced(a)
                } else {
                    LogicNode::implies(a, b)
                }
            }
        }
    }

    /// Negation normal form: only `And`, `Or`, constants, and literals.
    pub fn nnf(&self) -> LogicNode {
        self.nnf_inner(false)
    }

    fn nnf_inner(&self, negated: bool) -> LogicNode {
        let all = |cs: &[LogicNode], neg: bool| -> Vec<LogicNode> {
            cs.iter().map(|c| c.nnf_inner(neg)).collect()
        };
        match self.kind() {
            NodeKind::True => LogicNode::constant(!negated),
            NodeKind::False => LogicNode::constant(negated),
            NodeKind::Term(_) if negated => LogicNode::not(self.clone()),
            NodeKind::Term(_) => self.clone(),
            NodeKind::Not(c) => c.nnf_inner(!negated),
            NodeKind::And(cs) if negated => LogicNode::or(all(cs, true)),
            NodeKind::And(cs) => LogicNode::and(all(cs, false)),
            NodeKind::Or(cs) if negated => LogicNode::and(all(cs, true)),
            NodeKind::Or(cs) => LogicNode::or(all(cs, false)),
            NodeKind::Nor(cs) if negated => LogicNode::or(all(cs, false)),
            NodeKind::Nor(cs) => LogicNode::and(all(cs, true)),
            NodeKind::If(a, b) if negated => {
                LogicNode::and(vec![a.nnf_inner(false), b.nnf_inner(true)])
            }
            NodeKind::If(a, b) => LogicNode::or(vec![a.nnf_inner(true), b.nnf_inner(false)]),
            NodeKind::Xor(cs) => {
                let pos = all(cs, false);
                let neg = all(cs, true);
                if negated {
                    // none hold, or some pair holds together
                    let mut alternatives = vec![LogicNode::and(neg)];
                    for i in 0..pos.len() {
                        for j in i + 1..pos.len() {
                            alternatives.push(LogicNode::and(vec![pos[i].clone(), pos[j].clone()]));
                        }
                    }
                    LogicNode::or(alternatives)
                } else {
                    let alternatives = (0..pos.len())
                        .map(|i| {
                            let mut cube = vec![pos[i].clone()];
                            cube.extend(
                                neg.iter()
                                    .enumerate()
                                    .filter(|(j, _)| *j != i)
                                    .map(|(_, n)| n.clone()),
                            );
                            LogicNode::and(cube)
                        })
                        .collect();
                    LogicNode::or(alternatives)
                }
            }
        }
    }

    /// Rewrite n-ary `And`/`Or` nodes as left-associated binary chains.
    pub fn group_by_2(&self) -> LogicNode {
        let chain = |cs: &[LogicNode], conjunction: bool| -> LogicNode {
            let mut iter = cs.iter().map(LogicNode::group_by_2);
            let first = iter.next();
            iter.fold(first, |acc, next| {
                Some(match acc {
                    None => next,
                    Some(acc) if conjunction => LogicNode::and(vec![acc, next]),
                    Some(acc) => LogicNode::or(vec![acc, next]),
                })
            })
            .unwrap_or_else(|| LogicNode::constant(conjunction))
        };
        match self.kind() {
            NodeKind::True | NodeKind::False | NodeKind::Term(_) => self.clone(),
            NodeKind::Not(c) => LogicNode::not(c.group_by_2()),
            NodeKind::And(cs) => chain(cs, true),
            NodeKind::Or(cs) => chain(cs, false),
            NodeKind::Xor(cs) => LogicNode::xor(cs.iter().map(LogicNode::group_by_2).collect()),
            NodeKind::Nor(cs) => LogicNode::nor(cs.iter().map(LogicNode::group_by_2).collect()),
            NodeKind::If(a, b) => LogicNode::implies(a.group_by_2(), b.group_by_2()),
        }
    }

    /// Logically equivalent conjunctive normal form, using the default
    /// clause budget. See [`LogicNode::equiv_cnf_with_limit`].
    pub fn equiv_cnf(&self, raise_on_explosion: bool) -> Result<LogicNode> {
        self.equiv_cnf_with_limit(raise_on_explosion, DEFAULT_CNF_EXPLOSION_LIMIT)
    }

    /// Logically equivalent CNF by distributing `Or` over `And`.
    ///
    /// Distribution is exponential in the worst case. When
    /// `raise_on_explosion` is set and distribution emits more than `limit`
    /// clauses, `LogicError::SizeExplosion` is returned so the caller can
    /// pick another strategy.
    pub fn equiv_cnf_with_limit(&self, raise_on_explosion: bool, limit: usize) -> Result<LogicNode> {
        let groups = self.two_level_groups(false, raise_on_explosion, limit)?;
        Ok(LogicNode::from_clauses(&groups))
    }

    /// Logically equivalent disjunctive normal form, using the default
    /// clause budget.
    pub fn equiv_dnf(&self, raise_on_explosion: bool) -> Result<LogicNode> {
        self.equiv_dnf_with_limit(raise_on_explosion, DEFAULT_CNF_EXPLOSION_LIMIT)
    }

    /// Logically equivalent DNF by distributing `And` over `Or`.
    pub fn equiv_dnf_with_limit(&self, raise_on_explosion: bool, limit: usize) -> Result<LogicNode> {
        let groups = self.two_level_groups(true, raise_on_explosion, limit)?;
        Ok(LogicNode::from_cubes(&groups))
    }

    fn two_level_groups(&self, dnf: bool, raise: bool, limit: usize) -> Result<Vec<Vec<Literal>>> {
        let prepared = self.nnf().reduce();
        let grouped = prepared.group_by_2();
        let mut distributor = Distributor {
            dnf,
            limit: raise.then_some(limit),
            emitted: 0,
        };
        let groups = distributor.groups(&grouped)?;
        Ok(canonical_groups(groups))
    }

    /// Equisatisfiable CNF via the Tseytin encoding.
    ///
    /// Each `And`/`Or` of the negation normal form gets a fresh
    /// [`FreeTerm`]; the result is linear in the size of the input but is
    /// not equivalent to it.
    pub fn tseytin(&self) -> LogicNode {
        let prepared = self.nnf().reduce().flatten();
        if prepared.is_constant() || prepared.is_literal() {
            return prepared;
        }
        let mut clauses = Vec::new();
        let root = tseytin_encode(&prepared, &mut clauses);
        clauses.push(vec![root]);
        LogicNode::from_clauses(&clauses)
    }
}

/// Children of a junction, with same-kind children spliced in.
fn splice<I: Iterator<Item = LogicNode>>(children: I, conjunction: bool) -> Vec<LogicNode> {
    let mut out = Vec::new();
    for c in children {
        match (c.kind(), conjunction) {
            (NodeKind::And(inner), true) | (NodeKind::Or(inner), false) => {
                out.extend(inner.iter().cloned())
            }
            _ => out.push(c),
        }
    }
    out
}

fn negate_reduced(child: LogicNode) -> LogicNode {
    match child.kind() {
        NodeKind::True => LogicNode::always_false(),
        NodeKind::False => LogicNode::always_true(),
        NodeKind::Not(inner) => inner.clone(),
        _ => LogicNode::not(child),
    }
}

/// Complement of a node when it is syntactically obvious.
fn is_complement(a: &LogicNode, b: &LogicNode) -> bool {
    match (a.kind(), b.kind()) {
        (NodeKind::Not(x), _) if x == b => true,
        (_, NodeKind::Not(y)) if y == a => true,
        _ => false,
    }
}

fn reduce_junction<I: Iterator<Item = LogicNode>>(children: I, conjunction: bool) -> LogicNode {
    // the absorbing constant for this junction
    let absorbing = LogicNode::constant(!conjunction);
    let mut kept: Vec<LogicNode> = Vec::new();
    for c in splice(children, conjunction) {
        if c == absorbing {
            return absorbing;
        }
        if c.is_constant() || kept.contains(&c) {
            continue;
        }
        if kept.iter().any(|k| is_complement(k, &c)) {
            return absorbing;
        }
        kept.push(c);
    }
    if conjunction {
        LogicNode::and(kept)
    } else {
        LogicNode::or(kept)
    }
}

fn reduce_xor(children: Vec<LogicNode>) -> LogicNode {
    let trues = children.iter().filter(|c| c.is_true()).count();
    if trues >= 2 {
        return LogicNode::always_false();
    }
    let rest: Vec<LogicNode> = children.into_iter().filter(|c| !c.is_constant()).collect();
    if trues == 1 {
        return LogicNode::nor(rest).reduce();
    }
    // a child listed twice can never be the single true one
    if let Some(dup) = rest
        .iter()
        .find(|c| rest.iter().filter(|o| o == c).count() > 1)
        .cloned()
    {
        let others: Vec<LogicNode> = rest.into_iter().filter(|c| *c != dup).collect();
        return LogicNode::and(vec![LogicNode::not(dup), LogicNode::xor(others)]).reduce();
    }
    LogicNode::xor(rest)
}

struct Distributor {
    dnf: bool,
    limit: Option<usize>,
    emitted: usize,
}

impl Distributor {
    /// Clauses (or cubes, for DNF) of a grouped NNF tree.
    fn groups(&mut self, node: &LogicNode) -> Result<Vec<Vec<Literal>>> {
        if let Some(lit) = node.as_literal() {
            return Ok(vec![vec![lit]]);
        }
        match (node.kind(), self.dnf) {
            // identity element: no groups; absorbing element: one empty group
            (NodeKind::True, false) | (NodeKind::False, true) => Ok(Vec::new()),
            (NodeKind::False, false) | (NodeKind::True, true) => Ok(vec![Vec::new()]),
            (NodeKind::And(cs), false) | (NodeKind::Or(cs), true) => {
                let mut out = Vec::new();
                for c in cs {
                    out.extend(self.groups(c)?);
                }
                Ok(out)
            }
            (NodeKind::Or(cs), false) | (NodeKind::And(cs), true) => {
                let mut rest = cs.iter();
                let mut acc = match rest.next() {
                    Some(first) => self.groups(first)?,
                    None => vec![Vec::new()],
                };
                for c in rest {
                    let rhs = self.groups(c)?;
                    acc = self.product(&acc, &rhs)?;
                }
                Ok(acc)
            }
            _ => Err(LogicError::NotCnf(format!("{node}"))),
        }
    }

    fn product(&mut self, lhs: &[Vec<Literal>], rhs: &[Vec<Literal>]) -> Result<Vec<Vec<Literal>>> {
        let mut out = Vec::with_capacity(lhs.len() * rhs.len());
        for l in lhs {
            for r in rhs {
                let mut merged = l.clone();
                merged.extend(r.iter().cloned());
                out.push(merged);
            }
        }
        if lhs.len() > 1 || rhs.len() > 1 {
            self.emitted += out.len();
            if let Some(limit) = self.limit {
                if self.emitted > limit {
                    return Err(LogicError::SizeExplosion {
                        clauses: self.emitted,
                        limit,
                    });
                }
            }
        }
        Ok(out)
    }
}

/// Sort and dedupe literals in each group, drop groups holding a literal
/// and its complement, and dedupe groups.
fn canonical_groups(groups: Vec<Vec<Literal>>) -> Vec<Vec<Literal>> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for group in groups {
        let set: BTreeSet<Literal> = group.into_iter().collect();
        if set.iter().any(|l| set.contains(&l.negated())) {
            continue;
        }
        let canonical: Vec<Literal> = set.into_iter().collect();
        if seen.insert(canonical.clone()) {
            out.push(canonical);
        }
    }
    // an empty group absorbs everything else
    if out.iter().any(Vec::is_empty) {
        return vec![Vec::new()];
    }
    out
}

fn tseytin_encode(node: &LogicNode, clauses: &mut Vec<Vec<Literal>>) -> Literal {
    if let Some(lit) = node.as_literal() {
        return lit;
    }
    let var = Literal::positive(Term::Free(FreeTerm::fresh()));
    match node.kind() {
        NodeKind::And(cs) => {
            let lits: Vec<Literal> = cs.iter().map(|c| tseytin_encode(c, clauses)).collect();
            let mut back = vec![var.clone()];
            for l in &lits {
                clauses.push(vec![var.negated(), l.clone()]);
                back.push(l.negated());
            }
            clauses.push(back);
        }
        NodeKind::Or(cs) => {
            let lits: Vec<Literal> = cs.iter().map(|c| tseytin_encode(c, clauses)).collect();
            let mut forward = vec![var.negated()];
            for l in &lits {
                clauses.push(vec![var.clone(), l.negated()]);
                forward.push(l.clone());
            }
            clauses.push(forward);
        }
        NodeKind::True => clauses.push(vec![var.clone()]),
        // False; nothing else survives reduced NNF besides literals
        _ => clauses.push(vec![var.negated()]),
    }
    var
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::tests::ext;

    fn a() -> LogicNode {
        ext("A")
    }
    fn b() -> LogicNode {
        ext("B")
    }
    fn c() -> LogicNode {
        ext("C")
    }

    fn same_truth_table(x: &LogicNode, y: &LogicNode) -> bool {
        let both = LogicNode::and(vec![x.clone(), y.clone()]);
        let same = both
            .assignments()
            .all(|asg| x.evaluate_assignment(&asg) == y.evaluate_assignment(&asg));
        same
    }

    #[test]
    fn flatten_merges_nested_junctions() {
        let n = LogicNode::and(vec![LogicNode::and(vec![a(), b()]), c()]);
        assert_eq!(n.flatten(), LogicNode::and(vec![a(), b(), c()]));
    }

    #[test]
    fn reduce_drops_constants_and_contradictions() {
        let n = LogicNode::and(vec![LogicNode::always_true(), a()]);
        assert_eq!(n.reduce(), a());
        let n = LogicNode::and(vec![a(), LogicNode::not(a())]);
        assert!(n.reduce().is_false());
        let n = LogicNode::or(vec![a(), LogicNode::not(a())]);
        assert!(n.reduce().is_true());
        let n = LogicNode::not(LogicNode::not(a()));
        assert_eq!(n.reduce(), a());
    }

    #[test]
    fn reduce_xor_of_self_is_false() {
        let n = LogicNode::xor(vec![a(), a()]);
        assert!(n.reduce().is_false());
        let n = LogicNode::xor(vec![LogicNode::always_true(), a()]);
        assert_eq!(n.reduce(), LogicNode::not(a()));
    }

    #[test]
    fn reduce_folds_if() {
        assert_eq!(LogicNode::implies(LogicNode::always_true(), a()).reduce(), a());
        assert!(LogicNode::implies(LogicNode::always_false(), a()).reduce().is_true());
        assert_eq!(
            LogicNode::implies(a(), LogicNode::always_false()).reduce(),
            LogicNode::not(a())
        );
        assert!(LogicNode::implies(a(), a()).reduce().is_true());
    }

    #[test]
    fn nnf_pushes_negation_to_leaves() {
        let n = LogicNode::not(LogicNode::and(vec![a(), LogicNode::or(vec![b(), c()])]));
        let expected = LogicNode::or(vec![
            LogicNode::not(a()),
            LogicNode::and(vec![LogicNode::not(b()), LogicNode::not(c())]),
        ]);
        assert_eq!(n.nnf(), expected);
    }

    #[test]
    fn nnf_preserves_meaning_of_every_connective() {
        let nodes = [
            LogicNode::xor(vec![a(), b(), c()]),
            LogicNode::not(LogicNode::xor(vec![a(), b(), c()])),
            LogicNode::nor(vec![a(), b()]),
            LogicNode::not(LogicNode::nor(vec![a(), b()])),
            LogicNode::implies(a(), b()),
            LogicNode::not(LogicNode::implies(a(), b())),
        ];
        for n in &nodes {
            assert!(same_truth_table(n, &n.nnf()), "nnf changed {n}");
        }
    }

    #[test]
    fn group_by_2_left_associates() {
        let n = LogicNode::or(vec![a(), b(), c()]);
        assert_eq!(
            n.group_by_2(),
            LogicNode::or(vec![LogicNode::or(vec![a(), b()]), c()])
        );
    }

    #[test]
    fn equiv_cnf_distributes() {
        // (A & B) | C  =>  (A | C) & (B | C)
        let n = LogicNode::or(vec![LogicNode::and(vec![a(), b()]), c()]);
        let cnf = n.equiv_cnf(true).unwrap();
        assert!(cnf.is_cnf());
        assert_eq!(cnf.cnf_clauses().unwrap().len(), 2);
        assert!(same_truth_table(&n, &cnf));
    }

    #[test]
    fn equiv_cnf_raises_on_explosion() {
        let pair = |x: &str, y: &str| LogicNode::and(vec![ext(x), ext(y)]);
        let n = LogicNode::or(vec![pair("A", "B"), pair("C", "D"), pair("E", "F"), pair("G", "H")]);
        assert!(matches!(
            n.equiv_cnf(true),
            Err(LogicError::SizeExplosion { limit: 10, .. })
        ));
        let cnf = n.equiv_cnf(false).unwrap();
        assert_eq!(cnf.cnf_clauses().unwrap().len(), 16);
    }

    #[test]
    fn equiv_dnf_distributes() {
        let n = LogicNode::and(vec![LogicNode::or(vec![a(), b()]), c()]);
        let dnf = n.equiv_dnf(true).unwrap();
        assert!(dnf.is_dnf());
        assert!(same_truth_table(&n, &dnf));
    }

    #[test]
    fn tseytin_is_cnf_with_free_terms() {
        let n = LogicNode::or(vec![LogicNode::and(vec![a(), b()]), c()]);
        let t = n.tseytin();
        assert!(t.is_cnf());
        assert!(t.has_free_terms());
        assert_eq!(a().tseytin(), a());
    }
}
