//! Two-level minimization.
//!
//! Small functions are minimized exactly with Quine-McCluskey: prime
//! implicants are found by repeatedly merging implicants that differ in
//! one bit, then a cover is chosen from the essential primes plus a greedy
//! pick of the rest. Larger functions go through a [`TwoLevelMinimizer`]
//! via the engine.
//!
//! [`TwoLevelMinimizer`]: crate::solver::TwoLevelMinimizer

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::eval::assignments_of;
use crate::node::{Literal, LogicNode};
use crate::pla::{Cube, Pla};
use crate::term::Term;

/// Target shape of a minimized formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TwoLevelForm {
    /// OR of ANDs.
    SumOfProducts,
    /// AND of ORs.
    ProductOfSums,
}

/// An implicant over `n` variables: bits set in `mask` are don't-cares and
/// are always clear in `value`. Bit `n - 1` is the first variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Implicant {
    mask: u32,
    value: u32,
}

impl Implicant {
    fn covers(&self, minterm: u32) -> bool {
        minterm & !self.mask == self.value
    }

    fn literal_count(&self, n: usize) -> u32 {
        n as u32 - self.mask.count_ones()
    }

    fn to_cube(self, n: usize) -> Cube {
        (0..n)
            .map(|i| {
                let bit = 1u32 << (n - 1 - i);
                if self.mask & bit != 0 {
                    None
                } else {
                    Some(self.value & bit != 0)
                }
            })
            .collect()
    }
}

fn prime_implicants(minterms: &[u32]) -> Vec<Implicant> {
    let mut current: BTreeSet<Implicant> = minterms
        .iter()
        .map(|&m| Implicant { mask: 0, value: m })
        .collect();
    let mut primes = BTreeSet::new();

    while !current.is_empty() {
        let items: Vec<Implicant> = current.iter().copied().collect();
        let mut merged = vec![false; items.len()];
        let mut next = BTreeSet::new();
        for i in 0..items.len() {
            for j in i + 1..items.len() {
                let (a, b) = (items[i], items[j]);
                if a.mask != b.mask {
                    continue;
                }
                let diff = a.value ^ b.value;
                if diff.count_ones() == 1 {
                    next.insert(Implicant {
                        mask: a.mask | diff,
                        value: a.value & !diff,
                    });
                    merged[i] = true;
                    merged[j] = true;
                }
            }
        }
        for (item, used) in items.iter().zip(merged) {
            if !used {
                primes.insert(*item);
            }
        }
        current = next;
    }
    primes.into_iter().collect()
}

fn select_cover(n: usize, primes: &[Implicant], minterms: &[u32]) -> Vec<Implicant> {
    let mut remaining: BTreeSet<u32> = minterms.iter().copied().collect();
    let mut chosen: Vec<Implicant> = Vec::new();

    // essential primes: the only cover of some minterm
    for &m in minterms {
        let covering: Vec<&Implicant> = primes.iter().filter(|p| p.covers(m)).collect();
        if let [only] = covering.as_slice() {
            if !chosen.contains(only) {
                chosen.push(**only);
            }
        }
    }
    remaining.retain(|m| !chosen.iter().any(|p| p.covers(*m)));

    // greedy: most newly covered minterms, then fewest literals
    while !remaining.is_empty() {
        let best = primes
            .iter()
            .filter(|p| !chosen.contains(p))
            .map(|p| {
                let gain = remaining.iter().filter(|m| p.covers(**m)).count();
                (gain, std::cmp::Reverse(p.literal_count(n)), std::cmp::Reverse(*p))
            })
            .max();
        let Some((gain, _, std::cmp::Reverse(pick))) = best else {
            break;
        };
        if gain == 0 {
            break;
        }
        chosen.push(pick);
        remaining.retain(|m| !pick.covers(*m));
    }
    chosen.sort();
    chosen
}

/// Exact minimal cover of the ON-set `minterms` over `n` variables.
pub fn quine_mccluskey(n: usize, minterms: &[u32]) -> Vec<Cube> {
    let primes = prime_implicants(minterms);
    select_cover(n, &primes, minterms)
        .into_iter()
        .map(|p| p.to_cube(n))
        .collect()
}

/// The truth table of a tree over its sorted terms, split into the
/// assignments (as MSB-first bit patterns) that satisfy and falsify it.
pub(crate) struct TruthTable {
    pub terms: Vec<Term>,
    pub on: Vec<u32>,
    pub off: Vec<u32>,
}

impl TruthTable {
    pub fn of(node: &LogicNode) -> Self {
        let terms = node.terms().to_vec();
        let mut on = Vec::new();
        let mut off = Vec::new();
        for (bits, assignment) in assignments_of(&terms).enumerate() {
            if node.evaluate_assignment(&assignment) {
                on.push(bits as u32);
            } else {
                off.push(bits as u32);
            }
        }
        Self { terms, on, off }
    }

    /// The ON-set (or OFF-set) as a PLA of minterm cubes.
    pub fn to_pla(&self, off_set: bool) -> Pla {
        let n = self.terms.len();
        let points = if off_set { &self.off } else { &self.on };
        let cubes = points
            .iter()
            .map(|&m| Implicant { mask: 0, value: m }.to_cube(n))
            .collect();
        Pla::new(self.terms.iter().map(Term::identifier).collect(), cubes)
    }
}

/// Build the two-level tree for a cover.
///
/// For sum-of-products, `cubes` cover the ON-set and become the products.
/// For product-of-sums, `cubes` cover the OFF-set; each becomes a clause
/// of complemented literals.
pub(crate) fn cover_to_node(terms: &[Term], cubes: &[Cube], form: TwoLevelForm) -> LogicNode {
    let literals = |cube: &Cube, complement: bool| -> Vec<Literal> {
        cube.iter()
            .zip(terms)
            .filter_map(|(bit, term)| {
                bit.map(|b| Literal {
                    term: term.clone(),
                    positive: b != complement,
                })
            })
            .collect()
    };
    match form {
        TwoLevelForm::SumOfProducts => {
            LogicNode::from_cubes(&cubes.iter().map(|c| literals(c, false)).collect::<Vec<_>>())
        }
        TwoLevelForm::ProductOfSums => {
            LogicNode::from_clauses(&cubes.iter().map(|c| literals(c, true)).collect::<Vec<_>>())
        }
    }
}

impl LogicNode {
    /// Exact Quine-McCluskey minimization over this tree's terms.
    ///
    /// Cost grows with `2^terms`; the engine only calls this for small
    /// trees and routes larger ones to a heuristic minimizer.
    pub fn minimize_exact(&self, form: TwoLevelForm) -> LogicNode {
        let table = TruthTable::of(self);
        let n = table.terms.len();
        let points = match form {
            TwoLevelForm::SumOfProducts => &table.on,
            TwoLevelForm::ProductOfSums => &table.off,
        };
        cover_to_node(&table.terms, &quine_mccluskey(n, points), form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::tests::ext;

    #[test]
    fn merges_adjacent_minterms() {
        // f(a, b) = ab + a!b
        let cubes = quine_mccluskey(2, &[0b11, 0b10]);
        assert_eq!(cubes, vec![vec![Some(true), None]]);
    }

    #[test]
    fn classic_four_variable_example() {
        // f = sum m(4, 8, 10, 11, 12, 15) + ...: every cube of the cover
        // must be a prime, and the cover must be exact
        let minterms = [4, 8, 10, 11, 12, 15];
        let cubes = quine_mccluskey(4, &minterms);
        for m in 0..16u32 {
            let point: Vec<bool> = (0..4).map(|i| m >> (3 - i) & 1 == 1).collect();
            let covered = cubes.iter().any(|c| crate::pla::cube_covers(c, &point));
            assert_eq!(covered, minterms.contains(&m), "minterm {m}");
        }
        assert!(cubes.len() <= 4);
    }

    #[test]
    fn constant_functions() {
        assert!(quine_mccluskey(2, &[]).is_empty());
        assert_eq!(quine_mccluskey(2, &[0, 1, 2, 3]), vec![vec![None, None]]);
    }

    #[test]
    fn minimizes_tree_to_single_literal() {
        let a = ext("A");
        let b = ext("B");
        let n = LogicNode::or(vec![
            LogicNode::and(vec![a.clone(), b.clone()]),
            LogicNode::and(vec![a.clone(), LogicNode::not(b)]),
        ]);
        assert_eq!(n.minimize_exact(TwoLevelForm::SumOfProducts), a);
        assert_eq!(n.minimize_exact(TwoLevelForm::ProductOfSums), a);
    }

    #[test]
    fn product_of_sums_shape() {
        // (A | B) & C
        let n = LogicNode::and(vec![LogicNode::or(vec![ext("A"), ext("B")]), ext("C")]);
        let pos = n.minimize_exact(TwoLevelForm::ProductOfSums);
        assert!(pos.is_cnf());
        assert_eq!(pos.literal_count(), 3);
        let sop = n.minimize_exact(TwoLevelForm::SumOfProducts);
        assert!(sop.is_dnf());
        assert_eq!(sop.literal_count(), 4);
    }

    #[test]
    fn minimizes_constants() {
        let n = LogicNode::and(vec![ext("A"), LogicNode::not(ext("A"))]);
        assert!(n.minimize_exact(TwoLevelForm::SumOfProducts).is_false());
        assert!(n.minimize_exact(TwoLevelForm::ProductOfSums).is_false());
        let t = LogicNode::or(vec![ext("A"), LogicNode::not(ext("A"))]);
        assert!(t.minimize_exact(TwoLevelForm::SumOfProducts).is_true());
        assert!(t.minimize_exact(TwoLevelForm::ProductOfSums).is_true());
    }
}
