//! Adapter traits for the three delegated algorithms, plus in-process
//! implementations used when no external tool is configured and the `z3`
//! feature is off.
//!
//! The engine only speaks DIMACS and PLA to these adapters, so an external
//! process and an in-process substitute are interchangeable.

use std::collections::BTreeSet;

use tracing::debug;

use crate::dimacs::DimacsCnf;
use crate::error::Result;
use crate::pla::{Cube, Pla};

/// Verdict of a SAT query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatOutcome {
    /// Satisfiable, with a model as signed DIMACS literals.
    Satisfiable(Vec<i32>),
    Unsatisfiable,
}

impl SatOutcome {
    pub fn is_satisfiable(&self) -> bool {
        matches!(self, SatOutcome::Satisfiable(_))
    }
}

/// Decides satisfiability of a DIMACS formula.
pub trait SatSolver: Send + Sync {
    fn name(&self) -> &str;
    fn solve(&self, cnf: &DimacsCnf) -> Result<SatOutcome>;
}

/// Finds a small cover for the ON-set of a single-output function.
pub trait TwoLevelMinimizer: Send + Sync {
    fn name(&self) -> &str;
    fn minimize(&self, on_set: &Pla) -> Result<Pla>;
}

/// Enumerates minimal unsatisfiable subsets of a DIMACS formula. Each
/// subset is a list of clause indices into the input.
pub trait UnsatCoreExtractor: Send + Sync {
    fn name(&self) -> &str;
    fn extract(&self, cnf: &DimacsCnf) -> Result<Vec<Vec<usize>>>;
}

// ---------------------------------------------------------------------------
// DPLL
// ---------------------------------------------------------------------------

/// Small DPLL solver with unit propagation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DpllSolver;

impl DpllSolver {
    /// Satisfiability of a clause list over variables `1..=num_vars`.
    pub fn check(num_vars: usize, clauses: &[&[i32]]) -> Option<Vec<i32>> {
        let mut assign = vec![None; num_vars + 1];
        if !dpll(clauses, &mut assign) {
            return None;
        }
        Some(
            (1..=num_vars)
                .map(|v| {
                    let var = v as i32;
                    if assign[v] == Some(true) {
                        var
                    } else {
                        -var
                    }
                })
                .collect(),
        )
    }
}

impl SatSolver for DpllSolver {
    fn name(&self) -> &str {
        "dpll"
    }

    fn solve(&self, cnf: &DimacsCnf) -> Result<SatOutcome> {
        let clauses: Vec<&[i32]> = cnf.clauses.iter().map(Vec::as_slice).collect();
        Ok(match Self::check(cnf.num_vars, &clauses) {
            Some(model) => SatOutcome::Satisfiable(model),
            None => SatOutcome::Unsatisfiable,
        })
    }
}

fn value_of(assign: &[Option<bool>], lit: i32) -> Option<bool> {
    let v = assign.get(lit.unsigned_abs() as usize).copied().flatten()?;
    Some(if lit > 0 { v } else { !v })
}

fn dpll(clauses: &[&[i32]], assign: &mut Vec<Option<bool>>) -> bool {
    // unit propagation to a fixed point
    loop {
        let mut progressed = false;
        for clause in clauses {
            let mut open = None;
            let mut open_count = 0;
            let mut satisfied = false;
            for &lit in clause.iter() {
                match value_of(assign, lit) {
                    Some(true) => {
                        satisfied = true;
                        break;
                    }
                    Some(false) => {}
                    None => {
                        open_count += 1;
                        open = Some(lit);
                    }
                }
            }
            if satisfied {
                continue;
            }
            match (open_count, open) {
                (0, _) => return false,
                (1, Some(lit)) => {
                    assign[lit.unsigned_abs() as usize] = Some(lit > 0);
                    progressed = true;
                }
                _ => {}
            }
        }
        if !progressed {
            break;
        }
    }

    // branch on the first unassigned variable of an open clause
    let branch = clauses
        .iter()
        .filter(|c| !c.iter().any(|&l| value_of(assign, l) == Some(true)))
        .flat_map(|c| c.iter())
        .find(|&&l| value_of(assign, l).is_none())
        .map(|l| l.unsigned_abs() as usize);
    let Some(var) = branch else {
        return true;
    };
    for value in [true, false] {
        let mut trial = assign.clone();
        trial[var] = Some(value);
        if dpll(clauses, &mut trial) {
            *assign = trial;
            return true;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Two-level minimization
// ---------------------------------------------------------------------------

/// Espresso-style minimizer: each cube is expanded as far as the ON-set
/// allows, then cubes covered by the rest of the cover are dropped.
///
/// Containment is decided on cubes by cofactoring and recursive tautology
/// checking, so the cost depends on the size of the cover rather than on
/// the number of inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandIrredundantMinimizer;

fn cube_literals(cube: &[Option<bool>]) -> usize {
    cube.iter().filter(|b| b.is_some()).count()
}

/// Whether every point of `inner` lies in `outer`.
fn cube_within(inner: &[Option<bool>], outer: &[Option<bool>]) -> bool {
    inner
        .iter()
        .zip(outer)
        .all(|(i, o)| o.is_none() || i == o)
}

/// The cofactor of `cube` with respect to `wrt`, or `None` if the two are
/// disjoint.
fn cofactor(cube: &[Option<bool>], wrt: &[Option<bool>]) -> Option<Cube> {
    let mut out = Vec::with_capacity(cube.len());
    for (bit, fixed) in cube.iter().zip(wrt) {
        match (bit, fixed) {
            (Some(b), Some(f)) if b != f => return None,
            (_, Some(_)) => out.push(None),
            (b, None) => out.push(*b),
        }
    }
    Some(out)
}

/// Whether the union of `cover` is the whole space.
fn tautology(cover: &[Cube]) -> bool {
    if cover.iter().any(|c| c.iter().all(Option::is_none)) {
        return true;
    }
    let width = cover.first().map_or(0, Vec::len);
    let mut split = None;
    let mut best = 0;
    for i in 0..width {
        let positive = cover.iter().filter(|c| c[i] == Some(true)).count();
        let negative = cover.iter().filter(|c| c[i] == Some(false)).count();
        if positive > 0 && negative > 0 && positive + negative > best {
            best = positive + negative;
            split = Some(i);
        }
    }
    // a unate cover is a tautology only if it holds the universal cube
    let Some(var) = split else {
        return false;
    };
    [true, false].into_iter().all(|value| {
        let half: Vec<Cube> = cover
            .iter()
            .filter(|c| c[var] != Some(!value))
            .map(|c| {
                let mut d = c.clone();
                d[var] = None;
                d
            })
            .collect();
        tautology(&half)
    })
}

/// Whether `cube` lies inside the union of `cover`.
fn covered(cube: &[Option<bool>], cover: &[Cube]) -> bool {
    let cofactors: Vec<Cube> = cover.iter().filter_map(|c| cofactor(c, cube)).collect();
    tautology(&cofactors)
}

impl TwoLevelMinimizer for ExpandIrredundantMinimizer {
    fn name(&self) -> &str {
        "expand-irredundant"
    }

    fn minimize(&self, on_set: &Pla) -> Result<Pla> {
        // expand
        let mut cover: Vec<Cube> = Vec::new();
        for cube in &on_set.cubes {
            if cover.iter().any(|c| cube_within(cube, c)) {
                continue;
            }
            let mut grown = cube.clone();
            for i in 0..grown.len() {
                if grown[i].is_none() {
                    continue;
                }
                let saved = grown[i].take();
                if !covered(&grown, &on_set.cubes) {
                    grown[i] = saved;
                }
            }
            cover.retain(|c| !cube_within(c, &grown));
            cover.push(grown);
        }

        // irredundant: try to drop the most specific cubes first
        cover.sort_by_key(|c| std::cmp::Reverse(cube_literals(c)));
        let mut idx = 0;
        while idx < cover.len() {
            let others: Vec<Cube> = cover
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != idx)
                .map(|(_, c)| c.clone())
                .collect();
            if covered(&cover[idx], &others) {
                cover.remove(idx);
            } else {
                idx += 1;
            }
        }
        cover.sort();

        debug!(
            inputs = on_set.inputs,
            before = on_set.cubes.len(),
            after = cover.len(),
            "expand-irredundant minimization"
        );
        Ok(Pla {
            inputs: on_set.inputs,
            labels: on_set.labels.clone(),
            cubes: cover,
        })
    }
}

// ---------------------------------------------------------------------------
// MUS extraction
// ---------------------------------------------------------------------------

/// Every minimal unsatisfiable subset of `count` clauses, smallest first.
/// `unsat` decides a subset given as sorted clause indices.
pub(crate) fn enumerate_muses<F>(count: usize, mut unsat: F) -> Result<Vec<Vec<usize>>>
where
    F: FnMut(&[usize]) -> Result<bool>,
{
    let mut masks: Vec<u32> = (1..1u32 << count).collect();
    masks.sort_by_key(|mask| mask.count_ones());
    let mut found: Vec<u32> = Vec::new();
    for mask in masks {
        if found.iter().any(|f| mask & f == *f) {
            continue;
        }
        let subset: Vec<usize> = (0..count).filter(|i| mask >> i & 1 == 1).collect();
        if unsat(&subset)? {
            found.push(mask);
        }
    }
    Ok(found
        .into_iter()
        .map(|mask| (0..count).filter(|i| mask >> i & 1 == 1).collect())
        .collect())
}

/// Shrink an unsatisfiable subset to a minimal one by deleting each clause
/// whose removal keeps the rest unsatisfiable.
pub(crate) fn shrink_to_mus<F>(core: Vec<usize>, mut unsat: F) -> Result<Vec<usize>>
where
    F: FnMut(&[usize]) -> Result<bool>,
{
    let mut kept: BTreeSet<usize> = core.into_iter().collect();
    let candidates: Vec<usize> = kept.iter().copied().collect();
    for i in candidates {
        kept.remove(&i);
        let subset: Vec<usize> = kept.iter().copied().collect();
        if !unsat(&subset)? {
            kept.insert(i);
        }
    }
    Ok(kept.into_iter().collect())
}

/// In-process MUS extraction.
///
/// Formulas with at most `max_exhaustive` clauses get every minimal
/// unsatisfiable subset; larger ones get a single subset found by deletion.
#[derive(Debug, Clone, Copy)]
pub struct InProcessMusExtractor {
    pub max_exhaustive: usize,
}

impl Default for InProcessMusExtractor {
    fn default() -> Self {
        Self { max_exhaustive: 12 }
    }
}

impl InProcessMusExtractor {
    pub fn new(max_exhaustive: usize) -> Self {
        Self { max_exhaustive }
    }

    fn unsat(cnf: &DimacsCnf, subset: &[usize]) -> Result<bool> {
        let clauses: Vec<&[i32]> = subset.iter().map(|&i| cnf.clauses[i].as_slice()).collect();
        Ok(DpllSolver::check(cnf.num_vars, &clauses).is_none())
    }
}

impl UnsatCoreExtractor for InProcessMusExtractor {
    fn name(&self) -> &str {
        "in-process-mus"
    }

    fn extract(&self, cnf: &DimacsCnf) -> Result<Vec<Vec<usize>>> {
        let all: Vec<usize> = (0..cnf.clauses.len()).collect();
        if !Self::unsat(cnf, &all)? {
            return Ok(Vec::new());
        }
        if cnf.clauses.len() <= self.max_exhaustive.min(31) {
            debug!(clauses = cnf.clauses.len(), "exhaustive MUS enumeration");
            enumerate_muses(cnf.clauses.len(), |subset| Self::unsat(cnf, subset))
        } else {
            debug!(clauses = cnf.clauses.len(), "deletion-based MUS extraction");
            Ok(vec![shrink_to_mus(all, |subset| Self::unsat(cnf, subset))?])
        }
    }
}
