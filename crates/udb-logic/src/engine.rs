//! Query engine.
//!
//! Ties together brute-force evaluation, CNF conversion, the satisfiability
//! cache, and the three delegated algorithms (SAT solving, two-level
//! minimization, MUS extraction) behind satisfiability, equivalence,
//! minimization, and diagnosis queries.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::cache::{CacheStats, SatCache};
use crate::config::EngineConfig;
use crate::error::{LogicError, Result};
use crate::external::{ExternalMinimizer, ExternalMusExtractor, ExternalSatSolver};
use crate::minimize::{cover_to_node, TruthTable, TwoLevelForm};
use crate::node::{Literal, LogicNode, NodeKind};
use crate::pla::{Cube, Pla};
use crate::solver::{
    shrink_to_mus, ExpandIrredundantMinimizer, SatSolver, TwoLevelMinimizer, UnsatCoreExtractor,
};
use crate::term::Term;

/// Truth tables are never built over more terms than this.
const MAX_TRUTH_TABLE_TERMS: usize = 24;

#[cfg(feature = "z3")]
fn default_sat_solver() -> Box<dyn SatSolver> {
    Box::new(crate::smt::Z3SatSolver::default())
}

#[cfg(not(feature = "z3"))]
fn default_sat_solver() -> Box<dyn SatSolver> {
    Box::new(crate::solver::DpllSolver)
}

#[cfg(feature = "z3")]
fn default_mus_extractor(max_exhaustive: usize) -> Box<dyn UnsatCoreExtractor> {
    Box::new(crate::smt::Z3MusExtractor::new(max_exhaustive))
}

#[cfg(not(feature = "z3"))]
fn default_mus_extractor(max_exhaustive: usize) -> Box<dyn UnsatCoreExtractor> {
    Box::new(crate::solver::InProcessMusExtractor::new(max_exhaustive))
}

/// The logic query engine.
pub struct LogicEngine {
    config: EngineConfig,
    cache: Mutex<SatCache>,
    sat_solver: Box<dyn SatSolver>,
    minimizer: Box<dyn TwoLevelMinimizer>,
    mus_extractor: Box<dyn UnsatCoreExtractor>,
}

impl LogicEngine {
    /// Create an engine, using the external tools `config` names and
    /// built-in backends for the rest: Z3 with the `z3` feature, otherwise
    /// the in-process DPLL solver and MUS extractor.
    pub fn new(config: EngineConfig) -> Self {
        let sat_solver: Box<dyn SatSolver> = match &config.tools.sat_solver {
            Some(tool) => Box::new(ExternalSatSolver::new(tool.clone())),
            None => default_sat_solver(),
        };
        let minimizer: Box<dyn TwoLevelMinimizer> = match &config.tools.minimizer {
            Some(tool) => Box::new(ExternalMinimizer::new(tool.clone())),
            None => Box::new(ExpandIrredundantMinimizer),
        };
        let mus_extractor: Box<dyn UnsatCoreExtractor> = match &config.tools.mus_extractor {
            Some(tool) => Box::new(ExternalMusExtractor::new(tool.clone())),
            None => default_mus_extractor(config.limits.exhaustive_mus_max_clauses),
        };
        Self {
            config,
            cache: Mutex::new(SatCache::new()),
            sat_solver,
            minimizer,
            mus_extractor,
        }
    }

    pub fn with_sat_solver(mut self, solver: Box<dyn SatSolver>) -> Self {
        self.sat_solver = solver;
        self
    }

    pub fn with_minimizer(mut self, minimizer: Box<dyn TwoLevelMinimizer>) -> Self {
        self.minimizer = minimizer;
        self
    }

    pub fn with_mus_extractor(mut self, extractor: Box<dyn UnsatCoreExtractor>) -> Self {
        self.mus_extractor = extractor;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn cache(&self) -> MutexGuard<'_, SatCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn cache_statistics(&self) -> CacheStats {
        self.cache().statistics()
    }

    /// Forget every cached verdict, minimized form, and unsatisfiable
    /// subset. Verdicts found by enumeration are memoized on the nodes
    /// themselves and live as long as the nodes do.
    pub fn reset_cache(&self) {
        self.cache().reset();
    }

    // --- Satisfiability ---

    /// Whether some assignment of the tree's terms makes it true.
    ///
    /// Small trees are checked by enumerating assignments, and the verdict
    /// is memoized on the node. Larger ones go through this engine's
    /// content-hash cache and then its SAT solver, so a solver verdict is
    /// never shared with another engine.
    pub fn satisfiable(&self, node: &LogicNode) -> Result<bool> {
        if let Some(&verdict) = node.cache().satisfiable.get() {
            return Ok(verdict);
        }
        let limits = &self.config.limits;
        match node.kind() {
            NodeKind::True => return Ok(true),
            NodeKind::False => return Ok(false),
            _ => {}
        }
        if node.term_count() <= limits.brute_force_max_terms
            && node.literal_count() <= limits.brute_force_max_literals
        {
            debug!(terms = node.term_count(), "brute-force satisfiability");
            let verdict = self.brute_force_satisfiable(node);
            let _ = node.cache().satisfiable.set(verdict);
            return Ok(verdict);
        }
        let cached = self.cache().lookup(node);
        match cached {
            Some(verdict) => {
                debug!(terms = node.term_count(), "satisfiability cache hit");
                Ok(verdict)
            }
            None => {
                let verdict = self.solver_satisfiable(node)?;
                self.cache().store(node, verdict);
                Ok(verdict)
            }
        }
    }

    pub fn unsatisfiable(&self, node: &LogicNode) -> Result<bool> {
        Ok(!self.satisfiable(node)?)
    }

    /// Satisfiability by enumerating all `2^terms` assignments.
    pub fn brute_force_satisfiable(&self, node: &LogicNode) -> bool {
        node.assignments().any(|a| node.evaluate_assignment(&a))
    }

    /// Satisfiability through an equisatisfiable CNF and the SAT solver,
    /// bypassing brute force and the cache.
    pub fn solver_satisfiable(&self, node: &LogicNode) -> Result<bool> {
        let cnf = self.equisat_cnf(node)?;
        let encoding = cnf.to_dimacs()?;
        debug!(
            solver = self.sat_solver.name(),
            vars = encoding.cnf.num_vars,
            clauses = encoding.cnf.clauses.len(),
            "solver satisfiability"
        );
        Ok(self.sat_solver.solve(&encoding.cnf)?.is_satisfiable())
    }

    /// A CNF with the same satisfiability as `node`, computed once per node.
    ///
    /// Trees already in CNF are returned as is. Large trees use the Tseytin
    /// encoding directly; small ones try equivalent CNF first and fall back
    /// to Tseytin if distribution explodes.
    pub fn equisat_cnf(&self, node: &LogicNode) -> Result<LogicNode> {
        if let Some(cnf) = node.cache().equisat_cnf.get() {
            return Ok(cnf.clone());
        }
        let limits = &self.config.limits;
        let cnf = if node.is_cnf() {
            node.clone()
        } else if node.term_count() > limits.tseytin_term_threshold
            || node.literal_count() > limits.tseytin_literal_threshold
        {
            node.tseytin()
        } else {
            match node.equiv_cnf_with_limit(true, limits.cnf_explosion_limit) {
                Ok(cnf) => cnf,
                Err(LogicError::SizeExplosion { clauses, limit }) => {
                    warn!(clauses, limit, "CNF conversion exploded, using Tseytin");
                    node.tseytin()
                }
                Err(e) => return Err(e),
            }
        };
        let _ = node.cache().equisat_cnf.set(cnf.clone());
        Ok(cnf)
    }

    // --- Equivalence and implication ---

    /// Whether both trees are true under exactly the same assignments.
    pub fn equivalent(&self, a: &LogicNode, b: &LogicNode) -> Result<bool> {
        if a == b {
            return Ok(true);
        }
        self.unsatisfiable(&LogicNode::xor(vec![a.clone(), b.clone()]))
    }

    /// Whether every assignment satisfying `a` also satisfies `b`.
    pub fn always_implies(&self, a: &LogicNode, b: &LogicNode) -> Result<bool> {
        self.unsatisfiable(&LogicNode::and(vec![a.clone(), LogicNode::not(b.clone())]))
    }

    /// Whether `a` is covered by `b`, i.e. `a` always implies `b`.
    pub fn covered_by(&self, a: &LogicNode, b: &LogicNode) -> Result<bool> {
        self.always_implies(a, b)
    }

    // --- Minimization ---

    /// Smallest two-level equivalent of `node` in the requested form.
    ///
    /// Small trees are minimized exactly. Larger ones are handed to the
    /// configured [`TwoLevelMinimizer`] as a PLA whose cubes come from a
    /// bounded two-level form of the function (or of its complement, for
    /// product-of-sums), or from a truth table when that form explodes and
    /// the tree is small enough. When neither input can be built,
    /// [`LogicError::TooLargeToMinimize`] is returned.
    pub fn minimize(&self, node: &LogicNode, form: TwoLevelForm) -> Result<LogicNode> {
        let limits = &self.config.limits;
        let term_count = node.term_count();

        if term_count <= limits.exact_minimize_max_terms {
            debug!(terms = term_count, ?form, "exact minimization");
            return Ok(node.minimize_exact(form));
        }

        let already_two_level = match form {
            TwoLevelForm::ProductOfSums => node.is_nested_cnf(),
            TwoLevelForm::SumOfProducts => node.is_nested_dnf(),
        };
        if already_two_level && term_count == node.literal_count() {
            debug!(terms = term_count, ?form, "already minimal, skipping minimization");
            return Ok(node.flatten());
        }

        let cached = self.cache().lookup_minimized(node, form);
        if let Some(minimized) = cached {
            debug!(terms = term_count, ?form, "minimization cache hit");
            return Ok(minimized);
        }

        let off_set = form == TwoLevelForm::ProductOfSums;
        let terms = node.terms().to_vec();
        let cubes = match self.input_cover(node, &terms, off_set)? {
            Some(cubes) => cubes,
            None if term_count <= limits.heuristic_minimize_max_terms.min(MAX_TRUTH_TABLE_TERMS) => {
                debug!(terms = term_count, ?form, "two-level input exploded, using a truth table");
                TruthTable::of(node).to_pla(off_set).cubes
            }
            None => {
                return Err(LogicError::TooLargeToMinimize {
                    terms: term_count,
                    limit: limits.minimize_max_cubes,
                })
            }
        };

        debug!(
            terms = term_count,
            cubes = cubes.len(),
            ?form,
            minimizer = self.minimizer.name(),
            "heuristic minimization"
        );
        let pla = Pla::new(terms.iter().map(Term::identifier).collect(), cubes);
        let cover = self.minimizer.minimize(&pla)?;
        if let Some(bad) = cover.cubes.iter().find(|c| c.len() != term_count) {
            return Err(LogicError::ToolOutput {
                tool: self.minimizer.name().to_string(),
                detail: format!("cube has {} inputs, expected {term_count}", bad.len()),
            });
        }
        let minimized = cover_to_node(&terms, &cover.cubes, form);
        self.cache().store_minimized(node, form, minimized.clone());
        Ok(minimized)
    }

    /// Cubes over `terms` covering the ON-set of `node`, or its OFF-set.
    ///
    /// Read from the DNF of the target set, or else from the complemented
    /// clauses of the CNF of its complement. `None` when both exceed
    /// `minimize_max_cubes`.
    fn input_cover(&self, node: &LogicNode, terms: &[Term], off_set: bool) -> Result<Option<Vec<Cube>>> {
        let limit = self.config.limits.minimize_max_cubes;
        let target = if off_set {
            LogicNode::not(node.clone())
        } else {
            node.clone()
        };
        let groups = match target.equiv_dnf_with_limit(true, limit) {
            Ok(dnf) => dnf.dnf_cubes(),
            Err(LogicError::SizeExplosion { .. }) => {
                match LogicNode::not(target).equiv_cnf_with_limit(true, limit) {
                    Ok(cnf) => cnf.cnf_clauses().map(|clauses| {
                        clauses
                            .iter()
                            .map(|c| c.iter().map(Literal::negated).collect())
                            .collect()
                    }),
                    Err(LogicError::SizeExplosion { .. }) => None,
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };
        let Some(groups) = groups.filter(|g: &Vec<Vec<Literal>>| g.len() <= limit) else {
            return Ok(None);
        };

        let index: BTreeMap<&Term, usize> = terms.iter().enumerate().map(|(i, t)| (t, i)).collect();
        Ok(Some(
            groups
                .iter()
                .map(|group| {
                    let mut cube = vec![None; terms.len()];
                    for lit in group {
                        if let Some(&i) = index.get(&lit.term) {
                            cube[i] = Some(lit.positive);
                        }
                    }
                    cube
                })
                .collect(),
        ))
    }

    // --- Diagnosis ---

    /// Minimal unsatisfiable subsets of `node`'s clauses.
    ///
    /// Each top-level conjunct is converted to an equivalent CNF on its
    /// own, never a Tseytin encoding, so every clause is built from
    /// caller-visible terms. Each subset comes back as the conjunction of
    /// its clauses. A satisfiable tree has no subsets. Results are cached
    /// by content hash.
    ///
    /// A conjunct whose CNF exceeds `cnf_explosion_limit` is kept whole.
    /// One subset is then found by deletion over the clauses and whole
    /// conjuncts, using satisfiability queries instead of the extractor.
    pub fn minimal_unsat_subsets(&self, node: &LogicNode) -> Result<Vec<LogicNode>> {
        let cached = self.cache().lookup_muses(node);
        if let Some(muses) = cached {
            debug!(terms = node.term_count(), "unsatisfiable subset cache hit");
            return Ok(muses);
        }
        let muses = self.extract_muses(node)?;
        self.cache().store_muses(node, muses.clone());
        Ok(muses)
    }

    fn extract_muses(&self, node: &LogicNode) -> Result<Vec<LogicNode>> {
        let limit = self.config.limits.cnf_explosion_limit;
        let flat = node.flatten();
        let conjuncts: Vec<LogicNode> = match flat.kind() {
            NodeKind::And(cs) => cs.iter().cloned().collect(),
            _ => vec![flat.clone()],
        };

        let mut clauses: Vec<Vec<Literal>> = Vec::new();
        let mut seen = BTreeSet::new();
        let mut whole = Vec::new();
        for conjunct in conjuncts {
            match conjunct.equiv_cnf_with_limit(true, limit) {
                Ok(cnf) => {
                    for clause in cnf.cnf_clauses().unwrap_or_default() {
                        if seen.insert(clause.clone()) {
                            clauses.push(clause);
                        }
                    }
                }
                Err(LogicError::SizeExplosion { .. }) => whole.push(conjunct),
                Err(e) => return Err(e),
            }
        }
        if !whole.is_empty() {
            return self.deletion_mus(&clauses, whole);
        }

        let cnf = LogicNode::from_clauses(&clauses);
        let encoding = cnf.to_dimacs()?;
        debug!(
            extractor = self.mus_extractor.name(),
            clauses = encoding.cnf.clauses.len(),
            "extracting minimal unsatisfiable subsets"
        );
        self.mus_extractor
            .extract(&encoding.cnf)?
            .into_iter()
            .map(|subset| {
                let clauses = subset
                    .into_iter()
                    .map(|i| encoding.clause_node(i))
                    .collect::<Result<Vec<_>>>()?;
                Ok(LogicNode::and(clauses))
            })
            .collect()
    }

    fn deletion_mus(&self, clauses: &[Vec<Literal>], whole: Vec<LogicNode>) -> Result<Vec<LogicNode>> {
        warn!(
            clauses = clauses.len(),
            whole = whole.len(),
            "conjuncts too large for CNF, finding one unsatisfiable subset by deletion"
        );
        let units: Vec<LogicNode> = clauses
            .iter()
            .map(|c| LogicNode::or(c.iter().map(Literal::to_node).collect()))
            .chain(whole)
            .collect();
        let conjoin = |subset: &[usize]| LogicNode::and(subset.iter().map(|&i| units[i].clone()).collect());
        let unsat = |subset: &[usize]| self.unsatisfiable(&conjoin(subset));

        let all: Vec<usize> = (0..units.len()).collect();
        if !unsat(&all)? {
            return Ok(Vec::new());
        }
        let mus = shrink_to_mus(all, unsat)?;
        Ok(vec![conjoin(&mus)])
    }
}

impl Default for LogicEngine {
    fn default() -> Self {
        Self::new(EngineConfig::in_process())
    }
}

impl std::fmt::Debug for LogicEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicEngine")
            .field("config", &self.config)
            .field("sat_solver", &self.sat_solver.name())
            .field("minimizer", &self.minimizer.name())
            .field("mus_extractor", &self.mus_extractor.name())
            .finish()
    }
}
