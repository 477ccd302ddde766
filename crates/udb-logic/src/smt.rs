//! SAT and unsatisfiable-core backends using Z3 (feature-gated).
//!
//! All code in this module requires the `z3` feature flag. With it on,
//! [`crate::LogicEngine::new`] uses these backends wherever the
//! configuration names no external tool.

use std::time::Duration;

use tracing::debug;
use z3::ast::Bool;

use crate::dimacs::DimacsCnf;
use crate::error::{LogicError, Result};
use crate::solver::{enumerate_muses, shrink_to_mus, SatOutcome, SatSolver, UnsatCoreExtractor};

const TOOL: &str = "z3";

/// One Z3 context's solver with a boolean constant per DIMACS variable.
struct Session<'ctx> {
    ctx: &'ctx z3::Context,
    solver: z3::Solver<'ctx>,
    vars: Vec<Bool<'ctx>>,
}

impl<'ctx> Session<'ctx> {
    fn new(ctx: &'ctx z3::Context, num_vars: usize, timeout: Option<Duration>) -> Self {
        let solver = z3::Solver::new(ctx);
        if let Some(timeout) = timeout {
            let mut params = z3::Params::new(ctx);
            params.set_u32("timeout", timeout.as_millis() as u32);
            solver.set_params(&params);
        }
        let vars = (1..=num_vars)
            .map(|v| Bool::new_const(ctx, format!("x{v}")))
            .collect();
        Self { ctx, solver, vars }
    }

    fn clause(&self, clause: &[i32]) -> Result<Bool<'ctx>> {
        let literals = clause
            .iter()
            .map(|&lit| {
                let var = (lit.unsigned_abs() as usize)
                    .checked_sub(1)
                    .and_then(|i| self.vars.get(i))
                    .ok_or_else(|| LogicError::ToolOutput {
                        tool: TOOL.to_string(),
                        detail: format!("literal {lit} outside {} variables", self.vars.len()),
                    })?;
                Ok(if lit > 0 { var.clone() } else { var.not() })
            })
            .collect::<Result<Vec<_>>>()?;
        let refs: Vec<&Bool<'ctx>> = literals.iter().collect();
        Ok(Bool::or(self.ctx, &refs))
    }

    fn unknown(&self, cnf: &DimacsCnf, timeout: Option<Duration>) -> LogicError {
        let reason = self
            .solver
            .get_reason_unknown()
            .unwrap_or_else(|| "unknown".to_string());
        match timeout {
            Some(timeout) if reason.contains("timeout") || reason.contains("canceled") => {
                LogicError::ToolTimeout {
                    tool: TOOL.to_string(),
                    formula: format!("{} clauses", cnf.clauses.len()),
                    timeout,
                }
            }
            _ => LogicError::ToolOutput {
                tool: TOOL.to_string(),
                detail: reason,
            },
        }
    }
}

/// SAT solver wrapper around Z3.
#[derive(Debug, Clone, Copy, Default)]
pub struct Z3SatSolver {
    timeout: Option<Duration>,
}

impl Z3SatSolver {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl SatSolver for Z3SatSolver {
    fn name(&self) -> &str {
        TOOL
    }

    fn solve(&self, cnf: &DimacsCnf) -> Result<SatOutcome> {
        let cfg = z3::Config::new();
        let ctx = z3::Context::new(&cfg);
        let session = Session::new(&ctx, cnf.num_vars, self.timeout);
        for clause in &cnf.clauses {
            session.solver.assert(&session.clause(clause)?);
        }

        match session.solver.check() {
            z3::SatResult::Unsat => Ok(SatOutcome::Unsatisfiable),
            z3::SatResult::Sat => {
                let model = session.solver.get_model().ok_or_else(|| LogicError::ToolOutput {
                    tool: TOOL.to_string(),
                    detail: "satisfiable without a model".to_string(),
                })?;
                let assignment = session
                    .vars
                    .iter()
                    .enumerate()
                    .map(|(i, var)| {
                        let value = model
                            .eval(var, true)
                            .and_then(|b| b.as_bool())
                            .unwrap_or(false);
                        let v = i as i32 + 1;
                        if value {
                            v
                        } else {
                            -v
                        }
                    })
                    .collect();
                Ok(SatOutcome::Satisfiable(assignment))
            }
            z3::SatResult::Unknown => Err(session.unknown(cnf, self.timeout)),
        }
    }
}

/// MUS extraction from Z3 unsatisfiable cores.
///
/// Each clause is guarded by a selector constant and subsets are checked
/// under assumptions. Formulas with at most `max_exhaustive` clauses get
/// every minimal subset; larger ones get the first core, shrunk by
/// deletion.
#[derive(Debug, Clone, Copy)]
pub struct Z3MusExtractor {
    pub max_exhaustive: usize,
    timeout: Option<Duration>,
}

impl Z3MusExtractor {
    pub fn new(max_exhaustive: usize) -> Self {
        Self {
            max_exhaustive,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl UnsatCoreExtractor for Z3MusExtractor {
    fn name(&self) -> &str {
        TOOL
    }

    fn extract(&self, cnf: &DimacsCnf) -> Result<Vec<Vec<usize>>> {
        let cfg = z3::Config::new();
        let ctx = z3::Context::new(&cfg);
        let session = Session::new(&ctx, cnf.num_vars, self.timeout);
        let selectors: Vec<Bool<'_>> = (0..cnf.clauses.len())
            .map(|i| Bool::new_const(&ctx, format!("s{i}")))
            .collect();
        for (selector, clause) in selectors.iter().zip(&cnf.clauses) {
            session.solver.assert(&selector.implies(&session.clause(clause)?));
        }

        let unsat = |subset: &[usize]| -> Result<bool> {
            let assumptions: Vec<Bool<'_>> = subset.iter().map(|&i| selectors[i].clone()).collect();
            match session.solver.check_assumptions(&assumptions) {
                z3::SatResult::Unsat => Ok(true),
                z3::SatResult::Sat => Ok(false),
                z3::SatResult::Unknown => Err(session.unknown(cnf, self.timeout)),
            }
        };

        let all: Vec<usize> = (0..cnf.clauses.len()).collect();
        if !unsat(&all)? {
            return Ok(Vec::new());
        }
        if cnf.clauses.len() <= self.max_exhaustive.min(31) {
            debug!(clauses = cnf.clauses.len(), "exhaustive MUS enumeration with z3");
            return enumerate_muses(cnf.clauses.len(), unsat);
        }

        let core: Vec<usize> = session
            .solver
            .get_unsat_core()
            .iter()
            .filter_map(|lit| selectors.iter().position(|s| s == lit))
            .collect();
        debug!(
            clauses = cnf.clauses.len(),
            core = core.len(),
            "deletion-based MUS extraction from z3 core"
        );
        Ok(vec![shrink_to_mus(core, unsat)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cnf(num_vars: usize, clauses: &[&[i32]]) -> DimacsCnf {
        DimacsCnf {
            num_vars,
            clauses: clauses.iter().map(|c| c.to_vec()).collect(),
        }
    }

    #[test]
    fn z3_models_satisfy_every_clause() {
        let f = cnf(3, &[&[1, 2], &[-1, 3], &[-3]]);
        let SatOutcome::Satisfiable(model) = Z3SatSolver::default().solve(&f).unwrap() else {
            panic!("expected satisfiable");
        };
        for clause in &f.clauses {
            assert!(clause.iter().any(|lit| model.contains(lit)));
        }
    }

    #[test]
    fn z3_detects_unsat() {
        let f = cnf(2, &[&[1, 2], &[1, -2], &[-1, 2], &[-1, -2]]);
        assert_eq!(Z3SatSolver::default().solve(&f).unwrap(), SatOutcome::Unsatisfiable);
    }

    #[test]
    fn z3_rejects_out_of_range_literals() {
        let f = cnf(1, &[&[2]]);
        assert!(Z3SatSolver::default().solve(&f).is_err());
    }

    #[test]
    fn z3_enumerates_all_minimal_subsets() {
        let f = cnf(2, &[&[1], &[-1], &[2], &[-2]]);
        let muses = Z3MusExtractor::new(12).extract(&f).unwrap();
        assert_eq!(muses, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn z3_core_is_shrunk_to_a_minimal_subset() {
        let f = cnf(3, &[&[1], &[2], &[3], &[-1, -2], &[-3, 1]]);
        let muses = Z3MusExtractor::new(0).extract(&f).unwrap();
        assert_eq!(muses.len(), 1);
        let mus = &muses[0];
        assert!(mus.contains(&3) && mus.contains(&1));
        assert!(mus.contains(&0) || mus.contains(&4));
    }
}
