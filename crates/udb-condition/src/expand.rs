//! Expansion of a compiled tree with constraints the database implies.
//!
//! A verbatim tree treats every term as an independent variable, so a
//! solver is free to set `Zba = 1.0` true while `Zba >= 1.0` is false, or to
//! pick both XLENs at once. Expansion conjoins the clauses that rule such
//! assignments out:
//!
//! 1. each exact extension version or parameter implies its declared
//!    requirements, transitively;
//! 2. each version range is equivalent to the disjunction of the concrete
//!    versions it admits;
//! 3. at most one version of an extension is implemented;
//! 4. statically related parameter comparisons are linked, and XLEN is
//!    exactly one of 32 and 64.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;
use udb_logic::{ExtensionTerm, LogicNode, ParameterTerm, Term, Version};

use crate::compile::compile;
use crate::database::SpecDatabase;
use crate::error::Result;

/// `root` conjoined with every derived clause reachable from its terms.
pub fn expand(root: &LogicNode, db: &dyn SpecDatabase) -> Result<LogicNode> {
    let mut expansion = Expansion::new(db);
    expansion.run(root.terms())?;
    let derived = expansion.finish();
    debug!(derived = derived.len(), terms = root.term_count(), "expanded condition");
    if derived.is_empty() {
        return Ok(root.clone());
    }
    let mut conjuncts = Vec::with_capacity(derived.len() + 1);
    conjuncts.push(root.clone());
    conjuncts.extend(derived);
    Ok(LogicNode::and(conjuncts))
}

struct Expansion<'a> {
    db: &'a dyn SpecDatabase,
    visited: BTreeSet<Term>,
    queue: VecDeque<Term>,
    derived: Vec<LogicNode>,
    versions_seen: BTreeMap<String, BTreeSet<Version>>,
    params_seen: Vec<ParameterTerm>,
    xlen_seen: bool,
}

impl<'a> Expansion<'a> {
    fn new(db: &'a dyn SpecDatabase) -> Self {
        Self {
            db,
            visited: BTreeSet::new(),
            queue: VecDeque::new(),
            derived: Vec::new(),
            versions_seen: BTreeMap::new(),
            params_seen: Vec::new(),
            xlen_seen: false,
        }
    }

    fn enqueue(&mut self, terms: &[Term]) {
        self.queue.extend(terms.iter().cloned());
    }

    fn run(&mut self, roots: &[Term]) -> Result<()> {
        self.enqueue(roots);
        while let Some(term) = self.queue.pop_front() {
            if !self.visited.insert(term.clone()) {
                continue;
            }
            match &term {
                Term::Extension(ext) if ext.is_exact() => self.exact_version(ext)?,
                Term::Extension(ext) => self.version_range(ext),
                Term::Parameter(param) => self.parameter(param)?,
                Term::Xlen(_) => self.xlen_seen = true,
                Term::Free(_) => {}
            }
        }
        Ok(())
    }

    fn exact_version(&mut self, ext: &ExtensionTerm) -> Result<()> {
        let node = LogicNode::term(ext.clone());
        if !self.db.extension_versions(&ext.name).contains(&ext.version) {
            // a version the database does not define can never be implemented
            self.derived.push(LogicNode::not(node));
            return Ok(());
        }
        self.versions_seen
            .entry(ext.name.clone())
            .or_default()
            .insert(ext.version.clone());
        if let Some(requires) = self.db.extension_requirements(&ext.name, &ext.version) {
            let requires = compile(&requires)?;
            self.enqueue(requires.terms());
            self.derived.push(LogicNode::implies(node, requires));
        }
        Ok(())
    }

    fn version_range(&mut self, ext: &ExtensionTerm) {
        let node = LogicNode::term(ext.clone());
        let available = self.db.extension_versions(&ext.name);
        let exacts: Vec<LogicNode> = ext
            .satisfying_versions(&available)
            .into_iter()
            .map(|v| LogicNode::term(ExtensionTerm::exact(ext.name.clone(), v)))
            .collect();
        if exacts.is_empty() {
            self.derived.push(LogicNode::not(node));
            return;
        }
        for exact in &exacts {
            self.enqueue(exact.terms());
        }
        self.derived.push(LogicNode::iff(node, LogicNode::or(exacts)));
    }

    fn parameter(&mut self, param: &ParameterTerm) -> Result<()> {
        if let Some(requires) = self.db.parameter_requirements(&param.name) {
            let requires = compile(&requires)?;
            self.enqueue(requires.terms());
            self.derived
                .push(LogicNode::implies(LogicNode::term(param.clone()), requires));
        }
        self.params_seen.push(param.clone());
        Ok(())
    }

    fn finish(mut self) -> Vec<LogicNode> {
        for (name, versions) in &self.versions_seen {
            if versions.len() < 2 {
                continue;
            }
            let each: Vec<LogicNode> = versions
                .iter()
                .map(|v| LogicNode::term(ExtensionTerm::exact(name.clone(), v.clone())))
                .collect();
            self.derived.push(LogicNode::or(vec![
                LogicNode::nor(each.clone()),
                LogicNode::xor(each),
            ]));
        }
        for p in &self.params_seen {
            for q in &self.params_seen {
                if let Some(relation) = p.relation_to(q) {
                    self.derived.push(relation);
                }
            }
        }
        if self.xlen_seen {
            self.derived
                .push(LogicNode::xor(vec![LogicNode::xlen32(), LogicNode::xlen64()]));
        }
        self.derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::Clause;
    use crate::database::InMemoryDatabase;
    use udb_logic::{LogicEngine, ParamComparison, ParamScope, ParamValue, VersionOp, Xlen};

    fn v(major: u64) -> Version {
        Version::new(major, 0, 0)
    }

    fn exact(name: &str, major: u64) -> LogicNode {
        LogicNode::term(ExtensionTerm::exact(name, v(major)))
    }

    #[test]
    fn requirements_propagate_transitively_and_cycles_terminate() {
        let db = InMemoryDatabase::new()
            .with_extension("A", v(1), Some(Clause::extension_version("B", "1.0")))
            .with_extension("B", v(1), Some(Clause::extension_version("C", "1.0")))
            .with_extension("C", v(1), Some(Clause::extension_version("A", "1.0")));
        let root = exact("A", 1);
        let expanded = expand(&root, &db).unwrap();
        let engine = LogicEngine::default();
        let with_c_absent = LogicNode::and(vec![expanded, LogicNode::not(exact("C", 1))]);
        assert!(engine.unsatisfiable(&with_c_absent).unwrap());
    }

    #[test]
    fn ranges_bind_to_exact_versions() {
        let db = InMemoryDatabase::new()
            .with_extension("A", v(1), None)
            .with_extension("A", v(2), None);
        let range = LogicNode::term(ExtensionTerm::new("A", VersionOp::Ge, v(2)));
        let expanded = expand(&range, &db).unwrap();
        let engine = LogicEngine::default();
        // the range holds but its only version does not
        let inconsistent = LogicNode::and(vec![expanded.clone(), LogicNode::not(exact("A", 2))]);
        assert!(engine.unsatisfiable(&inconsistent).unwrap());
        assert!(engine.satisfiable(&expanded).unwrap());
    }

    #[test]
    fn empty_range_is_false() {
        let db = InMemoryDatabase::new().with_extension("A", v(1), None);
        let range = LogicNode::term(ExtensionTerm::new("A", VersionOp::Gt, v(1)));
        let engine = LogicEngine::default();
        assert!(engine.unsatisfiable(&expand(&range, &db).unwrap()).unwrap());
        let unknown = exact("Q", 1);
        assert!(engine.unsatisfiable(&expand(&unknown, &db).unwrap()).unwrap());
    }

    #[test]
    fn one_version_at_a_time() {
        let db = InMemoryDatabase::new()
            .with_extension("A", v(1), None)
            .with_extension("A", v(2), None);
        let both = LogicNode::and(vec![exact("A", 1), exact("A", 2)]);
        let engine = LogicEngine::default();
        assert!(engine.satisfiable(&both).unwrap());
        assert!(engine.unsatisfiable(&expand(&both, &db).unwrap()).unwrap());
    }

    #[test]
    fn xlen_is_exclusive() {
        let db = InMemoryDatabase::new();
        let both = LogicNode::and(vec![LogicNode::xlen32(), LogicNode::xlen64()]);
        let engine = LogicEngine::default();
        assert!(engine.unsatisfiable(&expand(&both, &db).unwrap()).unwrap());
        let neither = LogicNode::nor(vec![LogicNode::term(Xlen::Rv32), LogicNode::xlen64()]);
        assert!(engine.unsatisfiable(&expand(&neither, &db).unwrap()).unwrap());
    }

    #[test]
    fn parameter_relations_and_requirements() {
        let db = InMemoryDatabase::new()
            .with_extension("Sm", v(1), None)
            .with_parameter("P", Clause::extension("Sm"));
        let eq5 = LogicNode::term(ParameterTerm::new(
            "P",
            ParamScope::Value,
            ParamComparison::Equal(ParamValue::Int(5)),
        ));
        let eq6 = LogicNode::term(ParameterTerm::new(
            "P",
            ParamScope::Value,
            ParamComparison::Equal(ParamValue::Int(6)),
        ));
        let both = LogicNode::and(vec![eq5.clone(), eq6]);
        let engine = LogicEngine::default();
        assert!(engine.satisfiable(&both).unwrap());
        assert!(engine.unsatisfiable(&expand(&both, &db).unwrap()).unwrap());

        let without_sm = LogicNode::and(vec![
            eq5,
            LogicNode::not(LogicNode::term(ExtensionTerm::any("Sm"))),
        ]);
        assert!(engine.unsatisfiable(&expand(&without_sm, &db).unwrap()).unwrap());
    }

    #[test]
    fn nothing_to_add_returns_root() {
        let db = InMemoryDatabase::new();
        let root = LogicNode::always_true();
        assert_eq!(expand(&root, &db).unwrap(), root);
    }
}
