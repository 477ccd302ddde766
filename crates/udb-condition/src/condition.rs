//! Conditions: declarative clauses bound to a database and an engine.
//!
//! A condition keeps its clause, the verbatim (unexpanded) tree compiled
//! from it, and lazily the expanded tree. Satisfiability questions are
//! asked of expanded trees, so that the database's constraints between
//! terms hold; configuration evaluation walks the unexpanded tree, since a
//! configuration answers every term directly.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tracing::{debug, info};
use udb_logic::{
    ExtensionTerm, LogicEngine, LogicNode, ParamValue, SatisfiedResult, Term, TwoLevelForm,
};

use crate::clause::Clause;
use crate::compile::compile;
use crate::configuration::Configuration;
use crate::database::SpecDatabase;
use crate::declarative::to_clause;
use crate::error::Result;
use crate::expand::expand;

/// Which tree of a condition to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expansion {
    /// The clauses, translated one-for-one.
    Unexpanded,
    /// The clauses conjoined with the constraints the database implies.
    Expanded,
}

/// The database and engine shared by a family of conditions.
#[derive(Clone)]
pub struct Context {
    database: Arc<dyn SpecDatabase>,
    engine: Arc<LogicEngine>,
}

impl Context {
    /// A context using the in-process engine.
    pub fn new(database: impl SpecDatabase + 'static) -> Self {
        Self::with_engine(database, LogicEngine::default())
    }

    pub fn with_engine(database: impl SpecDatabase + 'static, engine: LogicEngine) -> Self {
        Self {
            database: Arc::new(database),
            engine: Arc::new(engine),
        }
    }

    pub fn database(&self) -> &dyn SpecDatabase {
        self.database.as_ref()
    }

    pub fn engine(&self) -> &LogicEngine {
        &self.engine
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

/// An extension a condition requires (or excludes), and the residual
/// condition under which it does.
#[derive(Debug, Clone)]
pub struct ConditionalExtension {
    pub extension: ExtensionTerm,
    pub condition: Condition,
}

/// A compiled declarative condition.
#[derive(Debug, Clone)]
pub struct Condition {
    clause: Clause,
    context: Context,
    unexpanded: LogicNode,
    expanded: OnceLock<LogicNode>,
}

impl Condition {
    /// Compile `clause`. Malformed clauses are rejected here, before any
    /// query runs.
    pub fn new(clause: Clause, context: &Context) -> Result<Self> {
        let unexpanded = compile(&clause)?;
        Ok(Self::from_parts(clause, unexpanded, context))
    }

    fn from_parts(clause: Clause, unexpanded: LogicNode, context: &Context) -> Self {
        Self {
            clause,
            context: context.clone(),
            unexpanded,
            expanded: OnceLock::new(),
        }
    }

    pub fn always_true(context: &Context) -> Self {
        Self::from_parts(Clause::Bool(true), LogicNode::always_true(), context)
    }

    pub fn always_false(context: &Context) -> Self {
        Self::from_parts(Clause::Bool(false), LogicNode::always_false(), context)
    }

    pub fn from_json(text: &str, context: &Context) -> Result<Self> {
        Self::new(Clause::from_json_str(text)?, context)
    }

    /// Wrap an existing tree. Fails if the tree holds synthetic terms.
    pub fn from_logic_tree(node: &LogicNode, context: &Context) -> Result<Self> {
        Ok(Self::from_parts(to_clause(node)?, node.clone(), context))
    }

    pub fn clause(&self) -> &Clause {
        &self.clause
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    fn engine(&self) -> &LogicEngine {
        self.context.engine()
    }

    // --- Combinators ---

    pub fn and(&self, other: &Condition) -> Condition {
        Self::from_parts(
            Clause::AllOf(vec![self.clause.clone(), other.clause.clone()]),
            LogicNode::and(vec![self.unexpanded.clone(), other.unexpanded.clone()]),
            &self.context,
        )
    }

    pub fn or(&self, other: &Condition) -> Condition {
        Self::from_parts(
            Clause::AnyOf(vec![self.clause.clone(), other.clause.clone()]),
            LogicNode::or(vec![self.unexpanded.clone(), other.unexpanded.clone()]),
            &self.context,
        )
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> Condition {
        Self::from_parts(
            Clause::negate(self.clause.clone()),
            LogicNode::not(self.unexpanded.clone()),
            &self.context,
        )
    }

    pub fn implies(&self, other: &Condition) -> Condition {
        Self::from_parts(
            Clause::implies(self.clause.clone(), other.clause.clone()),
            LogicNode::implies(self.unexpanded.clone(), other.unexpanded.clone()),
            &self.context,
        )
    }

    // --- Trees ---

    /// The requested tree. Both trees are built at most once.
    pub fn to_logic_tree(&self, expansion: Expansion) -> Result<LogicNode> {
        match expansion {
            Expansion::Unexpanded => Ok(self.unexpanded.clone()),
            Expansion::Expanded => {
                if let Some(tree) = self.expanded.get() {
                    return Ok(tree.clone());
                }
                let tree = expand(&self.unexpanded, self.context.database())?;
                Ok(self.expanded.get_or_init(|| tree).clone())
            }
        }
    }

    // --- Queries ---

    pub fn satisfiable(&self) -> Result<bool> {
        Ok(self
            .engine()
            .satisfiable(&self.to_logic_tree(Expansion::Expanded)?)?)
    }

    pub fn unsatisfiable(&self) -> Result<bool> {
        Ok(!self.satisfiable()?)
    }

    /// Whether the two conditions agree on every assignment the database
    /// allows.
    pub fn equivalent(&self, other: &Condition) -> Result<bool> {
        let differ = LogicNode::xor(vec![self.unexpanded.clone(), other.unexpanded.clone()]);
        self.never_holds(&differ)
    }

    /// Whether every assignment the database allows that satisfies `self`
    /// also satisfies `other`.
    pub fn always_implies(&self, other: &Condition) -> Result<bool> {
        let counterexample = LogicNode::and(vec![
            self.unexpanded.clone(),
            LogicNode::not(other.unexpanded.clone()),
        ]);
        self.never_holds(&counterexample)
    }

    fn never_holds(&self, tree: &LogicNode) -> Result<bool> {
        let expanded = expand(tree, self.context.database())?;
        Ok(self.engine().unsatisfiable(&expanded)?)
    }

    /// Three-valued evaluation against what `cfg` knows.
    pub fn satisfied_by_configuration(&self, cfg: &Configuration) -> SatisfiedResult {
        info!(
            configuration = cfg.kind(),
            terms = self.unexpanded.term_count(),
            "evaluating condition against configuration"
        );
        let db = self.context.database();
        self.unexpanded
            .evaluate(&|term: &Term| cfg.evaluate_term(term, db))
    }

    /// The condition left once every fact `cfg` decides is substituted.
    pub fn partially_evaluate(&self, cfg: &Configuration) -> Result<Condition> {
        let db = self.context.database();
        let reduced = self
            .unexpanded
            .partial_evaluate(&|term: &Term| cfg.evaluate_term(term, db));
        Self::from_logic_tree(&reduced, &self.context)
    }

    /// Like [`Condition::partially_evaluate`], resolving only parameter
    /// terms from known values.
    pub fn partially_evaluate_for_params(
        &self,
        params: &BTreeMap<String, ParamValue>,
    ) -> Result<Condition> {
        let reduced = self.unexpanded.partial_evaluate(&|term: &Term| match term {
            Term::Parameter(param) => param.evaluate(params.get(&param.name)),
            _ => SatisfiedResult::Maybe,
        });
        Self::from_logic_tree(&reduced, &self.context)
    }

    // --- Implied extensions ---

    /// Extensions this condition requires, each with the residual condition
    /// under which it is required (`true` when unconditional).
    pub fn implied_extension_requirements(&self) -> Result<Vec<ConditionalExtension>> {
        self.implied_extensions(true)
    }

    /// Extensions this condition rules out, each with the residual
    /// condition under which it is ruled out.
    pub fn implied_extension_conflicts(&self) -> Result<Vec<ConditionalExtension>> {
        self.implied_extensions(false)
    }

    /// Reads implications off the product-of-sums form. A clause
    /// `e | l1 | l2` says `e` must hold whenever `!l1 & !l2` does, and a
    /// clause `!e | l1 | l2` says `e` must not.
    fn implied_extensions(&self, positive: bool) -> Result<Vec<ConditionalExtension>> {
        let pos = self
            .engine()
            .minimize(&self.unexpanded, TwoLevelForm::ProductOfSums)?;
        let clauses = match pos.cnf_clauses() {
            Some(clauses) => clauses,
            None => pos.equiv_cnf(false)?.cnf_clauses().unwrap_or_default(),
        };

        let mut implied = Vec::new();
        for clause in &clauses {
            for (i, literal) in clause.iter().enumerate() {
                let Term::Extension(ext) = &literal.term else {
                    continue;
                };
                if literal.positive != positive {
                    continue;
                }
                let residual = LogicNode::and(
                    clause
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, other)| other.negated().to_node())
                        .collect(),
                );
                implied.push(ConditionalExtension {
                    extension: ext.clone(),
                    condition: Self::from_logic_tree(&residual, &self.context)?,
                });
            }
        }
        debug!(
            count = implied.len(),
            requirements = positive,
            "implied extensions"
        );
        Ok(implied)
    }

    // --- Diagnosis ---

    /// Minimal sets of constraints, from the expanded tree, that cannot
    /// hold together. Empty when the condition is satisfiable.
    pub fn explain_unsatisfiable(&self) -> Result<Vec<Condition>> {
        let tree = self.to_logic_tree(Expansion::Expanded)?;
        self.engine()
            .minimal_unsat_subsets(&tree)?
            .iter()
            .map(|subset| Self::from_logic_tree(subset, &self.context))
            .collect()
    }

    // --- Output ---

    /// The declarative form of the compiled tree.
    pub fn to_declarative(&self) -> Result<Value> {
        Ok(to_clause(&self.unexpanded)?.to_value())
    }

    pub fn to_prose(&self) -> String {
        self.unexpanded.to_prose()
    }

    pub fn to_asciidoc(&self) -> String {
        self.unexpanded.to_asciidoc()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_prose())
    }
}
