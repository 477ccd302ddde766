//! Propositional logic engine for architecture-specification conditions.
//!
//! Conditions are immutable trees of boolean connectives over typed leaf
//! predicates: extension-version requirements, parameter comparisons, XLEN
//! facts, and synthetic Tseytin variables.
//!
//! # Architecture
//!
//! - **Terms and trees**: `Term`, `LogicNode` with per-node memoized
//!   attributes and a structural content hash.
//! - **Evaluation**: three-valued (`SatisfiedResult`) under a caller-supplied
//!   leaf callback, boolean under a concrete assignment, and partial
//!   evaluation.
//! - **Rewrites**: reduce, NNF, flattening, equivalent CNF/DNF, Tseytin,
//!   and exact or heuristic two-level minimization.
//! - **Queries**: `LogicEngine` answers satisfiability, equivalence,
//!   implication, and minimal-unsatisfiable-subset questions, delegating
//!   large instances to `SatSolver`, `TwoLevelMinimizer`, and
//!   `UnsatCoreExtractor` adapters: external tools, Z3 with the `z3`
//!   feature, or in-process substitutes.

pub mod cache;
pub mod config;
pub mod dimacs;
pub mod engine;
pub mod error;
pub mod eval;
pub mod external;
pub mod hash;
pub mod minimize;
pub mod node;
pub mod pla;
pub mod render;
pub mod satisfied;
#[cfg(feature = "z3")]
pub mod smt;
pub mod solver;
pub mod term;
pub mod transform;
pub mod version;

// Re-exports for convenience.
pub use cache::{CacheStats, SatCache};
pub use config::{EngineConfig, Limits, ToolConfig, Tools};
pub use dimacs::{DimacsCnf, DimacsEncoding};
pub use engine::LogicEngine;
pub use error::{LogicError, Result};
pub use eval::Assignment;
pub use external::{ExternalMinimizer, ExternalMusExtractor, ExternalSatSolver};
pub use hash::ContentHash;
pub use minimize::TwoLevelForm;
pub use node::{Connective, Literal, LogicNode, NodeKind};
pub use pla::{Cube, Pla};
pub use render::Format;
pub use satisfied::SatisfiedResult;
#[cfg(feature = "z3")]
pub use smt::{Z3MusExtractor, Z3SatSolver};
pub use solver::{
    DpllSolver, ExpandIrredundantMinimizer, InProcessMusExtractor, SatOutcome, SatSolver,
    TwoLevelMinimizer, UnsatCoreExtractor,
};
pub use term::{
    ExtensionFact, ExtensionTerm, FreeTerm, ParamComparison, ParamScope, ParamValue,
    ParameterTerm, Term, Xlen,
};
pub use version::{parse_requirement, parse_version, RequirementError, Version, VersionOp};
