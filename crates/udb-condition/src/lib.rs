//! Condition compiler for architecture-specification databases.
//!
//! Extensions, parameters, instructions, and CSRs declare when they apply
//! and what they require as declarative clauses (`allOf`, `anyOf`,
//! `oneOf`, `noneOf`, `not`, `if`/`then`, `extension`, `param`, `xlen`).
//! This crate compiles those clauses into `udb_logic` trees and answers
//! questions about them.
//!
//! # Architecture
//!
//! - **Clauses**: `Clause` is the strictly parsed declarative form, and
//!   `declarative::to_clause` converts a tree back into it.
//! - **Database**: `SpecDatabase` supplies extension versions and the
//!   requirements of each extension version and parameter.
//! - **Compilation and expansion**: `compile` translates clauses verbatim;
//!   `expand` conjoins the constraints implied by the database
//!   (transitive requirements, version ranges, version and XLEN
//!   exclusivity, parameter relations).
//! - **Conditions**: `Condition` binds a clause to a `Context` and offers
//!   satisfiability, equivalence, configuration evaluation, implied
//!   extensions, and unsatisfiability explanations.

pub mod clause;
pub mod compile;
pub mod condition;
pub mod configuration;
pub mod database;
pub mod declarative;
pub mod error;
pub mod expand;

// Re-exports for convenience.
pub use clause::Clause;
pub use compile::compile;
pub use condition::{Condition, ConditionalExtension, Context, Expansion};
pub use configuration::{Configuration, FullConfig, PartialConfig};
pub use database::{InMemoryDatabase, SpecDatabase};
pub use declarative::to_clause;
pub use error::{ConditionError, Result};
pub use expand::expand;
