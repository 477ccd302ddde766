//! Error types for the logic engine.

use std::time::Duration;

/// Errors that can occur while building, rewriting, or solving logic trees.
#[derive(Debug, thiserror::Error)]
pub enum LogicError {
    /// A node was built with a child count its kind does not permit.
    #[error("malformed {kind} node: expected {expected} children, got {actual}")]
    MalformedNode {
        kind: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// The term has no simple syntactic inverse (`includes`, `oneOf`).
    #[error("term has no simple negation: {0}")]
    NoSimpleNegation(String),

    /// Equivalent CNF conversion emitted more clauses than allowed.
    #[error("CNF conversion exploded: {clauses} clauses exceeds limit of {limit}")]
    SizeExplosion { clauses: usize, limit: usize },

    /// Neither a bounded two-level cover nor a truth table of the function
    /// could be built as minimizer input.
    #[error("cannot minimize over {terms} terms: input cover exceeds {limit} cubes")]
    TooLargeToMinimize { terms: usize, limit: usize },

    /// An external tool exited with a failure status.
    #[error("{tool} failed on formula {formula} (status {status}): {stderr}")]
    ToolFailed {
        tool: String,
        formula: String,
        status: String,
        stderr: String,
    },

    /// An external tool did not finish within its configured timeout.
    #[error("{tool} timed out after {timeout:?} on formula {formula}")]
    ToolTimeout {
        tool: String,
        formula: String,
        timeout: Duration,
    },

    /// An external tool could not be started.
    #[error("could not launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// An external tool produced output that could not be interpreted.
    #[error("unexpected output from {tool}: {detail}")]
    ToolOutput { tool: String, detail: String },

    /// DIMACS export was requested for a tree that is not in CNF.
    #[error("formula is not in conjunctive normal form: {0}")]
    NotCnf(String),

    /// DIMACS text could not be parsed.
    #[error("DIMACS parse error at line {line}: {detail}")]
    Dimacs { line: usize, detail: String },

    /// PLA text could not be parsed.
    #[error("PLA parse error at line {line}: {detail}")]
    Pla { line: usize, detail: String },

    /// A synthetic Tseytin variable reached caller-visible output.
    #[error("synthetic term leaked into caller-visible output")]
    FreeTermLeak,

    /// Engine configuration could not be parsed.
    #[error("invalid engine configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for logic engine operations.
pub type Result<T> = std::result::Result<T, LogicError>;
