//! Condition error types.

use udb_logic::{LogicError, RequirementError};

/// Errors raised while parsing, compiling, or analyzing conditions.
#[derive(Debug, thiserror::Error)]
pub enum ConditionError {
    /// A clause mapping used a key outside the declarative vocabulary.
    #[error("unknown clause key '{0}'")]
    UnknownClauseKey(String),

    /// A clause had the right keys but the wrong shape.
    #[error("malformed clause: {0}")]
    MalformedClause(String),

    /// An extension version requirement could not be parsed.
    #[error("invalid version requirement '{requirement}': {source}")]
    InvalidVersion {
        requirement: String,
        #[source]
        source: RequirementError,
    },

    /// A database version key could not be parsed.
    #[error("invalid version: {0}")]
    Semver(#[from] semver::Error),

    #[error("XLEN must be 32 or 64, got {0}")]
    InvalidXlen(i64),

    /// A tree holding synthetic variables was converted to a clause.
    #[error("tree contains synthetic terms and has no clause form")]
    FreeTermInClause,

    #[error(transparent)]
    Logic(#[from] LogicError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConditionError>;
