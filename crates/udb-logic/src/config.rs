//! Engine configuration: size thresholds that choose between algorithms,
//! and optional external tools.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Size thresholds steering the engine's strategy choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Brute-force satisfiability is used up to this many distinct terms...
    pub brute_force_max_terms: usize,
    /// ...and this many literal occurrences.
    pub brute_force_max_literals: usize,
    /// Clauses distribution may emit before equivalent CNF gives up.
    pub cnf_explosion_limit: usize,
    /// Above this many terms, equisatisfiable CNF goes straight to Tseytin.
    pub tseytin_term_threshold: usize,
    /// Above this many literals, equisatisfiable CNF goes straight to Tseytin.
    pub tseytin_literal_threshold: usize,
    /// Exact Quine-McCluskey minimization is used up to this many terms.
    pub exact_minimize_max_terms: usize,
    /// Above this many terms, heuristic minimization never falls back to
    /// a truth table for its input cover.
    pub heuristic_minimize_max_terms: usize,
    /// Cubes the input cover of a heuristic minimization may hold.
    pub minimize_max_cubes: usize,
    /// In-process MUS extraction enumerates all subsets up to this many clauses.
    pub exhaustive_mus_max_clauses: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            brute_force_max_terms: 8,
            brute_force_max_literals: 32,
            cnf_explosion_limit: 10,
            tseytin_term_threshold: 4,
            tseytin_literal_threshold: 10,
            exact_minimize_max_terms: 4,
            heuristic_minimize_max_terms: 16,
            minimize_max_cubes: 4096,
            exhaustive_mus_max_clauses: 12,
        }
    }
}

/// How to run an external tool.
///
/// `args` may contain `{input}` and `{output}`, replaced with the paths of
/// the encoded query and of a scratch file for the tool's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// No timeout when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ToolConfig {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout_secs: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// External tools; an absent entry selects the in-process substitute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tools {
    pub sat_solver: Option<ToolConfig>,
    pub minimizer: Option<ToolConfig>,
    pub mus_extractor: Option<ToolConfig>,
}

/// Configuration of a [`crate::LogicEngine`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub limits: Limits,
    pub tools: Tools,
}

impl EngineConfig {
    /// Default thresholds, every query answered in-process.
    pub fn in_process() -> Self {
        Self::default()
    }

    /// Default thresholds with the usual command-line tools: a MiniSat
    /// compatible solver, espresso, and a MUS enumerator writing DIMACS.
    pub fn with_standard_tools() -> Self {
        Self {
            limits: Limits::default(),
            tools: Tools {
                sat_solver: Some(ToolConfig::new("minisat", &["{input}", "{output}"])),
                minimizer: Some(ToolConfig::new("espresso", &["{input}"])),
                mus_extractor: Some(ToolConfig::new("must", &["-o", "{output}", "{input}"])),
            },
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
