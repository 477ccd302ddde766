//! Adapters that delegate to external command-line tools.
//!
//! Each query is written to a scratch directory, the tool is run to
//! completion (or until its configured timeout), and its result is read
//! back from stdout or from the `{output}` file. A failing exit status is
//! fatal to the query; nothing is retried.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::ToolConfig;
use crate::dimacs::DimacsCnf;
use crate::error::{LogicError, Result};
use crate::hash::{hash_hex, tagged_hash};
use crate::pla::Pla;
use crate::solver::{SatOutcome, SatSolver, TwoLevelMinimizer, UnsatCoreExtractor};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What a finished tool left behind.
#[derive(Debug)]
struct ToolRun {
    status: ExitStatus,
    stdout: String,
    stderr: String,
    output: String,
}

impl ToolRun {
    /// The tool's result text: the output file if it wrote one, else stdout.
    fn result_text(&self) -> &str {
        if self.output.trim().is_empty() {
            &self.stdout
        } else {
            &self.output
        }
    }
}

/// Short identifier of a query, used in error messages.
fn formula_id(encoded: &str) -> String {
    let hash = hash_hex(&tagged_hash("query", [encoded.as_bytes()]));
    hash[..16].to_string()
}

fn run_tool(tool: &str, config: &ToolConfig, input: &str, suffix: &str) -> Result<ToolRun> {
    let dir = tempfile::tempdir()?;
    let input_path = dir.path().join(format!("query.{suffix}"));
    let output_path = dir.path().join("result.out");
    let stdout_path = dir.path().join("stdout");
    let stderr_path = dir.path().join("stderr");
    std::fs::write(&input_path, input)?;

    let args: Vec<String> = config
        .args
        .iter()
        .map(|a| {
            a.replace("{input}", &input_path.to_string_lossy())
                .replace("{output}", &output_path.to_string_lossy())
        })
        .collect();

    debug!(tool, program = %config.program, ?args, "spawning external tool");
    let mut child = Command::new(&config.program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(File::create(&stdout_path)?))
        .stderr(Stdio::from(File::create(&stderr_path)?))
        .spawn()
        .map_err(|source| LogicError::ToolLaunch {
            tool: tool.to_string(),
            source,
        })?;

    let status = match config.timeout() {
        None => child.wait()?,
        Some(timeout) => {
            let started = Instant::now();
            loop {
                if let Some(status) = child.try_wait()? {
                    break status;
                }
                if started.elapsed() >= timeout {
                    child.kill()?;
                    child.wait()?;
                    return Err(LogicError::ToolTimeout {
                        tool: tool.to_string(),
                        formula: formula_id(input),
                        timeout,
                    });
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    };
    debug!(tool, program = %config.program, %status, "external tool finished");

    Ok(ToolRun {
        status,
        stdout: read_if_present(&stdout_path)?,
        stderr: read_if_present(&stderr_path)?,
        output: read_if_present(&output_path)?,
    })
}

fn read_if_present(path: &Path) -> Result<String> {
    if path.exists() {
        Ok(std::fs::read_to_string(path)?)
    } else {
        Ok(String::new())
    }
}

fn tool_failed(tool: &str, input: &str, run: &ToolRun) -> LogicError {
    LogicError::ToolFailed {
        tool: tool.to_string(),
        formula: formula_id(input),
        status: run.status.to_string(),
        stderr: run.stderr.trim().to_string(),
    }
}

fn tool_output(tool: &str, detail: impl Into<String>) -> LogicError {
    LogicError::ToolOutput {
        tool: tool.to_string(),
        detail: detail.into(),
    }
}

// ---------------------------------------------------------------------------
// SAT solver
// ---------------------------------------------------------------------------

/// A DIMACS SAT solver run as a subprocess.
///
/// Understands SAT-competition output (`s SATISFIABLE` plus `v` lines) on
/// stdout and MiniSat-style result files (`SAT` then the model). Exit codes
/// 10 and 20 are the conventional SAT/UNSAT answers, not failures.
#[derive(Debug, Clone)]
pub struct ExternalSatSolver {
    config: ToolConfig,
}

impl ExternalSatSolver {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }
}

impl SatSolver for ExternalSatSolver {
    fn name(&self) -> &str {
        &self.config.program
    }

    fn solve(&self, cnf: &DimacsCnf) -> Result<SatOutcome> {
        let input = cnf.to_string();
        let run = run_tool(self.name(), &self.config, &input, "cnf")?;
        let code = run.status.code();
        if !matches!(code, Some(0) | Some(10) | Some(20)) {
            return Err(tool_failed(self.name(), &input, &run));
        }
        if let Some(outcome) = parse_competition_output(&run.stdout) {
            return Ok(outcome);
        }
        if let Some(outcome) = parse_minisat_result(&run.output) {
            return Ok(outcome);
        }
        match code {
            Some(10) => Ok(SatOutcome::Satisfiable(Vec::new())),
            Some(20) => Ok(SatOutcome::Unsatisfiable),
            _ => Err(tool_output(self.name(), "no satisfiability verdict found")),
        }
    }
}

fn model_literals<'a, I: Iterator<Item = &'a str>>(tokens: I) -> Vec<i32> {
    tokens
        .filter_map(|t| t.parse::<i32>().ok())
        .take_while(|&l| l != 0)
        .collect()
}

fn parse_competition_output(text: &str) -> Option<SatOutcome> {
    let mut verdict = None;
    let mut model = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if let Some(status) = line.strip_prefix("s ") {
            verdict = match status.trim() {
                "SATISFIABLE" => Some(true),
                "UNSATISFIABLE" => Some(false),
                _ => verdict,
            };
        } else if let Some(values) = line.strip_prefix("v ") {
            model.extend(model_literals(values.split_whitespace()));
        }
    }
    verdict.map(|sat| {
        if sat {
            SatOutcome::Satisfiable(model)
        } else {
            SatOutcome::Unsatisfiable
        }
    })
}

fn parse_minisat_result(text: &str) -> Option<SatOutcome> {
    let mut lines = text.lines();
    match lines.next()?.trim() {
        "SAT" => Some(SatOutcome::Satisfiable(model_literals(
            lines.flat_map(str::split_whitespace),
        ))),
        "UNSAT" => Some(SatOutcome::Unsatisfiable),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Two-level minimizer
// ---------------------------------------------------------------------------

/// An espresso-compatible minimizer: PLA on input, minimized PLA on stdout
/// (or in the `{output}` file).
#[derive(Debug, Clone)]
pub struct ExternalMinimizer {
    config: ToolConfig,
}

impl ExternalMinimizer {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }
}

impl TwoLevelMinimizer for ExternalMinimizer {
    fn name(&self) -> &str {
        &self.config.program
    }

    fn minimize(&self, on_set: &Pla) -> Result<Pla> {
        let input = on_set.to_string();
        let run = run_tool(self.name(), &self.config, &input, "pla")?;
        if !run.status.success() {
            return Err(tool_failed(self.name(), &input, &run));
        }
        let mut pla = Pla::parse(run.result_text())?;
        if pla.inputs != on_set.inputs {
            return Err(tool_output(
                self.name(),
                format!("expected {} inputs, got {}", on_set.inputs, pla.inputs),
            ));
        }
        if pla.labels.is_empty() {
            pla.labels = on_set.labels.clone();
        }
        Ok(pla)
    }
}

// ---------------------------------------------------------------------------
// MUS extractor
// ---------------------------------------------------------------------------

/// A MUS enumerator writing one DIMACS block per subset. The clauses of
/// each block are matched back to the input clauses by literal set.
#[derive(Debug, Clone)]
pub struct ExternalMusExtractor {
    config: ToolConfig,
}

impl ExternalMusExtractor {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }
}

fn literal_key(clause: &[i32]) -> Vec<i32> {
    let mut key = clause.to_vec();
    key.sort_unstable();
    key.dedup();
    key
}

/// Split text into DIMACS blocks, each starting at a `p` line.
fn dimacs_blocks(text: &str) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    for line in text.lines() {
        if line.trim_start().starts_with("p ") {
            blocks.push(String::new());
        }
        if let Some(block) = blocks.last_mut() {
            block.push_str(line);
            block.push('\n');
        }
    }
    blocks
}

impl UnsatCoreExtractor for ExternalMusExtractor {
    fn name(&self) -> &str {
        &self.config.program
    }

    fn extract(&self, cnf: &DimacsCnf) -> Result<Vec<Vec<usize>>> {
        let input = cnf.to_string();
        let run = run_tool(self.name(), &self.config, &input, "cnf")?;
        if !run.status.success() {
            return Err(tool_failed(self.name(), &input, &run));
        }
        let index: HashMap<Vec<i32>, usize> = cnf
            .clauses
            .iter()
            .enumerate()
            .rev()
            .map(|(i, c)| (literal_key(c), i))
            .collect();

        let mut subsets = Vec::new();
        for block in dimacs_blocks(run.result_text()) {
            let mus = DimacsCnf::parse(&block)?;
            let mut subset = mus
                .clauses
                .iter()
                .map(|c| {
                    index.get(&literal_key(c)).copied().ok_or_else(|| {
                        tool_output(self.name(), format!("clause {c:?} is not in the input"))
                    })
                })
                .collect::<Result<Vec<usize>>>()?;
            subset.sort_unstable();
            subset.dedup();
            subsets.push(subset);
        }
        Ok(subsets)
    }
}
