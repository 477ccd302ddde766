//! DIMACS CNF encoding, used at the boundary with external SAT and MUS tools.

use std::fmt;

use crate::error::{LogicError, Result};
use crate::eval::Assignment;
use crate::node::{Literal, LogicNode};
use crate::term::Term;

/// A CNF formula in DIMACS form. Variables are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DimacsCnf {
    pub num_vars: usize,
    pub clauses: Vec<Vec<i32>>,
}

impl DimacsCnf {
    /// Parse DIMACS text. Comment lines (`c ...`) are skipped, clauses may
    /// span lines, and a trailing `%` line ends the input.
    pub fn parse(text: &str) -> Result<Self> {
        let mut num_vars = None;
        let mut declared_clauses = 0usize;
        let mut clauses = Vec::new();
        let mut current = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('c') {
                continue;
            }
            if line.starts_with('%') {
                break;
            }
            if let Some(header) = line.strip_prefix('p') {
                let fields: Vec<&str> = header.split_whitespace().collect();
                let (vars, count) = match fields.as_slice() {
                    ["cnf", vars, count] => (vars.parse::<usize>(), count.parse::<usize>()),
                    _ => return Err(dimacs_error(line_no, "malformed problem line")),
                };
                num_vars = Some(vars.map_err(|e| dimacs_error(line_no, e))?);
                declared_clauses = count.map_err(|e| dimacs_error(line_no, e))?;
                continue;
            }
            let Some(vars) = num_vars else {
                return Err(dimacs_error(line_no, "clause before problem line"));
            };
            for token in line.split_whitespace() {
                let lit: i32 = token.parse().map_err(|e| dimacs_error(line_no, e))?;
                if lit == 0 {
                    clauses.push(std::mem::take(&mut current));
                } else if lit.unsigned_abs() as usize > vars {
                    return Err(dimacs_error(
                        line_no,
                        format!("variable {} exceeds declared count {vars}", lit.abs()),
                    ));
                } else {
                    current.push(lit);
                }
            }
        }

        if !current.is_empty() {
            clauses.push(current);
        }
        let num_vars = num_vars.ok_or_else(|| dimacs_error(0, "missing problem line"))?;
        if clauses.len() != declared_clauses {
            tracing::debug!(
                declared = declared_clauses,
                found = clauses.len(),
                "DIMACS clause count differs from header"
            );
        }
        Ok(Self { num_vars, clauses })
    }
}

impl fmt::Display for DimacsCnf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_vars, self.clauses.len())?;
        for clause in &self.clauses {
            for lit in clause {
                write!(f, "{lit} ")?;
            }
            writeln!(f, "0")?;
        }
        Ok(())
    }
}

fn dimacs_error(line: usize, detail: impl fmt::Display) -> LogicError {
    LogicError::Dimacs {
        line,
        detail: detail.to_string(),
    }
}

/// A CNF tree encoded as DIMACS, with the term behind each variable.
#[derive(Debug, Clone)]
pub struct DimacsEncoding {
    pub cnf: DimacsCnf,
    /// `terms[i]` is DIMACS variable `i + 1`.
    pub terms: Vec<Term>,
}

impl DimacsEncoding {
    /// Assignment described by a model given as signed DIMACS literals.
    /// Variables missing from the model are false.
    pub fn decode_model(&self, model: &[i32]) -> Assignment {
        let mut assignment: Assignment = self.terms.iter().map(|t| (t.clone(), false)).collect();
        for &lit in model {
            if lit > 0 {
                if let Some(term) = self.terms.get(lit as usize - 1) {
                    assignment.insert(term.clone(), true);
                }
            }
        }
        assignment
    }

    /// The clause at `index` as a logic tree.
    pub fn clause_node(&self, index: usize) -> Result<LogicNode> {
        let clause = self
            .cnf
            .clauses
            .get(index)
            .ok_or_else(|| dimacs_error(0, format!("no clause {index}")))?;
        Ok(LogicNode::or(
            decode_clause(clause, &self.terms)?
                .iter()
                .map(Literal::to_node)
                .collect(),
        ))
    }
}

fn decode_clause(clause: &[i32], terms: &[Term]) -> Result<Vec<Literal>> {
    clause
        .iter()
        .map(|&lit| {
            let term = (lit.unsigned_abs() as usize)
                .checked_sub(1)
                .and_then(|i| terms.get(i))
                .ok_or_else(|| dimacs_error(0, format!("variable {} has no term", lit.abs())))?;
            Ok(Literal {
                term: term.clone(),
                positive: lit > 0,
            })
        })
        .collect()
}

impl LogicNode {
    /// DIMACS encoding of a CNF tree. Variables follow [`LogicNode::terms`].
    pub fn to_dimacs(&self) -> Result<DimacsEncoding> {
        let clauses = self
            .cnf_clauses()
            .ok_or_else(|| LogicError::NotCnf(self.to_string()))?;
        let terms = self.terms().to_vec();
        let var = |t: &Term| -> i32 {
            // terms() is sorted, so binary search finds every clause term
            terms.binary_search(t).map_or(0, |i| i as i32 + 1)
        };
        let clauses = clauses
            .iter()
            .map(|c| {
                c.iter()
                    .map(|l| if l.positive { var(&l.term) } else { -var(&l.term) })
                    .collect()
            })
            .collect();
        Ok(DimacsEncoding {
            cnf: DimacsCnf {
                num_vars: terms.len(),
                clauses,
            },
            terms,
        })
    }

    /// Rebuild a CNF tree from DIMACS, naming variable `i + 1` by `terms[i]`.
    pub fn from_dimacs(cnf: &DimacsCnf, terms: &[Term]) -> Result<LogicNode> {
        let clauses = cnf
            .clauses
            .iter()
            .map(|c| decode_clause(c, terms))
            .collect::<Result<Vec<_>>>()?;
        Ok(LogicNode::from_clauses(&clauses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::tests::ext;

    #[test]
    fn encodes_cnf() {
        let n = LogicNode::and(vec![
            LogicNode::or(vec![ext("A"), LogicNode::not(ext("B"))]),
            ext("B"),
        ]);
        let enc = n.to_dimacs().unwrap();
        assert_eq!(enc.cnf.to_string(), "p cnf 2 2\n1 -2 0\n2 0\n");
    }

    #[test]
    fn rejects_non_cnf() {
        let n = LogicNode::xor(vec![ext("A"), ext("B")]);
        assert!(matches!(n.to_dimacs(), Err(LogicError::NotCnf(_))));
    }

    #[test]
    fn constants_encode_as_empty_formulas() {
        assert!(LogicNode::always_true().to_dimacs().unwrap().cnf.clauses.is_empty());
        assert_eq!(
            LogicNode::always_false().to_dimacs().unwrap().cnf.clauses,
            vec![Vec::<i32>::new()]
        );
    }

    #[test]
    fn parses_multiline_clauses_and_comments() {
        let text = "c example\np cnf 3 2\n1 -3\n 0 2 3 0\n%\n0\n";
        let cnf = DimacsCnf::parse(text).unwrap();
        assert_eq!(cnf.num_vars, 3);
        assert_eq!(cnf.clauses, vec![vec![1, -3], vec![2, 3]]);
    }

    #[test]
    fn parse_errors_carry_line() {
        let err = DimacsCnf::parse("p cnf 1 1\n2 0\n").unwrap_err();
        assert!(matches!(err, LogicError::Dimacs { line: 2, .. }));
        assert!(DimacsCnf::parse("1 0\n").is_err());
    }

    #[test]
    fn imports_with_term_table() {
        let n = LogicNode::and(vec![
            LogicNode::or(vec![ext("A"), LogicNode::not(ext("B"))]),
            ext("B"),
        ]);
        let enc = n.to_dimacs().unwrap();
        let parsed = DimacsCnf::parse(&enc.cnf.to_string()).unwrap();
        assert_eq!(LogicNode::from_dimacs(&parsed, &enc.terms).unwrap(), n);
        assert_eq!(enc.clause_node(1).unwrap(), ext("B"));
    }

    #[test]
    fn decodes_models() {
        let n = LogicNode::and(vec![ext("A"), LogicNode::not(ext("B"))]);
        let enc = n.to_dimacs().unwrap();
        let model = enc.decode_model(&[1, -2]);
        assert!(n.evaluate_assignment(&model));
    }
}
