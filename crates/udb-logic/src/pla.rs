//! Berkeley PLA truth-table encoding for two-level minimizers.
//!
//! Only single-output tables are produced or read. Each row is a cube over
//! the inputs (`0`, `1`, or `-` for don't-care) followed by the output bit.

use std::fmt;

use crate::error::{LogicError, Result};

/// One product term: `Some(true)` for a positive input, `Some(false)` for a
/// negated one, `None` for an input the cube does not mention.
pub type Cube = Vec<Option<bool>>;

/// A single-output PLA listing the ON-set cubes of a function.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pla {
    pub inputs: usize,
    pub labels: Vec<String>,
    pub cubes: Vec<Cube>,
}

impl Pla {
    pub fn new(labels: Vec<String>, cubes: Vec<Cube>) -> Self {
        Self {
            inputs: labels.len(),
            labels,
            cubes,
        }
    }

    /// Parse PLA text, keeping the rows whose output is `1`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut inputs = None;
        let mut labels = Vec::new();
        let mut cubes = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if let Some(directive) = line.strip_prefix('.') {
                let mut fields = directive.split_whitespace();
                match fields.next() {
                    Some("i") => {
                        let n = fields
                            .next()
                            .ok_or_else(|| pla_error(line_no, ".i without a count"))?;
                        inputs = Some(n.parse::<usize>().map_err(|e| pla_error(line_no, e))?);
                    }
                    Some("ilb") => labels = fields.map(str::to_string).collect(),
                    Some("e") | Some("end") => break,
                    // .o, .ob, .p, .type and friends carry nothing we need
                    _ => {}
                }
                continue;
            }
            let width = inputs.ok_or_else(|| pla_error(line_no, "cube before .i"))?;
            let mut fields = line.split_whitespace();
            let (Some(input), Some(output)) = (fields.next(), fields.next()) else {
                return Err(pla_error(line_no, "cube row needs input and output parts"));
            };
            if input.chars().count() != width {
                return Err(pla_error(
                    line_no,
                    format!("cube has {} inputs, expected {width}", input.chars().count()),
                ));
            }
            if !matches!(output, "1" | "4") {
                continue;
            }
            let cube = input
                .chars()
                .map(|c| match c {
                    '1' => Ok(Some(true)),
                    '0' => Ok(Some(false)),
                    '-' | '~' | '2' => Ok(None),
                    other => Err(pla_error(line_no, format!("bad cube character '{other}'"))),
                })
                .collect::<Result<Cube>>()?;
            cubes.push(cube);
        }

        let inputs = inputs.ok_or_else(|| pla_error(0, "missing .i directive"))?;
        Ok(Self {
            inputs,
            labels,
            cubes,
        })
    }
}

impl fmt::Display for Pla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ".i {}", self.inputs)?;
        writeln!(f, ".o 1")?;
        if !self.labels.is_empty() {
            writeln!(f, ".ilb {}", self.labels.join(" "))?;
        }
        writeln!(f, ".ob f")?;
        writeln!(f, ".type f")?;
        writeln!(f, ".p {}", self.cubes.len())?;
        for cube in &self.cubes {
            for bit in cube {
                let c = match bit {
                    Some(true) => '1',
                    Some(false) => '0',
                    None => '-',
                };
                write!(f, "{c}")?;
            }
            writeln!(f, " 1")?;
        }
        writeln!(f, ".e")
    }
}

fn pla_error(line: usize, detail: impl fmt::Display) -> LogicError {
    LogicError::Pla {
        line,
        detail: detail.to_string(),
    }
}

/// Whether `cube` contains the fully specified point `minterm`.
pub fn cube_covers(cube: &[Option<bool>], minterm: &[bool]) -> bool {
    cube.iter()
        .zip(minterm)
        .all(|(c, m)| c.map_or(true, |c| c == *m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_espresso_input() {
        let pla = Pla::new(
            vec!["a".into(), "b".into()],
            vec![vec![Some(true), None], vec![Some(false), Some(true)]],
        );
        let text = pla.to_string();
        assert!(text.starts_with(".i 2\n.o 1\n.ilb a b\n"));
        assert!(text.contains("1- 1\n01 1\n.e\n"));
    }

    #[test]
    fn reads_espresso_output() {
        let text = "# minimized\n.i 3\n.o 1\n.p 2\n1-0 1\n-11 1\n000 0\n.e\n";
        let pla = Pla::parse(text).unwrap();
        assert_eq!(pla.inputs, 3);
        assert_eq!(
            pla.cubes,
            vec![
                vec![Some(true), None, Some(false)],
                vec![None, Some(true), Some(true)]
            ]
        );
    }

    #[test]
    fn rejects_wrong_width() {
        let err = Pla::parse(".i 2\n101 1\n").unwrap_err();
        assert!(matches!(err, LogicError::Pla { line: 2, .. }));
    }

    #[test]
    fn cube_membership() {
        let cube = vec![Some(true), None];
        assert!(cube_covers(&cube, &[true, false]));
        assert!(!cube_covers(&cube, &[false, true]));
    }
}
