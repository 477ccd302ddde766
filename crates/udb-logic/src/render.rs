//! Rendering logic trees as text.
//!
//! Symbolic formats differ only in operator glyphs and term spelling.
//! Prose, pretty, and AsciiDoc forms are meant for people reading
//! generated documentation.

use std::fmt;

use crate::node::{LogicNode, NodeKind};
use crate::term::{ExtensionTerm, Term};
use crate::version::VersionOp;

/// Symbolic output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// C boolean expression over sanitized identifiers.
    C,
    /// eqntott-style equation (`&`, `|`, `!`, `^`).
    Eqn,
    /// Upper-case English operators.
    English,
    /// Mathematical glyphs (`∧`, `∨`, `¬`, `⊕`, `→`).
    Predicate,
}

struct Glyphs {
    and: &'static str,
    or: &'static str,
    not: &'static str,
    xor: &'static str,
    implies: Option<&'static str>,
    truth: &'static str,
    falsity: &'static str,
}

impl Format {
    fn glyphs(self) -> Glyphs {
        match self {
            Format::C => Glyphs {
                and: " && ",
                or: " || ",
                not: "!",
                xor: " ^ ",
                implies: None,
                truth: "true",
                falsity: "false",
            },
            Format::Eqn => Glyphs {
                and: " & ",
                or: " | ",
                not: "!",
                xor: " ^ ",
                implies: None,
                truth: "1",
                falsity: "0",
            },
            Format::English => Glyphs {
                and: " AND ",
                or: " OR ",
                not: "NOT ",
                xor: " XOR ",
                implies: Some(" IMPLIES "),
                truth: "TRUE",
                falsity: "FALSE",
            },
            Format::Predicate => Glyphs {
                and: " ∧ ",
                or: " ∨ ",
                not: "¬",
                xor: " ⊕ ",
                implies: Some(" → "),
                truth: "⊤",
                falsity: "⊥",
            },
        }
    }

    fn term(self, term: &Term) -> String {
        match self {
            Format::C | Format::Eqn => term.identifier(),
            Format::English | Format::Predicate => term.to_string(),
        }
    }
}

impl LogicNode {
    /// Render in a symbolic format.
    pub fn render(&self, format: Format) -> String {
        self.render_inner(format, &format.glyphs(), true)
    }

    fn render_inner(&self, format: Format, g: &Glyphs, top: bool) -> String {
        let join = |cs: &[LogicNode], sep: &str| -> String {
            cs.iter()
                .map(|c| c.render_inner(format, g, false))
                .collect::<Vec<_>>()
                .join(sep)
        };
        let wrap = |s: String| if top { s } else { format!("({s})") };
        match self.kind() {
            NodeKind::True => g.truth.to_string(),
            NodeKind::False => g.falsity.to_string(),
            NodeKind::Term(t) => format.term(t),
            NodeKind::Not(c) => format!("{}{}", g.not, c.render_inner(format, g, false)),
            NodeKind::And(cs) => wrap(join(cs, g.and)),
            NodeKind::Or(cs) => wrap(join(cs, g.or)),
            NodeKind::Nor(cs) => format!("{}({})", g.not, join(cs, g.or)),
            // the glyph means exactly-one only for two operands
            NodeKind::Xor(cs) if cs.len() == 2 || matches!(format, Format::English | Format::Predicate) => {
                wrap(join(cs, g.xor))
            }
            NodeKind::Xor(_) => self.nnf().render_inner(format, g, top),
            NodeKind::If(a, b) => match g.implies {
                Some(arrow) => wrap(format!(
                    "{}{arrow}{}",
                    a.render_inner(format, g, false),
                    b.render_inner(format, g, false)
                )),
                None => wrap(format!(
                    "{}{}{}",
                    LogicNode::not(a.clone()).render_inner(format, g, false),
                    g.or,
                    b.render_inner(format, g, false)
                )),
            },
        }
    }

    /// A sentence-like rendering, e.g. `Zba and (Zbb or Zbc)`.
    pub fn to_prose(&self) -> String {
        self.prose(&prose_term, true)
    }

    /// Like [`LogicNode::to_prose`], with extension names replaced by
    /// `%%LINK%ext;NAME;NAME%%` cross-reference placeholders.
    pub fn to_asciidoc(&self) -> String {
        self.prose(&asciidoc_term, true)
    }

    fn prose(&self, term: &dyn Fn(&Term) -> String, top: bool) -> String {
        let list = |cs: &[LogicNode], sep: &str| -> String {
            cs.iter()
                .map(|c| c.prose(term, false))
                .collect::<Vec<_>>()
                .join(sep)
        };
        let wrap = |s: String| if top { s } else { format!("({s})") };
        match self.kind() {
            NodeKind::True => "always".to_string(),
            NodeKind::False => "never".to_string(),
            NodeKind::Term(t) => term(t),
            NodeKind::Not(c) => format!("not {}", c.prose(term, false)),
            NodeKind::And(cs) => wrap(list(cs, " and ")),
            NodeKind::Or(cs) => wrap(list(cs, " or ")),
            NodeKind::Xor(cs) => format!("exactly one of ({})", list(cs, ", ")),
            NodeKind::Nor(cs) => format!("none of ({})", list(cs, ", ")),
            NodeKind::If(a, b) => wrap(format!(
                "if {} then {}",
                a.prose(term, false),
                b.prose(term, false)
            )),
        }
    }

    /// An indented outline, one node per line.
    pub fn to_pretty(&self) -> String {
        let mut out = String::new();
        self.pretty_into(&mut out, 0);
        out
    }

    fn pretty_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let section = |label: &str, children: &[LogicNode], out: &mut String| {
            out.push_str(&format!("{indent}{label}\n"));
            for c in children {
                c.pretty_into(out, depth + 1);
            }
        };
        match self.kind() {
            NodeKind::True | NodeKind::False | NodeKind::Term(_) => {
                out.push_str(&format!("{indent}{}\n", self.to_prose()));
            }
            NodeKind::Not(c) => section("not:", std::slice::from_ref(c), out),
            NodeKind::And(cs) => section("all of:", cs, out),
            NodeKind::Or(cs) => section("any of:", cs, out),
            NodeKind::Xor(cs) => section("exactly one of:", cs, out),
            NodeKind::Nor(cs) => section("none of:", cs, out),
            NodeKind::If(a, b) => {
                section("if:", std::slice::from_ref(a), out);
                section("then:", std::slice::from_ref(b), out);
            }
        }
    }
}

fn extension_prose(ext: &ExtensionTerm, name: &str) -> String {
    if ext.op == VersionOp::Ge && ext.version == crate::version::Version::new(0, 0, 0) {
        name.to_string()
    } else if ext.is_exact() {
        format!("{name} version {}", ext.version)
    } else {
        format!("{name} {}", ext.requirement())
    }
}

fn prose_term(term: &Term) -> String {
    match term {
        Term::Extension(ext) => extension_prose(ext, &ext.name),
        Term::Xlen(x) => format!("XLEN is {}", x.bits()),
        other => other.to_string(),
    }
}

fn asciidoc_term(term: &Term) -> String {
    match term {
        Term::Extension(ext) => {
            let link = format!("%%LINK%ext;{0};{0}%%", ext.name);
            extension_prose(ext, &link)
        }
        other => prose_term(other),
    }
}

impl fmt::Display for LogicNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Format::Predicate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{ParamComparison, ParamScope, ParameterTerm, Xlen};
    use crate::version::Version;

    fn zba() -> LogicNode {
        LogicNode::term(ExtensionTerm::new("Zba", VersionOp::Ge, Version::new(1, 0, 0)))
    }

    fn zbb() -> LogicNode {
        LogicNode::term(ExtensionTerm::any("Zbb"))
    }

    #[test]
    fn predicate_glyphs() {
        let n = LogicNode::and(vec![zba(), LogicNode::or(vec![zbb(), LogicNode::not(LogicNode::xlen32())])]);
        assert_eq!(n.to_string(), "Zba>=1.0.0 ∧ (Zbb>=0.0.0 ∨ ¬xlen()==32)");
        let imp = LogicNode::implies(zba(), zbb());
        assert_eq!(imp.to_string(), "Zba>=1.0.0 → Zbb>=0.0.0");
    }

    #[test]
    fn c_and_eqn_use_identifiers() {
        let n = LogicNode::implies(zba(), LogicNode::term(Xlen::Rv64));
        assert_eq!(n.render(Format::C), "!Zba_ge_1_0_0 || XLEN64");
        let x = LogicNode::xor(vec![zba(), zbb()]);
        assert_eq!(x.render(Format::Eqn), "Zba_ge_1_0_0 ^ Zbb_ge_0_0_0");
        let nor = LogicNode::nor(vec![zba(), zbb()]);
        assert_eq!(nor.render(Format::Eqn), "!(Zba_ge_1_0_0 | Zbb_ge_0_0_0)");
        assert_eq!(LogicNode::always_true().render(Format::Eqn), "1");
    }

    #[test]
    fn wide_xor_expands_in_c() {
        let x = LogicNode::xor(vec![zba(), zbb(), LogicNode::xlen32()]);
        let c = x.render(Format::C);
        assert!(!c.contains('^'));
        assert!(c.contains("&&") && c.contains("||"));
    }

    #[test]
    fn english_operators() {
        let n = LogicNode::or(vec![zba(), LogicNode::not(zbb())]);
        assert_eq!(n.render(Format::English), "Zba>=1.0.0 OR NOT Zbb>=0.0.0");
    }

    #[test]
    fn prose_and_asciidoc() {
        let n = LogicNode::and(vec![zba(), LogicNode::or(vec![zbb(), LogicNode::xlen64()])]);
        assert_eq!(n.to_prose(), "Zba >= 1.0.0 and (Zbb or XLEN is 64)");
        assert_eq!(
            n.to_asciidoc(),
            "%%LINK%ext;Zba;Zba%% >= 1.0.0 and (%%LINK%ext;Zbb;Zbb%% or XLEN is 64)"
        );
        let p = LogicNode::term(ParameterTerm::new(
            "MXLEN",
            ParamScope::Value,
            ParamComparison::Equal(crate::term::ParamValue::Int(64)),
        ));
        assert_eq!(p.to_prose(), "MXLEN==64");
    }

    #[test]
    fn pretty_outline() {
        let n = LogicNode::implies(zba(), LogicNode::nor(vec![zbb(), LogicNode::xlen32()]));
        assert_eq!(
            n.to_pretty(),
            "if:\n  Zba >= 1.0.0\nthen:\n  none of:\n    Zbb\n    XLEN is 32\n"
        );
    }
}
