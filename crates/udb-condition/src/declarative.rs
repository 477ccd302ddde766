//! Logic trees back to declarative clauses.

use udb_logic::{ExtensionTerm, LogicNode, NodeKind, Term};

use crate::clause::Clause;
use crate::error::{ConditionError, Result};

/// The clause form of a tree. Synthetic terms have no clause form.
pub fn to_clause(node: &LogicNode) -> Result<Clause> {
    let all = |cs: &[LogicNode]| cs.iter().map(to_clause).collect::<Result<Vec<_>>>();
    Ok(match node.kind() {
        NodeKind::True => Clause::Bool(true),
        NodeKind::False => Clause::Bool(false),
        NodeKind::Term(term) => term_clause(term)?,
        NodeKind::Not(c) => Clause::negate(to_clause(c)?),
        NodeKind::And(cs) => Clause::AllOf(all(cs)?),
        NodeKind::Or(cs) => Clause::AnyOf(all(cs)?),
        NodeKind::Xor(cs) => Clause::OneOf(all(cs)?),
        NodeKind::Nor(cs) => Clause::NoneOf(all(cs)?),
        NodeKind::If(a, b) => Clause::implies(to_clause(a)?, to_clause(b)?),
    })
}

fn term_clause(term: &Term) -> Result<Clause> {
    match term {
        Term::Free(_) => Err(ConditionError::FreeTermInClause),
        Term::Extension(ext) if *ext == ExtensionTerm::any(ext.name.clone()) => {
            Ok(Clause::extension(ext.name.clone()))
        }
        other => Clause::from_value(&other.to_declarative()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use udb_logic::{LogicEngine, Version};

    #[test]
    fn round_trips_through_compile() {
        let text = r#"{ "allOf": [
            { "extension": { "name": "Zca" } },
            { "oneOf": [ { "xlen": 32 }, { "extension": { "name": "Zcf", "version": "= 1.0.0" } } ] },
            { "if": { "param": { "name": "MXLEN", "equal": 32 } }, "then": { "noneOf": [ { "extension": { "name": "Zcd" } }, false ] } },
            { "not": { "param": { "name": "PMP", "size": true, "greater_than": 4 } } }
        ] }"#;
        let clause = Clause::from_json_str(text).unwrap();
        let tree = compile(&clause).unwrap();
        assert_eq!(to_clause(&tree).unwrap(), clause);
    }

    #[test]
    fn canonical_version_spelling_is_equivalent() {
        let clause = Clause::extension_version("Zba", ">= 1.0");
        let tree = compile(&clause).unwrap();
        let back = to_clause(&tree).unwrap();
        assert_eq!(back, Clause::extension_version("Zba", ">= 1.0.0"));
        let engine = LogicEngine::default();
        assert!(engine.equivalent(&tree, &compile(&back).unwrap()).unwrap());
    }

    #[test]
    fn synthetic_terms_are_rejected() {
        let tree = LogicNode::or(vec![
            LogicNode::term(ExtensionTerm::exact("A", Version::new(1, 0, 0))),
            LogicNode::term(ExtensionTerm::exact("B", Version::new(1, 0, 0))),
        ])
        .tseytin();
        assert!(matches!(to_clause(&tree), Err(ConditionError::FreeTermInClause)));
    }
}
