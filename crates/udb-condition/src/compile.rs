//! Translation of declarative clauses into logic trees.

use udb_logic::{parse_requirement, ExtensionTerm, LogicNode};

use crate::clause::Clause;
use crate::error::{ConditionError, Result};

/// The extension term an `extension` clause denotes. A clause without a
/// version means any version.
pub fn extension_term(name: &str, version: Option<&str>) -> Result<ExtensionTerm> {
    match version {
        None => Ok(ExtensionTerm::any(name)),
        Some(requirement) => {
            let (op, version) =
                parse_requirement(requirement).map_err(|source| ConditionError::InvalidVersion {
                    requirement: requirement.to_string(),
                    source,
                })?;
            Ok(ExtensionTerm::new(name, op, version))
        }
    }
}

/// Translate a clause verbatim, one connective per clause kind.
pub fn compile(clause: &Clause) -> Result<LogicNode> {
    let all = |cs: &[Clause]| cs.iter().map(compile).collect::<Result<Vec<_>>>();
    Ok(match clause {
        Clause::Bool(b) => LogicNode::constant(*b),
        Clause::AllOf(cs) => LogicNode::and(all(cs)?),
        Clause::AnyOf(cs) => LogicNode::or(all(cs)?),
        Clause::OneOf(cs) => LogicNode::xor(all(cs)?),
        Clause::NoneOf(cs) => LogicNode::nor(all(cs)?),
        Clause::Not(c) => LogicNode::not(compile(c)?),
        Clause::If { condition, then } => LogicNode::implies(compile(condition)?, compile(then)?),
        Clause::Extension { name, version } => {
            LogicNode::term(extension_term(name, version.as_deref())?)
        }
        Clause::Param(param) => LogicNode::term(param.clone()),
        Clause::Xlen(xlen) => LogicNode::term(*xlen),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use udb_logic::{NodeKind, Version, VersionOp, Xlen};

    #[test]
    fn maps_each_clause_kind() {
        let clause = Clause::from_json_str(
            r#"{ "allOf": [
                { "oneOf": [ { "extension": { "name": "A" } }, { "xlen": 32 } ] },
                { "noneOf": [ { "extension": { "name": "B" } }, false ] },
                { "if": { "extension": { "name": "C", "version": "~> 2.1" } }, "then": true }
            ] }"#,
        )
        .unwrap();
        let tree = compile(&clause).unwrap();
        let NodeKind::And(cs) = tree.kind() else {
            panic!("expected And, got {tree}");
        };
        assert!(matches!(cs[0].kind(), NodeKind::Xor(_)));
        assert!(matches!(cs[1].kind(), NodeKind::Nor(_)));
        let NodeKind::If(a, b) = cs[2].kind() else {
            panic!("expected If");
        };
        assert_eq!(
            *a,
            LogicNode::term(ExtensionTerm::new("C", VersionOp::Compatible, Version::new(2, 1, 0)))
        );
        assert!(b.is_true());
        assert!(tree.terms().contains(&udb_logic::Term::Xlen(Xlen::Rv32)));
    }

    #[test]
    fn versionless_extension_is_any_version() {
        let tree = compile(&Clause::extension("Zicsr")).unwrap();
        assert_eq!(tree, LogicNode::term(ExtensionTerm::any("Zicsr")));
        let exact = compile(&Clause::extension_version("Zicsr", "2.0")).unwrap();
        assert_eq!(
            exact,
            LogicNode::term(ExtensionTerm::exact("Zicsr", Version::new(2, 0, 0)))
        );
    }

    #[test]
    fn single_element_lists_collapse() {
        let tree = compile(&Clause::AnyOf(vec![Clause::extension("A")])).unwrap();
        assert!(tree.is_literal());
        let none = compile(&Clause::NoneOf(vec![Clause::extension("A")])).unwrap();
        assert!(matches!(none.kind(), NodeKind::Not(_)));
    }
}
