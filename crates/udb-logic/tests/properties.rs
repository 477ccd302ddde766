//! Property-based tests for the logic engine.
//!
//! Random trees over a small pool of extension terms are checked against
//! truth-table semantics: rewrites must preserve meaning, and the
//! brute-force and solver paths must agree.

use proptest::prelude::*;
use udb_logic::{
    Assignment, ExtensionTerm, LogicEngine, LogicNode, SatisfiedResult, Term, TwoLevelForm,
    Version,
};

// ============================================================================
// Strategies
// ============================================================================

const NAMES: [&str; 5] = ["A", "B", "C", "D", "E"];

fn ext(i: usize) -> LogicNode {
    LogicNode::term(ExtensionTerm::exact(NAMES[i], Version::new(1, 0, 0)))
}

fn leaf() -> impl Strategy<Value = LogicNode> {
    prop_oneof![
        8 => (0..NAMES.len()).prop_map(ext),
        1 => Just(LogicNode::always_true()),
        1 => Just(LogicNode::always_false()),
    ]
}

fn tree() -> impl Strategy<Value = LogicNode> {
    leaf().prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(LogicNode::not),
            prop::collection::vec(inner.clone(), 2..4).prop_map(LogicNode::and),
            prop::collection::vec(inner.clone(), 2..4).prop_map(LogicNode::or),
            prop::collection::vec(inner.clone(), 2..4).prop_map(LogicNode::xor),
            prop::collection::vec(inner.clone(), 2..4).prop_map(LogicNode::nor),
            (inner.clone(), inner).prop_map(|(a, b)| LogicNode::implies(a, b)),
        ]
    })
}

fn leaf_callback(assignment: &Assignment) -> impl Fn(&Term) -> SatisfiedResult + '_ {
    move |t: &Term| SatisfiedResult::from(assignment.get(t).copied().unwrap_or(false))
}

// ============================================================================
// Evaluation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_three_valued_agrees_with_truth_table(x in tree()) {
        for assignment in x.assignments() {
            let three_valued = x.evaluate(&leaf_callback(&assignment));
            let boolean = x.evaluate_assignment(&assignment);
            prop_assert_eq!(three_valued, SatisfiedResult::from(boolean));
        }
    }

    #[test]
    fn prop_partial_evaluation_with_full_facts_is_constant(x in tree()) {
        for assignment in x.assignments() {
            let reduced = x.partial_evaluate(&leaf_callback(&assignment));
            prop_assert!(reduced.is_constant());
            prop_assert_eq!(reduced.is_true(), x.evaluate_assignment(&assignment));
        }
    }
}

// ============================================================================
// Rewrites
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_nnf_is_idempotent(x in tree()) {
        let once = x.nnf();
        prop_assert_eq!(once.nnf().reduce(), once.reduce());
    }

    #[test]
    fn prop_nnf_is_equivalent(x in tree()) {
        let engine = LogicEngine::default();
        prop_assert!(engine.equivalent(&x, &x.nnf()).unwrap());
    }

    #[test]
    fn prop_reduce_is_equivalent(x in tree()) {
        let engine = LogicEngine::default();
        prop_assert!(engine.equivalent(&x, &x.reduce()).unwrap());
    }

    #[test]
    fn prop_equiv_cnf_is_equivalent(x in tree()) {
        let engine = LogicEngine::default();
        let cnf = x.equiv_cnf(false).unwrap();
        prop_assert!(cnf.is_cnf());
        prop_assert!(engine.equivalent(&x, &cnf).unwrap());
    }

    #[test]
    fn prop_equiv_dnf_is_equivalent(x in tree()) {
        let engine = LogicEngine::default();
        let dnf = x.equiv_dnf(false).unwrap();
        prop_assert!(dnf.is_dnf());
        prop_assert!(engine.equivalent(&x, &dnf).unwrap());
    }

    #[test]
    fn prop_tseytin_is_equisatisfiable(x in tree()) {
        let engine = LogicEngine::default();
        let encoded = x.tseytin();
        prop_assert!(encoded.is_cnf());
        prop_assert_eq!(
            engine.brute_force_satisfiable(&x),
            engine.solver_satisfiable(&encoded).unwrap()
        );
    }

    #[test]
    fn prop_minimization_is_equivalent(x in tree()) {
        let engine = LogicEngine::default();
        let sop = engine.minimize(&x, TwoLevelForm::SumOfProducts).unwrap();
        let pos = engine.minimize(&x, TwoLevelForm::ProductOfSums).unwrap();
        prop_assert!(engine.equivalent(&x, &sop).unwrap());
        prop_assert!(engine.equivalent(&x, &pos).unwrap());
        prop_assert!(sop.is_nested_dnf());
        prop_assert!(pos.is_nested_cnf());
    }
}

// ============================================================================
// Satisfiability
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_brute_force_and_solver_agree(x in tree()) {
        let engine = LogicEngine::default();
        prop_assert_eq!(
            engine.brute_force_satisfiable(&x),
            engine.solver_satisfiable(&x).unwrap()
        );
    }

    #[test]
    fn prop_unsatisfiable_iff_negation_is_valid(x in tree()) {
        let engine = LogicEngine::default();
        let negation_valid = engine
            .equivalent(&LogicNode::not(x.clone()), &LogicNode::always_true())
            .unwrap();
        prop_assert_eq!(engine.unsatisfiable(&x).unwrap(), negation_valid);
    }
}

// ============================================================================
// Fixtures
// ============================================================================

#[test]
fn adjacent_products_minimize_to_one_literal() {
    let engine = LogicEngine::default();
    let x = LogicNode::or(vec![
        LogicNode::and(vec![ext(0), ext(1)]),
        LogicNode::and(vec![ext(0), LogicNode::not(ext(1))]),
    ]);
    for form in [TwoLevelForm::SumOfProducts, TwoLevelForm::ProductOfSums] {
        let min = engine.minimize(&x, form).unwrap();
        assert_eq!(min, ext(0));
        assert_eq!(min.literal_count(), 1);
    }
}

#[test]
fn consensus_term_is_dropped() {
    // AB + !AC + BC == AB + !AC
    let engine = LogicEngine::default();
    let x = LogicNode::or(vec![
        LogicNode::and(vec![ext(0), ext(1)]),
        LogicNode::and(vec![LogicNode::not(ext(0)), ext(2)]),
        LogicNode::and(vec![ext(1), ext(2)]),
    ]);
    let min = engine.minimize(&x, TwoLevelForm::SumOfProducts).unwrap();
    assert_eq!(min.literal_count(), 4);
    assert!(engine.equivalent(&x, &min).unwrap());
}
