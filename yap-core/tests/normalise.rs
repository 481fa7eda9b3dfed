use std::rc::Rc;

use proptest::prelude::*;
use proptest::strategy::Union;
use yap_ast::{Implicitness, Literal, Multiplicity};
use yap_core::eval::evaluate;
use yap_core::quote::{normalize, quote};
use yap_core::value::{Env, Globals};
use yap_core::{Level, Term, Value};

/// Terms already in normal form with at most `depth` variables in scope.
fn normal(depth: usize, fuel: u32) -> BoxedStrategy<Term> {
    let mut leaves = vec![
        (-1000i32..1000).prop_map(|n| Term::Lit(Literal::Num(f64::from(n)))).boxed(),
        any::<bool>().prop_map(|b| Term::Lit(Literal::Bool(b))).boxed(),
    ];
    if depth > 0 {
        leaves.push((0..depth).prop_map(Term::bound).boxed());
    }
    let leaf = Union::new(leaves).boxed();
    if fuel == 0 {
        return leaf;
    }
    let mut cases = vec![
        leaf,
        normal(depth + 1, fuel - 1)
            .prop_map(|body| Term::lambda("x", Implicitness::Explicit, body))
            .boxed(),
        (normal(depth, fuel - 1), normal(depth + 1, fuel - 1))
            .prop_map(|(domain, codomain)| Term::pi("x", Implicitness::Explicit, Multiplicity::Many, domain, codomain))
            .boxed(),
    ];
    if depth > 0 {
        cases.push(
            (0..depth, normal(depth, fuel - 1))
                .prop_map(|(i, arg)| Term::app(Term::bound(i), arg))
                .boxed(),
        );
    }
    Union::new(cases).boxed()
}

proptest! {
    #[test]
    fn normal_forms_survive_evaluation_and_quotation(term in normal(0, 3)) {
        let value = evaluate(&Env::empty(), &term).unwrap();
        prop_assert_eq!(quote(Level(0), &value).unwrap(), term);
    }
}

fn prelude() -> Env {
    Env::new(Rc::new(Globals::prelude()))
}

#[test]
fn beta_reduces_under_binders() {
    // \y -> (\x -> x) y
    let identity = Term::lambda("x", Implicitness::Explicit, Term::bound(0));
    let term = Term::lambda("y", Implicitness::Explicit, Term::app(identity, Term::bound(0)));
    let expected = Term::lambda("y", Implicitness::Explicit, Term::bound(0));
    assert_eq!(normalize(&Env::empty(), &term).unwrap(), expected);
}

#[test]
fn primitives_compute_on_literals() {
    let sum = Term::app(Term::app(Term::foreign("$add"), Term::Lit(Literal::Num(2.0))), Term::Lit(Literal::Num(3.0)));
    let value = evaluate(&prelude(), &sum).unwrap();
    assert!(matches!(value, Value::Lit(Literal::Num(n)) if n == 5.0));
}

#[test]
fn primitives_on_variables_stay_stuck() {
    // \x -> x + 1
    let body = Term::app(Term::app(Term::foreign("$add"), Term::bound(0)), Term::Lit(Literal::Num(1.0)));
    let term = Term::lambda("x", Implicitness::Explicit, body.clone());
    let normal = normalize(&prelude(), &term).unwrap();
    assert_eq!(normal, Term::lambda("x", Implicitness::Explicit, body));
}

#[test]
fn globals_unfold_to_their_definitions() {
    let value = evaluate(&prelude(), &Term::Var(yap_core::syntax::Variable::Free("Num".into()))).unwrap();
    assert!(value.is_atom("Num"));
}
