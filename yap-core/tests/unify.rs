use proptest::prelude::*;
use yap_ast::{Literal, Row};
use yap_core::state::State;
use yap_core::subst::{Subst, force_row};
use yap_core::syntax::Variable;
use yap_core::value::ValueRow;
use yap_core::{ErrorKind, Level, Value, unify, unify_rows};

fn closed(fields: Vec<(&str, Value)>) -> ValueRow {
    Row::from_fields(fields.into_iter().map(|(l, v)| (l.to_string(), v)), Row::Empty)
}

fn ground() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        (-1000i32..1000).prop_map(|n| Value::num(f64::from(n))),
        any::<bool>().prop_map(|b| Value::Lit(Literal::Bool(b))),
        prop::sample::select(vec!["Num", "Bool", "String", "Unit"]).prop_map(Value::atom),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(Value::array),
            prop::collection::vec(inner, 0..4).prop_map(|values| {
                let fields = values.into_iter().enumerate().map(|(i, v)| (format!("f{i}"), v));
                Value::schema(Row::from_fields(fields, Row::Empty))
            }),
        ]
    })
}

proptest! {
    #[test]
    fn ground_values_unify_with_themselves(value in ground()) {
        let mut state = State::default();
        let subst = unify(&mut state, &value, &value, Level(0), Subst::empty()).unwrap();
        prop_assert!(subst.is_empty());
    }
}

#[test]
fn distinct_literals_fail() {
    let mut state = State::default();
    let err = unify(&mut state, &Value::num(1.0), &Value::num(2.0), Level(0), Subst::empty()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnificationFailure { .. }));
}

#[test]
fn metas_are_solved() {
    let mut state = State::default();
    let meta = state.fresh_meta(Level(0), Value::ty());
    let subst = unify(&mut state, &Value::flex(meta), &Value::atom("Num"), Level(0), Subst::empty()).unwrap();
    assert!(subst.get(meta.id).is_some_and(|v| v.is_atom("Num")));
}

#[test]
fn distinct_rigids_fail() {
    let mut state = State::default();
    let err = unify(&mut state, &Value::rigid(Level(0)), &Value::rigid(Level(1)), Level(2), Subst::empty()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::RigidVariableMismatch { .. }));
}

#[test]
fn open_rows_exchange_labels() {
    let mut state = State::default();
    let r1 = state.fresh_meta(Level(0), Value::row_kind());
    let r2 = state.fresh_meta(Level(0), Value::row_kind());
    let left = Row::extend("a", Value::atom("Num"), Row::Variable(Variable::Meta(r1)));
    let right = Row::extend("b", Value::atom("String"), Row::Variable(Variable::Meta(r2)));

    let subst = unify_rows(&mut state, &left, &right, Level(0), Subst::empty()).unwrap();
    let left = force_row(&left, &subst).unwrap();
    let right = force_row(&right, &subst).unwrap();

    let mut labels = left.labels();
    labels.sort();
    assert_eq!(labels, vec!["a", "b"]);
    let mut labels = right.labels();
    labels.sort();
    assert_eq!(labels, vec!["a", "b"]);
    assert!(right.get("a").is_some_and(|v| v.is_atom("Num")));
    assert!(left.get("b").is_some_and(|v| v.is_atom("String")));
    assert_eq!(left.tail(), right.tail());
    assert!(matches!(left.tail(), Some(Variable::Meta(_))));
}

fn solved_row(subst: &Subst, meta: yap_core::Meta) -> ValueRow {
    match subst.get(meta.id) {
        Some(Value::Row(row)) => row.clone(),
        other => panic!("{meta} solved by {other:?}"),
    }
}

#[test]
fn each_open_row_receives_the_other_sides_field() {
    // [x: 42 | ?r] ~ [y: 43 | ?s]
    let mut state = State::default();
    let r = state.fresh_meta(Level(0), Value::row_kind());
    let s = state.fresh_meta(Level(0), Value::row_kind());
    let left = Row::extend("x", Value::num(42.0), Row::Variable(Variable::Meta(r)));
    let right = Row::extend("y", Value::num(43.0), Row::Variable(Variable::Meta(s)));

    let subst = unify_rows(&mut state, &left, &right, Level(0), Subst::empty()).unwrap();
    let r_row = solved_row(&subst, r);
    let s_row = solved_row(&subst, s);

    assert_eq!(r_row.labels(), vec!["y"]);
    assert!(matches!(r_row.get("y"), Some(Value::Lit(Literal::Num(n))) if *n == 43.0));
    assert_eq!(s_row.labels(), vec!["x"]);
    assert!(matches!(s_row.get("x"), Some(Value::Lit(Literal::Num(n))) if *n == 42.0));

    let fresh = r_row.tail().cloned();
    assert!(matches!(fresh, Some(Variable::Meta(m)) if m.id != r.id && m.id != s.id));
    assert_eq!(s_row.tail().cloned(), fresh);
}

#[test]
fn closed_rows_with_different_labels_fail() {
    let mut state = State::default();
    let left = closed(vec![("a", Value::atom("Num"))]);
    let right = closed(vec![("b", Value::atom("Num"))]);
    let err = unify_rows(&mut state, &left, &right, Level(0), Subst::empty()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingLabel { .. }));
}

#[test]
fn schemas_unify_field_by_field() {
    let mut state = State::default();
    let meta = state.fresh_meta(Level(0), Value::ty());
    let left = Value::schema(closed(vec![("x", Value::atom("Num")), ("y", Value::flex(meta))]));
    let right = Value::schema(closed(vec![("y", Value::atom("Bool")), ("x", Value::atom("Num"))]));
    let subst = unify(&mut state, &left, &right, Level(0), Subst::empty()).unwrap();
    assert!(subst.get(meta.id).is_some_and(|v| v.is_atom("Bool")));
}
