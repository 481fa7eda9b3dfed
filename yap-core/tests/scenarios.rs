//! End-to-end elaboration of small programs: dependent matches and
//! delimited control.

use yap_ast::Literal;
use yap_ast::dsl::*;
use yap_core::{Context, ElabConfig, Elaborator, ErrorKind, Value, interpret, interpret_all};

fn is_num(value: &Value, n: f64) -> bool {
    matches!(value, Value::Lit(Literal::Num(m)) if *m == n)
}

fn dependent(zero_branch: yap_ast::Term) -> yap_ast::Statement {
    // f : (x: Num) -> match x | 0 -> Num | _ -> String
    let ty = pi(
        "x",
        var("Num"),
        matching(var("x"), vec![alt(pnum(0.0), var("Num")), alt(pwild(), var("String"))]),
    );
    let value = lam("x", matching(var("x"), vec![alt(pnum(0.0), zero_branch), alt(pwild(), string("10"))]));
    let_("f", Some(ty), value)
}

#[test]
fn dependent_match_narrows_each_alternative() {
    let (ctx, out) = interpret(&dependent(num(10.0)), &Context::prelude(), &ElabConfig::default()).unwrap();
    assert!(matches!(out.ty, Value::Abs { .. }));
    assert!(ctx.lookup("f").is_ok());
}

#[test]
fn dependent_match_rejects_the_wrong_branch_type() {
    let err = interpret(&dependent(string("hello")), &Context::prelude(), &ElabConfig::default()).unwrap_err();
    assert_eq!(err.to_string(), "Unification Failure: Cannot unify String with Num");
}

#[test]
fn shift_records_one_resumption() {
    let program = reset(binop("+", num(1.0), shift(resume(num(1.0)))));
    let mut elab = Elaborator::default();
    let ast = elab.elaborate(&Context::prelude(), &program).unwrap();

    assert!(ast.ty.is_atom("Num"));
    let [skolem] = elab.state.skolems.as_slice() else {
        panic!("expected one skolem, found {:?}", elab.state.skolems);
    };
    let resumed = elab.state.resumptions(*skolem);
    assert_eq!(resumed.len(), 1);
    assert!(is_num(&resumed[0], 1.0));
}

#[test]
fn resumption_is_replayed_into_the_normal_form() {
    let program = expr(reset(binop("+", num(1.0), shift(resume(num(1.0))))));
    let (_, out) = interpret(&program, &Context::prelude(), &ElabConfig::default()).unwrap();
    assert_eq!(out.normal_forms.len(), 1);
    assert!(is_num(&out.normal_forms[0], 2.0));
}

#[test]
fn every_resumption_yields_a_normal_form() {
    let body = block(vec![expr(resume(num(1.0)))], Some(resume(num(2.0))));
    let program = expr(reset(binop("+", num(1.0), shift(body))));
    let (_, out) = interpret(&program, &Context::prelude(), &ElabConfig::default()).unwrap();
    assert_eq!(out.normal_forms.len(), 2);
    assert!(is_num(&out.normal_forms[0], 2.0));
    assert!(is_num(&out.normal_forms[1], 3.0));
}

#[test]
fn resuming_with_the_wrong_type_fails() {
    let program = reset(binop("+", num(1.0), shift(resume(boolean(true)))));
    let err = Elaborator::default().elaborate(&Context::prelude(), &program).unwrap_err();
    assert_eq!(err.to_string(), "Unification Failure: Cannot unify Bool with Num");
}

#[test]
fn strict_answer_types_still_accept_pure_resets() {
    let config = ElabConfig {
        strict_reset_answer: true,
        ..ElabConfig::default()
    };
    let program = reset(binop("+", num(1.0), shift(resume(num(1.0)))));
    let ast = Elaborator::new(config).elaborate(&Context::prelude(), &program).unwrap();
    assert!(ast.ty.is_atom("Num"));
}

#[test]
fn shift_needs_a_reset() {
    let err = Elaborator::default()
        .elaborate(&Context::prelude(), &shift(num(1.0)))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ShiftWithoutReset));
}

#[test]
fn resume_needs_a_shift() {
    let err = Elaborator::default()
        .elaborate(&Context::prelude(), &reset(resume(num(1.0))))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ResumeWithoutShift));
}

#[test]
fn definitions_are_visible_to_later_statements() {
    let program = [
        let_("two", None, num(2.0)),
        expr(binop("*", var("two"), num(21.0))),
    ];
    let (_, results) = interpret_all(&program, &Context::prelude(), &ElabConfig::default()).unwrap();
    assert!(results[1].ty.is_atom("Num"));
    assert!(is_num(&results[1].normal_forms[0], 42.0));
}
