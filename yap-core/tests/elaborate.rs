use yap_ast::dsl::*;
use yap_ast::{Literal, Multiplicity};
use yap_core::value::Binder;
use yap_core::{Ast, Context, ElabError, Elaborator, ErrorKind, Value};

fn elaborate(term: &yap_ast::Term) -> Result<Ast, ElabError> {
    Elaborator::default().elaborate(&Context::prelude(), term)
}

fn is_pi_from(ty: &Value, domain: &str) -> bool {
    matches!(ty, Value::Abs { binder: Binder::Pi { annotation, .. }, .. } if annotation.is_atom(domain))
}

#[test]
fn literals() {
    assert!(elaborate(&num(1.0)).unwrap().ty.is_atom("Num"));
    assert!(elaborate(&boolean(false)).unwrap().ty.is_atom("Bool"));
    assert!(elaborate(&string("s")).unwrap().ty.is_atom("String"));
    assert!(elaborate(&var("Num")).unwrap().ty.is_atom("Type"));
}

#[test]
fn undefined_variables_are_reported() {
    let err = elaborate(&var("nope")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UndefinedVariable(ref name) if name == "nope"));
}

#[test]
fn annotated_lambda() {
    let ast = elaborate(&lam_ann("x", var("Num"), var("x"))).unwrap();
    assert!(is_pi_from(&ast.ty, "Num"));
}

#[test]
fn application_solves_the_domain() {
    let ast = elaborate(&app(lam("x", var("x")), num(1.0))).unwrap();
    assert!(ast.ty.is_atom("Num"));
}

#[test]
fn implicit_application_of_an_explicit_function() {
    let err = elaborate(&iapp(lam("x", var("x")), num(1.0))).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ImplicitnessMismatch { .. }));
}

#[test]
fn types_of_types() {
    assert!(elaborate(&pi("x", var("Num"), var("Num"))).unwrap().ty.is_atom("Type"));
    assert!(elaborate(&mu("t", var("Type"), var("Num"))).unwrap().ty.is_atom("Type"));
    assert!(elaborate(&row(vec![("a", var("Num"))], None)).unwrap().ty.is_atom("Row"));
    let sum = variant(vec![("none", var("Unit")), ("some", var("Num"))]);
    assert!(elaborate(&sum).unwrap().ty.is_atom("Type"));
}

#[test]
fn holes_take_the_expected_type() {
    let ast = elaborate(&annotate(hole(), var("Num"))).unwrap();
    assert!(ast.ty.is_atom("Num"));
}

#[test]
fn struct_projection() {
    let record = record(vec![("a", num(1.0)), ("b", boolean(true))]);
    let ast = elaborate(&project(record, "b")).unwrap();
    assert!(ast.ty.is_atom("Bool"));
}

#[test]
fn injection_extends_the_schema() {
    let ast = elaborate(&inject(record(vec![("a", num(1.0))]), "b", boolean(true))).unwrap();
    let row = ast.ty.tagged_row("Schema").unwrap();
    assert!(row.get("a").is_some_and(|ty| ty.is_atom("Num")));
    assert!(row.get("b").is_some_and(|ty| ty.is_atom("Bool")));
}

#[test]
fn records_check_against_schemas() {
    let schema = record(vec![("a", var("Num"))]);
    assert!(elaborate(&annotate(record(vec![("a", num(1.0))]), schema.clone())).is_ok());
    assert!(elaborate(&annotate(record(vec![("a", string("x"))]), schema)).is_err());
}

#[test]
fn projection_from_an_unknown_record() {
    let ast = elaborate(&lam("r", project(var("r"), "a"))).unwrap();
    assert!(matches!(ast.ty, Value::Abs { .. }));
}

#[test]
fn tagged_values_have_open_variant_types() {
    let ast = elaborate(&tagged("some", num(1.0))).unwrap();
    let row = ast.ty.tagged_row("Variant").unwrap();
    assert!(row.get("some").is_some_and(|ty| ty.is_atom("Num")));

    let sum = variant(vec![("none", var("Unit")), ("some", var("Num"))]);
    assert!(elaborate(&annotate(tagged("some", num(1.0)), sum)).is_ok());
}

#[test]
fn lists_share_an_element_type() {
    let ast = elaborate(&list(vec![num(1.0), num(2.0)])).unwrap();
    assert!(matches!(&ast.ty, Value::App { func, arg, .. } if func.is_atom("Array") && arg.is_atom("Num")));

    let err = elaborate(&list(vec![num(1.0), boolean(true)])).unwrap_err();
    assert_eq!(err.to_string(), "Unification Failure: Cannot unify Bool with Num");
}

#[test]
fn blocks_scope_their_lets() {
    let program = block(vec![let_("x", None, num(1.0))], Some(binop("+", var("x"), num(1.0))));
    assert!(elaborate(&program).unwrap().ty.is_atom("Num"));
    assert!(elaborate(&block(vec![], None)).unwrap().ty.is_atom("Unit"));
}

#[test]
fn row_tails_must_be_rows() {
    let program = block(vec![let_("n", None, num(1.0))], Some(row(vec![("a", var("Num"))], Some("n"))));
    let err = elaborate(&program).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotARow { .. }));
}

#[test]
fn match_alternatives_agree() {
    let program = matching(
        num(1.0),
        vec![alt(pnum(0.0), string("zero")), alt(pvar("n"), string("other"))],
    );
    assert!(elaborate(&program).unwrap().ty.is_atom("String"));

    let mixed = matching(num(1.0), vec![alt(pnum(0.0), string("zero")), alt(pwild(), num(1.0))]);
    assert!(elaborate(&mixed).is_err());
}

#[test]
fn struct_patterns_bind_fields() {
    let program = matching(
        record(vec![("a", num(1.0))]),
        vec![alt(pstruct(vec![("a", pvar("x"))], None), var("x"))],
    );
    assert!(elaborate(&program).unwrap().ty.is_atom("Num"));
}

#[test]
fn multiplicities_are_enforced() {
    let twice = lam("x", binop("+", var("x"), var("x")));
    let linear = pi_q("x", Multiplicity::One, var("Num"), var("Num"));
    let err = elaborate(&annotate(twice.clone(), linear.clone())).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::MultiplicityMismatch {
            expected: Multiplicity::One,
            computed: Multiplicity::Many,
        }
    ));

    let unrestricted = pi_q("x", Multiplicity::Many, var("Num"), var("Num"));
    assert!(elaborate(&annotate(twice, unrestricted)).is_ok());
    assert!(elaborate(&annotate(lam("x", var("x")), linear)).is_ok());

    let erased = pi_q("x", Multiplicity::Zero, var("Num"), var("Num"));
    assert!(elaborate(&annotate(lam("x", var("x")), erased)).is_err());
}

#[test]
fn errors_carry_provenance() {
    let err = elaborate(&annotate(string("hello"), var("Num"))).unwrap_err();
    assert!(!err.provenance.is_empty());
    assert!(err.report(1).lines().count() <= 3);
    assert!(err.report(10).starts_with("Unification Failure"));
}

#[test]
fn modal_types_check_their_predicate() {
    let positive = modal(
        var("Num"),
        Some(Multiplicity::One),
        Some(lam("v", binop(">", var("v"), num(0.0)))),
    );
    let ast = elaborate(&positive).unwrap();
    assert!(ast.ty.is_atom("Type"));

    let ill_typed = modal(var("Num"), None, Some(lam("v", var("v"))));
    assert!(elaborate(&ill_typed).is_err());
}

#[test]
fn literal_types() {
    assert!(yap_core::literal_type(&Literal::Num(0.0)).is_atom("Num"));
    assert!(yap_core::literal_type(&Literal::atom("Num")).is_atom("Type"));
}
