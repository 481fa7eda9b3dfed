use std::fs;

use miette::Diagnostic;
use yap_ast::dsl::*;
use yap_ast::{Implicitness, Literal, Multiplicity};
use yap_core::config::ElabConfig;
use yap_core::value::Binder;
use yap_core::verify::{self, NoProver, Prover, Verdict};
use yap_core::{ConfigError, Context, Value, interpret, interpret_all};

fn is_implicit_pi(ty: &Value) -> bool {
    matches!(
        ty,
        Value::Abs {
            binder: Binder::Pi {
                icit: Implicitness::Implicit,
                ..
            },
            ..
        }
    )
}

#[test]
fn unannotated_definitions_are_generalised() {
    let program = [
        let_("id", None, lam("x", var("x"))),
        expr(app(var("id"), boolean(true))),
        expr(app(var("id"), num(7.0))),
    ];
    let (_, results) = interpret_all(&program, &Context::prelude(), &ElabConfig::default()).unwrap();
    assert!(is_implicit_pi(&results[0].ty));
    assert!(results[1].ty.is_atom("Bool"));
    assert!(results[2].ty.is_atom("Num"));
    assert!(matches!(results[1].normal_forms[0], Value::Lit(Literal::Bool(true))));
}

#[test]
fn generalisation_can_be_switched_off() {
    let config = ElabConfig {
        generalize: false,
        ..ElabConfig::default()
    };
    let (_, out) = interpret(&let_("id", None, lam("x", var("x"))), &Context::prelude(), &config).unwrap();
    assert!(!is_implicit_pi(&out.ty));
}

#[test]
fn later_units_do_not_reuse_metas_left_in_globals() {
    let config = ElabConfig {
        generalize: false,
        ..ElabConfig::default()
    };
    let program = [
        let_("g", None, lam("x", var("x"))),
        expr(app(lam("y", app(var("g"), num(1.0))), string("s"))),
    ];
    let (ctx, results) = interpret_all(&program, &Context::prelude(), &config).unwrap();
    assert!(results[1].ty.is_atom("Num"));
    assert!(ctx.globals().metas_issued > 0);
}

#[test]
fn holes_in_a_let_annotation_stay_apart_from_later_metas() {
    let program = [
        let_("g", Some(pi("x", hole(), hole())), lam("x", var("x"))),
        expr(app(lam("a", app(lam("b", app(var("g"), num(1.0))), string("s"))), boolean(true))),
    ];
    let (_, results) = interpret_all(&program, &Context::prelude(), &ElabConfig::default()).unwrap();
    assert!(results[1].ty.is_atom("Num"));
}

#[test]
fn annotated_polymorphism() {
    let ty = ipi("a", var("Type"), pi("x", var("a"), var("a")));
    let program = [
        let_("id", Some(ty), ilam("a", lam("x", var("x")))),
        expr(app(var("id"), string("s"))),
    ];
    let (_, results) = interpret_all(&program, &Context::prelude(), &ElabConfig::default()).unwrap();
    assert!(results[1].ty.is_atom("String"));
}

#[test]
fn using_supplies_implicit_arguments() {
    let program = [
        let_("answer", Some(ipi("n", var("Num"), var("Num"))), ilam("n", var("n"))),
        using(num(42.0)),
        expr(annotate(var("answer"), var("Num"))),
    ];
    let (ctx, results) = interpret_all(&program, &Context::prelude(), &ElabConfig::default()).unwrap();
    assert_eq!(ctx.implicits().count(), 1);
    assert!(matches!(results[2].normal_forms[0], Value::Lit(Literal::Num(n)) if n == 42.0));
}

#[test]
fn pretty_types_use_source_names() {
    let (_, out) = interpret(&expr(num(1.0)), &Context::prelude(), &ElabConfig::default()).unwrap();
    assert_eq!(out.pretty, "Num");
}

fn positive() -> yap_ast::Term {
    modal(
        var("Num"),
        Some(Multiplicity::One),
        Some(lam("v", binop(">", var("v"), num(0.0)))),
    )
}

#[test]
fn refinements_become_verification_conditions() {
    let ctx = Context::prelude();
    let config = ElabConfig::default();

    let proved = verify::check(&ctx, &num(5.0), &positive(), &config).unwrap();
    assert_eq!(proved.vc.quantity, Multiplicity::One);
    assert_eq!(NoProver.prove(&proved.vc), Verdict::Proved);

    let refuted = verify::check(&ctx, &num(-1.0), &positive(), &config).unwrap();
    assert_eq!(NoProver.prove(&refuted.vc), Verdict::Refuted);
}

#[test]
fn plain_types_are_trivially_verified() {
    let artefacts = verify::check(&Context::prelude(), &num(5.0), &var("Num"), &ElabConfig::default()).unwrap();
    assert!(artefacts.vc.predicate.is_none());
    assert_eq!(NoProver.prove(&artefacts.vc), Verdict::Proved);
}

#[test]
fn configured_cap_limits_rendered_frames() {
    let config = ElabConfig {
        provenance_cap: 1,
        ..ElabConfig::default()
    };
    let err = interpret(&expr(annotate(string("hello"), var("Num"))), &Context::prelude(), &config).unwrap_err();
    let frames = err.provenance.len();
    assert!(frames > 1);
    assert_eq!(err.frame_cap, 1);

    let help = err.help().unwrap().to_string();
    assert_eq!(help.lines().count(), 2);
    assert_eq!(help.lines().last(), Some(format!("... {} more frames", frames - 1).as_str()));
}

#[test]
fn config_loads_from_a_manifest() {
    let dir = std::env::temp_dir().join(format!("yap-config-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("yap.toml");
    fs::write(&path, "[elaboration]\nstrict_reset_answer = true\n").unwrap();

    let config = ElabConfig::load(&path).unwrap();
    assert!(config.strict_reset_answer);
    assert!(config.generalize);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_config_is_an_io_error() {
    let err = ElabConfig::load("/definitely/not/here/yap.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
