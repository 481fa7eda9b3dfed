#![forbid(unsafe_code)]

//! Built-in base types, primitive operations and the operators that name them.

use yap_ast::{Implicitness, Literal, Multiplicity};

use crate::syntax::{Term, atoms};
use crate::usage::Usages;
use crate::value::{Closure, Compute, Env, Globals, Import, Primitive, Value};

fn numbers(args: &[Value]) -> Option<(f64, f64)> {
    match args {
        [Value::Lit(Literal::Num(a)), Value::Lit(Literal::Num(b))] => Some((*a, *b)),
        _ => None,
    }
}

fn booleans(args: &[Value]) -> Option<(bool, bool)> {
    match args {
        [Value::Lit(Literal::Bool(a)), Value::Lit(Literal::Bool(b))] => Some((*a, *b)),
        _ => None,
    }
}

fn literals(args: &[Value]) -> Option<(&Literal, &Literal)> {
    match args {
        [Value::Lit(a), Value::Lit(b)] => Some((a, b)),
        _ => None,
    }
}

fn num(n: f64) -> Option<Value> {
    Some(Value::Lit(Literal::Num(n)))
}

fn boolean(b: bool) -> Option<Value> {
    Some(Value::Lit(Literal::Bool(b)))
}

#[derive(Clone, Copy)]
enum Signature {
    Arithmetic,
    Logical,
    Comparison,
    Negation,
}

/// Primitive name, operator spelling, signature and implementation.
const OPERATIONS: &[(&str, &str, Signature, usize, Compute)] = &[
    ("$add", "+", Signature::Arithmetic, 2, |args| numbers(args).and_then(|(a, b)| num(a + b))),
    ("$sub", "-", Signature::Arithmetic, 2, |args| numbers(args).and_then(|(a, b)| num(a - b))),
    ("$mul", "*", Signature::Arithmetic, 2, |args| numbers(args).and_then(|(a, b)| num(a * b))),
    ("$div", "/", Signature::Arithmetic, 2, |args| numbers(args).and_then(|(a, b)| num(a / b))),
    ("$mod", "%", Signature::Arithmetic, 2, |args| numbers(args).and_then(|(a, b)| num(a % b))),
    ("$and", "&&", Signature::Logical, 2, |args| booleans(args).and_then(|(a, b)| boolean(a && b))),
    ("$or", "||", Signature::Logical, 2, |args| booleans(args).and_then(|(a, b)| boolean(a || b))),
    ("$eq", "==", Signature::Comparison, 2, |args| literals(args).and_then(|(a, b)| boolean(a == b))),
    ("$neq", "!=", Signature::Comparison, 2, |args| literals(args).and_then(|(a, b)| boolean(a != b))),
    ("$lt", "<", Signature::Comparison, 2, |args| numbers(args).and_then(|(a, b)| boolean(a < b))),
    ("$gt", ">", Signature::Comparison, 2, |args| numbers(args).and_then(|(a, b)| boolean(a > b))),
    ("$lte", "<=", Signature::Comparison, 2, |args| numbers(args).and_then(|(a, b)| boolean(a <= b))),
    ("$gte", ">=", Signature::Comparison, 2, |args| numbers(args).and_then(|(a, b)| boolean(a >= b))),
    ("$not", "!", Signature::Negation, 1, |args| match args {
        [Value::Lit(Literal::Bool(b))] => boolean(!b),
        _ => None,
    }),
];

const BASE_TYPES: &[&str] = &[atoms::NUM, atoms::BOOL, atoms::STRING, atoms::UNIT, atoms::TYPE, atoms::ROW];

/// `domain -> codomain` over closed base types.
fn arrow(domain: &str, codomain: Term) -> Value {
    Value::pi(
        "x",
        Implicitness::Explicit,
        Multiplicity::Many,
        Value::atom(domain),
        Closure::new(Env::empty(), codomain),
    )
}

impl Signature {
    fn ty(self) -> Value {
        let binary = |operand: &str, result: &str| {
            arrow(
                operand,
                Term::pi(
                    "y",
                    Implicitness::Explicit,
                    Multiplicity::Many,
                    Term::atom(operand),
                    Term::atom(result),
                ),
            )
        };
        match self {
            Signature::Arithmetic => binary(atoms::NUM, atoms::NUM),
            Signature::Logical => binary(atoms::BOOL, atoms::BOOL),
            Signature::Comparison => binary(atoms::NUM, atoms::BOOL),
            Signature::Negation => arrow(atoms::BOOL, Term::atom(atoms::BOOL)),
        }
    }
}

impl Globals {
    /// Base types, primitive operations and their operator names.
    pub fn prelude() -> Self {
        let mut globals = Globals::default();
        for name in BASE_TYPES {
            globals.imports.insert(
                name.to_string(),
                Import {
                    term: Term::atom(name),
                    ty: Value::ty(),
                    usages: Usages::default(),
                },
            );
        }
        for &(name, operator, signature, arity, compute) in OPERATIONS {
            globals.ffi.insert(name.to_string(), Primitive { arity, compute });
            let import = Import {
                term: Term::foreign(name),
                ty: signature.ty(),
                usages: Usages::default(),
            };
            globals.imports.insert(operator.to_string(), import.clone());
            globals.imports.insert(name.to_string(), import);
        }
        globals
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use yap_ast::Implicitness;

    use super::*;
    use crate::eval::{app, evaluate};

    fn call(name: &str, args: &[Value]) -> Value {
        let env = Env::new(Rc::new(Globals::prelude()));
        let mut f = evaluate(&env, &Term::foreign(name)).unwrap();
        for arg in args {
            f = app(f, Implicitness::Explicit, arg.clone()).unwrap();
        }
        f
    }

    #[test]
    fn saturated_primitives_compute() {
        assert!(matches!(call("$add", &[Value::num(1.0), Value::num(2.0)]), Value::Lit(Literal::Num(n)) if n == 3.0));
        assert!(matches!(call("$lt", &[Value::num(1.0), Value::num(2.0)]), Value::Lit(Literal::Bool(true))));
        assert!(matches!(
            call("$eq", &[Value::Lit(Literal::String("a".into())), Value::Lit(Literal::String("a".into()))]),
            Value::Lit(Literal::Bool(true))
        ));
        assert!(matches!(call("$not", &[Value::Lit(Literal::Bool(true))]), Value::Lit(Literal::Bool(false))));
    }

    #[test]
    fn partial_and_stuck_applications() {
        assert!(matches!(call("$add", &[Value::num(1.0)]), Value::External { ref args, .. } if args.len() == 1));
        let stuck = call("$add", &[Value::num(1.0), Value::rigid(crate::syntax::Level(0))]);
        assert!(stuck.is_neutral());
    }

    #[test]
    fn operators_share_their_primitive_type() {
        let globals = Globals::prelude();
        let plus = &globals.imports["+"];
        assert_eq!(plus.term, Term::foreign("$add"));
        assert_eq!(plus.ty.to_string(), "(x: Num) -> (y: Num) -> Num");
        assert!(globals.imports["Row"].ty.is_atom(atoms::TYPE));
    }
}
