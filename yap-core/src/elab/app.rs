#![forbid(unsafe_code)]

use std::rc::Rc;

use yap_ast::{self as src, Implicitness, Multiplicity};

use super::{Ast, Elaborator};
use crate::context::Context;
use crate::error::{ElabError, ElabResult, ErrorKind};
use crate::eval::apply;
use crate::implicits;
use crate::subst::force;
use crate::syntax::Term;
use crate::value::{Binder, Closure, Value};

/// A pi type taken apart.
struct Function {
    icit: Implicitness,
    multiplicity: Multiplicity,
    domain: Value,
    binder: Binder,
    closure: Closure,
}

impl Function {
    fn of(ty: &Value) -> Option<Function> {
        match ty.strip() {
            Value::Abs {
                binder:
                    binder @ Binder::Pi {
                        icit,
                        multiplicity,
                        annotation,
                        ..
                    },
                closure,
            } => Some(Function {
                icit: *icit,
                multiplicity: *multiplicity,
                domain: (**annotation).clone(),
                binder: binder.clone(),
                closure: closure.clone(),
            }),
            _ => None,
        }
    }
}

impl Elaborator {
    pub(super) fn infer_app(
        &mut self,
        ctx: &Context,
        icit: Implicitness,
        func: &src::Term,
        arg: &src::Term,
    ) -> ElabResult<Ast> {
        let mut head = self.infer(ctx, func)?;
        if icit == Implicitness::Explicit {
            head = implicits::instantiate(self, ctx, head)?;
        }

        let forced = force(&head.ty, &self.state.zonker)?;
        let function = match Function::of(&forced) {
            Some(function) => function,
            None => self.expect_function(ctx, icit, &head.ty),
        };
        if function.icit != icit {
            return Err(ElabError::new(ErrorKind::ImplicitnessMismatch {
                expected: function.icit,
                found: icit,
            }));
        }

        let (arg_term, arg_usages) = self.check(ctx, arg, &function.domain)?;
        let arg_value = self.eval(ctx, &arg_term)?;
        Ok(Ast {
            term: Term::App {
                icit,
                func: Box::new(head.term),
                arg: Box::new(arg_term),
            },
            ty: apply(&function.binder, &function.closure, arg_value)?,
            usages: head.usages.add(&arg_usages.scale(function.multiplicity)),
        })
    }

    /// The head's type is not known to be a function yet: constrain it to
    /// `(x: ?a) -> ?b`.
    fn expect_function(&mut self, ctx: &Context, icit: Implicitness, ty: &Value) -> Function {
        let domain = self.fresh(ctx, Value::ty());
        let codomain = self.state.fresh_meta(ctx.level().next(), Value::ty());
        let binder = Binder::Pi {
            variable: "x".to_string(),
            icit,
            multiplicity: Multiplicity::Many,
            annotation: Rc::new(domain.clone()),
        };
        let closure = Closure::new(ctx.env.clone(), Term::meta(codomain));
        let pi = Value::Abs {
            binder: binder.clone(),
            closure: closure.clone(),
        };
        self.assign(ctx, ty.clone(), pi);
        Function {
            icit,
            multiplicity: Multiplicity::Many,
            domain,
            binder,
            closure,
        }
    }
}
