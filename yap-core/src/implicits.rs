#![forbid(unsafe_code)]

//! Implicit arguments.
//!
//! A term whose type starts with implicit binders `{a: A} => ...` is applied
//! to an argument for each of them. The argument comes from a `using`
//! instance whose type matches `A` exactly; failing that it is a fresh meta
//! left for unification to solve.

use yap_ast::Implicitness;

use crate::context::Context;
use crate::elab::{Ast, Elaborator};
use crate::error::ElabResult;
use crate::eval::apply;
use crate::quote::quote;
use crate::state::Constraint;
use crate::subst::force;
use crate::syntax::Term;
use crate::unify::unify;
use crate::value::{Binder, Value};

/// What the instances in scope say about an implicit of some type.
enum Resolution {
    Instance(Term),
    /// An instance fits only once metas are solved.
    Ambiguous,
    Unknown,
}

fn resolve(elab: &Elaborator, ctx: &Context, ty: &Value) -> ElabResult<Resolution> {
    for instance in ctx.implicits() {
        // Trial unification on a scratch copy: nothing leaks into the unit.
        let mut scratch = elab.state.clone();
        let Ok(subst) = unify(&mut scratch, &instance.ty, ty, ctx.level(), elab.state.zonker.clone()) else {
            continue;
        };
        if subst.since(&elab.state.zonker).is_empty() {
            log::debug!("implicit {ty} resolved by instance of {}", instance.ty);
            return Ok(Resolution::Instance(quote(ctx.level(), &instance.value)?));
        }
        return Ok(Resolution::Ambiguous);
    }
    Ok(Resolution::Unknown)
}

/// Applies `ast` to arguments for its leading implicit binders.
pub fn instantiate(elab: &mut Elaborator, ctx: &Context, mut ast: Ast) -> ElabResult<Ast> {
    loop {
        let ty = force(&ast.ty, &elab.state.zonker)?;
        let Value::Abs {
            binder:
                binder @ Binder::Pi {
                    icit: Implicitness::Implicit,
                    annotation,
                    ..
                },
            closure,
        } = ty.strip()
        else {
            return Ok(ast);
        };

        let arg = match resolve(elab, ctx, annotation)? {
            Resolution::Instance(term) => term,
            Resolution::Ambiguous => {
                let meta = elab.fresh_meta(ctx, (**annotation).clone());
                elab.state.emit(
                    Constraint::Resolve {
                        meta,
                        annotation: (**annotation).clone(),
                    },
                    &ctx.trace,
                );
                Term::meta(meta)
            }
            Resolution::Unknown => Term::meta(elab.fresh_meta(ctx, (**annotation).clone())),
        };
        let value = elab.eval(ctx, &arg)?;
        ast = Ast {
            term: Term::App {
                icit: Implicitness::Implicit,
                func: Box::new(ast.term),
                arg: Box::new(arg),
            },
            ty: apply(binder, closure, value)?,
            usages: ast.usages,
        };
    }
}
