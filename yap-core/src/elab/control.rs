#![forbid(unsafe_code)]

//! Delimited control: `reset`, `shift` and `resume`.
//!
//! A `reset` delimits a computation and fixes its answer types. A `shift`
//! inside it captures the rest of the computation up to the `reset` as a
//! continuation named `resume`. The value a `shift` returns is a skolem: an
//! opaque meta standing for whatever `resume` is later called with. Every
//! such call is recorded so the unit can be replayed once per value.

use yap_ast::{self as src, Implicitness, Multiplicity};

use super::{Ast, Elaborator};
use crate::context::{Context, Delimitation, EntryKind};
use crate::error::{ElabError, ElabResult, ErrorKind};
use crate::eval::apply;
use crate::quote::close_val;
use crate::subst::force;
use crate::syntax::Term;
use crate::usage::Usages;
use crate::value::{Binder, Value};

const CONTINUATION: &str = "resume";

impl Elaborator {
    pub(super) fn infer_reset(&mut self, ctx: &Context, handler: Option<&src::Term>, body: &src::Term) -> ElabResult<Ast> {
        let [param, initial, value, result] = [(); 4].map(|_| self.fresh_meta(ctx, Value::ty()));

        let (handler, handler_usages) = match handler {
            Some(handler) => {
                // (k: (p: P) -> A) -> (v: V) -> R
                let explicit = Implicitness::Explicit;
                let many = Multiplicity::Many;
                let ty = Term::pi(
                    "k",
                    explicit,
                    many,
                    Term::pi("p", explicit, many, Term::meta(param), Term::meta(initial)),
                    Term::pi("v", explicit, many, Term::meta(value), Term::meta(result)),
                );
                let ty = self.eval(ctx, &ty)?;
                let (term, usages) = self.check(ctx, handler, &ty)?;
                (Some(Box::new(term)), usages)
            }
            None => (None, ctx.zeros()),
        };

        let inner = ctx.delimit(Delimitation {
            initial: Value::flex(initial),
            result: Value::flex(result),
        });
        let body = self.infer(&inner, body)?;
        if self.config.strict_reset_answer {
            self.assign(ctx, body.ty.clone(), Value::flex(initial));
        }
        Ok(Ast {
            term: Term::Reset {
                handler,
                body: Box::new(body.term),
            },
            ty: body.ty,
            usages: body.usages.add(&handler_usages),
        })
    }

    pub(super) fn infer_shift(&mut self, ctx: &Context, body: &src::Term) -> ElabResult<Ast> {
        let Some(frame) = ctx.delimitation().cloned() else {
            return Err(ElabError::new(ErrorKind::ShiftWithoutReset));
        };
        let domain = self.fresh(ctx, Value::ty());
        let skolem = self.fresh_meta(ctx, domain.clone());
        self.state.record_skolem(skolem);

        let continuation = Value::pi(
            "x",
            Implicitness::Explicit,
            Multiplicity::Many,
            domain.clone(),
            close_val(&ctx.env, &frame.initial)?,
        );
        let shifted = ctx.shifted().unwrap_or_else(|| ctx.clone());
        let inner = shifted.bind(CONTINUATION, continuation, Multiplicity::Many, EntryKind::Continuation { skolem });
        let (body, usages) = self.check(&inner, body, &frame.result)?;
        log::debug!("shift captured continuation {skolem}");
        Ok(Ast {
            term: Term::Shift {
                skolem,
                body: Box::new(body),
            },
            ty: domain,
            usages: usages.tail(),
        })
    }

    pub(super) fn infer_resume(&mut self, ctx: &Context, value: &src::Term) -> ElabResult<Ast> {
        let Some((index, entry)) = ctx.continuation() else {
            return Err(ElabError::new(ErrorKind::ResumeWithoutShift));
        };
        let EntryKind::Continuation { skolem } = &entry.kind else {
            return Err(ElabError::new(ErrorKind::ResumeWithoutShift));
        };
        let continuation = force(&entry.ty, &self.state.zonker)?;
        let Value::Abs {
            binder: binder @ Binder::Pi { annotation, .. },
            closure,
        } = continuation.strip()
        else {
            return Err(ElabError::new(ErrorKind::Unsupported(format!(
                "continuation of type {continuation}"
            ))));
        };

        let (term, usages) = self.check(ctx, value, annotation)?;
        let resumed = self.eval(ctx, &term)?;
        self.state.record_resumption(*skolem, resumed.clone());
        Ok(Ast {
            ty: apply(binder, closure, resumed)?,
            term: Term::App {
                icit: Implicitness::Explicit,
                func: Box::new(Term::bound(index.0)),
                arg: Box::new(term),
            },
            usages: Usages::one_hot(ctx.len(), index).add(&usages),
        })
    }
}
