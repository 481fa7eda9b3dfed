#![forbid(unsafe_code)]

use yap_ast::{self as src, Implicitness, Multiplicity};

use super::{Ast, Elaborator};
use crate::context::{Context, EntryKind};
use crate::error::{ElabError, ElabResult, ErrorKind};
use crate::eval::apply;
use crate::quote::close_val;
use crate::syntax::{Binding, Term};
use crate::usage::Usages;
use crate::value::{Binder, Closure, Value};

/// Surface lambda pieces: parameter, optional annotation and quantity, body.
pub(super) type LambdaParts<'a> = (&'a str, Option<&'a src::Term>, Option<Multiplicity>, &'a src::Term);

/// Quantity declared by a modal annotation such as `Num<1>`.
fn modal_quantity(ty: &Value) -> Option<Multiplicity> {
    match ty {
        Value::Modal { modalities, .. } => Some(modalities.quantity),
        _ => None,
    }
}

impl Elaborator {
    pub(super) fn infer_lambda(
        &mut self,
        ctx: &Context,
        icit: Implicitness,
        param: &str,
        annotation: Option<&src::Term>,
        multiplicity: Option<Multiplicity>,
        body: &src::Term,
    ) -> ElabResult<Ast> {
        // Annotations are erased, so their usages do not count.
        let domain = match annotation {
            Some(ann) => self.check_type(ctx, ann)?.1,
            None => self.fresh(ctx, Value::ty()),
        };
        let q = multiplicity.or_else(|| modal_quantity(&domain)).unwrap_or(Multiplicity::Many);

        let inner = ctx.bind(param, domain.clone(), q, EntryKind::Lambda);
        let body = self.infer(&inner, body)?;
        self.usage(ctx, q, body.usages.head());

        let codomain = close_val(&ctx.env, &body.ty)?;
        Ok(Ast {
            term: Term::lambda(param, icit, body.term),
            ty: Value::pi(param, icit, q, domain, codomain),
            usages: body.usages.tail(),
        })
    }

    pub(super) fn check_lambda(
        &mut self,
        ctx: &Context,
        (param, annotation, multiplicity, body): LambdaParts<'_>,
        binder: &Binder,
        closure: &Closure,
    ) -> ElabResult<(Term, Usages)> {
        let Binder::Pi {
            icit,
            multiplicity: expected_q,
            annotation: domain,
            ..
        } = binder
        else {
            return Err(ElabError::new(ErrorKind::Unsupported(format!(
                "checking a lambda against a {} binder",
                binder.variable()
            ))));
        };
        if let Some(ann) = annotation {
            let (_, value, _) = self.check_type(ctx, ann)?;
            self.assign(ctx, value, (**domain).clone());
        }
        if let Some(q) = multiplicity {
            self.usage(ctx, *expected_q, q);
        }

        let inner = ctx.bind(param, (**domain).clone(), *expected_q, EntryKind::Lambda);
        let codomain = apply(binder, closure, Value::rigid(ctx.level()))?;
        let (body, usages) = self.check(&inner, body, &codomain)?;
        self.usage(ctx, *expected_q, usages.head());
        Ok((Term::lambda(param, *icit, body), usages.tail()))
    }

    /// Pi types and arrows. The codomain is a type family over the domain.
    pub(super) fn infer_pi(
        &mut self,
        ctx: &Context,
        icit: Implicitness,
        param: &str,
        multiplicity: Option<Multiplicity>,
        domain: &src::Term,
        codomain: &src::Term,
    ) -> ElabResult<Ast> {
        let q = multiplicity.unwrap_or(Multiplicity::Many);
        let (domain_term, domain_value, domain_usages) = self.check_type(ctx, domain)?;
        let inner = ctx.bind(param, domain_value, q, EntryKind::Pi);
        let (codomain_term, codomain_usages) = self.check(&inner, codomain, &Value::ty())?;
        Ok(Ast {
            term: Term::pi(param, icit, q, domain_term, codomain_term),
            ty: Value::ty(),
            usages: domain_usages.add(&codomain_usages.tail()),
        })
    }

    /// `mu x: T. body`: the body may refer to itself through `x`.
    pub(super) fn infer_mu(
        &mut self,
        ctx: &Context,
        param: &str,
        annotation: &src::Term,
        body: &src::Term,
    ) -> ElabResult<Ast> {
        let (ann_term, ann_value, ann_usages) = self.check_type(ctx, annotation)?;
        let inner = ctx.bind(param, ann_value.clone(), Multiplicity::Many, EntryKind::Mu);
        let (body, usages) = self.check(&inner, body, &ann_value)?;
        Ok(Ast {
            term: Term::Abs {
                binding: Binding::Mu {
                    variable: param.to_string(),
                    annotation: Box::new(ann_term),
                },
                body: Box::new(body),
            },
            ty: ann_value,
            usages: ann_usages.add(&usages.tail()),
        })
    }
}
