#![forbid(unsafe_code)]

//! The seam between elaboration and refinement checking.
//!
//! `check` elaborates a term against a modal type and hands back what a
//! refinement verifier needs: the elaborated term, its usages and the
//! predicate instantiated at the term. Discharging the predicate is the
//! prover's job.

use std::fmt;

use yap_ast::{self as src, Implicitness, Literal, Multiplicity};

use crate::config::ElabConfig;
use crate::context::Context;
use crate::elab::Elaborator;
use crate::error::ElabResult;
use crate::eval::{app, evaluate};
use crate::quote::quote;
use crate::syntax::Term;
use crate::usage::Usages;
use crate::value::Value;
use crate::zonk::{zonk_term, zonk_value};

/// What must hold of `subject` for it to inhabit its modal type.
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationCondition {
    pub subject: Term,
    /// The liquid predicate applied to the subject and normalised, if the
    /// type carries one.
    pub predicate: Option<Term>,
    pub quantity: Multiplicity,
}

impl fmt::Display for VerificationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.predicate {
            Some(predicate) => write!(f, "<{}> {predicate}", self.quantity),
            None => write!(f, "<{}> true", self.quantity),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Artefacts {
    pub term: Term,
    pub usages: Usages,
    pub vc: VerificationCondition,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Proved,
    Refuted,
    Unknown,
}

/// Refinement prover interface.
///
/// The default implementation only decides conditions that normalised to a
/// boolean literal.
pub trait Prover {
    fn prove(&self, vc: &VerificationCondition) -> Verdict {
        match &vc.predicate {
            None | Some(Term::Lit(Literal::Bool(true))) => Verdict::Proved,
            Some(Term::Lit(Literal::Bool(false))) => Verdict::Refuted,
            Some(_) => Verdict::Unknown,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoProver;

impl Prover for NoProver {}

/// Elaborates `term` against `modal_ty` and builds its verification
/// condition.
pub fn check(ctx: &Context, term: &src::Term, modal_ty: &src::Term, config: &ElabConfig) -> ElabResult<Artefacts> {
    condition(ctx, term, modal_ty, config).map_err(|err| err.capped(config.provenance_cap))
}

fn condition(ctx: &Context, term: &src::Term, modal_ty: &src::Term, config: &ElabConfig) -> ElabResult<Artefacts> {
    let mut elab = Elaborator::within(ctx, config.clone());
    let (_, ty, _) = elab.check_type(ctx, modal_ty)?;
    let (core, usages) = elab.check(ctx, term, &ty)?;
    let subst = elab.solve()?;

    let level = ctx.level();
    let globals = ctx.globals().clone();
    let subject = zonk_term(&core, &subst, level)?;
    let ty = zonk_value(&ty, &subst, level, globals)?;

    let (quantity, predicate) = match &ty {
        Value::Modal { modalities, .. } => {
            let predicate = match &modalities.liquid {
                Some(liquid) => {
                    let value = evaluate(&ctx.env, &subject)?;
                    let applied = app((**liquid).clone(), Implicitness::Explicit, value)?;
                    Some(quote(level, &applied)?)
                }
                None => None,
            };
            (modalities.quantity, predicate)
        }
        _ => (Multiplicity::Many, None),
    };
    log::debug!("verification condition for `{term}`: {predicate:?}");

    Ok(Artefacts {
        term: subject.clone(),
        usages,
        vc: VerificationCondition {
            subject,
            predicate,
            quantity,
        },
    })
}
