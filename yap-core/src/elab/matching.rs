#![forbid(unsafe_code)]

//! Pattern matching.
//!
//! In checking mode a match over a bound variable refines the expected type
//! per alternative: if the expected type is itself stuck on a match over the
//! same variable, each alternative sees the branch its pattern selects.

use std::rc::Rc;

use yap_ast::{self as src, Literal};

use super::{Ast, Elaborator, PatternAst};
use crate::context::Context;
use crate::error::{ElabError, ElabResult, ErrorKind};
use crate::eval::evaluate;
use crate::provenance::Provenance;
use crate::syntax::{Alternative, Level, Pattern, Term, Variable};
use crate::usage::Usages;
use crate::value::Value;

/// What an alternative knows about the scrutinee: the literal it matched,
/// or the literals earlier alternatives already took.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Refinement {
    pub positive: Option<Literal>,
    pub excluded: Vec<Literal>,
}

/// The context level of a scrutinee that is a plain bound variable.
fn scrutinee_level(ctx: &Context, scrutinee: &Term) -> Option<Level> {
    match scrutinee {
        Term::Var(Variable::Bound(index)) => Some(index.to_level(ctx.level())),
        _ => None,
    }
}

/// Narrows `expected` under `refinement` of the variable at `level`.
pub fn narrow(expected: &Value, level: Level, refinement: &Refinement) -> ElabResult<Value> {
    match expected {
        Value::Modal { value, modalities } => Ok(Value::Modal {
            value: Rc::new(narrow(value, level, refinement)?),
            modalities: modalities.clone(),
        }),
        Value::Neutral(inner) => match inner.as_ref() {
            Value::Match(stuck) if stuck.scrutinee.as_rigid() == Some(level) => {
                for alt in stuck.alternatives.iter() {
                    let env = match (&alt.pattern, &refinement.positive) {
                        (Pattern::Lit(lit), Some(positive)) if lit == positive => stuck.env.clone(),
                        (Pattern::Lit(_), Some(_)) => continue,
                        (Pattern::Lit(lit), None) if refinement.excluded.contains(lit) => continue,
                        (Pattern::Wildcard, _) => stuck.env.clone(),
                        (Pattern::Binder(_), positive) => {
                            let bound = match positive {
                                Some(lit) => Value::Lit(lit.clone()),
                                None => (*stuck.scrutinee).clone(),
                            };
                            stuck.env.push(bound)
                        }
                        _ => return Ok(expected.clone()),
                    };
                    let selected = evaluate(&env, &alt.body)?;
                    return narrow(&selected, level, refinement);
                }
                Err(ElabError::new(ErrorKind::NoMatchingAlternative(expected.to_string())))
            }
            _ => Ok(expected.clone()),
        },
        _ => Ok(expected.clone()),
    }
}

impl Elaborator {
    fn alternative_pattern(&mut self, ctx: &Context, alt: &src::Alternative, scrutinee: &Ast) -> ElabResult<(Context, PatternAst)> {
        let ctx = ctx.track(Provenance::Alternative {
            span: alt.span,
            pattern: alt.pattern.to_string(),
        });
        let pattern = self.infer_pattern(&ctx, &alt.pattern)?;
        self.assign(&ctx, pattern.ty.clone(), scrutinee.ty.clone());
        Ok((ctx, pattern))
    }

    pub(super) fn infer_match(
        &mut self,
        ctx: &Context,
        scrutinee: &src::Term,
        alternatives: &[src::Alternative],
    ) -> ElabResult<Ast> {
        let scrutinee = self.infer(ctx, scrutinee)?;
        let mut core = Vec::with_capacity(alternatives.len());
        let mut result: Option<Value> = None;
        let mut branches: Option<Usages> = None;
        for alt in alternatives {
            let (alt_ctx, pattern) = self.alternative_pattern(ctx, alt, &scrutinee)?;
            let body = self.infer(&pattern.bind(&alt_ctx), &alt.body)?;
            match &result {
                Some(first) => self.assign(&alt_ctx, body.ty.clone(), first.clone()),
                None => result = Some(body.ty.clone()),
            }
            let usages = body.usages.strip(pattern.binders.len());
            branches = Some(match branches {
                Some(acc) => acc.join(&usages),
                None => usages,
            });
            core.push(Alternative {
                binders: pattern.pattern.binders(),
                pattern: pattern.pattern,
                body: body.term,
            });
        }
        let ty = match result {
            Some(ty) => ty,
            None => self.fresh(ctx, Value::ty()),
        };
        Ok(Ast {
            term: Term::Match {
                scrutinee: Box::new(scrutinee.term),
                alternatives: core,
            },
            ty,
            usages: scrutinee.usages.add(&branches.unwrap_or_else(|| ctx.zeros())),
        })
    }

    pub(super) fn check_match(
        &mut self,
        ctx: &Context,
        scrutinee: &src::Term,
        alternatives: &[src::Alternative],
        expected: &Value,
    ) -> ElabResult<(Term, Usages)> {
        let scrutinee = self.infer(ctx, scrutinee)?;
        let level = scrutinee_level(ctx, &scrutinee.term);
        let mut excluded: Vec<Literal> = Vec::new();
        let mut core = Vec::with_capacity(alternatives.len());
        let mut branches: Option<Usages> = None;
        for alt in alternatives {
            let (alt_ctx, pattern) = self.alternative_pattern(ctx, alt, &scrutinee)?;
            let positive = match &pattern.pattern {
                Pattern::Lit(lit) => Some(lit.clone()),
                _ => None,
            };
            let refined = match level {
                Some(level) => {
                    let refinement = Refinement {
                        positive: positive.clone(),
                        excluded: excluded.clone(),
                    };
                    narrow(expected, level, &refinement).map_err(|err| err.within(&alt_ctx.trace))?
                }
                None => expected.clone(),
            };
            log::trace!("alternative `{}` checked against {refined}", alt.pattern);

            let (body, usages) = self.check(&pattern.bind(&alt_ctx), &alt.body, &refined)?;
            let usages = usages.strip(pattern.binders.len());
            branches = Some(match branches {
                Some(acc) => acc.join(&usages),
                None => usages,
            });
            core.push(Alternative {
                binders: pattern.pattern.binders(),
                pattern: pattern.pattern,
                body,
            });
            excluded.extend(positive);
        }
        Ok((
            Term::Match {
                scrutinee: Box::new(scrutinee.term),
                alternatives: core,
            },
            scrutinee.usages.add(&branches.unwrap_or_else(|| ctx.zeros())),
        ))
    }
}
