#![forbid(unsafe_code)]

//! Bidirectional elaboration of surface terms into core terms.
//!
//! `infer` synthesises a type; `check` pushes an expected type inward. Both
//! produce a core term and a usage vector aligned with the context. Type
//! equalities are not decided on the spot: they are emitted as constraints
//! and discharged in order by the solver once the whole unit has been
//! elaborated.

mod app;
mod block;
mod control;
mod lambda;
mod matching;
mod modal;
mod patterns;
mod rows;

use yap_ast::{self as src, Implicitness, Literal, Multiplicity, TermKind};

use crate::config::ElabConfig;
use crate::context::{Context, EntryKind};
use crate::error::{ElabError, ElabResult};
use crate::eval::{apply, evaluate};
use crate::implicits;
use crate::provenance::{Action, Provenance};
use crate::solver;
use crate::state::{Constraint, State};
use crate::subst::{Subst, force};
use crate::syntax::{Meta, Term, atoms};
use crate::usage::Usages;
use crate::value::{Binder, Value};
use crate::zonk::{zonk_term, zonk_value};

pub use matching::Refinement;
pub use patterns::PatternAst;

/// A core term with its type and the usage of every variable in scope.
#[derive(Clone, Debug)]
pub struct Ast {
    pub term: Term,
    pub ty: Value,
    pub usages: Usages,
}

/// Elaboration state for one unit: the meta supply, pending constraints and
/// committed solutions, plus the switches it runs under.
#[derive(Debug, Default)]
pub struct Elaborator {
    pub state: State,
    pub config: ElabConfig,
}

fn describe(term: &src::Term) -> &'static str {
    match &term.kind {
        TermKind::Var(_) => "variable",
        TermKind::Lit(_) => "literal",
        TermKind::Hole => "hole",
        TermKind::Lambda { .. } => "lambda",
        TermKind::App { .. } => "application",
        TermKind::Pi { .. } => "pi type",
        TermKind::Arrow { .. } => "arrow",
        TermKind::Mu { .. } => "recursive type",
        TermKind::Annotation { .. } => "annotation",
        TermKind::Row(_) => "row",
        TermKind::Struct(_) => "struct",
        TermKind::Tuple(_) => "tuple",
        TermKind::Variant(_) => "variant",
        TermKind::Tagged { .. } => "tagged value",
        TermKind::List(_) => "list",
        TermKind::Projection { .. } => "projection",
        TermKind::Injection { .. } => "injection",
        TermKind::Match { .. } => "match",
        TermKind::Block { .. } => "block",
        TermKind::Modal { .. } => "modal type",
        TermKind::Reset { .. } => "reset",
        TermKind::Shift { .. } => "shift",
        TermKind::Resume { .. } => "resume",
    }
}

/// Errors raised directly by a step get that step's provenance; errors that
/// already carry frames came from deeper steps and are left alone.
fn located(err: ElabError, ctx: &Context) -> ElabError {
    if err.provenance.is_empty() { err.within(&ctx.trace) } else { err }
}

pub fn literal_type(lit: &Literal) -> Value {
    Value::atom(match lit {
        Literal::Num(_) => atoms::NUM,
        Literal::Bool(_) => atoms::BOOL,
        Literal::String(_) => atoms::STRING,
        Literal::Unit => atoms::UNIT,
        Literal::Atom(_) => atoms::TYPE,
    })
}

impl Elaborator {
    pub fn new(config: ElabConfig) -> Self {
        Self {
            state: State::default(),
            config,
        }
    }

    /// An elaborator for a unit run against `ctx`. Its fresh metas never
    /// collide with metas left unsolved in `ctx`'s globals.
    pub fn within(ctx: &Context, config: ElabConfig) -> Self {
        Self {
            state: State::starting_at(ctx.globals().metas_issued),
            config,
        }
    }

    pub fn infer(&mut self, ctx: &Context, term: &src::Term) -> ElabResult<Ast> {
        let ctx = ctx.track(Provenance::Term {
            span: term.span,
            term: term.to_string(),
            description: describe(term),
            action: Action::Infer,
        });
        log::trace!("infer {} `{term}`", describe(term));
        self.infer_term(&ctx, term).map_err(|err| located(err, &ctx))
    }

    pub fn check(&mut self, ctx: &Context, term: &src::Term, expected: &Value) -> ElabResult<(Term, Usages)> {
        let ctx = ctx.track(Provenance::Term {
            span: term.span,
            term: term.to_string(),
            description: describe(term),
            action: Action::Check(expected.clone()),
        });
        log::trace!("check {} `{term}` against {expected}", describe(term));
        self.check_term(&ctx, term, expected).map_err(|err| located(err, &ctx))
    }

    /// Infers, solves every constraint and returns the zonked result.
    pub fn elaborate(&mut self, ctx: &Context, term: &src::Term) -> ElabResult<Ast> {
        let ast = self.infer(ctx, term)?;
        let subst = self.solve()?;
        self.zonk(ctx, ast, &subst)
    }

    pub fn solve(&mut self) -> ElabResult<Subst> {
        solver::solve(&mut self.state)
    }

    pub fn zonk(&self, ctx: &Context, ast: Ast, subst: &Subst) -> ElabResult<Ast> {
        Ok(Ast {
            term: zonk_term(&ast.term, subst, ctx.level())?,
            ty: zonk_value(&ast.ty, subst, ctx.level(), ctx.globals().clone())?,
            usages: ast.usages,
        })
    }

    fn infer_term(&mut self, ctx: &Context, term: &src::Term) -> ElabResult<Ast> {
        match &term.kind {
            TermKind::Var(name) => {
                let found = ctx.lookup(name)?;
                Ok(Ast {
                    term: found.term,
                    ty: found.ty,
                    usages: found.usages,
                })
            }
            TermKind::Lit(lit) => Ok(Ast {
                term: Term::Lit(lit.clone()),
                ty: literal_type(lit),
                usages: ctx.zeros(),
            }),
            TermKind::Hole => {
                let ty = self.fresh(ctx, Value::ty());
                let meta = self.fresh_meta(ctx, ty.clone());
                Ok(Ast {
                    term: Term::meta(meta),
                    ty,
                    usages: ctx.zeros(),
                })
            }
            TermKind::Lambda {
                icit,
                param,
                annotation,
                multiplicity,
                body,
            } => self.infer_lambda(ctx, *icit, &param.node, annotation.as_deref(), *multiplicity, body),
            TermKind::App { icit, func, arg } => self.infer_app(ctx, *icit, func, arg),
            TermKind::Pi {
                icit,
                param,
                multiplicity,
                domain,
                codomain,
            } => self.infer_pi(ctx, *icit, &param.node, *multiplicity, domain, codomain),
            TermKind::Arrow {
                icit,
                domain,
                codomain,
            } => self.infer_pi(ctx, *icit, "_", None, domain, codomain),
            TermKind::Mu {
                param,
                annotation,
                body,
            } => self.infer_mu(ctx, &param.node, annotation, body),
            TermKind::Annotation { term, ty } => {
                let (ty, _) = self.check(ctx, ty, &Value::ty())?;
                let ty = self.eval(ctx, &ty)?;
                let (term, usages) = self.check(ctx, term, &ty)?;
                Ok(Ast { term, ty, usages })
            }
            TermKind::Row(row) => self.infer_row(ctx, row),
            TermKind::Struct(row) => self.infer_struct(ctx, row),
            TermKind::Tuple(items) => self.infer_struct(ctx, &rows::tuple_row(items)),
            TermKind::Variant(row) => self.infer_variant(ctx, row),
            TermKind::Tagged { tag, value } => self.infer_tagged(ctx, &tag.node, value),
            TermKind::List(items) => self.infer_list(ctx, items),
            TermKind::Projection { term, label } => self.infer_projection(ctx, term, &label.node),
            TermKind::Injection { term, label, value } => self.infer_injection(ctx, term, &label.node, value),
            TermKind::Match {
                scrutinee,
                alternatives,
            } => self.infer_match(ctx, scrutinee, alternatives),
            TermKind::Block { statements, ret } => self.infer_block(ctx, statements, ret.as_deref()),
            TermKind::Modal {
                term,
                quantity,
                liquid,
            } => self.infer_modal(ctx, term, *quantity, liquid.as_deref()),
            TermKind::Reset { handler, body } => self.infer_reset(ctx, handler.as_deref(), body),
            TermKind::Shift { body } => self.infer_shift(ctx, body),
            TermKind::Resume { value } => self.infer_resume(ctx, value),
        }
    }

    fn check_term(&mut self, ctx: &Context, term: &src::Term, expected: &Value) -> ElabResult<(Term, Usages)> {
        let forced = force(expected, &self.state.zonker)?;
        match (&term.kind, forced.strip()) {
            (TermKind::Hole, _) => {
                let meta = self.fresh_meta(ctx, expected.clone());
                Ok((Term::meta(meta), ctx.zeros()))
            }
            (
                TermKind::Lambda {
                    icit,
                    param,
                    annotation,
                    multiplicity,
                    body,
                },
                Value::Abs {
                    binder: binder @ Binder::Pi { icit: expected_icit, .. },
                    closure,
                },
            ) if icit == expected_icit => self.check_lambda(
                ctx,
                (&param.node, annotation.as_deref(), *multiplicity, body),
                binder,
                closure,
            ),
            (
                _,
                Value::Abs {
                    binder:
                        binder @ Binder::Pi {
                            icit: Implicitness::Implicit,
                            variable,
                            multiplicity,
                            annotation,
                        },
                    closure,
                },
            ) => {
                // Checking against `{a: A} => B`: abstract over the implicit.
                let name = format!("implicit {variable}");
                let inner = ctx.bind(&name, (**annotation).clone(), *multiplicity, EntryKind::Lambda);
                let codomain = apply(binder, closure, Value::rigid(ctx.level()))?;
                let (body, usages) = self.check(&inner, term, &codomain)?;
                self.usage(ctx, *multiplicity, usages.head());
                Ok((Term::lambda(&name, Implicitness::Implicit, body), usages.tail()))
            }
            (TermKind::Struct(row), _) if forced.is_atom(atoms::TYPE) => self.check_schema(ctx, row),
            (TermKind::Tuple(items), _) if forced.is_atom(atoms::TYPE) => {
                self.check_schema(ctx, &rows::tuple_row(items))
            }
            (
                TermKind::Match {
                    scrutinee,
                    alternatives,
                },
                _,
            ) => self.check_match(ctx, scrutinee, alternatives, &forced),
            _ => {
                let ast = self.infer(ctx, term)?;
                let ast = implicits::instantiate(self, ctx, ast)?;
                self.assign(ctx, ast.ty, expected.clone());
                Ok((ast.term, ast.usages))
            }
        }
    }

    pub fn fresh_meta(&mut self, ctx: &Context, ann: Value) -> Meta {
        self.state.fresh_meta(ctx.level(), ann)
    }

    /// A fresh meta of type `ann`, as a value.
    pub fn fresh(&mut self, ctx: &Context, ann: Value) -> Value {
        Value::flex(self.fresh_meta(ctx, ann))
    }

    pub fn assign(&mut self, ctx: &Context, left: Value, right: Value) {
        self.state.emit(
            Constraint::Assign {
                left,
                right,
                level: ctx.level(),
            },
            &ctx.trace,
        );
    }

    pub fn usage(&mut self, ctx: &Context, expected: Multiplicity, computed: Multiplicity) {
        self.state.emit(Constraint::Usage { expected, computed }, &ctx.trace);
    }

    pub fn eval(&self, ctx: &Context, term: &Term) -> ElabResult<Value> {
        Ok(evaluate(&ctx.env, term)?)
    }

    /// Checks `term` against `Type` and evaluates it.
    pub fn check_type(&mut self, ctx: &Context, term: &src::Term) -> ElabResult<(Term, Value, Usages)> {
        let (core, usages) = self.check(ctx, term, &Value::ty())?;
        let value = self.eval(ctx, &core)?;
        Ok((core, value, usages))
    }
}
