#![forbid(unsafe_code)]

//! Top-level statements: elaborate, solve, zonk, then normalise once per
//! recorded resumption.

use std::rc::Rc;

use yap_ast as src;

use crate::config::ElabConfig;
use crate::context::{Context, Implicit};
use crate::elab::{Ast, Elaborator};
use crate::error::ElabResult;
use crate::eval::evaluate;
use crate::generalize::generalize;
use crate::pretty::display_value;
use crate::provenance::Provenance;
use crate::quote::quote;
use crate::solver::replay;
use crate::syntax::Term;
use crate::usage::Usages;
use crate::value::{Import, Value};
use crate::zonk::{zonk_term, zonk_value};

/// Everything a top-level statement produced.
#[derive(Clone, Debug)]
pub struct Interpreted {
    pub term: Term,
    pub ty: Value,
    pub usages: Usages,
    /// The type, rendered with the context's binder names.
    pub pretty: String,
    /// One normal form per combination of resumption values.
    pub normal_forms: Vec<Value>,
}

/// Runs one statement against `ctx`, returning the context for the next
/// statement alongside the results. A `let` becomes a global; a `using`
/// registers an instance for implicit resolution.
pub fn interpret(statement: &src::Statement, ctx: &Context, config: &ElabConfig) -> ElabResult<(Context, Interpreted)> {
    interpret_statement(statement, ctx, config).map_err(|err| err.capped(config.provenance_cap))
}

fn interpret_statement(
    statement: &src::Statement,
    ctx: &Context,
    config: &ElabConfig,
) -> ElabResult<(Context, Interpreted)> {
    let mut elab = Elaborator::within(ctx, config.clone());
    let here = ctx.track(Provenance::Statement {
        span: statement.span(),
        statement: statement.to_string(),
    });
    let ast = match statement {
        src::Statement::Let { annotation, value, .. } => elab.let_value(&here, annotation.as_ref(), value)?,
        src::Statement::Expression(term) | src::Statement::Using { term, .. } => elab.infer(&here, term)?,
    };
    let subst = elab.solve()?;
    let mut ast = elab.zonk(ctx, ast, &subst)?;

    let unannotated = matches!(statement, src::Statement::Let { annotation: None, .. });
    if unannotated && config.generalize && ctx.is_empty() {
        let ty = quote(ctx.level(), &ast.ty)?;
        let (term, ty) = generalize(&elab.state, &ast.term, &ty)?;
        ast = Ast {
            term,
            ty: evaluate(&ctx.env, &ty)?,
            usages: ast.usages,
        };
    }

    let next = match statement {
        src::Statement::Let { name, .. } => {
            let mut globals = (**ctx.globals()).clone();
            globals.metas_issued = globals.metas_issued.max(elab.state.supply.issued());
            globals.imports.insert(
                name.node.clone(),
                Import {
                    term: ast.term.clone(),
                    ty: ast.ty.clone(),
                    usages: ast.usages.clone(),
                },
            );
            log::info!("defined {} : {}", name.node, ast.ty);
            ctx.with_globals(Rc::new(globals))
        }
        src::Statement::Using { .. } => ctx
            .using(Implicit {
                value: evaluate(&ctx.env, &ast.term)?,
                ty: ast.ty.clone(),
            })
            .issued_metas(elab.state.supply.issued()),
        src::Statement::Expression(_) => ctx.clone(),
    };

    let level = ctx.level();
    let globals = ctx.globals().clone();
    let normal_forms = replay(&elab.state, |subst| {
        let term = zonk_term(&ast.term, subst, level)?;
        let value = evaluate(&ctx.env, &term)?;
        Ok(zonk_value(&value, subst, level, globals.clone())?)
    })?;

    Ok((
        next,
        Interpreted {
            pretty: display_value(&ast.ty, &ctx.names()),
            term: ast.term,
            ty: ast.ty,
            usages: ast.usages,
            normal_forms,
        },
    ))
}

/// Interprets statements in order, threading the context through.
pub fn interpret_all(
    statements: &[src::Statement],
    ctx: &Context,
    config: &ElabConfig,
) -> ElabResult<(Context, Vec<Interpreted>)> {
    let mut ctx = ctx.clone();
    let mut results = Vec::with_capacity(statements.len());
    for statement in statements {
        let (next, result) = interpret(statement, &ctx, config)?;
        ctx = next;
        results.push(result);
    }
    Ok((ctx, results))
}
