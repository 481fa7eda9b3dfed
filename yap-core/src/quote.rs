#![forbid(unsafe_code)]

//! Reading values back into core terms.

use yap_ast::{Implicitness, Row};

use crate::error::Fault;
use crate::eval::{apply, evaluate};
use crate::syntax::{Alternative, Binding, Index, Level, Modalities, Term, TermRow, Variable};
use crate::value::{Binder, Closure, Env, Value, ValueRow};

/// Quotes `value` as seen from under `level` binders.
pub fn quote(level: Level, value: &Value) -> Result<Term, Fault> {
    match value {
        Value::Lit(lit) => Ok(Term::Lit(lit.clone())),
        Value::Var(var) => Ok(Term::Var(quote_var(level, var))),
        Value::App { icit, func, arg } => Ok(Term::App {
            icit: *icit,
            func: Box::new(quote(level, func)?),
            arg: Box::new(quote(level, arg)?),
        }),
        Value::Row(row) => Ok(Term::Row(quote_row(level, row)?)),
        Value::Abs { binder, closure } => {
            let body = apply(binder, closure, Value::rigid(level))?;
            let body = Box::new(quote(level.next(), &body)?);
            let binding = match binder {
                Binder::Lambda { variable, icit } => Binding::Lambda {
                    variable: variable.clone(),
                    icit: *icit,
                },
                Binder::Pi {
                    variable,
                    icit,
                    multiplicity,
                    annotation,
                } => Binding::Pi {
                    variable: variable.clone(),
                    icit: *icit,
                    multiplicity: *multiplicity,
                    annotation: Box::new(quote(level, annotation)?),
                },
                Binder::Mu {
                    variable,
                    annotation,
                } => Binding::Mu {
                    variable: variable.clone(),
                    annotation: Box::new(quote(level, annotation)?),
                },
            };
            Ok(Term::Abs { binding, body })
        }
        Value::Neutral(inner) => quote(level, inner),
        Value::Modal { value, modalities } => Ok(Term::Modal {
            term: Box::new(quote(level, value)?),
            modalities: Modalities {
                quantity: modalities.quantity,
                liquid: match &modalities.liquid {
                    Some(p) => Some(Box::new(quote(level, p)?)),
                    None => None,
                },
            },
        }),
        Value::External { name, args, .. } => args.iter().try_fold(Term::foreign(name), |func, arg| {
            Ok(Term::App {
                icit: Implicitness::Explicit,
                func: Box::new(func),
                arg: Box::new(quote(level, arg)?),
            })
        }),
        Value::Match(stuck) => {
            let alternatives = stuck
                .alternatives
                .iter()
                .map(|alt| {
                    let n = alt.binders.len();
                    let rigids = (0..n).map(|i| Value::rigid(level.plus(i)));
                    let body = evaluate(&stuck.env.extend(rigids), &alt.body)?;
                    Ok(Alternative {
                        pattern: alt.pattern.clone(),
                        binders: alt.binders.clone(),
                        body: quote(level.plus(n), &body)?,
                    })
                })
                .collect::<Result<Vec<_>, Fault>>()?;
            Ok(Term::Match {
                scrutinee: Box::new(quote(level, &stuck.scrutinee)?),
                alternatives,
            })
        }
        Value::Project { value, label } => Ok(Term::Proj {
            term: Box::new(quote(level, value)?),
            label: label.clone(),
        }),
        Value::Inject { value, label, field } => Ok(Term::Inj {
            term: Box::new(quote(level, value)?),
            label: label.clone(),
            value: Box::new(quote(level, field)?),
        }),
    }
}

fn quote_var(level: Level, var: &Variable<Level>) -> Variable<Index> {
    match var {
        Variable::Bound(l) => Variable::Bound(l.to_index(level)),
        Variable::Free(name) => Variable::Free(name.clone()),
        Variable::Label(name) => Variable::Label(name.clone()),
        Variable::Foreign(name) => Variable::Foreign(name.clone()),
        Variable::Meta(meta) => Variable::Meta(*meta),
    }
}

pub fn quote_row(level: Level, row: &ValueRow) -> Result<TermRow, Fault> {
    row.traverse(&mut |v: &Value| quote(level, v), &mut |var: &Variable<Level>| {
        Ok(Row::Variable(quote_var(level, var)))
    })
}

/// Packages `value`, which lives one binder below `env`, as a closure over
/// `env`.
pub fn close_val(env: &Env, value: &Value) -> Result<Closure, Fault> {
    let term = quote(env.level().next(), value)?;
    Ok(Closure::new(env.clone(), term))
}

/// Evaluates and reads back: the normal form of `term` under `env`.
pub fn normalize(env: &Env, term: &Term) -> Result<Term, Fault> {
    quote(env.level(), &evaluate(env, term)?)
}
