#![forbid(unsafe_code)]

//! Normalisation by evaluation: core terms to semantic values.

use std::rc::Rc;

use yap_ast::{Implicitness, Literal, Row};

use crate::error::Fault;
use crate::syntax::{Alternative, Binding, Index, Modalities, Pattern, Statement, Term, TermRow, Variable, atoms};
use crate::value::{Binder, Closure, Env, StuckMatch, Value, ValueRow};

pub fn evaluate(env: &Env, term: &Term) -> Result<Value, Fault> {
    match term {
        Term::Lit(lit) => Ok(Value::Lit(lit.clone())),
        Term::Var(var) => variable(env, var),
        Term::App { icit, func, arg } => {
            let func = evaluate(env, func)?;
            let arg = evaluate(env, arg)?;
            app(func, *icit, arg)
        }
        Term::Abs { binding, body } => {
            let binder = match binding {
                Binding::Lambda { variable, icit } => Binder::Lambda {
                    variable: variable.clone(),
                    icit: *icit,
                },
                Binding::Pi {
                    variable,
                    icit,
                    multiplicity,
                    annotation,
                } => Binder::Pi {
                    variable: variable.clone(),
                    icit: *icit,
                    multiplicity: *multiplicity,
                    annotation: Rc::new(evaluate(env, annotation)?),
                },
                Binding::Mu {
                    variable,
                    annotation,
                } => Binder::Mu {
                    variable: variable.clone(),
                    annotation: Rc::new(evaluate(env, annotation)?),
                },
            };
            Ok(Value::Abs {
                binder,
                closure: Closure {
                    env: env.clone(),
                    term: Rc::new((**body).clone()),
                },
            })
        }
        Term::Row(row) => Ok(Value::Row(evaluate_row(env, row)?)),
        Term::Proj { term, label } => project(evaluate(env, term)?, label),
        Term::Inj { term, label, value } => {
            let target = evaluate(env, term)?;
            let value = evaluate(env, value)?;
            inject(target, label, value)
        }
        Term::Match {
            scrutinee,
            alternatives,
        } => {
            let scrutinee = evaluate(env, scrutinee)?;
            select(env, scrutinee, alternatives.clone().into())
        }
        Term::Block { statements, ret } => {
            let mut env = env.clone();
            for stmt in statements {
                if let Statement::Let { value, .. } = stmt {
                    let value = evaluate(&env, value)?;
                    env = env.push(value);
                }
            }
            evaluate(&env, ret)
        }
        Term::Modal { term, modalities } => Ok(Value::Modal {
            value: Rc::new(evaluate(env, term)?),
            modalities: Modalities {
                quantity: modalities.quantity,
                liquid: match &modalities.liquid {
                    Some(p) => Some(Rc::new(evaluate(env, p)?)),
                    None => None,
                },
            },
        }),
        Term::Reset { body, .. } => evaluate(env, body),
        // The value at the hole is whatever a resumption supplies; until replay
        // picks one it stays the skolem.
        Term::Shift { skolem, .. } => Ok(Value::flex(*skolem)),
    }
}

fn variable(env: &Env, var: &Variable<Index>) -> Result<Value, Fault> {
    match var {
        Variable::Bound(index) => env.lookup(*index).cloned().ok_or(Fault::UnboundIndex {
            index: index.0,
            len: env.len(),
        }),
        Variable::Free(name) => {
            let import = env
                .globals()
                .imports
                .get(name)
                .ok_or_else(|| Fault::UnknownGlobal(name.clone()))?;
            evaluate(&Env::new(env.globals().clone()), &import.term)
        }
        Variable::Label(name) => Ok(match env.label(name) {
            Some(value) => value.clone(),
            None => Value::Neutral(Rc::new(Value::Var(Variable::Label(name.clone())))),
        }),
        Variable::Foreign(name) => match env.globals().ffi.get(name) {
            Some(prim) if prim.arity == 0 => (prim.compute)(&[]).ok_or_else(|| Fault::Primitive(name.clone())),
            Some(prim) => Ok(Value::External {
                name: name.clone(),
                arity: prim.arity,
                compute: prim.compute,
                args: Vec::new(),
            }),
            None => Ok(Value::Neutral(Rc::new(Value::Var(Variable::Foreign(name.clone()))))),
        },
        Variable::Meta(meta) => Ok(Value::flex(*meta)),
    }
}

fn evaluate_row(env: &Env, row: &TermRow) -> Result<ValueRow, Fault> {
    match row {
        Row::Empty => Ok(Row::Empty),
        Row::Extension { label, value, rest } => {
            let value = evaluate(env, value)?;
            // Later fields may refer to earlier ones by label.
            let scoped = env.with_label(label, value.clone());
            Ok(Row::extend(label.clone(), value, evaluate_row(&scoped, rest)?))
        }
        Row::Variable(var) => match variable(env, var)? {
            Value::Row(row) => Ok(row),
            Value::Neutral(inner) => match inner.as_ref() {
                Value::Var(v) => Ok(Row::Variable(v.clone())),
                other => Err(Fault::Unsupported(format!("row tail {other:?}"))),
            },
            other => Err(Fault::Unsupported(format!("row tail {other:?}"))),
        },
    }
}

/// Forces one closure step: binds `arg` at the next level and evaluates the
/// body.
pub fn apply(binder: &Binder, closure: &Closure, arg: Value) -> Result<Value, Fault> {
    log::trace!("apply {}", binder.variable());
    evaluate(&closure.env.push(arg), &closure.term)
}

/// Reduces an application where possible and builds a neutral otherwise.
pub fn app(func: Value, icit: Implicitness, arg: Value) -> Result<Value, Fault> {
    match func {
        Value::Abs {
            binder: binder @ (Binder::Lambda { .. } | Binder::Pi { .. }),
            closure,
        } => apply(&binder, &closure, arg),
        Value::Abs {
            binder: binder @ Binder::Mu { .. },
            closure,
        } => {
            let itself = Value::Abs {
                binder: binder.clone(),
                closure: closure.clone(),
            };
            let unfolded = apply(&binder, &closure, itself)?;
            app(unfolded, icit, arg)
        }
        Value::External {
            name,
            arity,
            compute,
            mut args,
        } => {
            args.push(arg);
            if args.len() < arity {
                return Ok(Value::External {
                    name,
                    arity,
                    compute,
                    args,
                });
            }
            let stuck = args.iter().any(|a| !matches!(a.strip(), Value::Lit(_)));
            if stuck {
                return Ok(Value::Neutral(Rc::new(Value::External {
                    name,
                    arity,
                    compute,
                    args,
                })));
            }
            let literals: Vec<Value> = args.iter().map(|a| a.strip().clone()).collect();
            compute(&literals).ok_or(Fault::Primitive(name))
        }
        Value::Neutral(_) => Ok(Value::Neutral(Rc::new(Value::App {
            icit,
            func: Rc::new(func),
            arg: Rc::new(arg),
        }))),
        Value::Lit(Literal::Atom(_)) | Value::App { .. } => Ok(Value::App {
            icit,
            func: Rc::new(func),
            arg: Rc::new(arg),
        }),
        Value::Modal { value, .. } => app((*value).clone(), icit, arg),
        other => Err(Fault::NotAFunction(other.to_string())),
    }
}

pub fn project(target: Value, label: &str) -> Result<Value, Fault> {
    if let Some(row) = target.tagged_row(atoms::STRUCT).or_else(|| target.tagged_row(atoms::SCHEMA)) {
        if let Some(value) = row.get(label) {
            return Ok(value.clone());
        }
    }
    if let Value::Row(row) = target.strip() {
        if let Some(value) = row.get(label) {
            return Ok(value.clone());
        }
    }
    if target.is_neutral() || matches!(target.strip(), Value::App { .. }) {
        return Ok(Value::Neutral(Rc::new(Value::Project {
            value: Rc::new(target),
            label: label.to_string(),
        })));
    }
    Err(Fault::Unsupported(format!("projection of `{label}` from {target}")))
}

pub fn inject(target: Value, label: &str, value: Value) -> Result<Value, Fault> {
    for tag in [atoms::STRUCT, atoms::SCHEMA, atoms::VARIANT] {
        if let Some(row) = target.tagged_row(tag) {
            let row = row.insert(label, value);
            return Ok(Value::app(Value::atom(tag), Value::Row(row)));
        }
    }
    if target.is_neutral() {
        return Ok(Value::Neutral(Rc::new(Value::Inject {
            value: Rc::new(target),
            label: label.to_string(),
            field: Rc::new(value),
        })));
    }
    Err(Fault::Unsupported(format!("injection of `{label}` into {target}")))
}

/// Outcome of testing one pattern against a value.
pub enum Meet {
    Bind(Vec<Value>),
    Fail,
    Stuck,
}

/// Picks the first alternative whose pattern matches, or builds a stuck match
/// if the scrutinee is not yet known well enough.
pub fn select(env: &Env, scrutinee: Value, alternatives: Rc<[Alternative]>) -> Result<Value, Fault> {
    for alt in alternatives.iter() {
        match meet(env, &alt.pattern, &scrutinee)? {
            Meet::Bind(values) => return evaluate(&env.extend(values), &alt.body),
            Meet::Fail => continue,
            Meet::Stuck => {
                return Ok(Value::Neutral(Rc::new(Value::Match(StuckMatch {
                    scrutinee: Rc::new(scrutinee),
                    alternatives,
                    env: env.clone(),
                }))));
            }
        }
    }
    Err(Fault::NoMatch(scrutinee.to_string()))
}

pub fn meet(env: &Env, pattern: &Pattern, value: &Value) -> Result<Meet, Fault> {
    let stripped = value.strip();
    Ok(match pattern {
        Pattern::Wildcard => Meet::Bind(Vec::new()),
        Pattern::Binder(_) => Meet::Bind(vec![value.clone()]),
        Pattern::Lit(lit) => match stripped {
            Value::Lit(other) if other == lit => Meet::Bind(Vec::new()),
            Value::Lit(_) => Meet::Fail,
            _ if value.is_neutral() => Meet::Stuck,
            _ => Meet::Fail,
        },
        Pattern::Var { term, .. } => {
            let expected = evaluate(env, term)?;
            match (expected.strip(), stripped) {
                (Value::Lit(a), Value::Lit(b)) if a == b => Meet::Bind(Vec::new()),
                (Value::Lit(_), Value::Lit(_)) => Meet::Fail,
                _ => Meet::Stuck,
            }
        }
        Pattern::Struct(row) => match value.tagged_row(atoms::STRUCT) {
            Some(fields) => meet_fields(env, row, fields, |rest| Value::structure(rest))?,
            None if value.is_neutral() => Meet::Stuck,
            None => Meet::Fail,
        },
        Pattern::Row(row) => match stripped {
            Value::Row(fields) => meet_fields(env, row, fields, Value::Row)?,
            _ if value.is_neutral() => Meet::Stuck,
            _ => Meet::Fail,
        },
        Pattern::Variant(row) => match value.tagged_row(atoms::STRUCT) {
            Some(Row::Extension { label, value, .. }) => match row.get(label) {
                Some(inner) => meet(env, inner, value)?,
                None => Meet::Fail,
            },
            Some(_) => Meet::Fail,
            None if value.is_neutral() => Meet::Stuck,
            None => Meet::Fail,
        },
        Pattern::List { elements, rest } => match value.tagged_row(atoms::LIST) {
            Some(items) => {
                let items: Vec<&Value> = items.fields().map(|(_, v)| v).collect();
                let fits = match rest {
                    Some(_) => items.len() >= elements.len(),
                    None => items.len() == elements.len(),
                };
                if !fits {
                    return Ok(Meet::Fail);
                }
                let mut bound = Vec::new();
                for (p, v) in elements.iter().zip(items.iter()) {
                    match meet(env, p, v)? {
                        Meet::Bind(values) => bound.extend(values),
                        other => return Ok(other),
                    }
                }
                if rest.is_some() {
                    let remaining = items[elements.len()..].iter().map(|v| (*v).clone());
                    bound.push(list_value(remaining));
                }
                Meet::Bind(bound)
            }
            None if value.is_neutral() => Meet::Stuck,
            None => Meet::Fail,
        },
    })
}

fn meet_fields(
    env: &Env,
    pattern: &Row<Pattern, String>,
    fields: &ValueRow,
    wrap: impl Fn(ValueRow) -> Value,
) -> Result<Meet, Fault> {
    let mut bound = Vec::new();
    for (label, p) in pattern.fields() {
        match fields.get(label) {
            Some(v) => match meet(env, p, v)? {
                Meet::Bind(values) => bound.extend(values),
                other => return Ok(other),
            },
            None if fields.tail().is_some() => return Ok(Meet::Stuck),
            None => return Ok(Meet::Fail),
        }
    }
    if pattern.tail().is_some() {
        let matched = pattern.labels();
        let rest: Vec<(String, Value)> = fields
            .fields()
            .filter(|(l, _)| !matched.contains(l))
            .map(|(l, v)| (l.to_string(), v.clone()))
            .collect();
        let tail = match fields.tail() {
            Some(v) => Row::Variable(v.clone()),
            None => Row::Empty,
        };
        bound.push(wrap(Row::from_fields(rest, tail)));
    }
    Ok(Meet::Bind(bound))
}

pub fn list_value(items: impl IntoIterator<Item = Value>) -> Value {
    let fields = items.into_iter().enumerate().map(|(i, v)| (i.to_string(), v));
    Value::app(Value::atom(atoms::LIST), Value::Row(Row::from_fields(fields, Row::Empty)))
}
