#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::rc::Rc;

use yap_ast::Row;

use crate::error::Fault;
use crate::eval::{app, inject, project, select};
use crate::syntax::{MetaId, Variable};
use crate::value::{Value, ValueRow};

/// Meta solutions. Bindings are only ever added.
#[derive(Clone, Debug, Default)]
pub struct Subst(BTreeMap<MetaId, Value>);

impl Subst {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: MetaId) -> Option<&Value> {
        self.0.get(&id)
    }

    pub fn contains(&self, id: MetaId) -> bool {
        self.0.contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetaId, &Value)> {
        self.0.iter().map(|(id, v)| (*id, v))
    }

    /// Binds `id`. An existing binding is kept: resolved metas are never
    /// rebound.
    pub fn bind(mut self, id: MetaId, value: Value) -> Self {
        if self.0.contains_key(&id) {
            log::warn!("ignoring rebinding of resolved meta ?{}", id.0);
        } else {
            self.0.insert(id, value);
        }
        self
    }

    /// Adds every binding of `newer` not already present.
    pub fn compose(mut self, newer: &Subst) -> Self {
        for (id, value) in &newer.0 {
            if !self.0.contains_key(id) {
                self.0.insert(*id, value.clone());
            }
        }
        self
    }

    /// Bindings present here but not in `base`.
    pub fn since(&self, base: &Subst) -> Subst {
        Subst(
            self.0
                .iter()
                .filter(|(id, _)| !base.0.contains_key(id))
                .map(|(id, v)| (*id, v.clone()))
                .collect(),
        )
    }
}

/// Resolves solved metas in head position until the value is either not
/// meta-headed or headed by an unsolved meta. Stuck computations whose head
/// has since been solved are re-run.
pub fn force(value: &Value, subst: &Subst) -> Result<Value, Fault> {
    match value {
        Value::Neutral(inner) => match inner.as_ref() {
            Value::Var(Variable::Meta(meta)) => match subst.get(meta.id) {
                Some(solution) => force(solution, subst),
                None => Ok(value.clone()),
            },
            Value::App { icit, func, arg } => {
                let head = force(func, subst)?;
                let reduced = app(head.clone(), *icit, (**arg).clone())?;
                if head.is_neutral() {
                    Ok(reduced)
                } else {
                    force(&reduced, subst)
                }
            }
            Value::Match(stuck) => {
                let scrutinee = force(&stuck.scrutinee, subst)?;
                let selected = select(&stuck.env, scrutinee, stuck.alternatives.clone())?;
                match &selected {
                    Value::Neutral(inner) if matches!(inner.as_ref(), Value::Match(_)) => Ok(selected),
                    _ => force(&selected, subst),
                }
            }
            Value::Project { value: target, label } => {
                let target = force(target, subst)?;
                if target.is_neutral() {
                    return project(target, label);
                }
                force(&project(target, label)?, subst)
            }
            Value::Inject {
                value: target,
                label,
                field,
            } => inject(force(target, subst)?, label, (**field).clone()),
            Value::External {
                name,
                arity,
                compute,
                args,
            } => {
                let forced: Vec<Value> = args.iter().map(|a| force(a, subst)).collect::<Result<_, _>>()?;
                if forced.iter().all(|a| matches!(a.strip(), Value::Lit(_))) {
                    let literals: Vec<Value> = forced.iter().map(|a| a.strip().clone()).collect();
                    return compute(&literals).ok_or_else(|| Fault::Primitive(name.clone()));
                }
                Ok(Value::Neutral(Rc::new(Value::External {
                    name: name.clone(),
                    arity: *arity,
                    compute: *compute,
                    args: forced,
                })))
            }
            _ => Ok(value.clone()),
        },
        Value::Row(row) => Ok(Value::Row(force_row(row, subst)?)),
        _ => Ok(value.clone()),
    }
}

/// Splices solved tail metas into the row.
pub fn force_row(row: &ValueRow, subst: &Subst) -> Result<ValueRow, Fault> {
    row.traverse(&mut |v: &Value| Ok(v.clone()), &mut |var: &Variable<_>| {
        if let Variable::Meta(meta) = var {
            if let Some(solution) = subst.get(meta.id) {
                return match force(solution, subst)? {
                    Value::Row(row) => force_row(&row, subst),
                    other => match other.strip() {
                        Value::Var(v) => Ok(Row::Variable(v.clone())),
                        _ => Err(Fault::Unsupported(format!("row tail solved by {other}"))),
                    },
                };
            }
        }
        Ok(Row::Variable(var.clone()))
    })
}
