#![forbid(unsafe_code)]

//! Structural unification of values up to evaluation.

mod rows;

pub use rows::unify_rows;

use crate::error::{ElabError, ElabResult, ErrorKind};
use crate::eval::{apply, evaluate};
use crate::provenance::Provenance;
use crate::quote::quote;
use crate::state::State;
use crate::subst::{Subst, force};
use crate::syntax::{Level, Meta, Variable};
use crate::value::{Binder, Value};
use crate::zonk::zonk_term;

/// Unifies `left` with `right` under `level` binders, extending `subst`.
///
/// Metas solved along the way only appear in the returned substitution; the
/// caller decides whether to commit them.
pub fn unify(state: &mut State, left: &Value, right: &Value, level: Level, subst: Subst) -> ElabResult<Subst> {
    Unifier { state }.unify(left, right, level, subst).map_err(|err| {
        err.framed(Provenance::Unify {
            left: left.clone(),
            right: right.clone(),
        })
    })
}

pub(crate) struct Unifier<'s> {
    pub(crate) state: &'s mut State,
}

fn mismatch(left: &Value, right: &Value) -> ElabError {
    ElabError::new(ErrorKind::UnificationFailure {
        left: left.clone(),
        right: right.clone(),
    })
}

impl Unifier<'_> {
    pub(crate) fn unify(&mut self, left: &Value, right: &Value, level: Level, subst: Subst) -> ElabResult<Subst> {
        let left = force(left, &subst)?;
        let right = force(right, &subst)?;
        log::trace!("unify {left} ~ {right} at level {}", level.0);

        // Neutral and modal wrappers do not take part in type equality.
        let (l, r) = (left.strip(), right.strip());
        match (l, r) {
            (Value::Var(Variable::Meta(a)), Value::Var(Variable::Meta(b))) if a.id == b.id => Ok(subst),
            (Value::Var(Variable::Meta(a)), Value::Var(Variable::Meta(b))) => {
                let subst = self.bind(*a, &right, level, subst)?;
                match (self.state.annotation(a.id).cloned(), self.state.annotation(b.id).cloned()) {
                    (Some(ta), Some(tb)) => self.unify(&ta, &tb, level, subst),
                    _ => Ok(subst),
                }
            }
            (Value::Var(Variable::Meta(a)), _) => self.bind(*a, &right, level, subst),
            (_, Value::Var(Variable::Meta(b))) => self.bind(*b, &left, level, subst),

            (Value::Lit(a), Value::Lit(b)) if a == b => Ok(subst),

            (Value::Var(Variable::Bound(a)), Value::Var(Variable::Bound(b))) => {
                if a == b {
                    Ok(subst)
                } else {
                    Err(ElabError::new(ErrorKind::RigidVariableMismatch { left: *a, right: *b }))
                }
            }
            (Value::Var(Variable::Free(a)), Value::Var(Variable::Free(b)))
            | (Value::Var(Variable::Label(a)), Value::Var(Variable::Label(b)))
            | (Value::Var(Variable::Foreign(a)), Value::Var(Variable::Foreign(b)))
                if a == b =>
            {
                Ok(subst)
            }

            (Value::Abs { binder: lb, closure: lc }, Value::Abs { binder: rb, closure: rc }) => {
                let subst = match (lb, rb) {
                    (Binder::Lambda { icit: li, .. }, Binder::Lambda { icit: ri, .. }) if li == ri => subst,
                    (
                        Binder::Pi {
                            icit: li,
                            annotation: la,
                            ..
                        },
                        Binder::Pi {
                            icit: ri,
                            annotation: ra,
                            ..
                        },
                    ) if li == ri => self.unify(la, ra, level, subst)?,
                    (Binder::Mu { annotation: la, .. }, Binder::Mu { annotation: ra, .. }) => {
                        self.unify(la, ra, level, subst)?
                    }
                    _ => {
                        return Err(ElabError::new(ErrorKind::TypeMismatch {
                            left: left.clone(),
                            right: right.clone(),
                        }));
                    }
                };
                let lbody = apply(lb, lc, Value::rigid(level))?;
                let rbody = apply(rb, rc, Value::rigid(level))?;
                self.unify(&lbody, &rbody, level.next(), subst)
            }

            (
                Value::App {
                    icit: li,
                    func: lf,
                    arg: la,
                },
                Value::App {
                    icit: ri,
                    func: rf,
                    arg: ra,
                },
            ) if li == ri => {
                let subst = self.unify(lf, rf, level, subst)?;
                self.unify(la, ra, level, subst)
            }

            (Value::Row(lr), Value::Row(rr)) => self.rows(lr, rr, level, subst),

            (
                Value::External {
                    name: ln, args: la, ..
                },
                Value::External {
                    name: rn, args: ra, ..
                },
            ) if ln == rn && la.len() == ra.len() => la
                .iter()
                .zip(ra.iter())
                .try_fold(subst, |subst, (a, b)| self.unify(a, b, level, subst)),

            (Value::Match(ls), Value::Match(rs)) if ls.alternatives.len() == rs.alternatives.len() => {
                let mut subst = self.unify(&ls.scrutinee, &rs.scrutinee, level, subst)?;
                for (la, ra) in ls.alternatives.iter().zip(rs.alternatives.iter()) {
                    if la.pattern != ra.pattern {
                        return Err(mismatch(&left, &right));
                    }
                    let n = la.binders.len();
                    let rigids = || (0..n).map(|i| Value::rigid(level.plus(i)));
                    let lbody = evaluate(&ls.env.extend(rigids()), &la.body)?;
                    let rbody = evaluate(&rs.env.extend(rigids()), &ra.body)?;
                    subst = self.unify(&lbody, &rbody, level.plus(n), subst)?;
                }
                Ok(subst)
            }

            (Value::Project { value: lv, label: ll }, Value::Project { value: rv, label: rl }) if ll == rl => {
                self.unify(lv, rv, level, subst)
            }
            (
                Value::Inject {
                    value: lv,
                    label: ll,
                    field: lf,
                },
                Value::Inject {
                    value: rv,
                    label: rl,
                    field: rf,
                },
            ) if ll == rl => {
                let subst = self.unify(lv, rv, level, subst)?;
                self.unify(lf, rf, level, subst)
            }

            _ => Err(mismatch(&left, &right)),
        }
    }

    /// Solves `meta := value` after an occurs check.
    pub(crate) fn bind(&mut self, meta: Meta, value: &Value, level: Level, subst: Subst) -> ElabResult<Subst> {
        if value.as_flex().is_some_and(|m| m.id == meta.id) {
            return Ok(subst);
        }
        let term = zonk_term(&quote(level, value)?, &subst, level)?;
        if term.metas().iter().any(|m| m.id == meta.id) {
            return Err(ElabError::new(ErrorKind::OccursCheck {
                meta,
                value: value.clone(),
            }));
        }
        log::trace!("bind {meta} := {value}");
        Ok(subst.bind(meta.id, value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use yap_ast::{Implicitness, Multiplicity};

    use super::*;
    use crate::syntax::{MetaId, Term};
    use crate::value::{Closure, Env};

    #[test]
    fn flex_flex_binds_left() {
        let mut state = State::default();
        let a = state.fresh_meta(Level(0), Value::ty());
        let b = state.fresh_meta(Level(0), Value::ty());
        let subst = unify(&mut state, &Value::flex(a), &Value::flex(b), Level(0), Subst::empty()).unwrap();
        assert_eq!(subst.get(a.id).and_then(Value::as_flex), Some(b));
        assert!(!subst.contains(b.id));
    }

    #[test]
    fn occurs_check_rejects_cyclic_solutions() {
        let mut state = State::default();
        let a = state.fresh_meta(Level(0), Value::ty());
        let cyclic = Value::array(Value::flex(a));
        let err = unify(&mut state, &Value::flex(a), &cyclic, Level(0), Subst::empty()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::OccursCheck { meta, .. } if meta.id == MetaId(0)));
    }

    #[test]
    fn pi_implicitness_must_agree() {
        let mut state = State::default();
        let pi = |icit| {
            Value::pi(
                "x",
                icit,
                Multiplicity::Many,
                Value::atom("Num"),
                Closure::new(Env::empty(), Term::atom("Num")),
            )
        };
        let err = unify(
            &mut state,
            &pi(Implicitness::Explicit),
            &pi(Implicitness::Implicit),
            Level(0),
            Subst::empty(),
        )
        .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn binders_compare_bodies_under_a_shared_rigid() {
        let mut state = State::default();
        let identity = |name: &str| Value::Abs {
            binder: Binder::Lambda {
                variable: name.to_string(),
                icit: Implicitness::Explicit,
            },
            closure: Closure::new(Env::empty(), Term::bound(0)),
        };
        unify(&mut state, &identity("x"), &identity("y"), Level(0), Subst::empty()).unwrap();

        let constant = Value::Abs {
            binder: Binder::Lambda {
                variable: "x".to_string(),
                icit: Implicitness::Explicit,
            },
            closure: Closure::new(Env::new(Rc::default()).push(Value::rigid(Level(0))), Term::bound(1)),
        };
        let err = unify(&mut state, &identity("x"), &constant, Level(1), Subst::empty()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::RigidVariableMismatch { .. }));
    }

    #[test]
    fn modal_wrappers_are_ignored() {
        let mut state = State::default();
        let modal = Value::Modal {
            value: Rc::new(Value::atom("Num")),
            modalities: crate::syntax::Modalities {
                quantity: Multiplicity::One,
                liquid: None,
            },
        };
        unify(&mut state, &modal, &Value::atom("Num"), Level(0), Subst::empty()).unwrap();
    }
}
