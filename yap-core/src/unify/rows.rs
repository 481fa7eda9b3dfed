#![forbid(unsafe_code)]

//! Row unification by label rewriting.
//!
//! To unify `[l: t | r]` with a row `s`, `s` is rewritten into the form
//! `[l: t' | s']`; then `t ~ t'` and `r ~ s'`. Rewriting an open row whose
//! tail is a meta solves that tail with `[l: t | fresh_tail]`, which is
//! how two open rows exchange the labels only one of them has.

use yap_ast::Row;

use super::Unifier;
use crate::error::{ElabError, ElabResult, ErrorKind};
use crate::provenance::Provenance;
use crate::state::State;
use crate::subst::{Subst, force_row};
use crate::syntax::{Level, Meta, Variable};
use crate::value::{Value, ValueRow};

pub fn unify_rows(state: &mut State, left: &ValueRow, right: &ValueRow, level: Level, subst: Subst) -> ElabResult<Subst> {
    Unifier { state }.rows(left, right, level, subst)
}

impl Unifier<'_> {
    pub(crate) fn rows(&mut self, left: &ValueRow, right: &ValueRow, level: Level, subst: Subst) -> ElabResult<Subst> {
        let left = force_row(left, &subst)?;
        let right = force_row(right, &subst)?;
        log::trace!("unify rows {left} ~ {right}");
        self.rows_forced(&left, &right, level, subst).map_err(|err| {
            err.framed(Provenance::Rows {
                left: left.clone(),
                right: right.clone(),
            })
        })
    }

    fn rows_forced(&mut self, left: &ValueRow, right: &ValueRow, level: Level, subst: Subst) -> ElabResult<Subst> {
        match (left, right) {
            (Row::Empty, Row::Empty) => Ok(subst),
            (Row::Variable(a), Row::Variable(b)) if a == b => Ok(subst),
            (Row::Variable(Variable::Meta(meta)), _) => self.bind_row(*meta, right, level, subst),
            (_, Row::Variable(Variable::Meta(meta))) => self.bind_row(*meta, left, level, subst),
            (Row::Extension { label, value, rest }, _) => {
                let before = subst.clone();
                let (found, residual, subst) = self.rewrite(right, label, value, level, subst)?;
                if let Some(Variable::Meta(tail)) = rest.tail() {
                    if !before.contains(tail.id) && subst.contains(tail.id) {
                        return Err(ElabError::new(ErrorKind::RowMismatch {
                            left: left.to_string(),
                            right: right.to_string(),
                        }));
                    }
                }
                let subst = self.unify(value, &found, level, subst)?;
                self.rows(rest, &residual, level, subst)
            }
            (Row::Empty, Row::Extension { label, .. }) => Err(ElabError::new(ErrorKind::MissingLabel { label: label.clone() })),
            _ => Err(ElabError::new(ErrorKind::RowMismatch {
                left: left.to_string(),
                right: right.to_string(),
            })),
        }
    }

    /// Splits the field `label` out of `row`, returning its value and what
    /// remains. An open tail is solved with `[label: demanded | fresh]`.
    fn rewrite(
        &mut self,
        row: &ValueRow,
        label: &str,
        demanded: &Value,
        level: Level,
        subst: Subst,
    ) -> ElabResult<(Value, ValueRow, Subst)> {
        match row {
            Row::Empty => Err(ElabError::new(ErrorKind::MissingLabel {
                label: label.to_string(),
            })),
            Row::Extension { label: l, value, rest } if l == label => Ok(((**value).clone(), (**rest).clone(), subst)),
            Row::Extension { label: l, value, rest } => {
                let (found, residual, subst) = self.rewrite(rest, label, demanded, level, subst)?;
                Ok((found, Row::extend(l.clone(), (**value).clone(), residual), subst))
            }
            Row::Variable(Variable::Meta(meta)) => {
                let tail = Row::Variable(Variable::Meta(self.state.fresh_meta(meta.level, Value::row_kind())));
                let extension = Row::extend(label, demanded.clone(), tail.clone());
                log::trace!("rewrite {meta} := {extension}");
                let subst = self.bind(*meta, &Value::Row(extension), level, subst)?;
                Ok((demanded.clone(), tail, subst))
            }
            Row::Variable(_) => Err(ElabError::new(ErrorKind::MissingLabel {
                label: label.to_string(),
            })),
        }
    }

    fn bind_row(&mut self, meta: Meta, row: &ValueRow, level: Level, subst: Subst) -> ElabResult<Subst> {
        self.bind(meta, &Value::Row(row.clone()), level, subst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_rows_unify_up_to_field_order() {
        let mut state = State::default();
        let a = Row::from_fields(
            vec![("x".to_string(), Value::num(1.0)), ("y".to_string(), Value::num(2.0))],
            Row::Empty,
        );
        let b = Row::from_fields(
            vec![("y".to_string(), Value::num(2.0)), ("x".to_string(), Value::num(1.0))],
            Row::Empty,
        );
        unify_rows(&mut state, &a, &b, Level(0), Subst::empty()).unwrap();
    }

    #[test]
    fn closed_row_missing_a_label() {
        let mut state = State::default();
        let a = Row::extend("x", Value::num(1.0), Row::Empty);
        let err = unify_rows(&mut state, &a, &Row::Empty, Level(0), Subst::empty()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MissingLabel { ref label } if label == "x"));
    }

    #[test]
    fn shared_tail_is_rejected() {
        let mut state = State::default();
        let r = state.fresh_meta(Level(0), Value::row_kind());
        let tail = || Row::Variable(Variable::Meta(r));
        let a = Row::extend("x", Value::num(1.0), tail());
        let b = Row::extend("y", Value::num(2.0), tail());
        let err = unify_rows(&mut state, &a, &b, Level(0), Subst::empty()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::RowMismatch { .. }));
    }
}
