#![forbid(unsafe_code)]

//! Ordered discharge of deferred constraints.

use crate::error::{ElabError, ElabResult, ErrorKind};
use crate::state::{Constraint, Obligation, State};
use crate::subst::Subst;
use crate::syntax::MetaId;
use crate::unify::unify;
use crate::value::Value;

/// Solves the pending constraints in emission order, starting from the
/// committed zonker. Earlier solutions are visible to later constraints.
///
/// On success the solutions are committed and returned. On failure nothing
/// is committed and the constraints are dropped.
pub fn solve(state: &mut State) -> ElabResult<Subst> {
    let obligations = std::mem::take(&mut state.constraints);
    log::debug!("solving {} constraints", obligations.len());
    let mut subst = state.zonker.clone();
    for Obligation { constraint, trace } in obligations {
        subst = discharge(state, constraint, subst).map_err(|err| err.within(&trace))?;
    }
    let solved = subst.since(&state.zonker);
    log::debug!("solved {} metas", solved.len());
    state.commit(&solved);
    Ok(state.zonker.clone())
}

fn discharge(state: &mut State, constraint: Constraint, subst: Subst) -> ElabResult<Subst> {
    match constraint {
        Constraint::Assign { left, right, level } => unify(state, &left, &right, level, subst),
        Constraint::Usage { expected, computed } => {
            if expected.admits(computed) {
                Ok(subst)
            } else {
                Err(ElabError::new(ErrorKind::MultiplicityMismatch { expected, computed }))
            }
        }
        Constraint::Resolve { meta, annotation } => {
            log::warn!("unresolved implicit {meta} : {annotation}");
            Err(ElabError::new(ErrorKind::Unsupported(format!(
                "resolving {meta} : {annotation} is not supported"
            ))))
        }
    }
}

/// Runs `action` once per combination of recorded resumption values, with
/// each skolem bound to its value for that run. Without recorded
/// resumptions it runs once against the zonker.
pub fn replay<T>(state: &State, mut action: impl FnMut(&Subst) -> ElabResult<T>) -> ElabResult<Vec<T>> {
    let choices: Vec<(MetaId, &[Value])> = state
        .skolems
        .iter()
        .map(|skolem| (skolem.id, state.resumptions(*skolem)))
        .filter(|(_, values)| !values.is_empty())
        .collect();
    if choices.is_empty() {
        return Ok(vec![action(&state.zonker)?]);
    }

    let mut results = Vec::new();
    let mut cursor = vec![0usize; choices.len()];
    loop {
        let mut subst = Subst::empty();
        for ((id, values), &i) in choices.iter().zip(cursor.iter()) {
            subst = subst.bind(*id, values[i].clone());
        }
        log::debug!("replaying with {} resumption choices", subst.len());
        results.push(action(&subst.compose(&state.zonker))?);

        // Odometer step over the choice points.
        let mut position = choices.len();
        loop {
            if position == 0 {
                return Ok(results);
            }
            position -= 1;
            cursor[position] += 1;
            if cursor[position] < choices[position].1.len() {
                break;
            }
            cursor[position] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use yap_ast::Multiplicity;

    use super::*;
    use crate::provenance::Trace;
    use crate::syntax::Level;

    #[test]
    fn constraints_are_solved_in_order() {
        let mut state = State::default();
        let meta = state.fresh_meta(Level(0), Value::ty());
        let trace = Trace::default();
        state.emit(
            Constraint::Assign {
                left: Value::flex(meta),
                right: Value::atom("Bool"),
                level: Level(0),
            },
            &trace,
        );
        state.emit(
            Constraint::Assign {
                left: Value::flex(meta),
                right: Value::atom("Num"),
                level: Level(0),
            },
            &trace,
        );
        let err = solve(&mut state).unwrap_err();
        assert_eq!(err.to_string(), "Unification Failure: Cannot unify Bool with Num");
        assert!(state.zonker.is_empty());
    }

    #[test]
    fn usage_lattice() {
        let mut state = State::default();
        let trace = Trace::default();
        state.emit(
            Constraint::Usage {
                expected: Multiplicity::Many,
                computed: Multiplicity::Zero,
            },
            &trace,
        );
        solve(&mut state).unwrap();
        state.emit(
            Constraint::Usage {
                expected: Multiplicity::Zero,
                computed: Multiplicity::One,
            },
            &trace,
        );
        let err = solve(&mut state).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MultiplicityMismatch { .. }));
    }

    #[test]
    fn resolve_fails_loudly() {
        let mut state = State::default();
        let meta = state.fresh_meta(Level(0), Value::ty());
        state.emit(
            Constraint::Resolve {
                meta,
                annotation: Value::ty(),
            },
            &Trace::default(),
        );
        assert!(solve(&mut state).unwrap_err().is_fault());
    }

    #[test]
    fn replay_enumerates_the_cartesian_product() {
        let mut state = State::default();
        let a = state.fresh_meta(Level(0), Value::ty());
        let b = state.fresh_meta(Level(0), Value::ty());
        for (skolem, values) in [(a, vec![1.0, 2.0]), (b, vec![10.0, 20.0, 30.0])] {
            state.record_skolem(skolem);
            for v in values {
                state.record_resumption(skolem, Value::num(v));
            }
        }
        let runs = replay(&state, |subst| Ok(subst.len())).unwrap();
        assert_eq!(runs, vec![2; 6]);
    }

    #[test]
    fn replay_without_resumptions_runs_once() {
        let state = State::default();
        assert_eq!(replay(&state, |_| Ok(())).unwrap().len(), 1);
    }
}
