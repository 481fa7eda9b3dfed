#![forbid(unsafe_code)]

//! Let-generalisation of closed top-level definitions.

use yap_ast::{Implicitness, Multiplicity};

use crate::error::Fault;
use crate::state::State;
use crate::syntax::{Level, Meta, Term, atoms};

const ALPHABET: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

fn name(i: usize) -> String {
    let letter = char::from(ALPHABET[i % ALPHABET.len()]);
    match i / 26 {
        0 => letter.to_string(),
        n => format!("{letter}{n}"),
    }
}

fn abstract_metas(term: &Term, metas: &[Meta]) -> Result<Term, Fault> {
    let k = metas.len();
    term.rewrite_metas(Level(k), &mut |meta, at| {
        Ok(metas
            .iter()
            .position(|m| m.id == meta.id)
            .map(|i| Term::bound(at.0 - i - 1)))
    })
}

/// Abstracts the metas left unsolved in `ty` as implicit type parameters of
/// both the definition and its type. `term` and `ty` must be closed and
/// already zonked.
pub fn generalize(state: &State, term: &Term, ty: &Term) -> Result<(Term, Term), Fault> {
    let metas = ty.metas();
    if metas.is_empty() {
        return Ok((term.clone(), ty.clone()));
    }
    log::debug!("generalizing over {} metas", metas.len());

    let mut term = abstract_metas(term, &metas)?;
    let mut ty = abstract_metas(ty, &metas)?;
    for (i, meta) in metas.iter().enumerate().rev() {
        let kind = match state.annotation(meta.id) {
            Some(ann) if ann.is_atom(atoms::ROW) => atoms::ROW,
            _ => atoms::TYPE,
        };
        let variable = name(i);
        term = Term::lambda(&variable, Implicitness::Implicit, term);
        ty = Term::pi(&variable, Implicitness::Implicit, Multiplicity::Zero, Term::atom(kind), ty);
    }
    Ok((term, ty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn binder_names_cycle_through_the_alphabet() {
        assert_eq!(name(0), "a");
        assert_eq!(name(25), "z");
        assert_eq!(name(26), "a1");
        assert_eq!(name(27 + 26 * 300), "b301");
    }

    #[test]
    fn unsolved_metas_become_implicit_binders() {
        let mut state = State::default();
        let a = state.fresh_meta(Level(0), Value::ty());
        // (x: ?a) -> ?a
        let ty = Term::pi("x", Implicitness::Explicit, Multiplicity::Many, Term::meta(a), Term::meta(a));
        let term = Term::lambda("x", Implicitness::Explicit, Term::bound(0));
        let (term, ty) = generalize(&state, &term, &ty).unwrap();
        let expected = Term::pi(
            "a",
            Implicitness::Implicit,
            Multiplicity::Zero,
            Term::atom(atoms::TYPE),
            Term::pi("x", Implicitness::Explicit, Multiplicity::Many, Term::bound(0), Term::bound(1)),
        );
        assert_eq!(ty, expected);
        assert!(matches!(
            term,
            Term::Abs {
                binding: crate::syntax::Binding::Lambda {
                    icit: Implicitness::Implicit,
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn closed_types_are_untouched() {
        let state = State::default();
        let ty = Term::atom("Num");
        let (_, generalized) = generalize(&state, &Term::atom("Unit"), &ty).unwrap();
        assert_eq!(generalized, ty);
    }
}
