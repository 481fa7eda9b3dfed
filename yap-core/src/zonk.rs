#![forbid(unsafe_code)]

//! Replacing solved metas by their solutions.

use std::rc::Rc;

use crate::error::Fault;
use crate::eval::evaluate;
use crate::quote::quote;
use crate::subst::Subst;
use crate::syntax::{Level, Term};
use crate::value::{Env, Globals, Value};

/// Substitutes every solved meta in `term`, which sits under `depth` binders.
pub fn zonk_term(term: &Term, subst: &Subst, depth: Level) -> Result<Term, Fault> {
    term.rewrite_metas(depth, &mut |meta, at| match subst.get(meta.id) {
        Some(solution) => {
            let quoted = quote(at, solution)?;
            Ok(Some(zonk_term(&quoted, subst, at)?))
        }
        None => Ok(None),
    })
}

/// Zonks a value living under `level` rigid binders.
pub fn zonk_value(value: &Value, subst: &Subst, level: Level, globals: Rc<Globals>) -> Result<Value, Fault> {
    let term = zonk_term(&quote(level, value)?, subst, level)?;
    evaluate(&Env::rigid(globals, level), &term)
}

#[cfg(test)]
mod tests {
    use yap_ast::{Implicitness, Literal};

    use super::*;
    use crate::syntax::{Meta, MetaId};

    fn meta(id: u32) -> Meta {
        Meta {
            id: MetaId(id),
            level: Level(0),
        }
    }

    #[test]
    fn chains_of_solutions_are_followed() {
        let subst = Subst::empty()
            .bind(MetaId(0), Value::flex(meta(1)))
            .bind(MetaId(1), Value::atom("Num"));
        let term = Term::app(Term::atom("Array"), Term::meta(meta(0)));
        let zonked = zonk_term(&term, &subst, Level(0)).unwrap();
        assert_eq!(zonked, Term::app(Term::atom("Array"), Term::atom("Num")));
    }

    #[test]
    fn solutions_are_requoted_under_binders() {
        // ?0 := #0, seen from inside a lambda that opens level 1.
        let subst = Subst::empty().bind(MetaId(0), Value::rigid(Level(0)));
        let term = Term::lambda("x", Implicitness::Explicit, Term::meta(meta(0)));
        let zonked = zonk_term(&term, &subst, Level(1)).unwrap();
        assert_eq!(zonked, Term::lambda("x", Implicitness::Explicit, Term::bound(1)));
    }

    #[test]
    fn unsolved_metas_survive() {
        let value = Value::flex(meta(4));
        let zonked = zonk_value(&value, &Subst::empty(), Level(0), Rc::default()).unwrap();
        assert_eq!(zonked.as_flex(), Some(meta(4)));
        let solved = Subst::empty().bind(MetaId(4), Value::Lit(Literal::Bool(true)));
        let zonked = zonk_value(&value, &solved, Level(0), Rc::default()).unwrap();
        assert!(matches!(zonked, Value::Lit(Literal::Bool(true))));
    }
}
