#![forbid(unsafe_code)]

use yap_ast::{self as src, Implicitness, Multiplicity};

use super::{Ast, Elaborator};
use crate::context::Context;
use crate::error::ElabResult;
use crate::syntax::{Modalities, Term, atoms};
use crate::value::{Closure, Value};

impl Elaborator {
    /// `T<q> [| p |]`: a type with a quantity and an optional refinement
    /// predicate `p : (v: T) -> Bool`.
    pub(super) fn infer_modal(
        &mut self,
        ctx: &Context,
        term: &src::Term,
        quantity: Option<Multiplicity>,
        liquid: Option<&src::Term>,
    ) -> ElabResult<Ast> {
        let (ty_term, ty_value, mut usages) = self.check_type(ctx, term)?;
        let liquid = match liquid {
            Some(predicate) => {
                let expected = Value::pi(
                    "v",
                    Implicitness::Explicit,
                    Multiplicity::Many,
                    ty_value,
                    Closure::new(ctx.env.clone(), Term::atom(atoms::BOOL)),
                );
                let (predicate, predicate_usages) = self.check(ctx, predicate, &expected)?;
                usages = usages.add(&predicate_usages);
                Some(Box::new(predicate))
            }
            None => None,
        };
        Ok(Ast {
            term: Term::Modal {
                term: Box::new(ty_term),
                modalities: Modalities {
                    quantity: quantity.unwrap_or(Multiplicity::Many),
                    liquid,
                },
            },
            ty: Value::ty(),
            usages,
        })
    }
}
