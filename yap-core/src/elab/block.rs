#![forbid(unsafe_code)]

use yap_ast::{self as src, Literal, Multiplicity};

use super::{Ast, Elaborator};
use crate::context::{Context, EntryKind, Implicit};
use crate::error::ElabResult;
use crate::provenance::Provenance;
use crate::quote::quote;
use crate::syntax::{Statement, Term, atoms};
use crate::usage::Usages;
use crate::value::Value;

struct Rest {
    statements: Vec<Statement>,
    ret: Term,
    ty: Value,
    usages: Usages,
}

impl Elaborator {
    /// Elaborates the right-hand side of a `let`, against its annotation when
    /// there is one.
    pub fn let_value(&mut self, ctx: &Context, annotation: Option<&src::Term>, value: &src::Term) -> ElabResult<Ast> {
        match annotation {
            Some(annotation) => {
                let (_, ty, _) = self.check_type(ctx, annotation)?;
                let (term, usages) = self.check(ctx, value, &ty)?;
                Ok(Ast { term, ty, usages })
            }
            None => self.infer(ctx, value),
        }
    }

    pub(super) fn infer_block(
        &mut self,
        ctx: &Context,
        statements: &[src::Statement],
        ret: Option<&src::Term>,
    ) -> ElabResult<Ast> {
        let rest = self.statements(ctx, statements, ret)?;
        Ok(Ast {
            term: Term::Block {
                statements: rest.statements,
                ret: Box::new(rest.ret),
            },
            ty: rest.ty,
            usages: rest.usages,
        })
    }

    fn statements(&mut self, ctx: &Context, statements: &[src::Statement], ret: Option<&src::Term>) -> ElabResult<Rest> {
        let Some((statement, remaining)) = statements.split_first() else {
            return match ret {
                Some(ret) => {
                    let ast = self.infer(ctx, ret)?;
                    Ok(Rest {
                        statements: Vec::new(),
                        ret: ast.term,
                        ty: ast.ty,
                        usages: ast.usages,
                    })
                }
                None => Ok(Rest {
                    statements: Vec::new(),
                    ret: Term::Lit(Literal::Unit),
                    ty: Value::atom(atoms::UNIT),
                    usages: ctx.zeros(),
                }),
            };
        };
        let here = ctx.track(Provenance::Statement {
            span: statement.span(),
            statement: statement.to_string(),
        });

        match statement {
            src::Statement::Let {
                name,
                annotation,
                multiplicity,
                value,
                ..
            } => {
                let q = multiplicity.unwrap_or(Multiplicity::Many);
                let ast = self.let_value(&here, annotation.as_ref(), value)?;
                let evaluated = self.eval(&here, &ast.term)?;
                let inner = ctx.define(&name.node, ast.ty.clone(), evaluated, q, EntryKind::Let);
                let mut rest = self.statements(&inner, remaining, ret)?;
                self.usage(&here, q, rest.usages.head());

                let binding = Statement::Let {
                    variable: name.node.clone(),
                    annotation: quote(ctx.level(), &ast.ty)?,
                    value: ast.term,
                };
                rest.statements.insert(0, binding);
                rest.usages = ast.usages.scale(q).add(&rest.usages.tail());
                Ok(rest)
            }
            src::Statement::Expression(term) => {
                let ast = self.infer(&here, term)?;
                let mut rest = self.statements(ctx, remaining, ret)?;
                rest.statements.insert(0, Statement::Expression(ast.term));
                rest.usages = ast.usages.add(&rest.usages);
                Ok(rest)
            }
            src::Statement::Using { term, .. } => {
                let ast = self.infer(&here, term)?;
                let value = self.eval(&here, &ast.term)?;
                log::debug!("using instance of {}", ast.ty);
                let inner = ctx.using(Implicit { value, ty: ast.ty });
                let mut rest = self.statements(&inner, remaining, ret)?;
                rest.statements.insert(0, Statement::Using(ast.term));
                rest.usages = ast.usages.add(&rest.usages);
                Ok(rest)
            }
        }
    }
}
