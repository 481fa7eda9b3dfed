#![forbid(unsafe_code)]

//! Rows and the data built from them: structs and their schemas, variants,
//! tagged values, lists, projection and injection.

use yap_ast::{self as src, Ident, Row};

use super::{Ast, Elaborator};
use crate::context::{Context, Sigma};
use crate::error::{ElabError, ElabResult, ErrorKind};
use crate::subst::force;
use crate::syntax::{Term, TermRow, Variable, atoms};
use crate::usage::Usages;
use crate::value::{Value, ValueRow};

pub(super) type SurfaceRow = Row<src::Term, Ident>;

/// Tuples are structs labelled by position.
pub(super) fn tuple_row(items: &[src::Term]) -> SurfaceRow {
    Row::from_fields(
        items.iter().enumerate().map(|(i, item)| (i.to_string(), item.clone())),
        Row::Empty,
    )
}

/// Labels visible inside a row, with the metas standing for their values
/// and types.
struct Scope {
    ctx: Context,
    sigmas: Vec<Sigma>,
}

impl Elaborator {
    /// Brings every label of `row` into scope. `kind` fixes the type of every
    /// field when it is known up front.
    fn open_row(&mut self, ctx: &Context, row: &SurfaceRow, kind: Option<&Value>) -> Scope {
        let mut scope = Scope {
            ctx: ctx.clone(),
            sigmas: Vec::new(),
        };
        for (label, _) in row.fields() {
            let ann = match kind {
                Some(kind) => kind.clone(),
                None => self.fresh(ctx, Value::ty()),
            };
            let nf = self.fresh(ctx, ann.clone());
            let sigma = Sigma { nf, ann };
            scope.ctx = scope.ctx.with_sigma(label, sigma.clone());
            scope.sigmas.push(sigma);
        }
        scope
    }

    /// Ties a label's metas to the elaborated field.
    fn close_label(&mut self, scope: &Scope, sigma: &Sigma, term: &Term, ty: &Value) -> ElabResult<()> {
        let value = self.eval(&scope.ctx, term)?;
        self.assign(&scope.ctx, ty.clone(), sigma.ann.clone());
        self.assign(&scope.ctx, value, sigma.nf.clone());
        Ok(())
    }

    /// Resolves a row tail. Its type must be `Row`.
    fn row_tail(&mut self, ctx: &Context, tail: Option<&Ident>) -> ElabResult<(TermRow, Usages)> {
        let Some(name) = tail else {
            return Ok((Row::Empty, ctx.zeros()));
        };
        let found = ctx.lookup(&name.node)?;
        let ty = force(&found.ty, &self.state.zonker)?;
        if ty.as_flex().is_some() {
            self.assign(ctx, found.ty.clone(), Value::row_kind());
        } else if !ty.is_atom(atoms::ROW) {
            return Err(ElabError::new(ErrorKind::NotARow {
                name: name.node.clone(),
                ty: found.ty,
            }));
        }
        match found.term {
            Term::Var(var) => Ok((Row::Variable(var), found.usages)),
            other => Err(ElabError::new(ErrorKind::Unsupported(format!("row tail {other}")))),
        }
    }

    /// Infers every field, returning the core row, the row of field types and
    /// the summed usages.
    fn infer_fields(&mut self, ctx: &Context, row: &SurfaceRow) -> ElabResult<(Vec<(String, Term)>, Vec<(String, Value)>, Usages)> {
        let scope = self.open_row(ctx, row, None);
        let mut terms = Vec::new();
        let mut types = Vec::new();
        let mut usages = ctx.zeros();
        for ((label, field), sigma) in row.fields().zip(&scope.sigmas) {
            let ast = self.infer(&scope.ctx, field)?;
            self.close_label(&scope, sigma, &ast.term, &ast.ty)?;
            usages = usages.add(&ast.usages);
            terms.push((label.to_string(), ast.term));
            types.push((label.to_string(), ast.ty));
        }
        Ok((terms, types, usages))
    }

    /// A row of types, `[a: A, b: B | r]`.
    pub(super) fn infer_row(&mut self, ctx: &Context, row: &SurfaceRow) -> ElabResult<Ast> {
        let (terms, _, usages) = self.infer_fields(ctx, row)?;
        let (tail, tail_usages) = self.row_tail(ctx, row.tail())?;
        Ok(Ast {
            term: Term::Row(Row::from_fields(terms, tail)),
            ty: Value::row_kind(),
            usages: usages.add(&tail_usages),
        })
    }

    pub(super) fn infer_struct(&mut self, ctx: &Context, row: &SurfaceRow) -> ElabResult<Ast> {
        let (terms, types, usages) = self.infer_fields(ctx, row)?;
        let (tail, tail_usages) = self.row_tail(ctx, row.tail())?;
        let type_tail: ValueRow = match tail {
            Row::Variable(_) => Row::Variable(Variable::Meta(self.fresh_meta(ctx, Value::row_kind()))),
            _ => Row::Empty,
        };
        Ok(Ast {
            term: Term::structure(Row::from_fields(terms, tail)),
            ty: Value::schema(Row::from_fields(types, type_tail)),
            usages: usages.add(&tail_usages),
        })
    }

    /// A struct literal in type position is a schema: every field is a type.
    pub(super) fn check_schema(&mut self, ctx: &Context, row: &SurfaceRow) -> ElabResult<(Term, Usages)> {
        let (terms, usages) = self.check_type_fields(ctx, row)?;
        let (tail, tail_usages) = self.row_tail(ctx, row.tail())?;
        Ok((Term::schema(Row::from_fields(terms, tail)), usages.add(&tail_usages)))
    }

    fn check_type_fields(&mut self, ctx: &Context, row: &SurfaceRow) -> ElabResult<(Vec<(String, Term)>, Usages)> {
        let ty = Value::ty();
        let scope = self.open_row(ctx, row, Some(&ty));
        let mut terms = Vec::new();
        let mut usages = ctx.zeros();
        for ((label, field), sigma) in row.fields().zip(&scope.sigmas) {
            let (term, field_usages) = self.check(&scope.ctx, field, &ty)?;
            let value = self.eval(&scope.ctx, &term)?;
            self.assign(&scope.ctx, value, sigma.nf.clone());
            usages = usages.add(&field_usages);
            terms.push((label.to_string(), term));
        }
        Ok((terms, usages))
    }

    /// `| a: A | b: B`: a variant type.
    pub(super) fn infer_variant(&mut self, ctx: &Context, row: &SurfaceRow) -> ElabResult<Ast> {
        let (terms, usages) = self.check_type_fields(ctx, row)?;
        let (tail, tail_usages) = self.row_tail(ctx, row.tail())?;
        Ok(Ast {
            term: Term::variant(Row::from_fields(terms, tail)),
            ty: Value::ty(),
            usages: usages.add(&tail_usages),
        })
    }

    /// `#tag value` inhabits any variant that has `tag`.
    pub(super) fn infer_tagged(&mut self, ctx: &Context, tag: &str, value: &src::Term) -> ElabResult<Ast> {
        let ast = self.infer(ctx, value)?;
        let rest = self.fresh_meta(ctx, Value::row_kind());
        Ok(Ast {
            term: Term::structure(Row::extend(tag, ast.term, Row::Empty)),
            ty: Value::variant(Row::extend(tag, ast.ty, Row::Variable(Variable::Meta(rest)))),
            usages: ast.usages,
        })
    }

    pub(super) fn infer_list(&mut self, ctx: &Context, items: &[src::Term]) -> ElabResult<Ast> {
        let element = self.fresh(ctx, Value::ty());
        let mut terms = Vec::with_capacity(items.len());
        let mut usages = ctx.zeros();
        for item in items {
            let (term, item_usages) = self.check(ctx, item, &element)?;
            usages = usages.add(&item_usages);
            terms.push(term);
        }
        Ok(Ast {
            term: Term::list(terms),
            ty: Value::array(element),
            usages,
        })
    }

    /// `{ label: ?a | ?r }`, the least a projection needs to know.
    fn open_schema(&mut self, ctx: &Context, label: &str, field: Value) -> Value {
        let rest = Row::Variable(Variable::Meta(self.fresh_meta(ctx, Value::row_kind())));
        Value::schema(Row::extend(label, field, rest))
    }

    pub(super) fn infer_projection(&mut self, ctx: &Context, term: &src::Term, label: &str) -> ElabResult<Ast> {
        let target = self.infer(ctx, term)?;
        let forced = force(&target.ty, &self.state.zonker)?;
        let known = forced.tagged_row(atoms::SCHEMA).and_then(|row| row.get(label)).cloned();
        let ty = match known {
            Some(ty) => ty,
            None => {
                let field = self.fresh(ctx, Value::ty());
                let shape = self.open_schema(ctx, label, field.clone());
                self.assign(ctx, target.ty.clone(), shape);
                field
            }
        };
        Ok(Ast {
            term: Term::Proj {
                term: Box::new(target.term),
                label: label.to_string(),
            },
            ty,
            usages: target.usages,
        })
    }

    /// `{ term | label = value }` sets or adds one field.
    pub(super) fn infer_injection(
        &mut self,
        ctx: &Context,
        term: &src::Term,
        label: &str,
        value: &src::Term,
    ) -> ElabResult<Ast> {
        let target = self.infer(ctx, term)?;
        let field = self.infer(ctx, value)?;
        let forced = force(&target.ty, &self.state.zonker)?;
        let ty = match forced.tagged_row(atoms::SCHEMA) {
            Some(row) => Value::schema(row.insert(label, field.ty.clone())),
            None => {
                let rest: ValueRow = Row::Variable(Variable::Meta(self.fresh_meta(ctx, Value::row_kind())));
                self.assign(ctx, target.ty.clone(), Value::schema(rest.clone()));
                Value::schema(Row::extend(label, field.ty.clone(), rest))
            }
        };
        Ok(Ast {
            term: Term::Inj {
                term: Box::new(target.term),
                label: label.to_string(),
                value: Box::new(field.term),
            },
            ty,
            usages: target.usages.add(&field.usages),
        })
    }
}
