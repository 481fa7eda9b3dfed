#![forbid(unsafe_code)]

use yap_ast::{self as src, Ident, Multiplicity, PatternKind, Row};

use super::{Elaborator, literal_type};
use crate::context::{Context, EntryKind};
use crate::error::{ElabError, ElabResult, ErrorKind};
use crate::syntax::{Pattern, Term, Variable};
use crate::value::{Value, ValueRow};

/// An elaborated pattern: its core form, the type of values it matches, and
/// the variables it binds in binding order.
#[derive(Clone, Debug)]
pub struct PatternAst {
    pub pattern: Pattern,
    pub ty: Value,
    pub binders: Vec<(String, Value)>,
}

impl PatternAst {
    /// `ctx` extended with the pattern's binders.
    pub fn bind(&self, ctx: &Context) -> Context {
        self.binders.iter().fold(ctx.clone(), |ctx, (name, ty)| {
            ctx.bind(name, ty.clone(), Multiplicity::Many, EntryKind::Pattern)
        })
    }
}

struct Fields {
    patterns: Vec<(String, Pattern)>,
    types: Vec<(String, Value)>,
    binders: Vec<(String, Value)>,
}

impl Elaborator {
    pub fn infer_pattern(&mut self, ctx: &Context, pattern: &src::Pattern) -> ElabResult<PatternAst> {
        match &pattern.kind {
            PatternKind::Wildcard => Ok(PatternAst {
                pattern: Pattern::Wildcard,
                ty: self.fresh(ctx, Value::ty()),
                binders: Vec::new(),
            }),
            PatternKind::Lit(lit) => Ok(PatternAst {
                pattern: Pattern::Lit(lit.clone()),
                ty: literal_type(lit),
                binders: Vec::new(),
            }),
            PatternKind::Var(name) => {
                // Globals are compared against; any other name binds.
                if let Ok(found) = ctx.lookup(&name.node) {
                    if let Term::Var(Variable::Free(_)) = found.term {
                        return Ok(PatternAst {
                            pattern: Pattern::Var {
                                name: name.node.clone(),
                                term: Box::new(found.term),
                            },
                            ty: found.ty,
                            binders: Vec::new(),
                        });
                    }
                }
                let ty = self.fresh(ctx, Value::ty());
                Ok(PatternAst {
                    pattern: Pattern::Binder(name.node.clone()),
                    binders: vec![(name.node.clone(), ty.clone())],
                    ty,
                })
            }
            PatternKind::Struct(row) => {
                let fields = self.pattern_fields(ctx, row)?;
                let (tail, binders) = self.pattern_tail(ctx, row.tail(), fields.binders, Value::schema);
                Ok(PatternAst {
                    pattern: Pattern::Struct(Row::from_fields(fields.patterns, name_tail(row.tail()))),
                    ty: Value::schema(Row::from_fields(fields.types, tail)),
                    binders,
                })
            }
            PatternKind::Tuple(items) => {
                let row = Row::from_fields(
                    items.iter().enumerate().map(|(i, p)| (i.to_string(), p.clone())),
                    Row::Empty,
                );
                let fields = self.pattern_fields(ctx, &row)?;
                Ok(PatternAst {
                    pattern: Pattern::Struct(Row::from_fields(fields.patterns, Row::Empty)),
                    ty: Value::schema(Row::from_fields(fields.types, Row::Empty)),
                    binders: fields.binders,
                })
            }
            PatternKind::Row(row) => {
                let fields = self.pattern_fields(ctx, row)?;
                let (_, binders) = self.pattern_tail(ctx, row.tail(), fields.binders, |_| Value::row_kind());
                Ok(PatternAst {
                    pattern: Pattern::Row(Row::from_fields(fields.patterns, name_tail(row.tail()))),
                    ty: Value::row_kind(),
                    binders,
                })
            }
            PatternKind::Variant(row) => {
                let fields = self.pattern_fields(ctx, row)?;
                let binding_arms = fields.patterns.iter().filter(|(_, p)| !p.binders().is_empty()).count();
                if binding_arms > 1 {
                    return Err(ElabError::new(ErrorKind::Unsupported(
                        "variant patterns may bind variables in at most one arm".to_string(),
                    )));
                }
                let rest = Row::Variable(Variable::Meta(self.fresh_meta(ctx, Value::row_kind())));
                Ok(PatternAst {
                    pattern: Pattern::Variant(Row::from_fields(fields.patterns, Row::Empty)),
                    ty: Value::variant(Row::from_fields(fields.types, rest)),
                    binders: fields.binders,
                })
            }
            PatternKind::List { elements, rest } => {
                let element = self.fresh(ctx, Value::ty());
                let mut patterns = Vec::with_capacity(elements.len());
                let mut binders = Vec::new();
                for p in elements {
                    let ast = self.infer_pattern(ctx, p)?;
                    self.assign(ctx, ast.ty, element.clone());
                    patterns.push(ast.pattern);
                    binders.extend(ast.binders);
                }
                if let Some(rest) = rest {
                    binders.push((rest.node.clone(), Value::array(element.clone())));
                }
                Ok(PatternAst {
                    pattern: Pattern::List {
                        elements: patterns,
                        rest: rest.as_ref().map(|r| r.node.clone()),
                    },
                    ty: Value::array(element),
                    binders,
                })
            }
        }
    }

    fn pattern_fields(&mut self, ctx: &Context, row: &Row<src::Pattern, Ident>) -> ElabResult<Fields> {
        let mut fields = Fields {
            patterns: Vec::new(),
            types: Vec::new(),
            binders: Vec::new(),
        };
        for (label, p) in row.fields() {
            let ast = self.infer_pattern(ctx, p)?;
            fields.patterns.push((label.to_string(), ast.pattern));
            fields.types.push((label.to_string(), ast.ty));
            fields.binders.extend(ast.binders);
        }
        Ok(fields)
    }

    /// A tail binder captures the remaining fields. Its row is a fresh meta;
    /// `wrap` turns that row into the binder's type.
    fn pattern_tail(
        &mut self,
        ctx: &Context,
        tail: Option<&Ident>,
        mut binders: Vec<(String, Value)>,
        wrap: impl FnOnce(ValueRow) -> Value,
    ) -> (ValueRow, Vec<(String, Value)>) {
        let Some(name) = tail else {
            return (Row::Empty, binders);
        };
        let rest: ValueRow = Row::Variable(Variable::Meta(self.fresh_meta(ctx, Value::row_kind())));
        binders.push((name.node.clone(), wrap(rest.clone())));
        (rest, binders)
    }
}

fn name_tail(tail: Option<&Ident>) -> Row<Pattern, String> {
    match tail {
        Some(name) => Row::Variable(name.node.clone()),
        None => Row::Empty,
    }
}
