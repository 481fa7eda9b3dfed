#![forbid(unsafe_code)]

//! Index-based core terms produced by elaboration.

use yap_ast::{Implicitness, Literal, Multiplicity, Row};

use crate::error::Fault;

/// Names of the type-level atoms the elaborator relies on.
pub mod atoms {
    pub const TYPE: &str = "Type";
    pub const NUM: &str = "Num";
    pub const BOOL: &str = "Bool";
    pub const STRING: &str = "String";
    pub const UNIT: &str = "Unit";
    pub const ROW: &str = "Row";
    pub const SCHEMA: &str = "Schema";
    pub const STRUCT: &str = "Struct";
    pub const VARIANT: &str = "Variant";
    pub const LIST: &str = "List";
    pub const ARRAY: &str = "Array";
}

/// De Bruijn index: distance to the binder, counted from the innermost one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Index(pub usize);

/// De Bruijn level: position of the binder, counted from the outermost one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Level(pub usize);

impl Level {
    pub fn next(self) -> Level {
        Level(self.0 + 1)
    }

    pub fn plus(self, n: usize) -> Level {
        Level(self.0 + n)
    }

    /// Index of this level when seen from under `depth` binders.
    pub fn to_index(self, depth: Level) -> Index {
        if self.0 >= depth.0 {
            log::warn!("bound level {} escapes depth {}", self.0, depth.0);
        }
        Index(depth.0.saturating_sub(self.0 + 1))
    }
}

impl Index {
    pub fn to_level(self, depth: Level) -> Level {
        Level(depth.0.saturating_sub(self.0 + 1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetaId(pub u32);

/// A unification variable together with the level it was created at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Meta {
    pub id: MetaId,
    pub level: Level,
}

/// Variables are generic over how bound occurrences are addressed: terms use
/// [`Index`], values use [`Level`].
#[derive(Clone, Debug, PartialEq)]
pub enum Variable<B> {
    Bound(B),
    Free(String),
    Label(String),
    Foreign(String),
    Meta(Meta),
}

pub type TermRow = Row<Term, Variable<Index>>;

#[derive(Clone, Debug, PartialEq)]
pub struct Modalities<T> {
    pub quantity: Multiplicity,
    pub liquid: Option<T>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    Lambda {
        variable: String,
        icit: Implicitness,
    },
    Pi {
        variable: String,
        icit: Implicitness,
        multiplicity: Multiplicity,
        annotation: Box<Term>,
    },
    Mu {
        variable: String,
        annotation: Box<Term>,
    },
}

impl Binding {
    pub fn variable(&self) -> &str {
        match self {
            Binding::Lambda { variable, .. }
            | Binding::Pi { variable, .. }
            | Binding::Mu { variable, .. } => variable,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    Lit(Literal),
    Var(Variable<Index>),
    App {
        icit: Implicitness,
        func: Box<Term>,
        arg: Box<Term>,
    },
    Abs {
        binding: Binding,
        body: Box<Term>,
    },
    Row(TermRow),
    Proj {
        term: Box<Term>,
        label: String,
    },
    Inj {
        term: Box<Term>,
        label: String,
        value: Box<Term>,
    },
    Match {
        scrutinee: Box<Term>,
        alternatives: Vec<Alternative>,
    },
    Block {
        statements: Vec<Statement>,
        ret: Box<Term>,
    },
    Modal {
        term: Box<Term>,
        modalities: Modalities<Box<Term>>,
    },
    Reset {
        handler: Option<Box<Term>>,
        body: Box<Term>,
    },
    /// The body is under one binder: the captured continuation.
    Shift {
        skolem: Meta,
        body: Box<Term>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Alternative {
    pub pattern: Pattern,
    /// Names bound by `pattern`, outermost first.
    pub binders: Vec<String>,
    pub body: Term,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    Wildcard,
    Binder(String),
    Lit(Literal),
    /// A global compared for equality.
    Var { name: String, term: Box<Term> },
    Struct(Row<Pattern, String>),
    Row(Row<Pattern, String>),
    Variant(Row<Pattern, String>),
    List {
        elements: Vec<Pattern>,
        rest: Option<String>,
    },
}

impl Pattern {
    /// Binder names in the order they are pushed into the context.
    pub fn binders(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_binders(&mut out);
        out
    }

    fn collect_binders(&self, out: &mut Vec<String>) {
        match self {
            Pattern::Binder(name) => out.push(name.clone()),
            Pattern::Struct(row) | Pattern::Row(row) | Pattern::Variant(row) => {
                for (_, p) in row.fields() {
                    p.collect_binders(out);
                }
                if let Some(tail) = row.tail() {
                    out.push(tail.clone());
                }
            }
            Pattern::List { elements, rest } => {
                for p in elements {
                    p.collect_binders(out);
                }
                if let Some(rest) = rest {
                    out.push(rest.clone());
                }
            }
            Pattern::Wildcard | Pattern::Lit(_) | Pattern::Var { .. } => {}
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    /// Binds one variable for the remaining statements.
    Let {
        variable: String,
        value: Term,
        annotation: Term,
    },
    Expression(Term),
    Using(Term),
}

impl Term {
    pub fn atom(name: &str) -> Term {
        Term::Lit(Literal::atom(name))
    }

    pub fn bound(index: usize) -> Term {
        Term::Var(Variable::Bound(Index(index)))
    }

    pub fn meta(meta: Meta) -> Term {
        Term::Var(Variable::Meta(meta))
    }

    pub fn foreign(name: &str) -> Term {
        Term::Var(Variable::Foreign(name.to_string()))
    }

    pub fn app(func: Term, arg: Term) -> Term {
        Term::App {
            icit: Implicitness::Explicit,
            func: Box::new(func),
            arg: Box::new(arg),
        }
    }

    pub fn pi(variable: &str, icit: Implicitness, multiplicity: Multiplicity, annotation: Term, body: Term) -> Term {
        Term::Abs {
            binding: Binding::Pi {
                variable: variable.to_string(),
                icit,
                multiplicity,
                annotation: Box::new(annotation),
            },
            body: Box::new(body),
        }
    }

    pub fn arrow(domain: Term, codomain: Term) -> Term {
        Term::pi("_", Implicitness::Explicit, Multiplicity::Many, domain, codomain)
    }

    pub fn lambda(variable: &str, icit: Implicitness, body: Term) -> Term {
        Term::Abs {
            binding: Binding::Lambda {
                variable: variable.to_string(),
                icit,
            },
            body: Box::new(body),
        }
    }

    fn tagged(tag: &str, row: TermRow) -> Term {
        Term::app(Term::atom(tag), Term::Row(row))
    }

    pub fn schema(row: TermRow) -> Term {
        Term::tagged(atoms::SCHEMA, row)
    }

    pub fn structure(row: TermRow) -> Term {
        Term::tagged(atoms::STRUCT, row)
    }

    pub fn variant(row: TermRow) -> Term {
        Term::tagged(atoms::VARIANT, row)
    }

    pub fn list(items: Vec<Term>) -> Term {
        let fields = items.into_iter().enumerate().map(|(i, t)| (i.to_string(), t));
        Term::tagged(atoms::LIST, Row::from_fields(fields, Row::Empty))
    }

    /// Rebuilds the term with every meta occurrence offered to `f`, which
    /// receives the meta and the number of binders above the occurrence.
    /// Returning `None` keeps the meta. A replacement row for a row tail is
    /// spliced in place.
    pub fn rewrite_metas(
        &self,
        depth: Level,
        f: &mut dyn FnMut(Meta, Level) -> Result<Option<Term>, Fault>,
    ) -> Result<Term, Fault> {
        Ok(match self {
            Term::Lit(_) => self.clone(),
            Term::Var(Variable::Meta(meta)) => match f(*meta, depth)? {
                Some(term) => term,
                None => self.clone(),
            },
            Term::Var(_) => self.clone(),
            Term::App { icit, func, arg } => Term::App {
                icit: *icit,
                func: Box::new(func.rewrite_metas(depth, f)?),
                arg: Box::new(arg.rewrite_metas(depth, f)?),
            },
            Term::Abs { binding, body } => {
                let binding = match binding {
                    Binding::Lambda { .. } => binding.clone(),
                    Binding::Pi {
                        variable,
                        icit,
                        multiplicity,
                        annotation,
                    } => Binding::Pi {
                        variable: variable.clone(),
                        icit: *icit,
                        multiplicity: *multiplicity,
                        annotation: Box::new(annotation.rewrite_metas(depth, f)?),
                    },
                    Binding::Mu {
                        variable,
                        annotation,
                    } => Binding::Mu {
                        variable: variable.clone(),
                        annotation: Box::new(annotation.rewrite_metas(depth, f)?),
                    },
                };
                Term::Abs {
                    binding,
                    body: Box::new(body.rewrite_metas(depth.next(), f)?),
                }
            }
            Term::Row(row) => Term::Row(rewrite_row(row, depth, f)?),
            Term::Proj { term, label } => Term::Proj {
                term: Box::new(term.rewrite_metas(depth, f)?),
                label: label.clone(),
            },
            Term::Inj { term, label, value } => Term::Inj {
                term: Box::new(term.rewrite_metas(depth, f)?),
                label: label.clone(),
                value: Box::new(value.rewrite_metas(depth, f)?),
            },
            Term::Match {
                scrutinee,
                alternatives,
            } => Term::Match {
                scrutinee: Box::new(scrutinee.rewrite_metas(depth, f)?),
                alternatives: alternatives
                    .iter()
                    .map(|alt| {
                        Ok(Alternative {
                            pattern: alt.pattern.clone(),
                            binders: alt.binders.clone(),
                            body: alt.body.rewrite_metas(depth.plus(alt.binders.len()), f)?,
                        })
                    })
                    .collect::<Result<_, Fault>>()?,
            },
            Term::Block { statements, ret } => {
                let mut depth = depth;
                let mut out = Vec::with_capacity(statements.len());
                for stmt in statements {
                    out.push(match stmt {
                        Statement::Let {
                            variable,
                            value,
                            annotation,
                        } => {
                            let stmt = Statement::Let {
                                variable: variable.clone(),
                                value: value.rewrite_metas(depth, f)?,
                                annotation: annotation.rewrite_metas(depth, f)?,
                            };
                            depth = depth.next();
                            stmt
                        }
                        Statement::Expression(t) => Statement::Expression(t.rewrite_metas(depth, f)?),
                        Statement::Using(t) => Statement::Using(t.rewrite_metas(depth, f)?),
                    });
                }
                Term::Block {
                    statements: out,
                    ret: Box::new(ret.rewrite_metas(depth, f)?),
                }
            }
            Term::Modal { term, modalities } => Term::Modal {
                term: Box::new(term.rewrite_metas(depth, f)?),
                modalities: Modalities {
                    quantity: modalities.quantity,
                    liquid: match &modalities.liquid {
                        Some(p) => Some(Box::new(p.rewrite_metas(depth, f)?)),
                        None => None,
                    },
                },
            },
            Term::Reset { handler, body } => Term::Reset {
                handler: match handler {
                    Some(h) => Some(Box::new(h.rewrite_metas(depth, f)?)),
                    None => None,
                },
                body: Box::new(body.rewrite_metas(depth, f)?),
            },
            Term::Shift { skolem, body } => Term::Shift {
                skolem: *skolem,
                body: Box::new(body.rewrite_metas(depth.next(), f)?),
            },
        })
    }

    /// Metas occurring anywhere in the term, in first-occurrence order.
    pub fn metas(&self) -> Vec<Meta> {
        let mut found: Vec<Meta> = Vec::new();
        let _ = self.rewrite_metas(Level(0), &mut |meta, _| {
            if !found.iter().any(|m| m.id == meta.id) {
                found.push(meta);
            }
            Ok(None)
        });
        found
    }
}

fn rewrite_row(
    row: &TermRow,
    depth: Level,
    f: &mut dyn FnMut(Meta, Level) -> Result<Option<Term>, Fault>,
) -> Result<TermRow, Fault> {
    match row {
        Row::Empty => Ok(Row::Empty),
        Row::Extension { label, value, rest } => Ok(Row::extend(
            label.clone(),
            value.rewrite_metas(depth, f)?,
            rewrite_row(rest, depth, f)?,
        )),
        Row::Variable(Variable::Meta(meta)) => Ok(match f(*meta, depth)? {
            Some(Term::Row(spliced)) => spliced,
            Some(Term::Var(var)) => Row::Variable(var),
            Some(_) | None => row.clone(),
        }),
        Row::Variable(_) => Ok(row.clone()),
    }
}
