#![forbid(unsafe_code)]

use std::fmt;

use miette::SourceSpan;

pub mod dsl;
mod quantity;
mod row;
mod term;

pub use quantity::Multiplicity;
pub use row::{Fields, Row};
pub use term::{Alternative, Pattern, PatternKind, Statement, Term, TermKind};

pub type Span = SourceSpan;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub node: T,
}

impl<T> Spanned<T> {
    pub fn new(span: Span, node: T) -> Self {
        Self { span, node }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            span: self.span,
            node: f(self.node),
        }
    }
}

pub fn span(start: usize, len: usize) -> Span {
    SourceSpan::new(start.into(), len)
}

pub fn span_between(start: usize, end: usize) -> Span {
    debug_assert!(end >= start);
    span(start, end - start)
}

pub type Ident = Spanned<String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Implicitness {
    Explicit,
    Implicit,
}

/// Literal payloads shared by surface terms, core terms and values.
///
/// `Atom` names a type-level constant (`Num`, `Type`, `Schema`, ...).
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Num(f64),
    Bool(bool),
    String(String),
    Unit,
    Atom(String),
}

impl Literal {
    pub fn atom(name: impl Into<String>) -> Self {
        Literal::Atom(name.into())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Num(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{n:.0}"),
            Literal::Num(n) => write!(f, "{n}"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::String(s) => write!(f, "{s:?}"),
            Literal::Unit => f.write_str("!"),
            Literal::Atom(a) => f.write_str(a),
        }
    }
}
