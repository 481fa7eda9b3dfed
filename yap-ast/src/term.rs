use std::fmt;

use crate::{Ident, Implicitness, Literal, Multiplicity, Row, Span};

/// Surface term as handed over by the parser.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    pub span: Span,
    pub kind: TermKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TermKind {
    Var(String),
    Lit(Literal),
    /// `_` in term position.
    Hole,
    Lambda {
        icit: Implicitness,
        param: Ident,
        annotation: Option<Box<Term>>,
        multiplicity: Option<Multiplicity>,
        body: Box<Term>,
    },
    App {
        icit: Implicitness,
        func: Box<Term>,
        arg: Box<Term>,
    },
    Pi {
        icit: Implicitness,
        param: Ident,
        multiplicity: Option<Multiplicity>,
        domain: Box<Term>,
        codomain: Box<Term>,
    },
    Arrow {
        icit: Implicitness,
        domain: Box<Term>,
        codomain: Box<Term>,
    },
    /// `mu x: T. body`
    Mu {
        param: Ident,
        annotation: Box<Term>,
        body: Box<Term>,
    },
    Annotation {
        term: Box<Term>,
        ty: Box<Term>,
    },
    Row(Row<Term, Ident>),
    Struct(Row<Term, Ident>),
    Tuple(Vec<Term>),
    /// `| a: T | b: U`
    Variant(Row<Term, Ident>),
    /// `#tag value`
    Tagged {
        tag: Ident,
        value: Box<Term>,
    },
    List(Vec<Term>),
    Projection {
        term: Box<Term>,
        label: Ident,
    },
    /// `{ term | label = value }`
    Injection {
        term: Box<Term>,
        label: Ident,
        value: Box<Term>,
    },
    Match {
        scrutinee: Box<Term>,
        alternatives: Vec<Alternative>,
    },
    Block {
        statements: Vec<Statement>,
        ret: Option<Box<Term>>,
    },
    /// `T<q> [| p |]`
    Modal {
        term: Box<Term>,
        quantity: Option<Multiplicity>,
        liquid: Option<Box<Term>>,
    },
    Reset {
        handler: Option<Box<Term>>,
        body: Box<Term>,
    },
    /// `shift body`; the body may `resume` the captured continuation.
    Shift {
        body: Box<Term>,
    },
    Resume {
        value: Box<Term>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Alternative {
    pub span: Span,
    pub pattern: Pattern,
    pub body: Term,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Let {
        span: Span,
        name: Ident,
        annotation: Option<Term>,
        multiplicity: Option<Multiplicity>,
        value: Term,
    },
    Expression(Term),
    /// Registers `term` as an instance for implicit resolution.
    Using {
        span: Span,
        term: Term,
    },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Let { span, .. } | Statement::Using { span, .. } => *span,
            Statement::Expression(term) => term.span,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    pub span: Span,
    pub kind: PatternKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PatternKind {
    Wildcard,
    Lit(Literal),
    Var(Ident),
    Struct(Row<Pattern, Ident>),
    Tuple(Vec<Pattern>),
    Row(Row<Pattern, Ident>),
    Variant(Row<Pattern, Ident>),
    List {
        elements: Vec<Pattern>,
        rest: Option<Ident>,
    },
}

struct Tail<'a>(&'a Ident);

impl fmt::Display for Tail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.node)
    }
}

fn write_fields<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    row: &Row<T, Ident>,
    sep: &str,
) -> fmt::Result {
    for (i, (label, value)) in row.fields().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{label}{sep}{value}")?;
    }
    if let Some(tail) = row.tail() {
        write!(f, " | {}", Tail(tail))?;
    }
    Ok(())
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn braces(icit: Implicitness) -> (&'static str, &'static str) {
    match icit {
        Implicitness::Explicit => ("(", ")"),
        Implicitness::Implicit => ("{", "}"),
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TermKind::Var(name) => f.write_str(name),
            TermKind::Lit(lit) => write!(f, "{lit}"),
            TermKind::Hole => f.write_str("_"),
            TermKind::Lambda {
                icit,
                param,
                annotation,
                body,
                ..
            } => {
                let (open, close) = braces(*icit);
                match annotation {
                    Some(ann) => write!(f, "\\{open}{}: {ann}{close} -> {body}", param.node),
                    None if *icit == Implicitness::Implicit => {
                        write!(f, "\\{open}{}{close} -> {body}", param.node)
                    }
                    None => write!(f, "\\{} -> {body}", param.node),
                }
            }
            TermKind::App { icit, func, arg } => match icit {
                Implicitness::Explicit => write!(f, "({func} {arg})"),
                Implicitness::Implicit => write!(f, "({func} @{arg})"),
            },
            TermKind::Pi {
                icit,
                param,
                multiplicity,
                domain,
                codomain,
            } => {
                let (open, close) = braces(*icit);
                match multiplicity {
                    Some(q) => write!(f, "{open}{q} {}: {domain}{close} -> {codomain}", param.node),
                    None => write!(f, "{open}{}: {domain}{close} -> {codomain}", param.node),
                }
            }
            TermKind::Arrow {
                domain, codomain, ..
            } => write!(f, "{domain} -> {codomain}"),
            TermKind::Mu {
                param,
                annotation,
                body,
            } => write!(f, "mu {}: {annotation}. {body}", param.node),
            TermKind::Annotation { term, ty } => write!(f, "({term} : {ty})"),
            TermKind::Row(row) => {
                f.write_str("[")?;
                write_fields(f, row, ": ")?;
                f.write_str("]")
            }
            TermKind::Struct(row) => {
                f.write_str("{ ")?;
                write_fields(f, row, ": ")?;
                f.write_str(" }")
            }
            TermKind::Tuple(items) => {
                f.write_str("{ ")?;
                write_list(f, items)?;
                f.write_str(" }")
            }
            TermKind::Variant(row) => {
                for (label, value) in row.fields() {
                    write!(f, "| {label}: {value} ")?;
                }
                Ok(())
            }
            TermKind::Tagged { tag, value } => write!(f, "#{} {value}", tag.node),
            TermKind::List(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            TermKind::Projection { term, label } => write!(f, "{term}.{}", label.node),
            TermKind::Injection { term, label, value } => {
                write!(f, "{{ {term} | {} = {value} }}", label.node)
            }
            TermKind::Match {
                scrutinee,
                alternatives,
            } => {
                write!(f, "match {scrutinee}")?;
                for alt in alternatives {
                    write!(f, " | {} -> {}", alt.pattern, alt.body)?;
                }
                Ok(())
            }
            TermKind::Block { statements, ret } => {
                f.write_str("{ ")?;
                for stmt in statements {
                    write!(f, "{stmt}; ")?;
                }
                if let Some(ret) = ret {
                    write!(f, "return {ret}; ")?;
                }
                f.write_str("}")
            }
            TermKind::Modal {
                term,
                quantity,
                liquid,
            } => {
                write!(f, "{term}")?;
                if let Some(q) = quantity {
                    write!(f, "<{q}>")?;
                }
                if let Some(p) = liquid {
                    write!(f, " [| {p} |]")?;
                }
                Ok(())
            }
            TermKind::Reset { handler, body } => match handler {
                Some(h) => write!(f, "reset {body} with {h}"),
                None => write!(f, "reset {body}"),
            },
            TermKind::Shift { body } => write!(f, "shift {body}"),
            TermKind::Resume { value } => write!(f, "resume {value}"),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let {
                name,
                annotation,
                value,
                ..
            } => match annotation {
                Some(ann) => write!(f, "let {} : {ann} = {value}", name.node),
                None => write!(f, "let {} = {value}", name.node),
            },
            Statement::Expression(term) => write!(f, "{term}"),
            Statement::Using { term, .. } => write!(f, "using {term}"),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PatternKind::Wildcard => f.write_str("_"),
            PatternKind::Lit(lit) => write!(f, "{lit}"),
            PatternKind::Var(name) => f.write_str(&name.node),
            PatternKind::Struct(row) => {
                f.write_str("{ ")?;
                write_fields(f, row, ": ")?;
                f.write_str(" }")
            }
            PatternKind::Tuple(items) => {
                f.write_str("{ ")?;
                write_list(f, items)?;
                f.write_str(" }")
            }
            PatternKind::Row(row) => {
                f.write_str("[")?;
                write_fields(f, row, ": ")?;
                f.write_str("]")
            }
            PatternKind::Variant(row) => {
                for (i, (label, value)) in row.fields().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "#{label} {value}")?;
                }
                Ok(())
            }
            PatternKind::List { elements, rest } => {
                f.write_str("[")?;
                write_list(f, elements)?;
                if let Some(rest) = rest {
                    write!(f, " | {}", rest.node)?;
                }
                f.write_str("]")
            }
        }
    }
}
