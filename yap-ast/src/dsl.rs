//! Builders for surface trees with a placeholder span, for callers that
//! construct terms without going through the parser.

use crate::{
    Alternative, Ident, Implicitness, Literal, Multiplicity, Pattern, PatternKind, Row, Span,
    Spanned, Statement, Term, TermKind, span,
};

fn nowhere() -> Span {
    span(0, 0)
}

pub fn ident(name: &str) -> Ident {
    Spanned::new(nowhere(), name.to_string())
}

pub fn term(kind: TermKind) -> Term {
    Term {
        span: nowhere(),
        kind,
    }
}

pub fn var(name: &str) -> Term {
    term(TermKind::Var(name.to_string()))
}

pub fn num(n: f64) -> Term {
    term(TermKind::Lit(Literal::Num(n)))
}

pub fn boolean(b: bool) -> Term {
    term(TermKind::Lit(Literal::Bool(b)))
}

pub fn string(s: &str) -> Term {
    term(TermKind::Lit(Literal::String(s.to_string())))
}

pub fn unit() -> Term {
    term(TermKind::Lit(Literal::Unit))
}

pub fn hole() -> Term {
    term(TermKind::Hole)
}

pub fn lam(param: &str, body: Term) -> Term {
    term(TermKind::Lambda {
        icit: Implicitness::Explicit,
        param: ident(param),
        annotation: None,
        multiplicity: None,
        body: Box::new(body),
    })
}

pub fn lam_ann(param: &str, annotation: Term, body: Term) -> Term {
    term(TermKind::Lambda {
        icit: Implicitness::Explicit,
        param: ident(param),
        annotation: Some(Box::new(annotation)),
        multiplicity: None,
        body: Box::new(body),
    })
}

pub fn lam_q(param: &str, q: Multiplicity, annotation: Term, body: Term) -> Term {
    term(TermKind::Lambda {
        icit: Implicitness::Explicit,
        param: ident(param),
        annotation: Some(Box::new(annotation)),
        multiplicity: Some(q),
        body: Box::new(body),
    })
}

pub fn ilam(param: &str, body: Term) -> Term {
    term(TermKind::Lambda {
        icit: Implicitness::Implicit,
        param: ident(param),
        annotation: None,
        multiplicity: None,
        body: Box::new(body),
    })
}

pub fn app(func: Term, arg: Term) -> Term {
    term(TermKind::App {
        icit: Implicitness::Explicit,
        func: Box::new(func),
        arg: Box::new(arg),
    })
}

pub fn iapp(func: Term, arg: Term) -> Term {
    term(TermKind::App {
        icit: Implicitness::Implicit,
        func: Box::new(func),
        arg: Box::new(arg),
    })
}

pub fn apps(func: Term, args: impl IntoIterator<Item = Term>) -> Term {
    args.into_iter().fold(func, app)
}

/// `lhs op rhs` as the curried application of the operator import.
pub fn binop(op: &str, lhs: Term, rhs: Term) -> Term {
    apps(var(op), [lhs, rhs])
}

pub fn pi(param: &str, domain: Term, codomain: Term) -> Term {
    term(TermKind::Pi {
        icit: Implicitness::Explicit,
        param: ident(param),
        multiplicity: None,
        domain: Box::new(domain),
        codomain: Box::new(codomain),
    })
}

pub fn pi_q(param: &str, q: Multiplicity, domain: Term, codomain: Term) -> Term {
    term(TermKind::Pi {
        icit: Implicitness::Explicit,
        param: ident(param),
        multiplicity: Some(q),
        domain: Box::new(domain),
        codomain: Box::new(codomain),
    })
}

pub fn ipi(param: &str, domain: Term, codomain: Term) -> Term {
    term(TermKind::Pi {
        icit: Implicitness::Implicit,
        param: ident(param),
        multiplicity: None,
        domain: Box::new(domain),
        codomain: Box::new(codomain),
    })
}

pub fn arrow(domain: Term, codomain: Term) -> Term {
    term(TermKind::Arrow {
        icit: Implicitness::Explicit,
        domain: Box::new(domain),
        codomain: Box::new(codomain),
    })
}

pub fn mu(param: &str, annotation: Term, body: Term) -> Term {
    term(TermKind::Mu {
        param: ident(param),
        annotation: Box::new(annotation),
        body: Box::new(body),
    })
}

pub fn annotate(t: Term, ty: Term) -> Term {
    term(TermKind::Annotation {
        term: Box::new(t),
        ty: Box::new(ty),
    })
}

fn row_of<T>(fields: Vec<(&str, T)>, tail: Option<&str>) -> Row<T, Ident> {
    let tail = match tail {
        Some(name) => Row::Variable(ident(name)),
        None => Row::Empty,
    };
    Row::from_fields(fields.into_iter().map(|(l, v)| (l.to_string(), v)), tail)
}

pub fn row(fields: Vec<(&str, Term)>, tail: Option<&str>) -> Term {
    term(TermKind::Row(row_of(fields, tail)))
}

pub fn record(fields: Vec<(&str, Term)>) -> Term {
    term(TermKind::Struct(row_of(fields, None)))
}

pub fn tuple(items: Vec<Term>) -> Term {
    term(TermKind::Tuple(items))
}

pub fn variant(fields: Vec<(&str, Term)>) -> Term {
    term(TermKind::Variant(row_of(fields, None)))
}

pub fn tagged(tag: &str, value: Term) -> Term {
    term(TermKind::Tagged {
        tag: ident(tag),
        value: Box::new(value),
    })
}

pub fn list(items: Vec<Term>) -> Term {
    term(TermKind::List(items))
}

pub fn project(t: Term, label: &str) -> Term {
    term(TermKind::Projection {
        term: Box::new(t),
        label: ident(label),
    })
}

pub fn inject(t: Term, label: &str, value: Term) -> Term {
    term(TermKind::Injection {
        term: Box::new(t),
        label: ident(label),
        value: Box::new(value),
    })
}

pub fn matching(scrutinee: Term, alternatives: Vec<Alternative>) -> Term {
    term(TermKind::Match {
        scrutinee: Box::new(scrutinee),
        alternatives,
    })
}

pub fn alt(pattern: Pattern, body: Term) -> Alternative {
    Alternative {
        span: nowhere(),
        pattern,
        body,
    }
}

pub fn block(statements: Vec<Statement>, ret: Option<Term>) -> Term {
    term(TermKind::Block {
        statements,
        ret: ret.map(Box::new),
    })
}

pub fn modal(t: Term, quantity: Option<Multiplicity>, liquid: Option<Term>) -> Term {
    term(TermKind::Modal {
        term: Box::new(t),
        quantity,
        liquid: liquid.map(Box::new),
    })
}

pub fn reset(body: Term) -> Term {
    term(TermKind::Reset {
        handler: None,
        body: Box::new(body),
    })
}

pub fn reset_with(handler: Term, body: Term) -> Term {
    term(TermKind::Reset {
        handler: Some(Box::new(handler)),
        body: Box::new(body),
    })
}

pub fn shift(body: Term) -> Term {
    term(TermKind::Shift {
        body: Box::new(body),
    })
}

pub fn resume(value: Term) -> Term {
    term(TermKind::Resume {
        value: Box::new(value),
    })
}

pub fn let_(name: &str, annotation: Option<Term>, value: Term) -> Statement {
    Statement::Let {
        span: nowhere(),
        name: ident(name),
        annotation,
        multiplicity: None,
        value,
    }
}

pub fn expr(t: Term) -> Statement {
    Statement::Expression(t)
}

pub fn using(t: Term) -> Statement {
    Statement::Using {
        span: nowhere(),
        term: t,
    }
}

pub fn pattern(kind: PatternKind) -> Pattern {
    Pattern {
        span: nowhere(),
        kind,
    }
}

pub fn pwild() -> Pattern {
    pattern(PatternKind::Wildcard)
}

pub fn pnum(n: f64) -> Pattern {
    pattern(PatternKind::Lit(Literal::Num(n)))
}

pub fn plit(lit: Literal) -> Pattern {
    pattern(PatternKind::Lit(lit))
}

pub fn pvar(name: &str) -> Pattern {
    pattern(PatternKind::Var(ident(name)))
}

pub fn pstruct(fields: Vec<(&str, Pattern)>, tail: Option<&str>) -> Pattern {
    pattern(PatternKind::Struct(row_of(fields, tail)))
}

pub fn ptuple(items: Vec<Pattern>) -> Pattern {
    pattern(PatternKind::Tuple(items))
}

pub fn ptagged(tag: &str, inner: Pattern) -> Pattern {
    pattern(PatternKind::Variant(row_of(vec![(tag, inner)], None)))
}

pub fn plist(elements: Vec<Pattern>, rest: Option<&str>) -> Pattern {
    pattern(PatternKind::List {
        elements,
        rest: rest.map(ident),
    })
}
