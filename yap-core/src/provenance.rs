#![forbid(unsafe_code)]

use std::fmt;
use std::rc::Rc;

use yap_ast::Span;

use crate::value::{Value, ValueRow};

#[derive(Clone, Debug)]
pub enum Action {
    Infer,
    Check(Value),
}

/// One step of elaboration, recorded so failures can say where they happened.
#[derive(Clone, Debug)]
pub enum Provenance {
    Term {
        span: Span,
        term: String,
        description: &'static str,
        action: Action,
    },
    Alternative {
        span: Span,
        pattern: String,
    },
    Statement {
        span: Span,
        statement: String,
    },
    Unify {
        left: Value,
        right: Value,
    },
    Rows {
        left: ValueRow,
        right: ValueRow,
    },
}

impl Provenance {
    pub fn span(&self) -> Option<Span> {
        match self {
            Provenance::Term { span, .. }
            | Provenance::Alternative { span, .. }
            | Provenance::Statement { span, .. } => Some(*span),
            Provenance::Unify { .. } | Provenance::Rows { .. } => None,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Term {
                term,
                description,
                action: Action::Infer,
                ..
            } => write!(f, "while inferring {description} `{term}`"),
            Provenance::Term {
                term,
                description,
                action: Action::Check(ty),
                ..
            } => write!(f, "while checking {description} `{term}` against {ty}"),
            Provenance::Alternative { pattern, .. } => write!(f, "in alternative `{pattern}`"),
            Provenance::Statement { statement, .. } => write!(f, "in statement `{statement}`"),
            Provenance::Unify { left, right } => write!(f, "while unifying {left} with {right}"),
            Provenance::Rows { left, right } => write!(f, "while unifying rows {left} with {right}"),
        }
    }
}

/// Persistent stack of provenance frames. Pushing shares the parent.
#[derive(Clone, Debug, Default)]
pub struct Trace(Option<Rc<Frame>>);

#[derive(Debug)]
struct Frame {
    provenance: Provenance,
    parent: Trace,
}

impl Trace {
    pub fn push(&self, provenance: Provenance) -> Trace {
        Trace(Some(Rc::new(Frame {
            provenance,
            parent: self.clone(),
        })))
    }

    /// Frames from the innermost outwards.
    pub fn frames(&self) -> Vec<Provenance> {
        let mut out = Vec::new();
        let mut cursor = self;
        while let Some(frame) = &cursor.0 {
            out.push(frame.provenance.clone());
            cursor = &frame.parent;
        }
        out
    }

    /// Innermost source location on the stack.
    pub fn span(&self) -> Option<Span> {
        let mut cursor = self;
        while let Some(frame) = &cursor.0 {
            if let Some(span) = frame.provenance.span() {
                return Some(span);
            }
            cursor = &frame.parent;
        }
        None
    }

    pub fn depth(&self) -> usize {
        let mut n = 0;
        let mut cursor = self;
        while let Some(frame) = &cursor.0 {
            n += 1;
            cursor = &frame.parent;
        }
        n
    }
}
