#![forbid(unsafe_code)]

use std::fmt;

use miette::{Diagnostic, LabeledSpan};
use thiserror::Error;
use yap_ast::{Implicitness, Multiplicity, Span};

use crate::provenance::{Provenance, Trace};
use crate::syntax::{Level, Meta};
use crate::value::Value;

pub const DEFAULT_PROVENANCE_CAP: usize = 10;

/// A hard failure of evaluation or quotation: a construct the normaliser
/// cannot handle, as opposed to an ordinary type error.
#[derive(Debug, Error, Diagnostic)]
pub enum Fault {
    #[error("not implemented: {0}")]
    #[diagnostic(code(yap::fault::unsupported))]
    Unsupported(String),

    #[error("unbound index {index} in an environment of {len} values")]
    #[diagnostic(code(yap::fault::index))]
    UnboundIndex { index: usize, len: usize },

    #[error("unknown global `{0}`")]
    #[diagnostic(code(yap::fault::global))]
    UnknownGlobal(String),

    #[error("cannot apply {0} to an argument")]
    #[diagnostic(code(yap::fault::apply))]
    NotAFunction(String),

    #[error("primitive `{0}` cannot compute with its arguments")]
    #[diagnostic(code(yap::fault::primitive))]
    Primitive(String),

    #[error("no alternative matches {0}")]
    #[diagnostic(code(yap::fault::no_match))]
    NoMatch(String),
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("Unification Failure: Cannot unify {left} with {right}")]
    UnificationFailure { left: Value, right: Value },

    #[error("Type Mismatch: {left} and {right} have different binder shapes")]
    TypeMismatch { left: Value, right: Value },

    #[error("Implicitness Mismatch: expected an {expected:?} argument but found an {found:?} one")]
    ImplicitnessMismatch {
        expected: Implicitness,
        found: Implicitness,
    },

    #[error("Rigid variables are different: #{} and #{}", .left.0, .right.0)]
    RigidVariableMismatch { left: Level, right: Level },

    #[error("Multiplicity Mismatch: declared {expected} but used {computed}")]
    MultiplicityMismatch {
        expected: Multiplicity,
        computed: Multiplicity,
    },

    #[error("occurs check failed: {meta} occurs in {value}")]
    OccursCheck { meta: Meta, value: Value },

    #[error("Missing Label: `{label}`")]
    MissingLabel { label: String },

    #[error("Row Mismatch: cannot reconcile {left} with {right}")]
    RowMismatch { left: String, right: String },

    #[error("expected a row, but `{name}` has type {ty}")]
    NotARow { name: String, ty: Value },

    #[error("no alternative matches {0}")]
    NoMatchingAlternative(String),

    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),

    #[error("shift without enclosing reset")]
    ShiftWithoutReset,

    #[error("resume without enclosing shift")]
    ResumeWithoutShift,

    #[error("unsupported construct: {0}")]
    Unsupported(String),
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnificationFailure { .. } => "yap::elab::unify",
            ErrorKind::TypeMismatch { .. } => "yap::elab::type_mismatch",
            ErrorKind::ImplicitnessMismatch { .. } => "yap::elab::implicitness",
            ErrorKind::RigidVariableMismatch { .. } => "yap::elab::rigid",
            ErrorKind::MultiplicityMismatch { .. } => "yap::elab::multiplicity",
            ErrorKind::OccursCheck { .. } => "yap::elab::occurs",
            ErrorKind::MissingLabel { .. } => "yap::elab::missing_label",
            ErrorKind::RowMismatch { .. } => "yap::elab::row",
            ErrorKind::NotARow { .. } => "yap::elab::not_a_row",
            ErrorKind::NoMatchingAlternative(_) => "yap::elab::no_match",
            ErrorKind::UndefinedVariable(_) => "yap::elab::undefined",
            ErrorKind::ShiftWithoutReset => "yap::elab::shift",
            ErrorKind::ResumeWithoutShift => "yap::elab::resume",
            ErrorKind::Unsupported(_) => "yap::elab::unsupported",
        }
    }

    /// Programming-boundary failures that abort the elaboration unit.
    pub fn is_fault(&self) -> bool {
        matches!(self, ErrorKind::Unsupported(_))
    }
}

#[derive(Debug, Error)]
#[error("{kind}")]
pub struct ElabError {
    pub kind: ErrorKind,
    pub span: Option<Span>,
    /// Innermost frame first.
    pub provenance: Vec<Provenance>,
    /// Frames shown when the error is rendered as a diagnostic.
    pub frame_cap: usize,
}

pub type ElabResult<T> = Result<T, ElabError>;

impl ElabError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            span: None,
            provenance: Vec::new(),
            frame_cap: DEFAULT_PROVENANCE_CAP,
        }
    }

    pub fn capped(mut self, cap: usize) -> Self {
        self.frame_cap = cap;
        self
    }

    /// Attaches the frames of `trace` outside the ones already recorded.
    pub fn within(mut self, trace: &Trace) -> Self {
        if self.span.is_none() {
            self.span = trace.span();
        }
        self.provenance.extend(trace.frames());
        self
    }

    /// Records one more frame outside the existing ones.
    pub fn framed(mut self, frame: Provenance) -> Self {
        self.provenance.push(frame);
        self
    }

    pub fn is_fault(&self) -> bool {
        self.kind.is_fault()
    }

    /// At most `cap` frames, then a count of the ones left out.
    fn frames(&self, cap: usize) -> Vec<String> {
        let mut lines: Vec<String> = self.provenance.iter().take(cap).map(ToString::to_string).collect();
        if self.provenance.len() > cap {
            lines.push(format!("... {} more frames", self.provenance.len() - cap));
        }
        lines
    }

    /// Headline plus at most `cap` provenance frames.
    pub fn report(&self, cap: usize) -> String {
        let mut out = self.kind.to_string();
        for line in self.frames(cap) {
            out.push_str("\n  ");
            out.push_str(&line);
        }
        out
    }
}

impl From<Fault> for ElabError {
    fn from(fault: Fault) -> Self {
        ElabError::new(ErrorKind::Unsupported(fault.to_string()))
    }
}

impl Diagnostic for ElabError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        if self.provenance.is_empty() {
            return None;
        }
        Some(Box::new(self.frames(self.frame_cap).join("\n")))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some("here".to_string()),
            span,
        ))))
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    #[diagnostic(code(yap::config::io))]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    #[diagnostic(code(yap::config::parse))]
    Parse(#[from] toml::de::Error),
}
