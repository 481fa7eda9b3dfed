#![forbid(unsafe_code)]

//! The elaboration context: what is in scope at a given point.
//!
//! Contexts are persistent. Extending one returns a new context and leaves
//! the original untouched, so a nested scope can never leak bindings.

use std::rc::Rc;

use yap_ast::Multiplicity;

use crate::error::{ElabError, ElabResult, ErrorKind};
use crate::provenance::{Provenance, Trace};
use crate::syntax::{Index, Level, Meta, Term, Variable};
use crate::usage::Usages;
use crate::value::{Env, Globals, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum EntryKind {
    Lambda,
    Pi,
    Let,
    Mu,
    Pattern,
    /// The continuation bound by a `shift`.
    Continuation { skolem: Meta },
}

#[derive(Clone, Debug)]
pub struct Entry {
    pub name: String,
    pub ty: Value,
    pub multiplicity: Multiplicity,
    pub kind: EntryKind,
}

/// Value and type of a label visible inside the row that declares it.
#[derive(Clone, Debug)]
pub struct Sigma {
    pub nf: Value,
    pub ann: Value,
}

/// A `using` instance available to implicit resolution. Values are
/// level-addressed, so the instance can be quoted back at any deeper scope.
#[derive(Clone, Debug)]
pub struct Implicit {
    pub value: Value,
    pub ty: Value,
}

/// Answer types of an enclosing `reset`.
#[derive(Clone, Debug)]
pub struct Delimitation {
    pub initial: Value,
    pub result: Value,
}

#[derive(Clone, Debug)]
pub struct Context {
    pub env: Env,
    entries: im::Vector<Entry>,
    sigma: im::HashMap<String, Sigma>,
    implicits: im::Vector<Implicit>,
    delimitations: im::Vector<Delimitation>,
    pub trace: Trace,
}

/// Result of resolving a name.
#[derive(Clone, Debug)]
pub struct Lookup {
    pub term: Term,
    pub ty: Value,
    pub usages: Usages,
}

impl Context {
    pub fn new(globals: Rc<Globals>) -> Self {
        Self {
            env: Env::new(globals),
            entries: im::Vector::new(),
            sigma: im::HashMap::new(),
            implicits: im::Vector::new(),
            delimitations: im::Vector::new(),
            trace: Trace::default(),
        }
    }

    /// An empty context over the built-in primitives and base types.
    pub fn prelude() -> Self {
        Self::new(Rc::new(Globals::prelude()))
    }

    pub fn level(&self) -> Level {
        self.env.level()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn globals(&self) -> &Rc<Globals> {
        self.env.globals()
    }

    pub fn with_globals(&self, globals: Rc<Globals>) -> Context {
        Context {
            env: self.env.with_globals(globals),
            ..self.clone()
        }
    }

    /// Raises the globals' meta watermark to `issued`.
    pub fn issued_metas(&self, issued: u32) -> Context {
        if issued <= self.globals().metas_issued {
            return self.clone();
        }
        let mut globals = (**self.globals()).clone();
        globals.metas_issued = issued;
        self.with_globals(Rc::new(globals))
    }

    /// Binder names, outermost first.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn entry(&self, index: Index) -> Option<&Entry> {
        let len = self.entries.len();
        index.0.checked_add(1).and_then(|n| len.checked_sub(n)).and_then(|i| self.entries.get(i))
    }

    /// Opens a binder whose value is unknown: a rigid variable.
    pub fn bind(&self, name: &str, ty: Value, multiplicity: Multiplicity, kind: EntryKind) -> Context {
        let value = Value::rigid(self.level());
        self.define(name, ty, value, multiplicity, kind)
    }

    /// Opens a binder with a known value.
    pub fn define(&self, name: &str, ty: Value, value: Value, multiplicity: Multiplicity, kind: EntryKind) -> Context {
        let mut ctx = self.clone();
        ctx.env = ctx.env.push(value);
        ctx.entries.push_back(Entry {
            name: name.to_string(),
            ty,
            multiplicity,
            kind,
        });
        ctx
    }

    pub fn with_sigma(&self, label: &str, sigma: Sigma) -> Context {
        let mut ctx = self.clone();
        ctx.env = ctx.env.with_label(label, sigma.nf.clone());
        ctx.sigma.insert(label.to_string(), sigma);
        ctx
    }

    pub fn using(&self, implicit: Implicit) -> Context {
        let mut ctx = self.clone();
        ctx.implicits.push_back(implicit);
        ctx
    }

    /// Instances in scope, most recent first.
    pub fn implicits(&self) -> impl Iterator<Item = &Implicit> {
        self.implicits.iter().rev()
    }

    pub fn delimit(&self, delimitation: Delimitation) -> Context {
        let mut ctx = self.clone();
        ctx.delimitations.push_back(delimitation);
        ctx
    }

    pub fn delimitation(&self) -> Option<&Delimitation> {
        self.delimitations.last()
    }

    /// The innermost delimitation with its initial answer type replaced by
    /// its final one, for elaborating a `shift` body.
    pub fn shifted(&self) -> Option<Context> {
        let current = self.delimitations.last()?.clone();
        let mut ctx = self.clone();
        ctx.delimitations.pop_back();
        ctx.delimitations.push_back(Delimitation {
            initial: current.result.clone(),
            result: current.result,
        });
        Some(ctx)
    }

    /// Nearest continuation binder, as an index.
    pub fn continuation(&self) -> Option<(Index, &Entry)> {
        self.entries
            .iter()
            .rev()
            .enumerate()
            .find(|(_, e)| matches!(e.kind, EntryKind::Continuation { .. }))
            .map(|(i, e)| (Index(i), e))
    }

    pub fn track(&self, provenance: Provenance) -> Context {
        Context {
            trace: self.trace.push(provenance),
            ..self.clone()
        }
    }

    /// Resolves `name`: bound variables first (innermost wins), then labels of
    /// the enclosing rows, then globals.
    pub fn lookup(&self, name: &str) -> ElabResult<Lookup> {
        let len = self.entries.len();
        if let Some((i, entry)) = self.entries.iter().rev().enumerate().find(|(_, e)| e.name == name) {
            log::trace!("lookup {name}: bound at index {i}");
            return Ok(Lookup {
                term: Term::bound(i),
                ty: entry.ty.clone(),
                usages: Usages::one_hot(len, Index(i)),
            });
        }
        if let Some(sigma) = self.sigma.get(name) {
            log::trace!("lookup {name}: row label");
            return Ok(Lookup {
                term: Term::Var(Variable::Label(name.to_string())),
                ty: sigma.ann.clone(),
                usages: Usages::zeros(len),
            });
        }
        if let Some(import) = self.globals().imports.get(name) {
            log::trace!("lookup {name}: global");
            return Ok(Lookup {
                term: Term::Var(Variable::Free(name.to_string())),
                ty: import.ty.clone(),
                usages: Usages::zeros(len),
            });
        }
        Err(ElabError::new(ErrorKind::UndefinedVariable(name.to_string())).within(&self.trace))
    }

    pub fn zeros(&self) -> Usages {
        Usages::zeros(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innermost_binding_shadows() {
        let ctx = Context::prelude()
            .bind("x", Value::atom("Num"), Multiplicity::Many, EntryKind::Lambda)
            .bind("y", Value::atom("Bool"), Multiplicity::Many, EntryKind::Lambda)
            .bind("x", Value::atom("String"), Multiplicity::One, EntryKind::Lambda);
        let found = ctx.lookup("x").unwrap();
        assert_eq!(found.term, Term::bound(0));
        assert!(found.ty.is_atom("String"));
        assert_eq!(found.usages.head(), Multiplicity::One);

        let y = ctx.lookup("y").unwrap();
        assert_eq!(y.term, Term::bound(1));
        assert_eq!(y.usages.get(Index(1)), Multiplicity::One);
        assert_eq!(y.usages.head(), Multiplicity::Zero);
    }

    #[test]
    fn globals_are_free_and_unused() {
        let ctx = Context::prelude().bind("x", Value::atom("Num"), Multiplicity::Many, EntryKind::Lambda);
        let found = ctx.lookup("Num").unwrap();
        assert_eq!(found.term, Term::Var(Variable::Free("Num".to_string())));
        assert!(found.usages.iter().all(|q| q == Multiplicity::Zero));
    }

    #[test]
    fn unknown_names_fail() {
        let err = Context::prelude().lookup("nope").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UndefinedVariable(ref n) if n == "nope"));
    }

    #[test]
    fn extension_does_not_touch_the_original() {
        let outer = Context::prelude();
        let inner = outer.bind("x", Value::atom("Num"), Multiplicity::Many, EntryKind::Lambda);
        assert_eq!(outer.level(), Level(0));
        assert_eq!(inner.level(), Level(1));
        assert!(outer.lookup("x").is_err());
    }

    #[test]
    fn shifting_swaps_the_initial_answer() {
        let ctx = Context::prelude().delimit(Delimitation {
            initial: Value::atom("Num"),
            result: Value::atom("Bool"),
        });
        let shifted = ctx.shifted().unwrap();
        assert!(shifted.delimitation().unwrap().initial.is_atom("Bool"));
        assert!(ctx.delimitation().unwrap().initial.is_atom("Num"));
        assert!(Context::prelude().shifted().is_none());
    }
}
