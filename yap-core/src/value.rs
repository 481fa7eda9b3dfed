#![forbid(unsafe_code)]

//! Level-based semantic values.

use std::fmt;
use std::rc::Rc;

use yap_ast::{Implicitness, Literal, Multiplicity, Row};

use crate::syntax::{Alternative, Index, Level, Meta, Modalities, Term, Variable, atoms};
use crate::usage::Usages;

pub type ValueRow = Row<Value, Variable<Level>>;

/// Arity-indexed primitive implementation. `None` signals arguments of the
/// wrong shape.
pub type Compute = fn(&[Value]) -> Option<Value>;

#[derive(Clone, Debug)]
pub enum Value {
    Lit(Literal),
    Var(Variable<Level>),
    App {
        icit: Implicitness,
        func: Rc<Value>,
        arg: Rc<Value>,
    },
    Row(ValueRow),
    Abs {
        binder: Binder,
        closure: Closure,
    },
    /// Marks a computation stuck on a variable, meta or unknown scrutinee.
    Neutral(Rc<Value>),
    Modal {
        value: Rc<Value>,
        modalities: Modalities<Rc<Value>>,
    },
    /// A partially applied primitive.
    External {
        name: String,
        arity: usize,
        compute: Compute,
        args: Vec<Value>,
    },
    Match(StuckMatch),
    Project {
        value: Rc<Value>,
        label: String,
    },
    Inject {
        value: Rc<Value>,
        label: String,
        field: Rc<Value>,
    },
}

#[derive(Clone, Debug)]
pub enum Binder {
    Lambda {
        variable: String,
        icit: Implicitness,
    },
    Pi {
        variable: String,
        icit: Implicitness,
        multiplicity: Multiplicity,
        annotation: Rc<Value>,
    },
    Mu {
        variable: String,
        annotation: Rc<Value>,
    },
}

impl Binder {
    pub fn variable(&self) -> &str {
        match self {
            Binder::Lambda { variable, .. } | Binder::Pi { variable, .. } | Binder::Mu { variable, .. } => variable,
        }
    }
}

/// A deferred body: the environment it was built in plus the unevaluated term.
#[derive(Clone, Debug)]
pub struct Closure {
    pub env: Env,
    pub term: Rc<Term>,
}

impl Closure {
    pub fn new(env: Env, term: Term) -> Self {
        Self {
            env,
            term: Rc::new(term),
        }
    }
}

/// A `match` whose scrutinee has not reduced to a constructor yet.
#[derive(Clone, Debug)]
pub struct StuckMatch {
    pub scrutinee: Rc<Value>,
    pub alternatives: Rc<[Alternative]>,
    pub env: Env,
}

/// A global definition visible through `Free` variables.
#[derive(Clone, Debug)]
pub struct Import {
    pub term: Term,
    pub ty: Value,
    pub usages: Usages,
}

#[derive(Clone, Debug)]
pub struct Primitive {
    pub arity: usize,
    pub compute: Compute,
}

#[derive(Clone, Debug, Default)]
pub struct Globals {
    pub imports: im::HashMap<String, Import>,
    pub ffi: im::HashMap<String, Primitive>,
    /// Imports may mention metas below this id. Units elaborated against
    /// these globals draw fresh metas from here on.
    pub metas_issued: u32,
}

/// Evaluation environment: one value per bound level, the values of row labels
/// currently in scope, and the globals.
#[derive(Clone)]
pub struct Env {
    values: im::Vector<Value>,
    labels: im::HashMap<String, Value>,
    globals: Rc<Globals>,
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("values", &self.values)
            .field("labels", &self.labels.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Env {
    pub fn new(globals: Rc<Globals>) -> Self {
        Self {
            values: im::Vector::new(),
            labels: im::HashMap::new(),
            globals,
        }
    }

    pub fn empty() -> Self {
        Self::new(Rc::new(Globals::default()))
    }

    /// An environment of `depth` rigid variables.
    pub fn rigid(globals: Rc<Globals>, depth: Level) -> Self {
        let mut env = Self::new(globals);
        for level in 0..depth.0 {
            env.values.push_back(Value::rigid(Level(level)));
        }
        env
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn level(&self) -> Level {
        Level(self.values.len())
    }

    pub fn push(&self, value: Value) -> Env {
        let mut env = self.clone();
        env.values.push_back(value);
        env
    }

    pub fn extend(&self, values: impl IntoIterator<Item = Value>) -> Env {
        let mut env = self.clone();
        env.values.extend(values);
        env
    }

    pub fn lookup(&self, index: Index) -> Option<&Value> {
        let len = self.values.len();
        if index.0 >= len {
            return None;
        }
        self.values.get(len - index.0 - 1)
    }

    pub fn label(&self, name: &str) -> Option<&Value> {
        self.labels.get(name)
    }

    pub fn with_label(&self, name: &str, value: Value) -> Env {
        let mut env = self.clone();
        env.labels.insert(name.to_string(), value);
        env
    }

    pub fn globals(&self) -> &Rc<Globals> {
        &self.globals
    }

    pub fn with_globals(&self, globals: Rc<Globals>) -> Env {
        Env {
            globals,
            ..self.clone()
        }
    }
}

impl Value {
    pub fn atom(name: &str) -> Value {
        Value::Lit(Literal::atom(name))
    }

    pub fn ty() -> Value {
        Value::atom(atoms::TYPE)
    }

    pub fn row_kind() -> Value {
        Value::atom(atoms::ROW)
    }

    pub fn num(n: f64) -> Value {
        Value::Lit(Literal::Num(n))
    }

    pub fn rigid(level: Level) -> Value {
        Value::Neutral(Rc::new(Value::Var(Variable::Bound(level))))
    }

    pub fn flex(meta: Meta) -> Value {
        Value::Neutral(Rc::new(Value::Var(Variable::Meta(meta))))
    }

    pub fn app(func: Value, arg: Value) -> Value {
        Value::App {
            icit: Implicitness::Explicit,
            func: Rc::new(func),
            arg: Rc::new(arg),
        }
    }

    fn tagged(tag: &str, row: ValueRow) -> Value {
        Value::app(Value::atom(tag), Value::Row(row))
    }

    pub fn schema(row: ValueRow) -> Value {
        Value::tagged(atoms::SCHEMA, row)
    }

    pub fn structure(row: ValueRow) -> Value {
        Value::tagged(atoms::STRUCT, row)
    }

    pub fn variant(row: ValueRow) -> Value {
        Value::tagged(atoms::VARIANT, row)
    }

    pub fn array(element: Value) -> Value {
        Value::app(Value::atom(atoms::ARRAY), element)
    }

    pub fn pi(variable: &str, icit: Implicitness, multiplicity: Multiplicity, annotation: Value, closure: Closure) -> Value {
        Value::Abs {
            binder: Binder::Pi {
                variable: variable.to_string(),
                icit,
                multiplicity,
                annotation: Rc::new(annotation),
            },
            closure,
        }
    }

    /// Strips `Neutral` and `Modal` wrappers.
    pub fn strip(&self) -> &Value {
        match self {
            Value::Neutral(inner) => inner.strip(),
            Value::Modal { value, .. } => value.strip(),
            _ => self,
        }
    }

    pub fn as_flex(&self) -> Option<Meta> {
        match self.strip() {
            Value::Var(Variable::Meta(meta)) => Some(*meta),
            _ => None,
        }
    }

    pub fn as_rigid(&self) -> Option<Level> {
        match self.strip() {
            Value::Var(Variable::Bound(level)) => Some(*level),
            _ => None,
        }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, Value::Neutral(_))
    }

    pub fn is_atom(&self, name: &str) -> bool {
        matches!(self.strip(), Value::Lit(Literal::Atom(a)) if a == name)
    }

    /// The row of a `Schema`, `Struct`, `Variant` or `List` application tagged
    /// with `tag`.
    pub fn tagged_row(&self, tag: &str) -> Option<&ValueRow> {
        match self.strip() {
            Value::App { func, arg, .. } if func.is_atom(tag) => match arg.strip() {
                Value::Row(row) => Some(row),
                _ => None,
            },
            _ => None,
        }
    }
}
