#![forbid(unsafe_code)]

pub mod config;
pub mod context;
mod elab;
pub mod error;
pub mod eval;
mod generalize;
mod implicits;
pub mod interpret;
pub mod pretty;
mod prims;
pub mod provenance;
pub mod quote;
pub mod solver;
pub mod state;
pub mod subst;
pub mod syntax;
pub mod unify;
pub mod usage;
pub mod value;
pub mod verify;
pub mod zonk;

pub use config::ElabConfig;
pub use context::Context;
pub use elab::{Ast, Elaborator, PatternAst, Refinement, literal_type};
pub use error::{ConfigError, ElabError, ElabResult, ErrorKind, Fault};
pub use generalize::generalize;
pub use implicits::instantiate;
pub use interpret::{Interpreted, interpret, interpret_all};
pub use solver::{replay, solve};
pub use syntax::{Level, Meta, MetaId, Term};
pub use unify::{unify, unify_rows};
pub use value::Value;
pub use verify::{Artefacts, NoProver, Prover, Verdict, VerificationCondition};
