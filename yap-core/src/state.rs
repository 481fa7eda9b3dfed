#![forbid(unsafe_code)]

//! Mutable bookkeeping threaded through one elaboration unit.

use std::collections::BTreeMap;

use yap_ast::Multiplicity;

use crate::provenance::Trace;
use crate::subst::Subst;
use crate::syntax::{Level, Meta, MetaId};
use crate::value::Value;

/// Source of fresh meta ids. One supply per elaboration unit keeps runs
/// reproducible.
#[derive(Clone, Debug, Default)]
pub struct Supply {
    next_meta: u32,
}

impl Supply {
    pub fn starting_at(next_meta: u32) -> Self {
        Self { next_meta }
    }

    /// The id the next fresh meta will get.
    pub fn issued(&self) -> u32 {
        self.next_meta
    }

    pub fn meta(&mut self, level: Level) -> Meta {
        let id = MetaId(self.next_meta);
        self.next_meta += 1;
        Meta { id, level }
    }
}

#[derive(Clone, Debug)]
pub struct MetaInfo {
    pub meta: Meta,
    /// The type of the meta.
    pub ann: Value,
}

#[derive(Clone, Debug)]
pub enum Constraint {
    Assign { left: Value, right: Value, level: Level },
    Usage { expected: Multiplicity, computed: Multiplicity },
    Resolve { meta: Meta, annotation: Value },
}

/// A constraint together with the elaboration step that emitted it.
#[derive(Clone, Debug)]
pub struct Obligation {
    pub constraint: Constraint,
    pub trace: Trace,
}

#[derive(Clone, Debug, Default)]
pub struct State {
    pub supply: Supply,
    pub metas: BTreeMap<MetaId, MetaInfo>,
    pub constraints: Vec<Obligation>,
    /// Solutions committed by the solver. Only ever grows.
    pub zonker: Subst,
    /// Skolems introduced by `shift`, in creation order.
    pub skolems: Vec<Meta>,
    /// Values supplied by each `resume` of a shift, keyed by its skolem.
    pub nondeterminism: BTreeMap<MetaId, Vec<Value>>,
}

impl State {
    /// A state whose fresh metas start at `next_meta`.
    pub fn starting_at(next_meta: u32) -> Self {
        Self {
            supply: Supply::starting_at(next_meta),
            ..Self::default()
        }
    }

    pub fn fresh_meta(&mut self, level: Level, ann: Value) -> Meta {
        let meta = self.supply.meta(level);
        log::debug!("fresh meta {meta} at level {} : {ann}", level.0);
        self.metas.insert(meta.id, MetaInfo { meta, ann });
        meta
    }

    pub fn annotation(&self, id: MetaId) -> Option<&Value> {
        self.metas.get(&id).map(|info| &info.ann)
    }

    pub fn emit(&mut self, constraint: Constraint, trace: &Trace) {
        log::debug!("emit {constraint:?}");
        self.constraints.push(Obligation {
            constraint,
            trace: trace.clone(),
        });
    }

    /// Folds solver output into the zonker without overwriting anything
    /// already resolved.
    pub fn commit(&mut self, solved: &Subst) {
        let zonker = std::mem::take(&mut self.zonker);
        self.zonker = zonker.compose(solved);
    }

    pub fn record_skolem(&mut self, skolem: Meta) {
        self.skolems.push(skolem);
        self.nondeterminism.entry(skolem.id).or_default();
    }

    pub fn record_resumption(&mut self, skolem: Meta, value: Value) {
        self.nondeterminism.entry(skolem.id).or_default().push(value);
    }

    pub fn resumptions(&self, skolem: Meta) -> &[Value] {
        self.nondeterminism.get(&skolem.id).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supply_is_sequential_per_state() {
        let mut a = State::default();
        let mut b = State::default();
        let m0 = a.fresh_meta(Level(0), Value::ty());
        let m1 = a.fresh_meta(Level(2), Value::ty());
        assert_eq!(m0.id, MetaId(0));
        assert_eq!(m1.id, MetaId(1));
        assert_eq!(m1.level, Level(2));
        assert_eq!(b.fresh_meta(Level(0), Value::ty()).id, MetaId(0));
    }

    #[test]
    fn seeded_supply_skips_issued_ids() {
        let mut state = State::starting_at(7);
        assert_eq!(state.fresh_meta(Level(0), Value::ty()).id, MetaId(7));
        assert_eq!(state.supply.issued(), 8);
    }

    #[test]
    fn commit_never_overwrites() {
        let mut state = State::default();
        let meta = state.fresh_meta(Level(0), Value::ty());
        state.commit(&Subst::empty().bind(meta.id, Value::num(1.0)));
        state.commit(&Subst::empty().bind(meta.id, Value::num(2.0)));
        assert!(matches!(state.zonker.get(meta.id), Some(Value::Lit(yap_ast::Literal::Num(n))) if *n == 1.0));
    }

    #[test]
    fn resumptions_accumulate_per_skolem() {
        let mut state = State::default();
        let skolem = state.fresh_meta(Level(0), Value::ty());
        state.record_skolem(skolem);
        assert!(state.resumptions(skolem).is_empty());
        state.record_resumption(skolem, Value::num(1.0));
        state.record_resumption(skolem, Value::num(2.0));
        assert_eq!(state.resumptions(skolem).len(), 2);
    }
}
