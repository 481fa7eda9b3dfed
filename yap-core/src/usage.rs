#![forbid(unsafe_code)]

use std::fmt;

use yap_ast::Multiplicity;

use crate::syntax::Index;

/// Per-binder usage counts, aligned with the context: position `i` is the
/// variable with de Bruijn index `i`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Usages(Vec<Multiplicity>);

impl Usages {
    pub fn zeros(len: usize) -> Self {
        Usages(vec![Multiplicity::Zero; len])
    }

    pub fn one_hot(len: usize, index: Index) -> Self {
        let mut us = Self::zeros(len);
        if let Some(slot) = us.0.get_mut(index.0) {
            *slot = Multiplicity::One;
        }
        us
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: Index) -> Multiplicity {
        self.0.get(index.0).copied().unwrap_or(Multiplicity::Zero)
    }

    /// Usage of the innermost binder.
    pub fn head(&self) -> Multiplicity {
        self.get(Index(0))
    }

    /// Drops the innermost binder.
    pub fn tail(&self) -> Usages {
        Usages(self.0.iter().skip(1).copied().collect())
    }

    pub fn strip(&self, binders: usize) -> Usages {
        Usages(self.0.iter().skip(binders).copied().collect())
    }

    pub fn add(&self, other: &Usages) -> Usages {
        self.zip_with(other, Multiplicity::add)
    }

    pub fn join(&self, other: &Usages) -> Usages {
        self.zip_with(other, Multiplicity::join)
    }

    pub fn scale(&self, q: Multiplicity) -> Usages {
        Usages(self.0.iter().map(|u| q.mul(*u)).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = Multiplicity> + '_ {
        self.0.iter().copied()
    }

    fn zip_with(&self, other: &Usages, f: impl Fn(Multiplicity, Multiplicity) -> Multiplicity) -> Usages {
        let len = self.0.len().max(other.0.len());
        Usages(
            (0..len)
                .map(|i| f(self.get(Index(i)), other.get(Index(i))))
                .collect(),
        )
    }
}

impl fmt::Display for Usages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, q) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{q}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yap_ast::Multiplicity::*;

    #[test]
    fn one_hot_marks_single_binder() {
        let us = Usages::one_hot(3, Index(1));
        assert_eq!(us.iter().collect::<Vec<_>>(), vec![Zero, One, Zero]);
    }

    #[test]
    fn add_then_scale() {
        let x = Usages::one_hot(2, Index(0));
        let twice = x.add(&x);
        assert_eq!(twice.head(), Many);
        assert_eq!(x.scale(Zero).head(), Zero);
        assert_eq!(twice.tail(), Usages::zeros(1));
    }

    #[test]
    fn join_disagreeing_branches_is_unrestricted() {
        let used = Usages::one_hot(1, Index(0));
        let unused = Usages::zeros(1);
        assert_eq!(used.join(&unused).head(), Many);
        assert_eq!(used.join(&used).head(), One);
    }
}
