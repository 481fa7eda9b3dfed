use std::fmt;

/// Usage quantity of a bound variable.
///
/// `Zero` means erased, `One` linear and `Many` unrestricted. Together with
/// [`Multiplicity::add`] and [`Multiplicity::mul`] these form a semiring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    Zero,
    One,
    #[default]
    Many,
}

impl Multiplicity {
    pub fn add(self, other: Multiplicity) -> Multiplicity {
        use Multiplicity::*;
        match (self, other) {
            (Zero, q) | (q, Zero) => q,
            _ => Many,
        }
    }

    pub fn mul(self, other: Multiplicity) -> Multiplicity {
        use Multiplicity::*;
        match (self, other) {
            (Zero, _) | (_, Zero) => Zero,
            (One, q) | (q, One) => q,
            (Many, Many) => Many,
        }
    }

    /// Least upper bound across alternative branches: equal usages are kept,
    /// anything else needs an unrestricted binder.
    pub fn join(self, other: Multiplicity) -> Multiplicity {
        if self == other { self } else { Multiplicity::Many }
    }

    /// Whether a binder declared with `self` may be used `computed` times.
    pub fn admits(self, computed: Multiplicity) -> bool {
        use Multiplicity::*;
        matches!((self, computed), (One, One) | (Many, _) | (Zero, Zero))
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Multiplicity::Zero => f.write_str("0"),
            Multiplicity::One => f.write_str("1"),
            Multiplicity::Many => f.write_str("ω"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Multiplicity::{self, *};

    const ALL: [Multiplicity; 3] = [Zero, One, Many];

    #[test]
    fn addition_table() {
        assert_eq!(Zero.add(Zero), Zero);
        assert_eq!(One.add(Zero), One);
        assert_eq!(Zero.add(One), One);
        assert_eq!(One.add(One), Many);
        assert_eq!(Many.add(Zero), Many);
    }

    #[test]
    fn multiplication_table() {
        assert_eq!(Zero.mul(Many), Zero);
        assert_eq!(One.mul(Many), Many);
        assert_eq!(One.mul(One), One);
        assert_eq!(Many.mul(Many), Many);
    }

    #[test]
    fn semiring_laws_hold() {
        for a in ALL {
            assert_eq!(a.add(Zero), a);
            assert_eq!(a.mul(One), a);
            assert_eq!(a.mul(Zero), Zero);
            for b in ALL {
                assert_eq!(a.add(b), b.add(a));
                assert_eq!(a.mul(b), b.mul(a));
                for c in ALL {
                    assert_eq!(a.mul(b.add(c)), a.mul(b).add(a.mul(c)));
                    assert_eq!(a.add(b.add(c)), a.add(b).add(c));
                }
            }
        }
    }

    #[test]
    fn admissible_usages() {
        assert!(One.admits(One));
        assert!(Zero.admits(Zero));
        assert!(Many.admits(Zero) && Many.admits(One) && Many.admits(Many));
        assert!(!One.admits(Many));
        assert!(!One.admits(Zero));
        assert!(!Zero.admits(One));
    }
}
