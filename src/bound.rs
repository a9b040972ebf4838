//! Cardinality bounds and range arithmetic.
//!
//! `Unbounded` is a variant, never a magic count: it orders after every
//! finite bound and absorbs addition.
use std::fmt;
use std::ops::Add;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bound {
    Finite(u64),
    Unbounded,
}

impl From<u64> for Bound {
    fn from(n: u64) -> Self { Bound::Finite(n) }
}

impl Bound {
    pub fn finite(self) -> Option<u64> {
        match self {
            Bound::Finite(n) => Some(n),
            Bound::Unbounded => None,
        }
    }
}

impl Add for Bound {
    type Output = Bound;

    fn add(self, rhs: Bound) -> Bound {
        match (self, rhs) {
            (Bound::Finite(a), Bound::Finite(b)) => a.checked_add(b).map_or(Bound::Unbounded, Bound::Finite),
            _ => Bound::Unbounded,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Finite(n) => write!(f, "{n}"),
            Bound::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// An item-count range `[min, max]`. The lower end is always concrete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnRange {
    pub min: u64,
    pub max: Bound,
}

impl ColumnRange {
    pub const ZERO: ColumnRange = ColumnRange { min: 0, max: Bound::Finite(0) };

    pub fn new(min: u64, max: impl Into<Bound>) -> Self {
        Self { min, max: max.into() }
    }

    /// Exactly `n` items.
    pub fn exact(n: u64) -> Self {
        Self::new(n, n)
    }
}

impl Add for ColumnRange {
    type Output = ColumnRange;

    fn add(self, rhs: ColumnRange) -> ColumnRange {
        add_ranges(self, rhs)
    }
}

impl fmt::Display for ColumnRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.min, self.max)
    }
}

/// Sum of two ranges. Minimums add (saturating); maximums add unless either
/// side is unbounded.
pub fn add_ranges(a: ColumnRange, b: ColumnRange) -> ColumnRange {
    ColumnRange {
        min: a.min.saturating_add(b.min),
        max: a.max + b.max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_absorbs_the_maximum() {
        let open = ColumnRange::new(0, Bound::Unbounded);
        let fixed = ColumnRange::new(2, 5u64);
        assert_eq!(add_ranges(open, fixed), ColumnRange::new(2, Bound::Unbounded));
        assert_eq!(add_ranges(fixed, open), ColumnRange::new(2, Bound::Unbounded));
    }

    #[test]
    fn finite_ranges_add_componentwise() {
        assert_eq!(ColumnRange::new(1, 3u64) + ColumnRange::new(2, 4u64), ColumnRange::new(3, 7u64));
        assert_eq!(ColumnRange::ZERO + ColumnRange::exact(4), ColumnRange::exact(4));
    }

    #[test]
    fn addition_is_associative() {
        let a = ColumnRange::new(1, 3u64);
        let b = ColumnRange::new(0, Bound::Unbounded);
        let c = ColumnRange::exact(2);
        assert_eq!((a + b) + c, a + (b + c));
    }

    #[test]
    fn overflow_widens_instead_of_wrapping() {
        let big = ColumnRange::exact(u64::MAX);
        let sum = big + ColumnRange::exact(1);
        assert_eq!(sum.min, u64::MAX);
        assert_eq!(sum.max, Bound::Unbounded);
    }

    #[test]
    fn bounds_order_unbounded_last() {
        assert!(Bound::Finite(u64::MAX) < Bound::Unbounded);
        assert_eq!(Bound::Finite(3).max(Bound::Finite(2)), Bound::Finite(3));
        assert_eq!(Bound::Unbounded.to_string(), "unbounded");
    }
}
