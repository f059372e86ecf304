use std::{fmt, iter::{self, FromIterator}};
use bit_vec::BitVec;

/// A growable set of bit indices.
///
/// This is a thin wrapper around [`BitVec`] which grows on insertion
/// and accepts operands of different lengths in binary operations:
/// bits past the end of a vector read as zero.  Literals and actions
/// are mapped to bit indices by their identifiers (see
/// [`LiteralId::index()`] and [`ActionId::index()`]), so that set
/// tests on preconditions, effects and mutex partners reduce to a
/// few word operations.
///
/// [`LiteralId::index()`]: crate::LiteralId::index()
/// [`ActionId::index()`]: crate::ActionId::index()
#[derive(Clone, Default)]
pub struct Bits(BitVec);

impl Bits {
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets bit `ndx`.  Returns `false` if it was already set.
    pub fn insert(&mut self, ndx: usize) -> bool {
        let len = self.0.len();

        if ndx >= len {
            self.0.grow(ndx + 1 - len, false);
        } else if self.0[ndx] {
            return false
        }

        self.0.set(ndx, true);

        true
    }

    /// Clears bit `ndx`.  Returns `false` if it wasn't set.
    pub fn remove(&mut self, ndx: usize) -> bool {
        if self.contains(ndx) {
            self.0.set(ndx, false);
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn contains(&self, ndx: usize) -> bool {
        self.0.get(ndx).unwrap_or(false)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.none()
    }

    pub fn count(&self) -> usize {
        self.0.storage().iter().map(|block| block.count_ones() as usize).sum()
    }

    /// Returns `true` if the two sets aren't disjoint.
    pub fn intersects(&self, other: &Self) -> bool {
        self.0.storage().iter().zip(other.0.storage().iter()).any(|(x, y)| x & y != 0)
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        let others = other.0.storage().iter().copied().chain(iter::repeat(0));

        self.0.storage().iter().zip(others).all(|(x, y)| x & !y == 0)
    }

    /// Returns `true` if this set is a subset of the union of `a` and
    /// `b`.
    pub fn is_covered_by(&self, a: &Self, b: &Self) -> bool {
        let a_blocks = a.0.storage().iter().copied().chain(iter::repeat(0));
        let b_blocks = b.0.storage().iter().copied().chain(iter::repeat(0));

        self.0.storage().iter().zip(a_blocks.zip(b_blocks)).all(|(x, (y, z))| x & !(y | z) == 0)
    }

    pub fn union_with(&mut self, other: &Self) {
        for ndx in other.iter() {
            self.insert(ndx);
        }
    }

    /// Iterates over the indices of all set bits in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().filter_map(|(ndx, bit)| if bit { Some(ndx) } else { None })
    }
}

impl PartialEq for Bits {
    fn eq(&self, other: &Self) -> bool {
        let (short, long) = if self.0.storage().len() <= other.0.storage().len() {
            (self.0.storage(), other.0.storage())
        } else {
            (other.0.storage(), self.0.storage())
        };

        short.iter().copied().chain(iter::repeat(0)).zip(long.iter()).all(|(x, &y)| x == y)
    }
}

impl Eq for Bits {}

impl FromIterator<usize> for Bits {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut result = Bits::new();

        for ndx in iter {
            result.insert(ndx);
        }

        result
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
