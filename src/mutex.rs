//! Pairwise mutual exclusion relations of a layer.
//!
//! A relation is kept in two lockstep representations: explicit
//! partner sets, used for iteration, and one [`Bits`] vector per item,
//! used for constant-time pairwise tests and for testing a whole set
//! of items at once.
//!
//! [`MutexSet`] splits the mutex relation of a layer into static facts,
//! which hold at every later level, and dynamic facts, which depend on
//! the parent layer and are re-checked whenever a layer is extended.
//! Static facts are shared with the previous layer of the same kind
//! and copied only when a new static fact is recorded.

use std::{collections::{BTreeMap, BTreeSet}, fmt, rc::Rc};
use crate::{Bits, LiteralId, ActionId};

/// An item of a layer: a literal or an action, together with its bit
/// index.
pub trait Indexed: Copy + Ord + fmt::Debug {
    fn index(self) -> usize;
}

impl Indexed for LiteralId {
    #[inline]
    fn index(self) -> usize {
        LiteralId::index(self)
    }
}

impl Indexed for ActionId {
    #[inline]
    fn index(self) -> usize {
        ActionId::index(self)
    }
}

/// A symmetric, irreflexive relation over layer items.
#[derive(Clone, Debug)]
pub(crate) struct Relation<T: Indexed> {
    partners:  BTreeMap<T, BTreeSet<T>>,
    vectors:   BTreeMap<T, Bits>,
    num_pairs: usize,
}

impl<T: Indexed> Default for Relation<T> {
    fn default() -> Self {
        Self { partners: Default::default(), vectors: Default::default(), num_pairs: 0 }
    }
}

impl<T: Indexed> Relation<T> {
    /// Returns `false` if the pair was already related.
    pub(crate) fn insert(&mut self, a: T, b: T) -> bool {
        assert_ne!(a, b, "Attempt to make an item mutex with itself");

        if self.partners.entry(a).or_default().insert(b) {
            self.partners.entry(b).or_default().insert(a);
            self.vectors.entry(a).or_default().insert(b.index());
            self.vectors.entry(b).or_default().insert(a.index());
            self.num_pairs += 1;

            true
        } else {
            false
        }
    }

    /// Returns `false` if the pair wasn't related.
    pub(crate) fn remove(&mut self, a: T, b: T) -> bool {
        let removed = self.partners.get_mut(&a).map_or(false, |set| set.remove(&b));

        if removed {
            if let Some(set) = self.partners.get_mut(&b) {
                set.remove(&a);
            }
            if let Some(bits) = self.vectors.get_mut(&a) {
                bits.remove(b.index());
            }
            if let Some(bits) = self.vectors.get_mut(&b) {
                bits.remove(a.index());
            }
            self.num_pairs -= 1;
        }

        removed
    }

    #[inline]
    pub(crate) fn contains(&self, a: T, b: T) -> bool {
        self.vectors.get(&a).map_or(false, |bits| bits.contains(b.index()))
    }

    #[inline]
    pub(crate) fn get_vector(&self, a: T) -> Option<&Bits> {
        self.vectors.get(&a)
    }

    pub(crate) fn partners(&self, a: T) -> impl Iterator<Item = T> + '_ {
        self.partners.get(&a).into_iter().flat_map(|set| set.iter().copied())
    }

    /// Iterates over all related pairs, each listed once, smaller item
    /// first.
    pub(crate) fn pairs(&self) -> impl Iterator<Item = (T, T)> + '_ {
        self.partners
            .iter()
            .flat_map(|(&a, set)| set.range(a..).filter(move |&&b| b != a).map(move |&b| (a, b)))
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.num_pairs
    }
}

/// The mutex relation of a single layer, split into static and
/// dynamic facts.
#[derive(Clone, Debug)]
pub struct MutexSet<T: Indexed> {
    statics:  Rc<Relation<T>>,
    dynamics: Relation<T>,
}

impl<T: Indexed> Default for MutexSet<T> {
    fn default() -> Self {
        Self { statics: Default::default(), dynamics: Default::default() }
    }
}

impl<T: Indexed> MutexSet<T> {
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates the mutex set of the next layer of the same kind.
    ///
    /// The static table is shared until this set records a static
    /// fact of its own.  Dynamic facts are copied, to be re-checked
    /// against the new parent layer.
    pub fn inherit(&self) -> Self {
        Self { statics: Rc::clone(&self.statics), dynamics: self.dynamics.clone() }
    }

    #[inline]
    pub fn is_mutex(&self, a: T, b: T) -> bool {
        self.statics.contains(a, b) || self.dynamics.contains(a, b)
    }

    #[inline]
    pub fn is_static_mutex(&self, a: T, b: T) -> bool {
        self.statics.contains(a, b)
    }

    #[inline]
    pub fn is_dynamic_mutex(&self, a: T, b: T) -> bool {
        self.dynamics.contains(a, b)
    }

    pub fn set_static_mutex(&mut self, a: T, b: T) {
        if !self.statics.contains(a, b) {
            Rc::make_mut(&mut self.statics).insert(a, b);
        }
    }

    pub fn set_dynamic_mutex(&mut self, a: T, b: T) {
        assert!(!self.statics.contains(a, b), "Attempt to demote a static mutex {:?}-{:?}", a, b);
        self.dynamics.insert(a, b);
    }

    /// Removes a dynamic mutex.  Returns `false` if there was none.
    pub fn relax_dynamic_mutex(&mut self, a: T, b: T) -> bool {
        self.dynamics.remove(a, b)
    }

    /// Returns `true` if `item` is mutex with any item whose bit is set
    /// in `bits`.
    pub fn intersects(&self, item: T, bits: &Bits) -> bool {
        self.statics.get_vector(item).map_or(false, |v| v.intersects(bits))
            || self.dynamics.get_vector(item).map_or(false, |v| v.intersects(bits))
    }

    /// Returns `true` if `item` is mutex with every item whose bit is
    /// set in `bits`.
    pub fn covers(&self, item: T, bits: &Bits) -> bool {
        let empty = Bits::new();
        let statics = self.statics.get_vector(item).unwrap_or(&empty);
        let dynamics = self.dynamics.get_vector(item).unwrap_or(&empty);

        bits.is_covered_by(statics, dynamics)
    }

    /// Returns the bit vector of all mutex partners of `item`.
    pub fn get_vector(&self, item: T) -> Bits {
        let mut result = self.statics.get_vector(item).cloned().unwrap_or_default();

        if let Some(v) = self.dynamics.get_vector(item) {
            result.union_with(v);
        }

        result
    }

    /// Iterates over all mutex partners of `item`, static ones first.
    pub fn partners(&self, item: T) -> impl Iterator<Item = T> + '_ {
        self.statics.partners(item).chain(self.dynamics.partners(item))
    }

    pub fn dynamic_pairs(&self) -> Vec<(T, T)> {
        self.dynamics.pairs().collect()
    }

    pub fn static_pairs(&self) -> impl Iterator<Item = (T, T)> + '_ {
        self.statics.pairs()
    }

    #[inline]
    pub fn num_static(&self) -> usize {
        self.statics.len()
    }

    #[inline]
    pub fn num_dynamic(&self) -> usize {
        self.dynamics.len()
    }

    /// Returns `true` if both sets still refer to the same static
    /// table.
    #[inline]
    pub fn shares_statics_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.statics, &other.statics)
    }
}
