use std::collections::{BTreeMap, BTreeSet};
use crate::{Bits, MutexSet, Indexed, Context, Contextual, PlanError};

/// A common base of [`LiteralLayer`] and [`ActionLayer`].
///
/// A layer of items of type `T` is linked to items of type `P` in its
/// neighbor layers: `parents` map an item to the items of the
/// previous layer which caused or enabled it, `children` map an item
/// to the items of the next layer which it enables.  Provenance is
/// also kept as a [`Bits`] vector per item (achiever vectors of
/// literals, precondition vectors of actions).
///
/// Since a planning graph only ever grows, a new layer starts as a
/// copy of the previous layer of the same kind (see
/// [`Layer::inherit()`]).  Items added afterwards are `fresh`.  Items
/// which are fresh or lost a dynamic mutex while the layer was
/// completed are marked as `touched`; the next layer of the other
/// kind re-checks only those of its dynamic mutexes which depend on a
/// touched item.
///
/// [`LiteralLayer`]: crate::LiteralLayer
/// [`ActionLayer`]: crate::ActionLayer
#[derive(Clone, Debug)]
pub struct Layer<T: Indexed, P: Indexed> {
    items:       BTreeSet<T>,
    item_bits:   Bits,
    parents:     BTreeMap<T, BTreeSet<P>>,
    parent_bits: BTreeMap<T, Bits>,
    children:    BTreeMap<T, BTreeSet<P>>,
    mutexes:     MutexSet<T>,
    fresh:       BTreeSet<T>,
    touched:     Bits,
    num_relaxed: usize,
}

impl<T: Indexed, P: Indexed> Default for Layer<T, P> {
    fn default() -> Self {
        Self {
            items:       Default::default(),
            item_bits:   Default::default(),
            parents:     Default::default(),
            parent_bits: Default::default(),
            children:    Default::default(),
            mutexes:     Default::default(),
            fresh:       Default::default(),
            touched:     Default::default(),
            num_relaxed: 0,
        }
    }
}

impl<T: Indexed, P: Indexed> Layer<T, P> {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    /// Creates the next layer of the same kind, containing all items,
    /// edges and mutexes of this layer.
    pub(crate) fn inherit(&self) -> Self {
        Self {
            items:       self.items.clone(),
            item_bits:   self.item_bits.clone(),
            parents:     self.parents.clone(),
            parent_bits: self.parent_bits.clone(),
            children:    self.children.clone(),
            mutexes:     self.mutexes.inherit(),
            fresh:       Default::default(),
            touched:     Default::default(),
            num_relaxed: 0,
        }
    }

    /// Adds an item.  Returns `false` if the item was already present.
    pub(crate) fn insert(&mut self, item: T) -> bool {
        if self.items.insert(item) {
            self.item_bits.insert(item.index());
            self.fresh.insert(item);
            self.touched.insert(item.index());

            true
        } else {
            false
        }
    }

    /// Adds inbound edges from the previous layer.
    pub(crate) fn add_parents<I>(&mut self, item: T, parents: I)
    where
        I: IntoIterator<Item = P>,
    {
        let set = self.parents.entry(item).or_default();
        let bits = self.parent_bits.entry(item).or_default();

        for parent in parents {
            set.insert(parent);
            bits.insert(parent.index());
        }
    }

    /// Adds outbound edges to the next layer.
    pub(crate) fn add_children<I>(&mut self, item: T, children: I)
    where
        I: IntoIterator<Item = P>,
    {
        self.children.entry(item).or_default().extend(children);
    }

    /// Removes a dynamic mutex and marks both items as touched.
    pub(crate) fn relax(&mut self, a: T, b: T) {
        if self.mutexes.relax_dynamic_mutex(a, b) {
            trace!("Relax {:?}-{:?}", a, b);
            self.touched.insert(a.index());
            self.touched.insert(b.index());
            self.num_relaxed += 1;
        }
    }

    #[inline]
    pub(crate) fn get_mutexes_mut(&mut self) -> &mut MutexSet<T> {
        &mut self.mutexes
    }

    #[inline]
    pub fn contains(&self, item: T) -> bool {
        self.item_bits.contains(item.index())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.items.iter().copied()
    }

    #[inline]
    pub fn get_item_bits(&self) -> &Bits {
        &self.item_bits
    }

    pub fn get_parents(&self, item: T) -> impl Iterator<Item = P> + '_ {
        self.parents.get(&item).into_iter().flat_map(|set| set.iter().copied())
    }

    #[inline]
    pub fn get_parent_bits(&self, item: T) -> Option<&Bits> {
        self.parent_bits.get(&item)
    }

    pub fn get_children(&self, item: T) -> impl Iterator<Item = P> + '_ {
        self.children.get(&item).into_iter().flat_map(|set| set.iter().copied())
    }

    #[inline]
    pub fn get_mutexes(&self) -> &MutexSet<T> {
        &self.mutexes
    }

    #[inline]
    pub fn is_mutex(&self, a: T, b: T) -> bool {
        self.mutexes.is_mutex(a, b)
    }

    /// Returns `true` if the item was added to this layer, rather than
    /// carried over from the previous layer of the same kind.
    #[inline]
    pub fn is_fresh(&self, item: T) -> bool {
        self.fresh.contains(&item)
    }

    pub fn fresh_items(&self) -> impl Iterator<Item = T> + '_ {
        self.fresh.iter().copied()
    }

    #[inline]
    pub fn get_touched(&self) -> &Bits {
        &self.touched
    }

    /// Returns the number of dynamic mutexes relaxed in this layer.
    #[inline]
    pub fn num_relaxed(&self) -> usize {
        self.num_relaxed
    }

    /// Iterates over all pairs of items, at least one of them fresh,
    /// listing each pair once.
    pub(crate) fn fresh_pairs(&self) -> Vec<(T, T)> {
        let mut result = Vec::new();

        for &a in self.fresh.iter() {
            for &b in self.items.iter() {
                if b != a && !(b < a && self.fresh.contains(&b)) {
                    result.push((a, b));
                }
            }
        }

        result
    }

    /// Returns `true` if both layers contain the same items and the
    /// same mutex relation.
    pub fn same_as(&self, other: &Self) -> bool {
        self.items == other.items
            && self.mutexes.num_static() + self.mutexes.num_dynamic()
                == other.mutexes.num_static() + other.mutexes.num_dynamic()
            && self.items.iter().all(|&item| {
                self.mutexes.get_vector(item) == other.mutexes.get_vector(item)
            })
    }
}

impl<T: Indexed + Contextual, P: Indexed> Contextual for Layer<T, P> {
    fn format_locked(&self, ctx: &Context) -> Result<String, PlanError> {
        let items: Result<Vec<_>, PlanError> =
            self.items.iter().map(|item| item.format_locked(ctx)).collect();
        let mut pairs = Vec::new();

        for (a, b) in self.mutexes.static_pairs() {
            pairs.push(format!("{}#{}", a.format_locked(ctx)?, b.format_locked(ctx)?));
        }

        for (a, b) in self.mutexes.dynamic_pairs() {
            pairs.push(format!("{}~{}", a.format_locked(ctx)?, b.format_locked(ctx)?));
        }

        if pairs.is_empty() {
            Ok(format!("{{{}}}", items?.join(", ")))
        } else {
            Ok(format!("{{{}}} with mutexes {{{}}}", items?.join(", "), pairs.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnyId, PropId, LiteralId, ActionId};

    fn lit(id: usize) -> LiteralId {
        LiteralId::positive(PropId(AnyId::new(id).unwrap()))
    }

    fn act(id: usize) -> ActionId {
        ActionId(AnyId::new(id).unwrap())
    }

    #[test]
    fn test_fresh_and_inherit() {
        let mut layer: Layer<LiteralId, ActionId> = Layer::new();
        assert!(layer.insert(lit(1)));
        assert!(!layer.insert(lit(1)));
        layer.add_parents(lit(1), vec![act(1)]);
        assert!(layer.is_fresh(lit(1)));
        assert!(layer.get_touched().contains(lit(1).index()));

        let mut next = layer.inherit();
        assert!(next.contains(lit(1)));
        assert!(!next.is_fresh(lit(1)));
        assert!(next.get_touched().is_empty());
        next.insert(lit(2));
        next.add_parents(lit(1), vec![act(2)]);
        assert_eq!(next.get_parents(lit(1)).collect::<Vec<_>>(), vec![act(1), act(2)]);
        assert!(next.get_parent_bits(lit(1)).unwrap().contains(act(2).index()));
        assert_eq!(layer.get_parents(lit(1)).count(), 1);
        assert!(!layer.contains(lit(2)));
    }

    #[test]
    fn test_fresh_pairs() {
        let mut layer: Layer<LiteralId, ActionId> = Layer::new();
        layer.insert(lit(1));
        let mut next = layer.inherit();
        next.insert(lit(3));
        next.insert(lit(2));
        assert_eq!(next.fresh_pairs(), vec![(lit(2), lit(1)), (lit(2), lit(3)), (lit(3), lit(1))]);
    }

    #[test]
    fn test_relax_touches() {
        let mut layer: Layer<LiteralId, ActionId> = Layer::new();
        layer.insert(lit(1));
        layer.insert(lit(2));
        layer.get_mutexes_mut().set_dynamic_mutex(lit(1), lit(2));

        let mut next = layer.inherit();
        assert!(next.same_as(&layer));
        next.relax(lit(1), lit(2));
        next.relax(lit(1), lit(2));
        assert_eq!(next.num_relaxed(), 1);
        assert!(next.get_touched().contains(lit(2).index()));
        assert!(!next.same_as(&layer));
        assert!(layer.is_mutex(lit(2), lit(1)));
    }

    #[test]
    fn test_children() {
        let mut layer: Layer<LiteralId, ActionId> = Layer::new();
        layer.insert(lit(1));
        layer.add_children(lit(1), vec![act(3), act(1)]);
        assert_eq!(layer.get_children(lit(1)).collect::<Vec<_>>(), vec![act(1), act(3)]);
        assert_eq!(layer.get_children(lit(2)).count(), 0);
    }
}
