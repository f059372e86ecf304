use crate::{
    ActionId, LiteralId, ActionNode, ActionLayer, Layer, MutexSet, Bits, GraphOptions, Context,
    Contextual, PlanError,
};

/// A set of literals reachable at a given level, together with their
/// mutex relation.
///
/// Each literal of a non-initial layer is linked to its achievers in
/// the parent action layer, both explicitly and as an achiever
/// [`Bits`] vector, and to the actions it enables in the child action
/// layer.
#[derive(Clone, Debug)]
pub struct LiteralLayer {
    layer:   Layer<LiteralId, ActionId>,
    options: GraphOptions,
}

impl LiteralLayer {
    /// Creates the layer of level zero.
    ///
    /// The only mutexes at level zero are between a literal and its
    /// negation, if both are given.
    pub(crate) fn new<I>(literals: I, options: GraphOptions) -> Self
    where
        I: IntoIterator<Item = LiteralId>,
    {
        let mut layer = Layer::new();

        for lit in literals {
            layer.insert(lit);
        }

        let negated: Vec<_> = layer.iter().filter(|&lit| !lit.is_negative() && layer.contains(!lit)).collect();

        for lit in negated {
            layer.get_mutexes_mut().set_static_mutex(lit, !lit);
        }

        LiteralLayer { layer, options }
    }

    pub(crate) fn inherit(&self) -> Self {
        LiteralLayer { layer: self.layer.inherit(), options: self.options }
    }

    /// Adds all effects of an action, linking them to the action as
    /// their achiever.
    pub(crate) fn add_effects(&mut self, node: &ActionNode) {
        let action_id = node.get_id();

        for &lit in node.get_effects() {
            self.layer.insert(lit);
            self.layer.add_parents(lit, Some(action_id));
        }
    }

    /// Links the preconditions of an action of the child layer.
    pub(crate) fn add_enabled(&mut self, node: &ActionNode) {
        let action_id = node.get_id();

        for &lit in node.get_preconditions() {
            self.layer.add_children(lit, Some(action_id));
        }
    }

    /// Completes the mutex relation of this layer, given the completed
    /// parent action layer.
    ///
    /// A carried dynamic mutex is re-checked only if an achiever of
    /// either literal was touched in the parent layer, and it is
    /// relaxed if the literals no longer have inconsistent support.
    pub(crate) fn update_mutexes(&mut self, parent: &ActionLayer) {
        if !self.options.ignores_mutexes() {
            let touched = parent.get_touched();

            for (a, b) in self.layer.get_mutexes().dynamic_pairs() {
                if (self.achievers_of(a).intersects(touched) || self.achievers_of(b).intersects(touched))
                    && !self.has_inconsistent_support(a, b, parent.get_mutexes())
                {
                    self.layer.relax(a, b);
                }
            }
        }

        for (a, b) in self.layer.fresh_pairs() {
            if a == !b {
                trace!("Negation {:?}-{:?}", a, b);
                self.layer.get_mutexes_mut().set_static_mutex(a, b);
            } else if !self.options.ignores_mutexes()
                && self.has_inconsistent_support(a, b, parent.get_mutexes())
            {
                trace!("Inconsistent support {:?}-{:?}", a, b);
                self.layer.get_mutexes_mut().set_dynamic_mutex(a, b);
            }
        }
    }

    fn achievers_of(&self, lit: LiteralId) -> &Bits {
        lazy_static! {
            static ref NO_ACHIEVERS: Bits = Bits::new();
        }

        self.layer.get_parent_bits(lit).unwrap_or(&*NO_ACHIEVERS)
    }

    /// Returns `true` if no action achieves both literals and every
    /// achiever of `a` is mutex with every achiever of `b`.
    fn has_inconsistent_support(&self, a: LiteralId, b: LiteralId, parent_mutexes: &MutexSet<ActionId>) -> bool {
        let achievers_of_b = self.achievers_of(b);

        !self.achievers_of(a).intersects(achievers_of_b)
            && self.layer.get_parents(a).all(|action_id| parent_mutexes.covers(action_id, achievers_of_b))
    }

    /// Returns `true` if both layers contain the same literals and the
    /// same mutex relation.
    pub fn same_as(&self, other: &Self) -> bool {
        self.layer.same_as(&other.layer)
    }

    /// Returns `true` if some two of the given literals are mutex, or
    /// if some of them is missing from this layer.
    pub fn has_mutex_among(&self, literals: &[LiteralId]) -> bool {
        literals.iter().enumerate().any(|(pos, &a)| {
            !self.contains(a) || literals[pos + 1..].iter().any(|&b| a != b && self.is_mutex(a, b))
        })
    }

    #[inline]
    pub fn get_layer(&self) -> &Layer<LiteralId, ActionId> {
        &self.layer
    }

    #[inline]
    pub fn contains(&self, lit: LiteralId) -> bool {
        self.layer.contains(lit)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layer.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = LiteralId> + '_ {
        self.layer.iter()
    }

    #[inline]
    pub fn get_literal_bits(&self) -> &Bits {
        self.layer.get_item_bits()
    }

    /// Iterates over the achievers of `lit` in the parent action layer.
    pub fn get_achievers(&self, lit: LiteralId) -> impl Iterator<Item = ActionId> + '_ {
        self.layer.get_parents(lit)
    }

    #[inline]
    pub fn is_mutex(&self, a: LiteralId, b: LiteralId) -> bool {
        self.layer.is_mutex(a, b)
    }

    #[inline]
    pub fn get_mutexes(&self) -> &MutexSet<LiteralId> {
        self.layer.get_mutexes()
    }

    #[inline]
    pub fn get_touched(&self) -> &Bits {
        self.layer.get_touched()
    }
}

impl Contextual for LiteralLayer {
    fn format_locked(&self, ctx: &Context) -> Result<String, PlanError> {
        self.layer.format_locked(ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use super::*;
    use crate::Action;

    #[test]
    fn test_initial_layer() {
        let mut ctx = Context::new();
        let p = ctx.share_literal("p").unwrap();
        let q = ctx.share_literal("q").unwrap();

        let layer = LiteralLayer::new(vec![p, !q], GraphOptions::default());
        assert!(layer.contains(p) && layer.contains(!q));
        assert!(!layer.contains(!p));
        assert_eq!(layer.get_mutexes().num_static() + layer.get_mutexes().num_dynamic(), 0);
        assert_eq!(layer.format_locked(&ctx).unwrap(), "{p, ~q}");

        let layer = LiteralLayer::new(vec![p, !p], GraphOptions::default());
        assert!(layer.get_mutexes().is_static_mutex(p, !p));
        assert!(layer.has_mutex_among(&[p, !p]));
        assert!(!layer.has_mutex_among(&[p, p]));
        assert!(layer.has_mutex_among(&[q]));
    }

    #[test]
    fn test_inconsistent_support() {
        let mut ctx = Context::new();
        let p = ctx.share_literal("p").unwrap();
        let q = ctx.share_literal("q").unwrap();
        let [_, nnp] = ctx.share_no_ops(p.get_prop_id()).unwrap();
        let [_, nnq] = ctx.share_no_ops(q.get_prop_id()).unwrap();
        let a = ctx.share_action(&Action::new("A").with_precondition(!p).with_effect(p));
        let b = ctx.share_action(&Action::new("B").with_precondition(!q).with_effect(q));

        let options = GraphOptions::default();
        let mut literals = LiteralLayer::new(vec![!p, !q], options);
        let mut actions = ActionLayer::new(options);
        let nodes: Vec<Arc<ActionNode>> = vec![nnp, nnq, a, b];

        for node in nodes.iter() {
            actions.add(node);
            literals.add_enabled(node);
        }
        actions.update_mutexes(&literals);

        let mut next = literals.inherit();
        for node in nodes.iter() {
            next.add_effects(node);
        }
        next.update_mutexes(&actions);

        // A and B are serialized.
        assert!(next.get_mutexes().is_dynamic_mutex(p, q));
        assert!(next.get_mutexes().is_static_mutex(p, !p));
        assert!(!next.is_mutex(p, !q));
        assert!(!next.is_mutex(!p, !q));
        assert_eq!(next.get_achievers(p).collect::<Vec<_>>(), vec![nodes[2].get_id()]);
        assert_eq!(
            literals.get_layer().get_children(!p).collect::<Vec<_>>(),
            vec![nodes[0].get_id(), nodes[2].get_id()]
        );
        assert!(next.has_mutex_among(&[p, q]));
        assert!(!next.same_as(&literals));
    }

    #[test]
    fn test_ignore_mutexes() {
        let mut ctx = Context::new();
        let p = ctx.share_literal("p").unwrap();
        let q = ctx.share_literal("q").unwrap();
        let a = ctx.share_action(&Action::new("A").with_precondition(!p).with_effect(p));
        let b = ctx.share_action(&Action::new("B").with_precondition(!q).with_effect(q));

        let options = GraphOptions::default().with_ignore_mutexes(true);
        let literals = LiteralLayer::new(vec![!p, !q], options);
        let mut actions = ActionLayer::new(options);
        actions.add(&a);
        actions.add(&b);
        actions.update_mutexes(&literals);

        let mut next = literals.inherit();
        next.add_effects(&a);
        next.add_effects(&b);
        next.update_mutexes(&actions);

        assert!(actions.is_mutex(a.get_id(), b.get_id()));
        assert!(!next.is_mutex(p, q));
        assert!(next.is_mutex(p, !p));
    }
}
