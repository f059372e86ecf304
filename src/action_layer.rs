use std::{collections::BTreeMap, sync::Arc};
use crate::{
    ActionId, LiteralId, ActionNode, Layer, LiteralLayer, MutexSet, Bits, GraphOptions, Context,
    Contextual, PlanError,
};

/// A set of actions applicable at a given level, together with their
/// mutex relation.
///
/// Each action is linked to its preconditions in the parent literal
/// layer and to its effects in the child literal layer.  The layer of
/// level `n + 1` starts as a copy of the layer of level `n` and grows
/// by the actions which became applicable in between.
#[derive(Clone, Debug)]
pub struct ActionLayer {
    layer:   Layer<ActionId, LiteralId>,
    nodes:   BTreeMap<ActionId, Arc<ActionNode>>,
    options: GraphOptions,
}

impl ActionLayer {
    pub(crate) fn new(options: GraphOptions) -> Self {
        ActionLayer { layer: Layer::new(), nodes: BTreeMap::new(), options }
    }

    pub(crate) fn inherit(&self) -> Self {
        ActionLayer { layer: self.layer.inherit(), nodes: self.nodes.clone(), options: self.options }
    }

    /// Adds an action with its inbound (precondition) and outbound
    /// (effect) edges.
    ///
    /// Panics if the action is already present in this layer.
    pub(crate) fn add(&mut self, node: &Arc<ActionNode>) {
        let action_id = node.get_id();

        assert!(self.layer.insert(action_id), "Attempt to re-add action {:?}", action_id);

        self.layer.add_parents(action_id, node.get_preconditions().iter().copied());
        self.layer.add_children(action_id, node.get_effects().iter().copied());
        self.nodes.insert(action_id, Arc::clone(node));
    }

    /// Completes the mutex relation of this layer, given the completed
    /// parent literal layer.
    ///
    /// Pairs involving a fresh action are checked in full.  A carried
    /// dynamic mutex is re-checked only if a precondition of either
    /// action was touched in the parent layer, and it is relaxed if
    /// the preconditions no longer compete.  Carried non-mutex pairs
    /// stay non-mutex.
    pub(crate) fn update_mutexes(&mut self, parent: &LiteralLayer) {
        if !self.options.ignores_mutexes() {
            let touched = parent.get_touched();

            for (a, b) in self.layer.get_mutexes().dynamic_pairs() {
                let node_a = Arc::clone(&self.nodes[&a]);
                let node_b = Arc::clone(&self.nodes[&b]);

                if (node_a.get_precondition_bits().intersects(touched)
                    || node_b.get_precondition_bits().intersects(touched))
                    && !has_competing_needs(&node_a, &node_b, parent.get_mutexes())
                {
                    self.layer.relax(a, b);
                }
            }
        }

        for (a, b) in self.layer.fresh_pairs() {
            let node_a = Arc::clone(&self.nodes[&a]);
            let node_b = Arc::clone(&self.nodes[&b]);

            if self.options.is_serialized() && !node_a.is_no_op() && !node_b.is_no_op() {
                trace!("Serialize {:?}-{:?}", a, b);
                self.layer.get_mutexes_mut().set_static_mutex(a, b);
            } else if node_a.has_inconsistent_effects(&node_b) {
                trace!("Inconsistent effects {:?}-{:?}", a, b);
                self.layer.get_mutexes_mut().set_static_mutex(a, b);
            } else if node_a.interferes_with(&node_b) {
                trace!("Interference {:?}-{:?}", a, b);
                self.layer.get_mutexes_mut().set_static_mutex(a, b);
            } else if !self.options.ignores_mutexes()
                && has_competing_needs(&node_a, &node_b, parent.get_mutexes())
            {
                trace!("Competing needs {:?}-{:?}", a, b);
                self.layer.get_mutexes_mut().set_dynamic_mutex(a, b);
            }
        }
    }

    #[inline]
    pub fn get_layer(&self) -> &Layer<ActionId, LiteralId> {
        &self.layer
    }

    #[inline]
    pub fn get_node(&self, action_id: ActionId) -> Option<&Arc<ActionNode>> {
        self.nodes.get(&action_id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Arc<ActionNode>> + '_ {
        self.nodes.values()
    }

    #[inline]
    pub fn contains(&self, action_id: ActionId) -> bool {
        self.layer.contains(action_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layer.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ActionId> + '_ {
        self.layer.iter()
    }

    #[inline]
    pub fn is_mutex(&self, a: ActionId, b: ActionId) -> bool {
        self.layer.is_mutex(a, b)
    }

    #[inline]
    pub fn get_mutexes(&self) -> &MutexSet<ActionId> {
        self.layer.get_mutexes()
    }

    #[inline]
    pub fn get_touched(&self) -> &Bits {
        self.layer.get_touched()
    }
}

impl Contextual for ActionLayer {
    fn format_locked(&self, ctx: &Context) -> Result<String, PlanError> {
        self.layer.format_locked(ctx)
    }
}

/// Returns `true` if some precondition of one action is mutex with
/// some precondition of the other, in the parent literal layer.
fn has_competing_needs(a: &ActionNode, b: &ActionNode, parent_mutexes: &MutexSet<LiteralId>) -> bool {
    a.get_preconditions().iter().any(|&lit| parent_mutexes.intersects(lit, b.get_precondition_bits()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, Context};

    struct Fixture {
        ctx:   Context,
        p:     LiteralId,
        q:     LiteralId,
        no_op: [Arc<ActionNode>; 4],
        a:     Arc<ActionNode>,
        b:     Arc<ActionNode>,
    }

    fn fixture() -> Fixture {
        let mut ctx = Context::new();
        let p = ctx.share_literal("p").unwrap();
        let q = ctx.share_literal("q").unwrap();
        let [np, nnp] = ctx.share_no_ops(p.get_prop_id()).unwrap();
        let [nq, nnq] = ctx.share_no_ops(q.get_prop_id()).unwrap();
        let a = ctx.share_action(&Action::new("A").with_precondition(!p).with_effect(p));
        let b = ctx.share_action(&Action::new("B").with_precondition(!q).with_effect(q));

        Fixture { ctx, p, q, no_op: [np, nnp, nq, nnq], a, b }
    }

    #[test]
    fn test_serialization() {
        let f = fixture();
        let literals = LiteralLayer::new(vec![!f.p, !f.q], GraphOptions::default());
        let mut actions = ActionLayer::new(GraphOptions::default());
        actions.add(&f.a);
        actions.add(&f.b);
        actions.add(&f.no_op[1]);
        actions.add(&f.no_op[3]);
        actions.update_mutexes(&literals);

        assert!(actions.get_mutexes().is_static_mutex(f.a.get_id(), f.b.get_id()));
        // A deletes ~p, which NoOp(~p) needs and carries.
        assert!(actions.is_mutex(f.a.get_id(), f.no_op[1].get_id()));
        assert!(!actions.is_mutex(f.a.get_id(), f.no_op[3].get_id()));
        assert_eq!(actions.get_mutexes().num_dynamic(), 0);
        assert_eq!(
            actions.get_layer().format_locked(&f.ctx).unwrap(),
            "{NoOp(~p), NoOp(~q), A, B} with mutexes {NoOp(~p)#A, NoOp(~q)#B, A#B}"
        );
    }

    #[test]
    fn test_no_serialization() {
        let f = fixture();
        let options = GraphOptions::default().with_serialize(false);
        let literals = LiteralLayer::new(vec![!f.p, !f.q], options);
        let mut actions = ActionLayer::new(options);
        actions.add(&f.a);
        actions.add(&f.b);
        actions.update_mutexes(&literals);

        assert!(!actions.is_mutex(f.a.get_id(), f.b.get_id()));
    }

    #[test]
    fn test_competing_needs() {
        let f = fixture();
        let options = GraphOptions::default().with_serialize(false);
        let literals = LiteralLayer::new(vec![!f.p], options);
        let mut actions = ActionLayer::new(options);
        actions.add(&f.a);
        actions.add(&f.no_op[1]);
        actions.update_mutexes(&literals);

        let mut next_literals = literals.inherit();
        next_literals.add_effects(&f.a);
        next_literals.add_effects(&f.no_op[1]);
        next_literals.update_mutexes(&actions);
        assert!(next_literals.get_mutexes().is_static_mutex(f.p, !f.p));

        let mut next_actions = actions.inherit();
        next_actions.add(&f.no_op[0]);
        next_actions.update_mutexes(&next_literals);
        // A needs ~p, which NoOp(p) negates.
        assert!(next_actions.get_mutexes().is_static_mutex(f.no_op[0].get_id(), f.a.get_id()));
        assert!(next_actions.is_mutex(f.no_op[0].get_id(), f.no_op[1].get_id()));
        assert!(next_literals.contains(f.p));
        assert!(!next_literals.contains(f.q));
    }

    #[test]
    fn test_ignore_mutexes() {
        let f = fixture();
        let options = GraphOptions::default().with_ignore_mutexes(true);
        let literals = LiteralLayer::new(vec![!f.p, !f.q], options);
        let mut actions = ActionLayer::new(options);
        actions.add(&f.a);
        actions.add(&f.b);
        actions.add(&f.no_op[1]);
        actions.update_mutexes(&literals);

        assert!(actions.get_mutexes().is_static_mutex(f.a.get_id(), f.b.get_id()));
        assert!(actions.get_mutexes().is_static_mutex(f.a.get_id(), f.no_op[1].get_id()));
        assert_eq!(actions.get_mutexes().num_dynamic(), 0);
    }

    #[test]
    #[should_panic(expected = "re-add")]
    fn test_readd_action() {
        let f = fixture();
        let mut actions = ActionLayer::new(GraphOptions::default());
        actions.add(&f.a);

        let mut next = actions.inherit();
        next.add(&f.a);
    }
}
