use std::{collections::{BTreeSet, HashMap}, sync::Arc};
use crate::{
    AnyId, PropId, LiteralId, Bits, Context, Contextual, PlanError, PlanErrorKind, name::Name,
};

/// An identifier of an [`ActionNode`].
///
/// Action nodes are registered in a [`Context`] and shared by all
/// layers of all graphs built in that context.  The identifier, which
/// is serial and one-based, is also the node's bit index in [`Bits`]
/// vectors of action layers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct ActionId(pub(crate) AnyId);

impl ActionId {
    #[inline]
    pub const fn get(self) -> AnyId {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0.get()
    }
}

impl From<ActionId> for AnyId {
    #[inline]
    fn from(id: ActionId) -> Self {
        id.0
    }
}

impl Contextual for ActionId {
    fn format_locked(&self, ctx: &Context) -> Result<String, PlanError> {
        let node = ctx
            .get_action(*self)
            .ok_or_else(|| PlanError::from(PlanErrorKind::ActionMissingForId(*self)))?;

        node.format_locked(ctx)
    }
}

/// A ground STRIPS action, as supplied by a planning problem.
///
/// Preconditions and effects are kept as four sets of propositions:
/// positive and negative preconditions, add effects and delete
/// effects.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Action {
    name:        String,
    precond_pos: BTreeSet<PropId>,
    precond_neg: BTreeSet<PropId>,
    effect_add:  BTreeSet<PropId>,
    effect_rem:  BTreeSet<PropId>,
}

impl Action {
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        Self {
            name:        name.as_ref().to_owned(),
            precond_pos: Default::default(),
            precond_neg: Default::default(),
            effect_add:  Default::default(),
            effect_rem:  Default::default(),
        }
    }

    pub fn with_precondition(mut self, lit: LiteralId) -> Self {
        self.add_precondition(lit);
        self
    }

    pub fn with_effect(mut self, lit: LiteralId) -> Self {
        self.add_effect(lit);
        self
    }

    pub fn add_precondition(&mut self, lit: LiteralId) {
        if lit.is_negative() {
            self.precond_neg.insert(lit.get_prop_id());
        } else {
            self.precond_pos.insert(lit.get_prop_id());
        }
    }

    pub fn add_effect(&mut self, lit: LiteralId) {
        if lit.is_negative() {
            self.effect_rem.insert(lit.get_prop_id());
        } else {
            self.effect_add.insert(lit.get_prop_id());
        }
    }

    #[inline]
    pub fn get_name(&self) -> &str {
        self.name.as_str()
    }

    #[inline]
    pub fn get_precond_pos(&self) -> &BTreeSet<PropId> {
        &self.precond_pos
    }

    #[inline]
    pub fn get_precond_neg(&self) -> &BTreeSet<PropId> {
        &self.precond_neg
    }

    #[inline]
    pub fn get_effect_add(&self) -> &BTreeSet<PropId> {
        &self.effect_add
    }

    #[inline]
    pub fn get_effect_rem(&self) -> &BTreeSet<PropId> {
        &self.effect_rem
    }

    /// Iterates over all preconditions as literals.
    pub fn preconditions(&self) -> impl Iterator<Item = LiteralId> + '_ {
        self.precond_pos
            .iter()
            .map(|&p| LiteralId::positive(p))
            .chain(self.precond_neg.iter().map(|&p| LiteralId::negative(p)))
    }

    /// Iterates over all effects as literals.
    pub fn effects(&self) -> impl Iterator<Item = LiteralId> + '_ {
        self.effect_add
            .iter()
            .map(|&p| LiteralId::positive(p))
            .chain(self.effect_rem.iter().map(|&p| LiteralId::negative(p)))
    }
}

/// An immutable action as seen by a planning graph.
///
/// Preconditions, effects and their negations are precomputed once,
/// both as ordered literal vectors and as [`Bits`], so that pairwise
/// mutex tests between actions reduce to intersections of bit
/// vectors.
#[derive(Debug)]
pub struct ActionNode {
    action_id:                 ActionId,
    name:                      Name,
    preconditions:             Vec<LiteralId>,
    effects:                   Vec<LiteralId>,
    negated_preconditions:     Vec<LiteralId>,
    negated_effects:           Vec<LiteralId>,
    precondition_bits:         Bits,
    effect_bits:               Bits,
    negated_precondition_bits: Bits,
    negated_effect_bits:       Bits,
    no_op:                     bool,
}

impl ActionNode {
    fn new(
        action_id: ActionId,
        name: Name,
        preconditions: Vec<LiteralId>,
        effects: Vec<LiteralId>,
        no_op: bool,
    ) -> Self {
        let negated_preconditions: Vec<_> =
            preconditions.iter().map(|&lit| !lit).collect::<BTreeSet<_>>().into_iter().collect();
        let negated_effects: Vec<_> =
            effects.iter().map(|&lit| !lit).collect::<BTreeSet<_>>().into_iter().collect();

        let precondition_bits = preconditions.iter().map(|lit| lit.index()).collect();
        let effect_bits = effects.iter().map(|lit| lit.index()).collect();
        let negated_precondition_bits = negated_preconditions.iter().map(|lit| lit.index()).collect();
        let negated_effect_bits = negated_effects.iter().map(|lit| lit.index()).collect();

        trace!("New action node {:?}: {:?} -> {:?}", action_id, preconditions, effects);

        ActionNode {
            action_id,
            name,
            preconditions,
            effects,
            negated_preconditions,
            negated_effects,
            precondition_bits,
            effect_bits,
            negated_precondition_bits,
            negated_effect_bits,
            no_op,
        }
    }

    #[inline]
    pub fn get_id(&self) -> ActionId {
        self.action_id
    }

    #[inline]
    pub fn get_name(&self) -> &str {
        self.name.as_ref()
    }

    #[inline]
    pub fn is_no_op(&self) -> bool {
        self.no_op
    }

    #[inline]
    pub fn get_preconditions(&self) -> &[LiteralId] {
        self.preconditions.as_slice()
    }

    #[inline]
    pub fn get_effects(&self) -> &[LiteralId] {
        self.effects.as_slice()
    }

    #[inline]
    pub fn get_negated_preconditions(&self) -> &[LiteralId] {
        self.negated_preconditions.as_slice()
    }

    #[inline]
    pub fn get_negated_effects(&self) -> &[LiteralId] {
        self.negated_effects.as_slice()
    }

    #[inline]
    pub fn get_precondition_bits(&self) -> &Bits {
        &self.precondition_bits
    }

    #[inline]
    pub fn get_effect_bits(&self) -> &Bits {
        &self.effect_bits
    }

    #[inline]
    pub fn get_negated_precondition_bits(&self) -> &Bits {
        &self.negated_precondition_bits
    }

    #[inline]
    pub fn get_negated_effect_bits(&self) -> &Bits {
        &self.negated_effect_bits
    }

    /// Returns `true` if all preconditions of this action belong to
    /// the set of literals given as `literal_bits`.
    #[inline]
    pub fn is_applicable(&self, literal_bits: &Bits) -> bool {
        self.precondition_bits.is_subset(literal_bits)
    }

    /// Returns `true` if an effect of one action negates an effect of
    /// the other.
    #[inline]
    pub fn has_inconsistent_effects(&self, other: &Self) -> bool {
        self.effect_bits.intersects(&other.negated_effect_bits)
    }

    /// Returns `true` if the effects of either action negate the
    /// preconditions of the other.
    #[inline]
    pub fn interferes_with(&self, other: &Self) -> bool {
        self.precondition_bits.intersects(&other.negated_effect_bits)
            || other.precondition_bits.intersects(&self.negated_effect_bits)
    }
}

impl Contextual for ActionNode {
    fn format_locked(&self, _ctx: &Context) -> Result<String, PlanError> {
        Ok(self.get_name().to_owned())
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
struct NodeKey {
    name:          Name,
    preconditions: Vec<LiteralId>,
    effects:       Vec<LiteralId>,
    no_op:         bool,
}

/// A registry of [`ActionNode`]s deduplicated by name, preconditions,
/// effects and the no-op flag.
///
/// Sharing the same action twice yields the same node, hence the same
/// [`ActionId`] in every layer of every graph using this registry.
#[derive(Default, Debug)]
pub(crate) struct ActionSpace {
    nodes: Vec<Arc<ActionNode>>,
    ids:   HashMap<NodeKey, ActionId>,
}

impl ActionSpace {
    fn do_share_node(
        &mut self,
        name: Name,
        preconditions: Vec<LiteralId>,
        effects: Vec<LiteralId>,
        no_op: bool,
    ) -> Arc<ActionNode> {
        let key = NodeKey { name, preconditions, effects, no_op };

        if let Some(&id) = self.ids.get(&key) {
            return self.nodes[id.index() - 1].clone()
        }

        let action_id =
            ActionId(AnyId::new(self.nodes.len() + 1).expect("Action space overflow"));
        let node = Arc::new(ActionNode::new(
            action_id,
            key.name.clone(),
            key.preconditions.clone(),
            key.effects.clone(),
            no_op,
        ));

        self.nodes.push(node.clone());
        self.ids.insert(key, action_id);

        node
    }

    pub(crate) fn share_action(&mut self, action: &Action) -> Arc<ActionNode> {
        let preconditions: BTreeSet<_> = action.preconditions().collect();
        let effects: BTreeSet<_> = action.effects().collect();

        self.do_share_node(
            Name::from(action.get_name()),
            preconditions.into_iter().collect(),
            effects.into_iter().collect(),
            false,
        )
    }

    /// Returns the persistence action carrying `lit` unchanged to the
    /// next level.
    pub(crate) fn share_no_op(&mut self, lit: LiteralId, lit_name: &str) -> Arc<ActionNode> {
        let name = Name::from(format!("NoOp({})", lit_name));

        self.do_share_node(name, vec![lit], vec![lit], true)
    }

    #[inline]
    pub(crate) fn get_node(&self, action_id: ActionId) -> Option<&Arc<ActionNode>> {
        self.nodes.get(action_id.index() - 1)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(id: usize, negated: bool) -> LiteralId {
        LiteralId::new(PropId(AnyId::new(id).unwrap()), negated)
    }

    #[test]
    fn test_action_literals() {
        let action = Action::new("Load(C1, P1, SFO)")
            .with_precondition(lit(1, false))
            .with_precondition(lit(2, true))
            .with_effect(lit(3, false))
            .with_effect(lit(1, true));

        assert_eq!(action.preconditions().collect::<Vec<_>>(), vec![lit(1, false), lit(2, true)]);
        assert_eq!(action.effects().collect::<Vec<_>>(), vec![lit(3, false), lit(1, true)]);
        assert_eq!(action.get_effect_rem().len(), 1);
    }

    #[test]
    fn test_node_dedup() {
        let mut space = ActionSpace::default();
        let action = Action::new("A").with_effect(lit(1, false));
        let node1 = space.share_action(&action);
        let node2 = space.share_action(&action.clone());
        assert_eq!(node1.get_id(), node2.get_id());
        assert_eq!(space.len(), 1);

        let no_op1 = space.share_no_op(lit(1, false), "p");
        let no_op2 = space.share_no_op(lit(1, false), "p");
        assert_eq!(no_op1.get_id(), no_op2.get_id());
        assert_ne!(no_op1.get_id(), node1.get_id());
        assert!(no_op1.is_no_op());
        assert_eq!(space.get_node(no_op1.get_id()).unwrap().get_name(), "NoOp(p)");
    }

    #[test]
    fn test_negated_sets() {
        let mut space = ActionSpace::default();
        let action = Action::new("A").with_precondition(lit(1, false)).with_effect(lit(2, true));
        let node = space.share_action(&action);
        assert_eq!(node.get_negated_preconditions(), &[lit(1, true)]);
        assert_eq!(node.get_negated_effects(), &[lit(2, false)]);
        assert!(node.get_negated_effect_bits().contains(lit(2, false).index()));
    }

    #[test]
    fn test_static_mutex_rules() {
        let mut space = ActionSpace::default();
        let a = space.share_action(&Action::new("A").with_effect(lit(1, false)));
        let b = space.share_action(&Action::new("B").with_effect(lit(1, true)));
        let c = space.share_action(&Action::new("C").with_precondition(lit(1, false)));
        let d = space.share_action(&Action::new("D").with_effect(lit(2, false)));

        assert!(a.has_inconsistent_effects(&b));
        assert!(b.has_inconsistent_effects(&a));
        assert!(!a.has_inconsistent_effects(&d));
        assert!(b.interferes_with(&c));
        assert!(c.interferes_with(&b));
        assert!(!a.interferes_with(&c));
        assert!(!a.interferes_with(&d));
    }

    #[test]
    fn test_applicable() {
        let mut space = ActionSpace::default();
        let a = space
            .share_action(&Action::new("A").with_precondition(lit(1, false)).with_precondition(lit(2, true)));
        let state: Bits = vec![lit(1, false).index(), lit(2, true).index()].into_iter().collect();
        let partial: Bits = vec![lit(1, false).index()].into_iter().collect();
        assert!(a.is_applicable(&state));
        assert!(!a.is_applicable(&partial));
    }
}
