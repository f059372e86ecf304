use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};
use crate::{
    PropId, LiteralId, ActionId, Action, ActionNode, PlanError, PlanErrorKind,
    name::NameSpace,
    action::ActionSpace,
    literal::parse_literal,
};

/// A handle to a [`Context`] shared by problems and graphs.
///
/// The mutex serializes registration of new propositions and
/// actions, so that identifiers stay unique when several graphs are
/// built in different threads.
pub type ContextHandle = Arc<Mutex<Context>>;

/// A registry of propositions and action nodes.
///
/// Proposition names are interned into [`PropId`]s, and ground
/// actions (including synthesized persistence actions) are
/// deduplicated into [`ActionNode`]s.  Identity of literals and
/// actions across levels of a planning graph depends on this
/// deduplication: a graph never compares two actions by content.
#[derive(Default, Debug)]
pub struct Context {
    pub(crate) props:   NameSpace,
    pub(crate) actions: ActionSpace,
}

impl Context {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn new_handle() -> ContextHandle {
        Arc::new(Mutex::new(Self::new()))
    }

    pub(crate) fn lock(ctx: &ContextHandle) -> Result<MutexGuard<Context>, PlanError> {
        ctx.lock().map_err(|_| PlanErrorKind::ContextPoisoned.into())
    }

    // Propositions

    pub fn share_prop<S: AsRef<str>>(&mut self, prop_name: S) -> PropId {
        PropId(self.props.share_name(prop_name))
    }

    pub fn get_prop_id<S: AsRef<str>>(&self, prop_name: S) -> Option<PropId> {
        self.props.get_id(prop_name).map(PropId)
    }

    pub fn get_prop_name(&self, prop_id: PropId) -> Option<&str> {
        self.props.get_name(prop_id.get())
    }

    pub fn num_props(&self) -> usize {
        self.props.len()
    }

    /// Parses `text` as a literal (a proposition name, optionally
    /// preceded by `~`) and registers its proposition.
    pub fn share_literal<S: AsRef<str>>(&mut self, text: S) -> Result<LiteralId, PlanError> {
        let (negated, prop_name) = parse_literal(text.as_ref())?;

        Ok(LiteralId::new(self.share_prop(prop_name), negated))
    }

    /// Parses `text` as a literal, without registering anything.
    ///
    /// Returns `None` if the proposition is unknown.
    pub fn get_literal<S: AsRef<str>>(&self, text: S) -> Result<Option<LiteralId>, PlanError> {
        let (negated, prop_name) = parse_literal(text.as_ref())?;

        Ok(self.get_prop_id(prop_name).map(|prop_id| LiteralId::new(prop_id, negated)))
    }

    // Actions

    pub fn share_action(&mut self, action: &Action) -> Arc<ActionNode> {
        self.actions.share_action(action)
    }

    /// Returns the two persistence actions of a fluent, carrying its
    /// positive and its negative literal, respectively.
    pub fn share_no_ops(&mut self, prop_id: PropId) -> Result<[Arc<ActionNode>; 2], PlanError> {
        let prop_name = self
            .get_prop_name(prop_id)
            .ok_or_else(|| PlanError::from(PlanErrorKind::PropMissingForId(prop_id)))?
            .to_owned();
        let negated_name = format!("~{}", prop_name);

        Ok([
            self.actions.share_no_op(LiteralId::positive(prop_id), &prop_name),
            self.actions.share_no_op(LiteralId::negative(prop_id), &negated_name),
        ])
    }

    pub fn get_action(&self, action_id: ActionId) -> Option<&Arc<ActionNode>> {
        self.actions.get_node(action_id)
    }

    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }
}

/// A trait of things which may be formatted only with the help of a
/// [`Context`], for example, identifiers.
pub trait Contextual {
    /// Formats `self` given a locked [`Context`].
    fn format_locked(&self, ctx: &Context) -> Result<String, PlanError>;

    /// Locks the [`Context`] behind a [`ContextHandle`] and formats
    /// `self`.
    fn format(&self, ctx: &ContextHandle) -> Result<String, PlanError> {
        let ctx = Context::lock(ctx)?;

        self.format_locked(&ctx)
    }

    /// Couples `self` with a [`Context`] into a value implementing
    /// [`fmt::Display`].
    fn with<'a>(&'a self, ctx: &'a Context) -> InContext<'a, Self>
    where
        Self: Sized,
    {
        InContext { context: ctx, thing: self }
    }
}

/// A reference to a [`Contextual`] thing coupled with a [`Context`].
pub struct InContext<'a, T: Contextual> {
    context: &'a Context,
    thing:   &'a T,
}

impl<'a, T: Contextual> InContext<'a, T> {
    #[inline]
    pub fn get_context(&self) -> &Context {
        self.context
    }

    #[inline]
    pub fn get_thing(&self) -> &T {
        self.thing
    }
}

impl<'a, T: Contextual> fmt::Display for InContext<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.thing.format_locked(self.context) {
            Ok(s) => f.write_str(&s),
            Err(_) => f.write_str("???"),
        }
    }
}

impl<T: Contextual> Contextual for Vec<T> {
    fn format_locked(&self, ctx: &Context) -> Result<String, PlanError> {
        let items: Result<Vec<_>, PlanError> = self.iter().map(|t| t.format_locked(ctx)).collect();

        Ok(format!("{{{}}}", items?.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_literal() {
        let mut ctx = Context::new();
        let p = ctx.share_literal("At(C1, SFO)").unwrap();
        let not_p = ctx.share_literal("~At(C1,SFO)").unwrap();
        assert_eq!(!p, not_p);
        assert_eq!(!!p, p);
        assert_eq!(ctx.num_props(), 1);
        assert_eq!(ctx.get_literal("~ At(C1, SFO)").unwrap(), Some(not_p));
        assert_eq!(ctx.get_literal("At(C2, SFO)").unwrap(), None);
        assert_eq!(not_p.with(&ctx).to_string(), "~At(C1, SFO)");
    }

    #[test]
    fn test_no_ops() {
        let mut ctx = Context::new();
        let p = ctx.share_prop("p");
        let [pos, neg] = ctx.share_no_ops(p).unwrap();
        assert!(pos.is_no_op() && neg.is_no_op());
        assert_eq!(pos.get_preconditions(), &[LiteralId::positive(p)]);
        assert_eq!(neg.get_effects(), &[LiteralId::negative(p)]);
        assert_eq!(neg.get_id().with(&ctx).to_string(), "NoOp(~p)");

        let [again, _] = ctx.share_no_ops(p).unwrap();
        assert_eq!(again.get_id(), pos.get_id());
        assert_eq!(ctx.num_actions(), 2);
    }

    #[test]
    fn test_handle_format() {
        let ctx = Context::new_handle();
        let lits = {
            let mut ctx = ctx.lock().unwrap();
            vec![ctx.share_literal("p").unwrap(), ctx.share_literal("~q").unwrap()]
        };
        assert_eq!(lits.format(&ctx).unwrap(), "{p, ~q}");
    }
}
