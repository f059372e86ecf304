//! Planning graphs for STRIPS problems, with incremental mutex
//! computation, and the level-cost heuristics derived from them.
//!
//! Several definitions used throughout the crate are collected below.
//!
//! # Literals and actions
//!
//! A _fluent_ is a ground proposition whose truth value may change.  A
//! _literal_ is a fluent or its negation.  A _state_ assigns a truth
//! value to every fluent of a problem; it is represented by the set of
//! literals true in it.
//!
//! A ground _action_ has a set of precondition literals and a set of
//! effect literals.  Every fluent also gives rise to two _no-op_
//! (persistence) actions, one per polarity, whose single precondition
//! and single effect is the same literal.
//!
//! # Layers
//!
//! A _planning graph_ is a sequence of alternating layers, starting
//! with the _literal layer_ of level zero, which contains the literals
//! of the initial state.  The _action layer_ of level _n + 1_ contains
//! every action, no-ops included, whose preconditions all belong to
//! the literal layer of level _n_.  The literal layer of level _n + 1_
//! contains every effect of every action in the action layer of level
//! _n + 1_.  The actions producing a literal are its _achievers_.
//!
//! Since no-ops carry every literal forward, layers of the same kind
//! only grow from level to level.  A graph _levels off_ when two
//! consecutive literal layers contain the same literals and the same
//! mutex relation; from then on nothing changes.
//!
//! # Mutexes
//!
//! Two actions of the same layer are _mutex_ (mutually exclusive) if
//!
//! * _serialization_ is requested, and neither action is a no-op,
//! * they have _inconsistent effects_: an effect of one negates an
//!   effect of the other,
//! * they _interfere_: an effect of one negates a precondition of the
//!   other, or
//! * they have _competing needs_: a precondition of one is mutex with
//!   a precondition of the other in the parent literal layer.
//!
//! Two literals of the same layer are mutex if one is the negation of
//! the other, or if they have _inconsistent support_: no action
//! achieves both, and every achiever of one is mutex with every
//! achiever of the other.
//!
//! Mutexes due to serialization, inconsistent effects, interference
//! and negation are _static_: once established they hold at every
//! later level.  The remaining mutexes are _dynamic_: they may be
//! relaxed at a later level, but a pair of items which is not mutex
//! never becomes mutex later.  A new layer therefore starts as a copy
//! of the previous layer of the same kind, fully checks only the pairs
//! involving new items, and re-checks only those dynamic mutexes which
//! depend on items changed in the parent layer.
//!
//! # Heuristics
//!
//! The _level cost_ of a literal is the first level at which it
//! appears.  Given a goal set of literals,
//!
//! * _level-sum_ is the sum of level costs of all goal literals,
//! * _max-level_ is the maximum of these, and
//! * _set-level_ is the first level at which all goal literals are
//!   present and pairwise non-mutex.
//!
//! A heuristic is undefined (the goal is unreachable) if the graph
//! levels off before the corresponding condition is met.

#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;

mod error;
mod name;
mod bits;
mod literal;
mod action;
mod context;
mod mutex;
mod layer;
mod action_layer;
mod literal_layer;
mod graph;
mod problem;
mod logging;

pub use error::{PlanError, PlanErrorKind};
pub use bits::Bits;
pub use literal::{PropId, LiteralId};
pub use action::{ActionId, Action, ActionNode};
pub use context::{Context, ContextHandle, Contextual, InContext};
pub use mutex::{MutexSet, Indexed};
pub use layer::Layer;
pub use action_layer::ActionLayer;
pub use literal_layer::LiteralLayer;
pub use graph::{PlanningGraph, GraphOptions};
pub use problem::Problem;
pub use logging::Logger;

use std::num::NonZeroUsize;

pub(crate) type AnyId = NonZeroUsize;
