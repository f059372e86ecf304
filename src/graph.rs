use std::sync::Arc;
use crate::{
    LiteralId, ActionNode, ActionLayer, LiteralLayer, Problem, ContextHandle, Context, Contextual,
    PlanError, PlanErrorKind,
};

/// Options controlling which mutexes a [`PlanningGraph`] records.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GraphOptions {
    serialize:      bool,
    ignore_mutexes: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        GraphOptions { serialize: true, ignore_mutexes: false }
    }
}

impl GraphOptions {
    pub fn new() -> Self {
        Default::default()
    }

    /// If set (the default), any two actions which aren't both no-ops
    /// are mutex.
    pub fn with_serialize(mut self, serialize: bool) -> Self {
        self.serialize = serialize;
        self
    }

    /// If set, only static mutexes are recorded: competing needs and
    /// inconsistent support are skipped.
    pub fn with_ignore_mutexes(mut self, ignore_mutexes: bool) -> Self {
        self.ignore_mutexes = ignore_mutexes;
        self
    }

    #[inline]
    pub fn is_serialized(&self) -> bool {
        self.serialize
    }

    #[inline]
    pub fn ignores_mutexes(&self) -> bool {
        self.ignore_mutexes
    }
}

/// A planning graph of a [`Problem`] rooted at a given state.
///
/// Literal layers and action layers alternate, starting with the
/// literal layer of level zero.  The action layer of level `n` (for
/// `n > 0`) leads from the literal layer of level `n - 1` to the
/// literal layer of level `n`.  The graph grows one level at a time,
/// either explicitly, by [`extend()`] and [`fill()`], or on demand,
/// while computing heuristics, until it levels off.
///
/// Heuristic values are memoized: each is computed at most once per
/// graph, including errors.
///
/// [`extend()`]: PlanningGraph::extend()
/// [`fill()`]: PlanningGraph::fill()
#[derive(Debug)]
pub struct PlanningGraph {
    context:        ContextHandle,
    options:        GraphOptions,
    goal:           Vec<LiteralId>,
    candidates:     Vec<Arc<ActionNode>>,
    literal_layers: Vec<LiteralLayer>,
    action_layers:  Vec<ActionLayer>,
    leveled:        bool,
    level_costs:    Option<Result<Vec<usize>, PlanError>>,
    set_level:      Option<Result<usize, PlanError>>,
}

impl PlanningGraph {
    /// Creates a graph of a single literal layer: the literals of
    /// `state`, which assigns a truth value to every fluent of the
    /// `problem`, in the problem's order of fluents.
    ///
    /// Candidate actions are the problem's actions together with two
    /// no-ops per fluent, one per polarity.
    pub fn new(problem: &Problem, state: &[bool], options: GraphOptions) -> Result<Self, PlanError> {
        let literals = problem.literals_of(state)?;
        let context = problem.get_context().clone();
        let mut candidates = Vec::new();

        {
            let mut ctx = Context::lock(&context)?;

            for &prop_id in problem.get_fluents() {
                let [positive, negative] = ctx.share_no_ops(prop_id)?;

                candidates.push(positive);
                candidates.push(negative);
            }

            for action in problem.get_actions() {
                candidates.push(ctx.share_action(action));
            }
        }

        let mut goal = problem.get_goal().to_vec();
        goal.sort();
        goal.dedup();

        let first_layer = LiteralLayer::new(literals, options);

        debug!(
            "New planning graph: {} literals, {} candidate actions, goal of {} literals",
            first_layer.len(),
            candidates.len(),
            goal.len()
        );

        Ok(PlanningGraph {
            context,
            options,
            goal,
            candidates,
            literal_layers: vec![first_layer],
            action_layers: Vec::new(),
            leveled: false,
            level_costs: None,
            set_level: None,
        })
    }

    /// Adds the next action layer and the next literal layer.
    ///
    /// Does nothing if the graph has already leveled off.
    pub fn extend(&mut self) {
        if self.leveled {
            return
        }

        let level = self.literal_layers.len();
        let candidates = &self.candidates;
        let parent_literals =
            self.literal_layers.last_mut().expect("Attempt to extend a graph without literal layers");
        let mut action_layer = match self.action_layers.last() {
            Some(layer) => layer.inherit(),
            None => ActionLayer::new(self.options),
        };
        let mut literal_layer = parent_literals.inherit();

        for node in candidates.iter() {
            if !action_layer.contains(node.get_id()) && node.is_applicable(parent_literals.get_literal_bits()) {
                action_layer.add(node);
                literal_layer.add_effects(node);
                parent_literals.add_enabled(node);
            }
        }

        action_layer.update_mutexes(parent_literals);
        literal_layer.update_mutexes(&action_layer);

        self.leveled = literal_layer.same_as(parent_literals);

        debug!(
            "Level {}: {} actions ({} static, {} dynamic mutexes, {} relaxed), \
             {} literals ({} static, {} dynamic mutexes, {} relaxed)",
            level,
            action_layer.len(),
            action_layer.get_mutexes().num_static(),
            action_layer.get_mutexes().num_dynamic(),
            action_layer.get_layer().num_relaxed(),
            literal_layer.len(),
            literal_layer.get_mutexes().num_static(),
            literal_layer.get_mutexes().num_dynamic(),
            literal_layer.get_layer().num_relaxed(),
        );

        if log_enabled!(log::Level::Trace) {
            if let Ok(ctx) = Context::lock(&self.context) {
                trace!("Actions {}: {}", level, action_layer.with(&ctx));
                trace!("Literals {}: {}", level, literal_layer.with(&ctx));
            }
        }

        if self.leveled {
            info!("Planning graph leveled off at level {}", level);
        }

        self.action_layers.push(action_layer);
        self.literal_layers.push(literal_layer);
    }

    /// Extends the graph until it levels off, or at most `max_levels`
    /// more times.
    pub fn fill(&mut self, max_levels: Option<usize>) -> &mut Self {
        let mut remaining = max_levels;

        while !self.leveled && remaining.map_or(true, |n| n > 0) {
            self.extend();
            remaining = remaining.map(|n| n - 1);
        }

        self
    }

    /// Returns the sum of level costs of all goal literals.
    pub fn h_levelsum(&mut self) -> Result<usize, PlanError> {
        Ok(self.level_costs()?.iter().sum())
    }

    /// Returns the maximum of level costs of all goal literals.
    pub fn h_maxlevel(&mut self) -> Result<usize, PlanError> {
        Ok(self.level_costs()?.iter().copied().max().unwrap_or(0))
    }

    /// Returns the first level at which all goal literals are present
    /// and pairwise non-mutex.
    pub fn h_setlevel(&mut self) -> Result<usize, PlanError> {
        if let Some(ref result) = self.set_level {
            return result.clone()
        }

        let result = self.compute_set_level();

        self.set_level = Some(result.clone());

        result
    }

    /// Returns level costs of goal literals, in the order of
    /// [`get_goal()`].  The level cost of a literal is the first level
    /// at which it appears.
    ///
    /// [`get_goal()`]: PlanningGraph::get_goal()
    pub fn level_costs(&mut self) -> Result<Vec<usize>, PlanError> {
        if let Some(ref result) = self.level_costs {
            return result.clone()
        }

        let result = self.compute_level_costs();

        self.level_costs = Some(result.clone());

        result
    }

    fn compute_level_costs(&mut self) -> Result<Vec<usize>, PlanError> {
        let mut costs = vec![None; self.goal.len()];
        let mut num_missing = self.goal.len();
        let mut level = 0;

        loop {
            let layer = &self.literal_layers[level];

            for (cost, &lit) in costs.iter_mut().zip(self.goal.iter()) {
                if cost.is_none() && layer.contains(lit) {
                    *cost = Some(level);
                    num_missing -= 1;
                }
            }

            if num_missing == 0 {
                return Ok(costs.into_iter().flatten().collect())
            }

            if level + 1 == self.literal_layers.len() {
                if self.leveled {
                    let missing: Vec<_> = costs
                        .iter()
                        .zip(self.goal.iter())
                        .filter_map(|(cost, &lit)| if cost.is_none() { Some(lit) } else { None })
                        .collect();

                    return Err(PlanErrorKind::UnreachableGoal(missing).with_level(level))
                }

                self.extend();
            }

            level += 1;
        }
    }

    fn compute_set_level(&mut self) -> Result<usize, PlanError> {
        let mut level = self.h_maxlevel()?;

        loop {
            if !self.literal_layers[level].has_mutex_among(&self.goal) {
                return Ok(level)
            }

            if level + 1 == self.literal_layers.len() {
                if self.leveled {
                    return Err(PlanErrorKind::UnreachableGoalSet.with_level(level))
                }

                self.extend();
            }

            level += 1;
        }
    }

    #[inline]
    pub fn get_context(&self) -> &ContextHandle {
        &self.context
    }

    #[inline]
    pub fn get_options(&self) -> GraphOptions {
        self.options
    }

    /// Returns the goal literals, sorted and deduplicated.
    #[inline]
    pub fn get_goal(&self) -> &[LiteralId] {
        self.goal.as_slice()
    }

    #[inline]
    pub fn is_leveled(&self) -> bool {
        self.leveled
    }

    /// Returns the number of literal layers, including level zero.
    #[inline]
    pub fn num_levels(&self) -> usize {
        self.literal_layers.len()
    }

    #[inline]
    pub fn get_literal_layer(&self, level: usize) -> Option<&LiteralLayer> {
        self.literal_layers.get(level)
    }

    /// Returns the action layer leading to the literal layer of the
    /// same level.  There is no action layer of level zero.
    #[inline]
    pub fn get_action_layer(&self, level: usize) -> Option<&ActionLayer> {
        level.checked_sub(1).and_then(|pos| self.action_layers.get(pos))
    }
}

impl Contextual for PlanningGraph {
    fn format_locked(&self, ctx: &Context) -> Result<String, PlanError> {
        let mut result = format!("Literals 0: {}", self.literal_layers[0].format_locked(ctx)?);

        for (pos, (actions, literals)) in
            self.action_layers.iter().zip(self.literal_layers.iter().skip(1)).enumerate()
        {
            result.push_str(&format!("\nActions {}: {}", pos + 1, actions.format_locked(ctx)?));
            result.push_str(&format!("\nLiterals {}: {}", pos + 1, literals.format_locked(ctx)?));
        }

        Ok(result)
    }
}
