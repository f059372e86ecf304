use std::{collections::BTreeMap, fs::File, io::Read, path::Path};
use yaml_rust::{Yaml, YamlLoader};
use crate::{
    PropId, LiteralId, Action, Context, ContextHandle, Contextual, GraphOptions, PlanError,
    PlanErrorKind, literal::parse_literal,
};

/// A STRIPS planning problem: fluents, initial state, goal and
/// ground actions.
///
/// The ordered list of fluents is the state map: a state is a vector
/// of truth values, one per fluent, in the order in which fluents
/// were added.
///
/// A problem may be built programmatically or loaded from a YAML
/// description (see [`Problem::from_str()`]).
#[derive(Clone, Debug)]
pub struct Problem {
    context:   ContextHandle,
    name:      Option<String>,
    fluents:   Vec<PropId>,
    positions: BTreeMap<PropId, usize>,
    initial:   Vec<bool>,
    goal:      Vec<LiteralId>,
    actions:   Vec<Action>,
    options:   Option<GraphOptions>,
}

impl Default for Problem {
    fn default() -> Self {
        Self::with_context(Context::new_handle())
    }
}

impl Problem {
    /// Creates an empty problem in a fresh [`Context`].
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_context(ctx: ContextHandle) -> Self {
        Problem {
            context:   ctx,
            name:      None,
            fluents:   Vec::new(),
            positions: BTreeMap::new(),
            initial:   Vec::new(),
            goal:      Vec::new(),
            actions:   Vec::new(),
            options:   None,
        }
    }

    /// Declares a fluent, initially false, and returns its positive
    /// literal.  Declaring a fluent twice has no effect.
    pub fn add_fluent<S: AsRef<str>>(&mut self, name: S) -> Result<LiteralId, PlanError> {
        let (negated, prop_name) = parse_literal(name.as_ref())?;

        if negated {
            return Err(PlanErrorKind::InvalidLiteral(name.as_ref().to_owned()).into())
        }

        let prop_id = Context::lock(&self.context)?.share_prop(prop_name);

        if !self.positions.contains_key(&prop_id) {
            self.positions.insert(prop_id, self.fluents.len());
            self.fluents.push(prop_id);
            self.initial.push(false);
        }

        Ok(LiteralId::positive(prop_id))
    }

    pub fn set_name<S: AsRef<str>>(&mut self, name: S) {
        self.name = Some(name.as_ref().to_owned());
    }

    /// Sets the initial state, one truth value per fluent.
    pub fn set_initial_state(&mut self, state: Vec<bool>) -> Result<(), PlanError> {
        if state.len() == self.fluents.len() {
            self.initial = state;

            Ok(())
        } else {
            Err(PlanErrorKind::StateLengthMismatch(self.fluents.len(), state.len()).into())
        }
    }

    /// Makes a single fluent initially true or false.
    pub fn set_initially(&mut self, lit: LiteralId) -> Result<(), PlanError> {
        let pos = self.position_of(lit.get_prop_id())?;

        self.initial[pos] = !lit.is_negative();

        Ok(())
    }

    pub fn add_goal(&mut self, lit: LiteralId) -> Result<(), PlanError> {
        self.position_of(lit.get_prop_id())?;

        if !self.goal.contains(&lit) {
            self.goal.push(lit);
        }

        Ok(())
    }

    pub fn set_goal(&mut self, goal: Vec<LiteralId>) -> Result<(), PlanError> {
        for lit in goal.iter() {
            self.position_of(lit.get_prop_id())?;
        }

        self.goal = goal;

        Ok(())
    }

    /// Adds a ground action.  All propositions the action refers to
    /// must be declared fluents.
    pub fn add_action(&mut self, action: Action) -> Result<(), PlanError> {
        for lit in action.preconditions().chain(action.effects()) {
            self.position_of(lit.get_prop_id())?;
        }

        self.actions.push(action);

        Ok(())
    }

    pub fn set_options(&mut self, options: GraphOptions) {
        self.options = Some(options);
    }

    fn position_of(&self, prop_id: PropId) -> Result<usize, PlanError> {
        self.positions.get(&prop_id).copied().ok_or_else(|| {
            let name = prop_id.format(&self.context).unwrap_or_else(|_| format!("{:?}", prop_id));

            PlanErrorKind::UnknownFluent(name).into()
        })
    }

    /// Maps a state vector to the literals true in that state.
    pub fn literals_of(&self, state: &[bool]) -> Result<Vec<LiteralId>, PlanError> {
        if state.len() == self.fluents.len() {
            Ok(self
                .fluents
                .iter()
                .zip(state.iter())
                .map(|(&prop_id, &value)| LiteralId::new(prop_id, !value))
                .collect())
        } else {
            Err(PlanErrorKind::StateLengthMismatch(self.fluents.len(), state.len()).into())
        }
    }

    #[inline]
    pub fn get_context(&self) -> &ContextHandle {
        &self.context
    }

    #[inline]
    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn get_fluents(&self) -> &[PropId] {
        self.fluents.as_slice()
    }

    #[inline]
    pub fn get_initial_state(&self) -> &[bool] {
        self.initial.as_slice()
    }

    #[inline]
    pub fn get_goal(&self) -> &[LiteralId] {
        self.goal.as_slice()
    }

    #[inline]
    pub fn get_actions(&self) -> &[Action] {
        self.actions.as_slice()
    }

    /// Returns graph options given in the problem description, if any.
    #[inline]
    pub fn get_options(&self) -> Option<GraphOptions> {
        self.options
    }

    /// Creates a problem from a YAML description.
    ///
    /// The description is a dictionary with the following keys, all
    /// optional:
    ///
    /// * `name`: a string,
    /// * `fluents`: a list of proposition names, such as `At(C1, SFO)`,
    /// * `initial`: a list of fluents true initially (all the others
    ///   are false),
    /// * `goal`: a list of literals, with `~` marking negation,
    /// * `actions`: a list of dictionaries with keys `name`, `pre`
    ///   (literals), `add` and `del` (fluents),
    /// * `options`: a dictionary with boolean entries `serialize` and
    ///   `ignore_mutexes`.
    pub fn from_str<S: AsRef<str>>(ctx: ContextHandle, script: S) -> Result<Self, PlanError> {
        let docs = YamlLoader::load_from_str(script.as_ref())?;

        if docs.is_empty() {
            Err(PlanErrorKind::YamlEmpty.into())
        } else if docs.len() == 1 {
            Self::from_yaml(ctx, &docs[0])
        } else {
            Err(PlanErrorKind::YamlMultiple.into())
        }
    }

    /// Creates a problem from a YAML description read from a file.
    pub fn from_file<P: AsRef<Path>>(ctx: ContextHandle, path: P) -> Result<Self, PlanError> {
        let mut fp = File::open(path)?;
        let mut script = String::new();
        fp.read_to_string(&mut script)?;

        Self::from_str(ctx, &script)
    }

    fn from_yaml(ctx: ContextHandle, yaml: &Yaml) -> Result<Self, PlanError> {
        let dict = match yaml {
            Yaml::Hash(dict) => dict,
            _ => return Err(PlanErrorKind::YamlNotADict.into()),
        };
        let mut entries = BTreeMap::new();

        for (key, value) in dict {
            if let Some(key) = key.as_str() {
                entries.insert(key.trim(), value);
            } else {
                return Err(PlanErrorKind::YamlKeyNotString.into())
            }
        }

        let mut result = Self::with_context(ctx);

        // Fluents go first, since all other entries refer to them.
        if let Some(value) = entries.remove("fluents") {
            for name in string_list("fluents", value)? {
                result.add_fluent(name)?;
            }
        }

        for (key, value) in entries {
            match key {
                "name" => {
                    let name = value.as_str().ok_or(PlanErrorKind::YamlNameInvalid)?;
                    result.set_name(name.trim());
                }
                "initial" => {
                    for text in string_list(key, value)? {
                        let lit = result.known_literal(text)?;

                        if lit.is_negative() {
                            return Err(PlanErrorKind::InvalidLiteral(text.to_owned()).into())
                        }
                        result.set_initially(lit)?;
                    }
                }
                "goal" => {
                    for text in string_list(key, value)? {
                        let lit = result.known_literal(text)?;
                        result.add_goal(lit)?;
                    }
                }
                "actions" => match value {
                    Yaml::Array(table) => {
                        for action_yaml in table {
                            let action = result.action_from_yaml(action_yaml)?;
                            result.add_action(action)?;
                        }
                    }
                    Yaml::Null => {}
                    _ => return Err(PlanErrorKind::YamlActionInvalid.into()),
                },
                "options" => {
                    let options = options_from_yaml(value)?;
                    result.set_options(options);
                }
                _ => {
                    warn!("Unknown key '{}' in problem description", key);
                }
            }
        }

        debug!(
            "Loaded problem{}: {} fluents, {} actions, goal of {} literals",
            result.name.as_ref().map(|name| format!(" '{}'", name)).unwrap_or_default(),
            result.fluents.len(),
            result.actions.len(),
            result.goal.len()
        );

        Ok(result)
    }

    /// Parses a literal of a declared fluent.
    fn known_literal(&self, text: &str) -> Result<LiteralId, PlanError> {
        let lit = Context::lock(&self.context)?
            .get_literal(text)?
            .ok_or_else(|| PlanError::from(PlanErrorKind::UnknownFluent(text.trim().to_owned())))?;

        self.position_of(lit.get_prop_id())?;

        Ok(lit)
    }

    fn action_from_yaml(&self, yaml: &Yaml) -> Result<Action, PlanError> {
        let dict = match yaml {
            Yaml::Hash(dict) => dict,
            _ => return Err(PlanErrorKind::YamlActionInvalid.into()),
        };
        let name = dict
            .get(&Yaml::String("name".to_owned()))
            .and_then(Yaml::as_str)
            .ok_or(PlanErrorKind::YamlActionInvalid)?;
        let mut action = Action::new(name.trim());

        for (key, value) in dict {
            match key.as_str() {
                Some("name") => {}
                Some(key @ "pre") => {
                    for text in string_list(key, value)? {
                        action.add_precondition(self.known_literal(text)?);
                    }
                }
                Some(key @ "add") | Some(key @ "del") => {
                    for text in string_list(key, value)? {
                        let lit = self.known_literal(text)?;

                        if lit.is_negative() {
                            return Err(PlanErrorKind::InvalidLiteral(text.to_owned()).into())
                        }

                        action.add_effect(if key == "del" { !lit } else { lit });
                    }
                }
                _ => return Err(PlanErrorKind::YamlActionInvalid.into()),
            }
        }

        Ok(action)
    }
}

/// Accepts a list of strings, a single string, or nothing.
fn string_list<'a>(key: &str, yaml: &'a Yaml) -> Result<Vec<&'a str>, PlanError> {
    match yaml {
        Yaml::Array(table) => table
            .iter()
            .map(|value| {
                value.as_str().ok_or_else(|| PlanError::from(PlanErrorKind::YamlListInvalid(key.to_owned())))
            })
            .collect(),
        Yaml::String(text) => Ok(vec![text.as_str()]),
        Yaml::Null => Ok(Vec::new()),
        _ => Err(PlanErrorKind::YamlListInvalid(key.to_owned()).into()),
    }
}

fn options_from_yaml(yaml: &Yaml) -> Result<GraphOptions, PlanError> {
    let mut options = GraphOptions::default();

    match yaml {
        Yaml::Hash(dict) => {
            for (key, value) in dict {
                let key = key.as_str().ok_or(PlanErrorKind::YamlKeyNotString)?;
                let flag =
                    value.as_bool().ok_or_else(|| PlanErrorKind::YamlOptionInvalid(key.to_owned()))?;

                match key.trim() {
                    "serialize" => options = options.with_serialize(flag),
                    "ignore_mutexes" => options = options.with_ignore_mutexes(flag),
                    _ => return Err(PlanErrorKind::YamlOptionInvalid(key.to_owned()).into()),
                }
            }
        }
        Yaml::Null => {}
        _ => return Err(PlanErrorKind::YamlOptionInvalid("options".to_owned()).into()),
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlanningGraph;

    #[test]
    fn test_have_cake() {
        let problem = Problem::from_str(Context::new_handle(), include_str!("../demos/cake.yaml")).unwrap();

        assert_eq!(problem.get_name(), Some("Have cake and eat it too"));
        assert_eq!(problem.get_fluents().len(), 2);
        assert_eq!(problem.get_initial_state(), &[true, false]);
        assert_eq!(problem.get_goal().len(), 2);
        assert_eq!(problem.get_actions().len(), 2);
        assert_eq!(problem.get_options(), Some(GraphOptions::default()));

        let eat = &problem.get_actions()[0];
        assert_eq!(eat.get_name(), "Eat(Cake)");
        assert_eq!(eat.get_effect_rem().len(), 1);
        assert_eq!(problem.get_actions()[1].get_precond_neg().len(), 1);

        let literals = problem.literals_of(problem.get_initial_state()).unwrap();
        assert_eq!(literals.format(problem.get_context()).unwrap(), "{Have(Cake), ~Eaten(Cake)}");

        let mut graph =
            PlanningGraph::new(&problem, problem.get_initial_state(), GraphOptions::default()).unwrap();
        assert_eq!(graph.h_levelsum().unwrap(), 1);
        assert_eq!(graph.h_maxlevel().unwrap(), 1);
        assert_eq!(graph.h_setlevel().unwrap(), 2);
    }

    #[test]
    fn test_air_cargo() {
        let script = include_str!("../demos/air_cargo.yaml");
        let problem = Problem::from_str(Context::new_handle(), script).unwrap();

        assert_eq!(problem.get_fluents().len(), 12);
        assert_eq!(problem.get_actions().len(), 20);
        assert_eq!(problem.get_initial_state().iter().filter(|&&value| value).count(), 4);

        let mut graph =
            PlanningGraph::new(&problem, problem.get_initial_state(), GraphOptions::default()).unwrap();
        assert_eq!(graph.level_costs().unwrap(), vec![2, 2]);
        assert_eq!(graph.h_levelsum().unwrap(), 4);
        assert_eq!(graph.h_maxlevel().unwrap(), 2);
        assert!(graph.h_setlevel().unwrap() >= 2);
    }

    #[test]
    fn test_options() {
        let script = "fluents: [p]\noptions: {serialize: false, ignore_mutexes: true}\n";
        let problem = Problem::from_str(Context::new_handle(), script).unwrap();
        let options = problem.get_options().unwrap();
        assert!(!options.is_serialized());
        assert!(options.ignores_mutexes());

        let script = "fluents: [p]\noptions: {serialize: 1}\n";
        let err = Problem::from_str(Context::new_handle(), script).unwrap_err();
        assert_eq!(err.get_kind(), &PlanErrorKind::YamlOptionInvalid("serialize".to_owned()));

        let script = "fluents: [p]\noptions: {parallel: true}\n";
        assert!(Problem::from_str(Context::new_handle(), script).is_err());
    }

    #[test]
    fn test_yaml_errors() {
        let ctx = Context::new_handle();

        let err = Problem::from_str(ctx.clone(), "").unwrap_err();
        assert_eq!(err.get_kind(), &PlanErrorKind::YamlEmpty);

        let err = Problem::from_str(ctx.clone(), "---\nfluents: [p]\n---\nfluents: [q]\n").unwrap_err();
        assert_eq!(err.get_kind(), &PlanErrorKind::YamlMultiple);

        let err = Problem::from_str(ctx.clone(), "- p\n- q\n").unwrap_err();
        assert_eq!(err.get_kind(), &PlanErrorKind::YamlNotADict);

        let err = Problem::from_str(ctx.clone(), "fluents: [p]\ngoal: [q]\n").unwrap_err();
        assert_eq!(err.get_kind(), &PlanErrorKind::UnknownFluent("q".to_owned()));

        let err = Problem::from_str(ctx.clone(), "fluents: [p]\ninitial: [~p]\n").unwrap_err();
        assert_eq!(err.get_kind(), &PlanErrorKind::InvalidLiteral("~p".to_owned()));

        let err = Problem::from_str(ctx.clone(), "fluents: [p, 'q r']\n").unwrap_err();
        assert_eq!(err.get_kind(), &PlanErrorKind::InvalidLiteral("q r".to_owned()));

        let err = Problem::from_str(ctx.clone(), "name: [cake]\n").unwrap_err();
        assert_eq!(err.get_kind(), &PlanErrorKind::YamlNameInvalid);

        let err = Problem::from_str(ctx.clone(), "fluents: [p, [q]]\n").unwrap_err();
        assert_eq!(err.get_kind(), &PlanErrorKind::YamlListInvalid("fluents".to_owned()));

        let err = Problem::from_str(ctx.clone(), "fluents: [p]\nactions: [{pre: [p]}]\n").unwrap_err();
        assert_eq!(err.get_kind(), &PlanErrorKind::YamlActionInvalid);

        let err = Problem::from_str(ctx.clone(), "fluents: [p]\nactions: [{name: A, eff: [p]}]\n").unwrap_err();
        assert_eq!(err.get_kind(), &PlanErrorKind::YamlActionInvalid);

        let err = Problem::from_str(ctx, "fluents: [p\n").unwrap_err();
        assert!(matches!(err.get_kind(), PlanErrorKind::YamlScan(_)));
    }

    #[test]
    fn test_programmatic() {
        let mut problem = Problem::new();
        let p = problem.add_fluent("At(C1, SFO)").unwrap();
        let q = problem.add_fluent("At(C1,JFK)").unwrap();
        assert_eq!(problem.add_fluent("At( C1, SFO )").unwrap(), p);
        assert_eq!(problem.get_fluents().len(), 2);
        let err = problem.add_fluent("~At(C2, SFO)").unwrap_err();
        assert_eq!(err.get_kind(), &PlanErrorKind::InvalidLiteral("~At(C2, SFO)".to_owned()));
        assert!(problem.get_context().lock().unwrap().get_prop_id("At(C2, SFO)").is_none());
        assert_eq!(problem.get_fluents().len(), 2);

        problem.set_initially(p).unwrap();
        assert_eq!(problem.get_initial_state(), &[true, false]);
        problem.add_goal(q).unwrap();
        problem.add_goal(q).unwrap();
        assert_eq!(problem.get_goal(), &[q]);

        let err = problem.set_initial_state(vec![true]).unwrap_err();
        assert_eq!(err.get_kind(), &PlanErrorKind::StateLengthMismatch(2, 1));
        assert_eq!(problem.literals_of(&[false, true]).unwrap(), vec![!p, q]);

        let mut other = Problem::with_context(problem.get_context().clone());
        let r = other.add_fluent("r").unwrap();
        let err = problem.add_action(Action::new("A").with_effect(r)).unwrap_err();
        assert_eq!(err.get_kind(), &PlanErrorKind::UnknownFluent("r".to_owned()));
    }
}
