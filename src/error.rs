use std::{fmt, error::Error};
use crate::{LiteralId, PropId, ActionId};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PlanErrorKind {
    UnreachableGoal(Vec<LiteralId>),
    UnreachableGoalSet,

    StateLengthMismatch(usize, usize),
    PropMissingForId(PropId),
    ActionMissingForId(ActionId),
    UnknownFluent(String),
    InvalidLiteral(String),
    ContextPoisoned,

    YamlEmpty,
    YamlMultiple,
    YamlNotADict,
    YamlKeyNotString,
    YamlNameInvalid,
    YamlListInvalid(String),
    YamlActionInvalid,
    YamlOptionInvalid(String),
    YamlScan(String),

    Io(String),
}

impl fmt::Display for PlanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use PlanErrorKind::*;

        match self {
            UnreachableGoal(goals) => {
                write!(f, "Planning graph leveled off before reaching goals {:?}", goals)
            }
            UnreachableGoalSet => {
                write!(f, "Planning graph leveled off with goals still pairwise mutex")
            }
            StateLengthMismatch(expected, found) => {
                write!(f, "State vector has {} entries, but there are {} fluents", found, expected)
            }
            PropMissingForId(id) => write!(f, "Proposition is missing for {:?}", id),
            ActionMissingForId(id) => write!(f, "Action is missing for {:?}", id),
            UnknownFluent(name) => write!(f, "Unknown fluent '{}'", name),
            InvalidLiteral(text) => write!(f, "Invalid literal '{}'", text),
            ContextPoisoned => write!(f, "Context lock is poisoned"),
            YamlEmpty => write!(f, "YAML description is empty"),
            YamlMultiple => write!(f, "Multiple YAML descriptions"),
            YamlNotADict => write!(f, "Bad YAML description (not a dictionary)"),
            YamlKeyNotString => write!(f, "Non-string key in YAML description"),
            YamlNameInvalid => write!(f, "Invalid problem name in YAML description (not a string)"),
            YamlListInvalid(key) => write!(f, "Invalid list of literals under '{}'", key),
            YamlActionInvalid => write!(f, "Invalid action in YAML description"),
            YamlOptionInvalid(key) => write!(f, "Invalid value of option '{}'", key),
            YamlScan(msg) => write!(f, "YAML syntax error: {}", msg),
            Io(msg) => write!(f, "{}", msg),
        }
    }
}

impl PlanErrorKind {
    #[inline]
    pub fn with_level(self, level: usize) -> PlanError {
        PlanError { kind: self, level: Some(level) }
    }
}

/// An error returned by graph construction, heuristic queries and
/// problem loading.
///
/// Unreachability errors carry the index of the last literal layer
/// built before the graph leveled off.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PlanError {
    kind:  PlanErrorKind,
    level: Option<usize>,
}

impl PlanError {
    #[inline]
    pub fn get_kind(&self) -> &PlanErrorKind {
        &self.kind
    }

    #[inline]
    pub fn get_level(&self) -> Option<usize> {
        self.level
    }

    /// Returns `true` if this error means the heuristic value is
    /// infinite, i.e. the goals can't be reached from the state the
    /// graph was built for.
    pub fn is_unreachable(&self) -> bool {
        matches!(self.kind, PlanErrorKind::UnreachableGoal(_) | PlanErrorKind::UnreachableGoalSet)
    }
}

impl From<PlanErrorKind> for PlanError {
    #[inline]
    fn from(kind: PlanErrorKind) -> Self {
        PlanError { kind, level: None }
    }
}

impl From<std::io::Error> for PlanError {
    fn from(err: std::io::Error) -> Self {
        PlanErrorKind::Io(err.to_string()).into()
    }
}

impl From<yaml_rust::ScanError> for PlanError {
    fn from(err: yaml_rust::ScanError) -> Self {
        PlanErrorKind::YamlScan(err.to_string()).into()
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(level) = self.level {
            write!(f, "{} (level {})", self.kind, level)
        } else {
            self.kind.fmt(f)
        }
    }
}

impl Error for PlanError {}
