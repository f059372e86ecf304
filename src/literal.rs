use std::{fmt, ops};
use regex::Regex;
use crate::{AnyId, Context, Contextual, PlanError, PlanErrorKind};

/// An identifier of a ground proposition (a fluent).
///
/// The set of all propositions is a resource shared by every problem
/// and graph built in the same [`Context`].  Proposition names are
/// interned there and mapped to one-based serial `PropId`s.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct PropId(pub(crate) AnyId);

impl PropId {
    #[inline]
    pub const fn get(self) -> AnyId {
        self.0
    }
}

impl From<AnyId> for PropId {
    #[inline]
    fn from(id: AnyId) -> Self {
        PropId(id)
    }
}

impl From<PropId> for AnyId {
    #[inline]
    fn from(id: PropId) -> Self {
        id.0
    }
}

impl Contextual for PropId {
    fn format_locked(&self, ctx: &Context) -> Result<String, PlanError> {
        let name =
            ctx.get_prop_name(*self).ok_or_else(|| PlanError::from(PlanErrorKind::PropMissingForId(*self)))?;

        Ok(name.to_owned())
    }
}

/// A literal: a proposition or its negation.
///
/// Encoded as `2 * prop + polarity`, the way SAT solvers encode their
/// literals, so that negation flips the lowest bit and double
/// negation is the identity.  The same number serves as the literal's
/// bit index in [`Bits`] vectors.
///
/// [`Bits`]: crate::Bits
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct LiteralId(usize);

impl LiteralId {
    #[inline]
    pub fn new(prop_id: PropId, negated: bool) -> Self {
        LiteralId(prop_id.get().get() << 1 | negated as usize)
    }

    #[inline]
    pub fn positive(prop_id: PropId) -> Self {
        Self::new(prop_id, false)
    }

    #[inline]
    pub fn negative(prop_id: PropId) -> Self {
        Self::new(prop_id, true)
    }

    #[inline]
    pub fn get_prop_id(self) -> PropId {
        // A literal is only ever built from a nonzero `PropId`.
        PropId(AnyId::new(self.0 >> 1).expect("Literal of the bottom proposition"))
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 & 1 == 1
    }

    /// Returns the bit index of this literal.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl ops::Not for LiteralId {
    type Output = LiteralId;

    #[inline]
    fn not(self) -> Self::Output {
        LiteralId(self.0 ^ 1)
    }
}

impl fmt::Debug for LiteralId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_negative() {
            write!(f, "~p{}", self.0 >> 1)
        } else {
            write!(f, "p{}", self.0 >> 1)
        }
    }
}

impl Contextual for LiteralId {
    fn format_locked(&self, ctx: &Context) -> Result<String, PlanError> {
        let name = self.get_prop_id().format_locked(ctx)?;

        if self.is_negative() {
            Ok(format!("~{}", name))
        } else {
            Ok(name)
        }
    }
}

/// Splits literal text into polarity and the canonical proposition
/// name.
///
/// Accepted forms are `Name` and `Name(arg, ...)`, optionally
/// preceded by `~`.  Whitespace around the arguments is normalized,
/// so that `At(C1,SFO)` and `At( C1, SFO )` name the same
/// proposition.
pub(crate) fn parse_literal(text: &str) -> Result<(bool, String), PlanError> {
    lazy_static! {
        static ref LITERAL_RE: Regex =
            Regex::new(r"^\s*(~)?\s*([A-Za-z_][\w\-]*)\s*(?:\(([^()]*)\))?\s*$").unwrap();
        static ref ARG_RE: Regex = Regex::new(r"^[\w\-]+$").unwrap();
    }

    let cap = LITERAL_RE
        .captures(text)
        .ok_or_else(|| PlanError::from(PlanErrorKind::InvalidLiteral(text.to_owned())))?;
    let negated = cap.get(1).is_some();
    let head = &cap[2];

    match cap.get(3).map(|m| m.as_str().trim()) {
        Some(args) if !args.is_empty() => {
            let args: Vec<_> = args.split(',').map(str::trim).collect();

            if args.iter().all(|arg| ARG_RE.is_match(arg)) {
                Ok((negated, format!("{}({})", head, args.join(", "))))
            } else {
                Err(PlanErrorKind::InvalidLiteral(text.to_owned()).into())
            }
        }
        _ => Ok((negated, head.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(id: usize) -> PropId {
        PropId(AnyId::new(id).unwrap())
    }

    #[test]
    fn test_double_negation() {
        for id in 1..20 {
            let lit = LiteralId::positive(prop(id));
            assert_eq!(!!lit, lit);
            assert_ne!(!lit, lit);
            assert_eq!(!lit, LiteralId::negative(prop(id)));
            assert_eq!((!lit).get_prop_id(), prop(id));
        }
    }

    #[test]
    fn test_polarity() {
        let lit = LiteralId::new(prop(3), true);
        assert!(lit.is_negative());
        assert!(!(!lit).is_negative());
        assert_eq!(lit.index(), 7);
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_literal("Have(Cake)").unwrap(), (false, "Have(Cake)".to_owned()));
        assert_eq!(parse_literal(" ~ At( C1 ,SFO ) ").unwrap(), (true, "At(C1, SFO)".to_owned()));
        assert_eq!(parse_literal("p").unwrap(), (false, "p".to_owned()));
        assert_eq!(parse_literal("~p()").unwrap(), (true, "p".to_owned()));
        assert!(parse_literal("").is_err());
        assert!(parse_literal("~~p").is_err());
        assert!(parse_literal("At(C1,,SFO)").is_err());
        assert!(parse_literal("At(C1) extra").is_err());
    }
}
