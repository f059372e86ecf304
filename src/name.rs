use std::collections::HashMap;
use crate::AnyId;

/// An interned `String` representing the name of a proposition.
pub(crate) type Name = string_cache::DefaultAtom;

/// This type maintains a bijection between proposition [`Name`]s and
/// their serial [`AnyId`]s.
///
/// Identifiers are one-based: the entry at index zero is a bottom
/// name which is never handed out.
#[derive(Debug)]
pub(crate) struct NameSpace {
    names: Vec<Name>,
    ids:   HashMap<Name, AnyId>,
}

impl NameSpace {
    pub(crate) fn get_name(&self, id: AnyId) -> Option<&str> {
        self.names.get(id.get()).map(|n| n.as_ref())
    }

    pub(crate) fn get_id<S: AsRef<str>>(&self, name: S) -> Option<AnyId> {
        self.ids.get(&Name::from(name.as_ref())).copied()
    }

    pub(crate) fn share_name<S: AsRef<str>>(&mut self, name: S) -> AnyId {
        let name = Name::from(name.as_ref());

        if let Some(&id) = self.ids.get(&name) {
            id
        } else {
            let id = AnyId::new(self.names.len()).expect("Name space lost its bottom entry");

            self.names.push(name.clone());
            self.ids.insert(name, id);

            id
        }
    }

    /// Returns the number of names shared so far.
    pub(crate) fn len(&self) -> usize {
        self.names.len() - 1
    }
}

impl Default for NameSpace {
    fn default() -> Self {
        Self { names: vec![Name::from("")], ids: Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_name() {
        let mut names = NameSpace::default();
        let a = names.share_name("At(C1, SFO)");
        let b = names.share_name("At(C2, JFK)");
        assert_ne!(a, b);
        assert_eq!(names.share_name("At(C1, SFO)"), a);
        assert_eq!(names.get_id("At(C2, JFK)"), Some(b));
        assert_eq!(names.get_name(a), Some("At(C1, SFO)"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_missing_name() {
        let names = NameSpace::default();
        assert_eq!(names.get_id("Nowhere"), None);
        assert_eq!(names.len(), 0);
    }
}
