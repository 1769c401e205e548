//! Document registry
//!
//! Maps external document identifiers to dense ordinals:
//! - ordinals start at 1 and are assigned in registration order
//! - a known identifier keeps its ordinal; registering it again is a no-op
//! - reverse lookup is a dense array indexed by `ordinal - 1`

use std::collections::HashMap;

use crate::error::{IndexError, Result};
use crate::models::{DocumentId, Ordinal};

/// Outcome of registering an external identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// Newly assigned ordinal
    New(Ordinal),
    /// Identifier was already known
    Existing(Ordinal),
}

impl Registration {
    pub fn ordinal(self) -> Ordinal {
        match self {
            Registration::New(ordinal) | Registration::Existing(ordinal) => ordinal,
        }
    }

    pub fn is_new(self) -> bool {
        matches!(self, Registration::New(_))
    }
}

/// Dense external-id to ordinal mapping owned by one index
#[derive(Clone, Debug)]
pub struct DocumentRegistry {
    /// Dense array: ordinal - 1 -> external id
    ids: Vec<DocumentId>,
    /// External id -> ordinal
    ordinals: HashMap<DocumentId, Ordinal>,
    /// Next ordinal to hand out
    next_ordinal: Ordinal,
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            ordinals: HashMap::new(),
            next_ordinal: Ordinal::FIRST,
        }
    }

    /// Look up `id`, assigning the next ordinal when it is unknown
    pub fn register(&mut self, id: &str) -> Result<Registration> {
        if let Some(&ordinal) = self.ordinals.get(id) {
            return Ok(Registration::Existing(ordinal));
        }

        let ordinal = self.next_ordinal;
        let next = ordinal
            .next()
            .ok_or_else(|| {
                IndexError::OrdinalOverflow(u32::try_from(self.ids.len()).unwrap_or(u32::MAX))
            })?;

        self.ids.push(id.to_string());
        self.ordinals.insert(id.to_string(), ordinal);
        self.next_ordinal = next;
        Ok(Registration::New(ordinal))
    }

    /// Get the ordinal of an external id
    pub fn ordinal(&self, id: &str) -> Option<Ordinal> {
        self.ordinals.get(id).copied()
    }

    /// Get the external id of an ordinal
    pub fn resolve(&self, ordinal: Ordinal) -> Option<&str> {
        self.ids.get(ordinal.slot()).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ordinals.contains_key(id)
    }

    pub fn next_ordinal(&self) -> Ordinal {
        self.next_ordinal
    }

    /// Number of registered documents
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// External ids in ordinal order
    pub fn ids(&self) -> &[DocumentId] {
        &self.ids
    }

    /// Iterate over `(ordinal, external id)` pairs in ordinal order
    pub fn iter(&self) -> impl Iterator<Item = (Ordinal, &str)> {
        self.ids
            .iter()
            .enumerate()
            .map(|(i, id)| (Ordinal::new(i as u32 + 1), id.as_str()))
    }

    /// Rebuild a registry from ids in ordinal order
    ///
    /// Fails when an id repeats or `next_ordinal` does not follow the last id.
    pub fn from_parts(ids: Vec<DocumentId>, next_ordinal: Ordinal) -> Result<Self> {
        if next_ordinal.as_u32() as usize != ids.len() + 1 {
            return Err(IndexError::Corrupt(format!(
                "next ordinal {} does not follow {} registered documents",
                next_ordinal.as_u32(),
                ids.len()
            )));
        }

        let mut ordinals = HashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            let ordinal = Ordinal::new(i as u32 + 1);
            if ordinals.insert(id.clone(), ordinal).is_some() {
                return Err(IndexError::Corrupt(format!(
                    "document id {:?} registered twice",
                    id
                )));
            }
        }

        Ok(Self {
            ids,
            ordinals,
            next_ordinal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_assigns_dense_ordinals() {
        let mut registry = DocumentRegistry::new();
        assert_eq!(registry.register("a").unwrap(), Registration::New(Ordinal(1)));
        assert_eq!(registry.register("b").unwrap(), Registration::New(Ordinal(2)));
        assert_eq!(registry.register("c").unwrap(), Registration::New(Ordinal(3)));
        assert_eq!(registry.next_ordinal(), Ordinal(4));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = DocumentRegistry::new();
        registry.register("a").unwrap();
        let again = registry.register("a").unwrap();

        assert_eq!(again, Registration::Existing(Ordinal(1)));
        assert!(!again.is_new());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.next_ordinal(), Ordinal(2));
    }

    #[test]
    fn test_ordinal_overflow() {
        let mut registry = DocumentRegistry::new();
        registry.register("a").unwrap();
        registry.next_ordinal = Ordinal(u32::MAX);

        let err = registry.register("b").unwrap_err();
        assert!(matches!(err, IndexError::OrdinalOverflow(1)));
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains("b"));
        // Known ids still resolve without consuming an ordinal
        assert_eq!(registry.register("a").unwrap(), Registration::Existing(Ordinal(1)));
    }

    #[test]
    fn test_reverse_lookup() {
        let mut registry = DocumentRegistry::new();
        registry.register("doc1").unwrap();
        registry.register("doc2").unwrap();

        assert_eq!(registry.resolve(Ordinal(2)), Some("doc2"));
        assert_eq!(registry.resolve(Ordinal(3)), None);
        assert_eq!(registry.resolve(Ordinal(0)), None);
        assert_eq!(registry.ordinal("doc1"), Some(Ordinal(1)));

        let pairs: Vec<_> = registry.iter().collect();
        assert_eq!(pairs, vec![(Ordinal(1), "doc1"), (Ordinal(2), "doc2")]);
    }

    #[test]
    fn test_from_parts_validates() {
        let ids = vec!["x".to_string(), "y".to_string()];
        let registry = DocumentRegistry::from_parts(ids.clone(), Ordinal(3)).unwrap();
        assert_eq!(registry.ordinal("y"), Some(Ordinal(2)));

        assert!(DocumentRegistry::from_parts(ids, Ordinal(5)).is_err());

        let dupes = vec!["x".to_string(), "x".to_string()];
        let err = DocumentRegistry::from_parts(dupes, Ordinal(3)).unwrap_err();
        assert!(err.is_deserialization_failure());
    }
}
