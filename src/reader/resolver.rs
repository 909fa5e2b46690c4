//! External entity resolution
//!
//! Parameter entities declared with SYSTEM or PUBLIC identifiers have no
//! replacement text of their own. When one is referenced, the parser asks an
//! [`EntityResolver`] for its content. A resolver that has nothing to offer
//! returns `Ok(None)` and the reference expands to nothing.

use crate::core::dtd::ExternalId;
use std::collections::HashMap;
use std::io::{self, Cursor, Read};

/// Source of external entity content
pub trait EntityResolver {
    /// Open the content of an external entity, if available
    fn resolve(&mut self, id: &ExternalId) -> io::Result<Option<Box<dyn Read>>>;
}

/// Resolver that never finds anything (the default)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoResolver;

impl EntityResolver for NoResolver {
    fn resolve(&mut self, _id: &ExternalId) -> io::Result<Option<Box<dyn Read>>> {
        Ok(None)
    }
}

/// In-memory resolver keyed by system identifier, falling back to the
/// public identifier
#[derive(Debug, Default, Clone)]
pub struct MapResolver {
    entries: HashMap<String, Vec<u8>>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register content under an identifier
    pub fn insert(&mut self, id: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.entries.insert(id.into(), content.into());
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_entity(mut self, id: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(id, content);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntityResolver for MapResolver {
    fn resolve(&mut self, id: &ExternalId) -> io::Result<Option<Box<dyn Read>>> {
        let content = [&id.system_id, &id.public_id]
            .into_iter()
            .flatten()
            .find_map(|key| self.entries.get(key));
        Ok(content.map(|bytes| Box::new(Cursor::new(bytes.clone())) as Box<dyn Read>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(id: &str) -> ExternalId {
        ExternalId {
            system_id: Some(id.to_string()),
            public_id: None,
        }
    }

    #[test]
    fn test_no_resolver() {
        assert!(NoResolver.resolve(&system("a.ent")).unwrap().is_none());
    }

    #[test]
    fn test_map_resolver() {
        let mut resolver = MapResolver::new().with_entity("a.ent", "<!ELEMENT a EMPTY>");
        let mut reader = resolver.resolve(&system("a.ent")).unwrap().unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "<!ELEMENT a EMPTY>");

        assert!(resolver.resolve(&system("b.ent")).unwrap().is_none());
    }

    #[test]
    fn test_public_id_fallback() {
        let mut resolver = MapResolver::new().with_entity("-//X//Y", "x");
        let id = ExternalId {
            system_id: Some("missing".to_string()),
            public_id: Some("-//X//Y".to_string()),
        };
        assert!(resolver.resolve(&id).unwrap().is_some());
        assert_eq!(resolver.len(), 1);
    }
}
