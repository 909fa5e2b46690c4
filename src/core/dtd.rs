//! Parameter Entity Store and Parse Record
//!
//! Collects parameter entity declarations during parsing together with the
//! atoms recorded while scanning the document and each entity expansion.
//! Atoms refer to entities by [`EntityId`], so the record forms a tree
//! rooted at the document without reference cycles.

use super::tokenizer::TokenKind;
use std::collections::HashMap;

/// Index of an entity within its [`EntityTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(usize);

/// One unit of recorded output
#[derive(Debug, Clone)]
pub enum Atom {
    /// A token with its exact source text
    Literal { kind: TokenKind, text: String },
    /// A parameter entity was expanded here; its content is the entity's
    /// `expansion`-th recorded expansion
    Reference { entity: EntityId, expansion: usize },
}

impl Atom {
    pub fn literal(kind: TokenKind, text: impl Into<String>) -> Self {
        Atom::Literal {
            kind,
            text: text.into(),
        }
    }
}

/// Literal atoms compare by kind and text, reference atoms by entity identity
impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Atom::Literal { kind, text },
                Atom::Literal {
                    kind: other_kind,
                    text: other_text,
                },
            ) => kind == other_kind && text == other_text,
            (Atom::Reference { entity, .. }, Atom::Reference { entity: other, .. }) => {
                entity == other
            }
            _ => false,
        }
    }
}

impl Eq for Atom {}

/// External identifier of an entity declared with SYSTEM or PUBLIC
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalId {
    pub system_id: Option<String>,
    pub public_id: Option<String>,
}

/// A declared parameter entity
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    /// Fully expanded replacement text, once the value literal is parsed
    pub(crate) text: Option<String>,
    /// Notation name for unparsed entities (NDATA)
    pub(crate) notation: Option<String>,
    pub(crate) external_id: ExternalId,
    /// True while this entity is being expanded somewhere on the call stack
    pub(crate) open: bool,
    /// Atoms of every expansion, in the order the references were met
    pub(crate) expansions: Vec<Vec<Atom>>,
}

impl Entity {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Entity {
            name: name.into(),
            text: None,
            notation: None,
            external_id: ExternalId::default(),
            open: false,
            expansions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cached replacement text, if the value literal has been parsed
    pub fn replacement_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Notation name if the entity is unparsed
    pub fn notation(&self) -> Option<&str> {
        self.notation.as_deref()
    }

    pub fn external_id(&self) -> &ExternalId {
        &self.external_id
    }

    /// True while the entity is being expanded
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Atoms of the most recent expansion
    pub fn atoms(&self) -> &[Atom] {
        self.expansions.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Atoms of one particular expansion
    pub fn expansion(&self, index: usize) -> Option<&[Atom]> {
        self.expansions.get(index).map(Vec::as_slice)
    }

    pub fn expansion_count(&self) -> usize {
        self.expansions.len()
    }
}

/// Parameter entities declared during one parse, shared by every nested
/// parse context it spawns
#[derive(Debug, Default)]
pub struct EntityTable {
    entities: Vec<Entity>,
    by_name: HashMap<String, EntityId>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter entity
    ///
    /// First declaration wins (per XML spec): returns None, and changes
    /// nothing, if the name is already declared.
    pub fn declare(&mut self, name: &str) -> Option<EntityId> {
        if self.by_name.contains_key(name) {
            return None;
        }
        let id = EntityId(self.entities.len());
        self.entities.push(Entity::new(name));
        self.by_name.insert(name.to_string(), id);
        Some(id)
    }

    pub fn lookup(&self, name: &str) -> Option<EntityId> {
        self.by_name.get(name).copied()
    }

    /// Look up an entity by name
    pub fn get_by_name(&self, name: &str) -> Option<&Entity> {
        self.lookup(name).map(|id| &self.entities[id.0])
    }

    pub fn get(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0]
    }

    /// Store the atoms of a finished expansion, returning its index
    pub(crate) fn record_expansion(&mut self, id: EntityId, atoms: Vec<Atom>) -> usize {
        let expansions = &mut self.entities[id.0].expansions;
        expansions.push(atoms);
        expansions.len() - 1
    }

    /// Entities in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_declaration_wins() {
        let mut table = EntityTable::new();
        let first = table.declare("p").unwrap();
        table.get_mut(first).text = Some("first".to_string());

        assert!(table.declare("p").is_none());
        assert_eq!(table.len(), 1);
        assert_eq!(table.get_by_name("p").unwrap().replacement_text(), Some("first"));
    }

    #[test]
    fn test_atom_equality() {
        let mut table = EntityTable::new();
        let a = table.declare("a").unwrap();
        let b = table.declare("b").unwrap();

        assert_eq!(Atom::literal(TokenKind::Name, "x"), Atom::literal(TokenKind::Name, "x"));
        assert_ne!(Atom::literal(TokenKind::Name, "x"), Atom::literal(TokenKind::Nmtoken, "x"));
        assert_eq!(
            Atom::Reference { entity: a, expansion: 0 },
            Atom::Reference { entity: a, expansion: 3 }
        );
        assert_ne!(
            Atom::Reference { entity: a, expansion: 0 },
            Atom::Reference { entity: b, expansion: 0 }
        );
    }

    #[test]
    fn test_expansion_history() {
        let mut table = EntityTable::new();
        let id = table.declare("p").unwrap();
        assert!(table.get(id).atoms().is_empty());

        let first = table.record_expansion(id, vec![Atom::literal(TokenKind::Name, "one")]);
        let second = table.record_expansion(id, vec![Atom::literal(TokenKind::Name, "two")]);

        assert_eq!((first, second), (0, 1));
        assert_eq!(table.get(id).atoms(), &[Atom::literal(TokenKind::Name, "two")]);
        assert_eq!(
            table.get(id).expansion(0),
            Some(&[Atom::literal(TokenKind::Name, "one")][..])
        );
    }
}
