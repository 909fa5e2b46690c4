//! Parameter entity substitution
//!
//! Expanding a reference scans the entity's replacement text in a child
//! [`ParseContext`] that shares the entity table with its parent. While the
//! child runs, the entity is held open by an [`ExpansionGuard`]; any
//! reference to an open entity is a recursion error, so cyclic definitions
//! terminate at the first repeat.

use super::context::{DeclState, ParseContext, Shared};
use crate::core::dtd::{Atom, EntityId};
use crate::core::position::Position;
use crate::core::prolog::{DeclarationParser, Origin};
use crate::error::{DtdError, Result};
use crate::reader::buffered::SlidingBuffer;
use std::ops::{Deref, DerefMut};
use tracing::debug;

/// How the expanded text is consumed
pub(crate) enum Expansion<'e> {
    /// Between declarations: the text is a sequence of declarations
    Outer,
    /// Inside a declaration: the text continues the declaration
    Inner {
        pp: &'e mut dyn DeclarationParser,
        decl_state: &'e mut DeclState,
    },
    /// Inside an entity value: the text is appended to the value
    Value(&'e mut String),
}

/// Holds an entity open for the lifetime of one expansion
///
/// Derefs to the shared state so the child context can keep using it.
pub(crate) struct ExpansionGuard<'g, 'a> {
    shared: &'g mut Shared<'a>,
    id: EntityId,
}

impl<'g, 'a> ExpansionGuard<'g, 'a> {
    pub fn open(shared: &'g mut Shared<'a>, id: EntityId) -> Self {
        shared.table.get_mut(id).open = true;
        ExpansionGuard { shared, id }
    }
}

impl<'a> Deref for ExpansionGuard<'_, 'a> {
    type Target = Shared<'a>;

    fn deref(&self) -> &Self::Target {
        self.shared
    }
}

impl DerefMut for ExpansionGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.shared
    }
}

impl Drop for ExpansionGuard<'_, '_> {
    fn drop(&mut self) {
        self.shared.table.get_mut(self.id).open = false;
    }
}

/// Expand the parameter entity `name`, referenced at offset `at` of the
/// parent's buffer
///
/// In prolog modes the child's atoms are stored as a new expansion of the
/// entity and a reference atom is appended to the parent, whether or not
/// the child finished cleanly.
pub(crate) fn expand(
    parent: &mut ParseContext<'_>,
    shared: &mut Shared<'_>,
    name: &str,
    at: usize,
    mode: Expansion<'_>,
) -> Result<()> {
    let id = match shared.table.lookup(name) {
        Some(id) => id,
        None => {
            return Err(DtdError::UndefPeRef {
                name: name.to_string(),
                location: parent.location_at(at),
            })
        }
    };

    let entity = shared.table.get(id);
    if entity.open {
        return Err(DtdError::Recursion {
            name: name.to_string(),
            location: parent.location_at(at),
        });
    }
    if entity.notation.is_some() {
        return Err(DtdError::UnparsedRef {
            name: name.to_string(),
            location: parent.location_at(at),
        });
    }

    let internal = entity.text.is_some();
    let buffer = match &entity.text {
        Some(text) => SlidingBuffer::from_text(text.clone().into_bytes(), Position::start(), 0),
        None => {
            let external_id = entity.external_id.clone();
            match shared.resolver.resolve(&external_id)? {
                Some(reader) => SlidingBuffer::from_boxed(reader, &shared.config),
                None => {
                    debug!(entity = name, ?external_id, "no content for parameter entity");
                    return Ok(());
                }
            }
        }
    };

    debug!(entity = name, internal, "expanding parameter entity");
    let mut child = ParseContext::new(buffer, Some(name.to_string()));
    let mut guard = ExpansionGuard::open(shared, id);

    let (result, record) = match mode {
        Expansion::Outer => {
            let origin = if internal {
                Origin::InternalEntity
            } else {
                Origin::External
            };
            (child.parse_decls(&mut guard, origin), true)
        }
        Expansion::Inner { pp, decl_state } => {
            (child.parse_inner(&mut guard, pp, decl_state), true)
        }
        Expansion::Value(out) => (child.parse_entity_value(&mut guard, out), false),
    };
    drop(guard);

    if record {
        let expansion = shared.table.record_expansion(id, child.atoms);
        parent.atoms.push(Atom::Reference { entity: id, expansion });
    }
    debug!(entity = name, ok = result.is_ok(), "finished parameter entity");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::core::tokenizer::TokenKind;
    use crate::reader::resolver::{MapResolver, NoResolver};

    fn shared_with(decls: &[(&str, Option<&str>)]) -> Shared<'static> {
        let mut shared = Shared::new(Box::new(NoResolver), ParserConfig::default());
        for (name, text) in decls {
            let id = shared.table.declare(name).unwrap();
            shared.table.get_mut(id).text = text.map(str::to_string);
        }
        shared
    }

    fn document() -> ParseContext<'static> {
        ParseContext::new(SlidingBuffer::from_text(b"%p;".to_vec(), Position::start(), 0), None)
    }

    #[test]
    fn test_guard_closes_on_drop() {
        let mut shared = shared_with(&[("p", Some(""))]);
        let id = shared.table.lookup("p").unwrap();
        {
            let guard = ExpansionGuard::open(&mut shared, id);
            assert!(guard.table.get(id).is_open());
            assert_eq!(guard.table.iter().filter(|e| e.is_open()).count(), 1);
        }
        assert!(!shared.table.get(id).is_open());
    }

    #[test]
    fn test_outer_expansion_records_reference() {
        let mut shared = shared_with(&[("p", Some("<!ELEMENT a EMPTY>"))]);
        let mut doc = document();
        expand(&mut doc, &mut shared, "p", 0, Expansion::Outer).unwrap();

        let id = shared.table.lookup("p").unwrap();
        assert_eq!(doc.atoms, vec![Atom::Reference { entity: id, expansion: 0 }]);
        let atoms = shared.table.get(id).atoms();
        assert_eq!(atoms.first(), Some(&Atom::literal(TokenKind::DeclOpen, "<!ELEMENT")));
        assert!(!shared.table.get(id).is_open());
    }

    #[test]
    fn test_reference_errors() {
        let mut shared = shared_with(&[("n", None)]);
        let id = shared.table.lookup("n").unwrap();
        shared.table.get_mut(id).notation = Some("gif".to_string());

        let mut doc = document();
        let err = expand(&mut doc, &mut shared, "undefined", 0, Expansion::Outer).unwrap_err();
        assert_eq!(err.code(), "UNDEF_PEREF");
        let err = expand(&mut doc, &mut shared, "n", 0, Expansion::Outer).unwrap_err();
        assert_eq!(err.code(), "UNPARSED_REF");
        assert!(doc.atoms.is_empty());
    }

    #[test]
    fn test_self_reference_is_recursion() {
        let mut shared = shared_with(&[("a", Some("%a;"))]);
        let mut doc = document();
        expand(&mut doc, &mut shared, "a", 0, Expansion::Outer).unwrap();

        // The repeat is a reference between declarations, so it is recorded
        assert_eq!(shared.diagnostics.len(), 1);
        let err = &shared.diagnostics[0];
        assert_eq!(err.code(), "RECURSION");
        assert_eq!(err.location().unwrap().entity.as_deref(), Some("a"));
        let id = shared.table.lookup("a").unwrap();
        assert!(!shared.table.get(id).is_open());
        assert_eq!(doc.atoms.len(), 1);
    }

    #[test]
    fn test_value_expansion_appends_text() {
        let mut shared = shared_with(&[("p", Some("foo")), ("q", Some("%p;bar"))]);
        let mut doc = document();
        let mut out = String::new();
        expand(&mut doc, &mut shared, "q", 0, Expansion::Value(&mut out)).unwrap();

        assert_eq!(out, "foobar");
        assert!(doc.atoms.is_empty());
        assert_eq!(shared.table.get_by_name("q").unwrap().expansion_count(), 0);
    }

    #[test]
    fn test_unresolved_external_is_empty() {
        let mut shared = shared_with(&[("ext", None)]);
        let mut doc = document();
        expand(&mut doc, &mut shared, "ext", 0, Expansion::Outer).unwrap();
        assert!(doc.atoms.is_empty());
    }

    #[test]
    fn test_resolved_external_is_streamed() {
        let resolver = MapResolver::new().with_entity("ext.dtd", "<!ELEMENT b ANY>");
        let mut shared = Shared::new(Box::new(resolver), ParserConfig::default().with_read_size(4));
        let id = shared.table.declare("ext").unwrap();
        shared.table.get_mut(id).external_id.system_id = Some("ext.dtd".to_string());

        let mut doc = document();
        expand(&mut doc, &mut shared, "ext", 0, Expansion::Outer).unwrap();
        assert_eq!(doc.atoms.len(), 1);
        assert_eq!(shared.table.get(id).atoms().len(), 6);
        assert!(shared.diagnostics.is_empty());
    }
}
