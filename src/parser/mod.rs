//! DTD parser
//!
//! [`DtdParser`] reads a DTD from any `Read` source, expanding parameter
//! entity references as it goes, and returns a [`ParsedDtd`]: the entity
//! table, the atoms recorded for the document, and every diagnostic.
//!
//! ```
//! use rustydtd::parse_dtd;
//!
//! let dtd = parse_dtd(b"<!ENTITY % p 'foo'><!ENTITY % q '%p;bar'><!ELEMENT e (%q;)>").unwrap();
//! assert!(dtd.is_well_formed());
//! assert_eq!(dtd.entity("q").unwrap().replacement_text(), Some("foobar"));
//! assert!(dtd.expanded_text().ends_with("<!ELEMENT e (foobar)>"));
//! ```

mod context;
mod substitution;
mod value;

use crate::config::ParserConfig;
use crate::core::dtd::{Atom, Entity, EntityTable};
use crate::core::prolog::Origin;
use crate::error::{DtdError, Result};
use crate::reader::buffered::SlidingBuffer;
use crate::reader::resolver::{EntityResolver, NoResolver};
use context::{ParseContext, Shared};
use std::io::Read;
use tracing::debug;

/// Builder for one parse of a DTD
pub struct DtdParser<'a> {
    reader: Box<dyn Read + 'a>,
    config: ParserConfig,
    resolver: Box<dyn EntityResolver + 'a>,
}

impl<'a> DtdParser<'a> {
    pub fn new<R: Read + 'a>(reader: R) -> Self {
        DtdParser {
            reader: Box::new(reader),
            config: ParserConfig::default(),
            resolver: Box::new(NoResolver),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the resolver used for external parameter entities
    pub fn with_resolver<E: EntityResolver + 'a>(mut self, resolver: E) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Parse the whole input
    ///
    /// Only a failing read is returned as an error. Everything else is
    /// collected in [`ParsedDtd::diagnostics`]; the scan stops at the first
    /// error that is not confined to a single reference or token.
    pub fn parse(self) -> Result<ParsedDtd> {
        let buffer = SlidingBuffer::from_boxed(self.reader, &self.config);
        let mut shared = Shared::new(self.resolver, self.config);
        let mut document = ParseContext::new(buffer, None);

        match document.parse_decls(&mut shared, Origin::External) {
            Ok(()) => {}
            Err(err @ DtdError::Io(_)) => return Err(err),
            Err(err) => shared.recover(err)?,
        }
        debug!(
            entities = shared.table.len(),
            diagnostics = shared.diagnostics.len(),
            "parsed DTD"
        );

        Ok(ParsedDtd {
            entities: shared.table,
            atoms: document.atoms,
            diagnostics: shared.diagnostics,
        })
    }
}

/// Parse a DTD held in memory with the default configuration
pub fn parse_dtd(input: &[u8]) -> Result<ParsedDtd> {
    DtdParser::new(input).parse()
}

/// Result of parsing a DTD
#[derive(Debug)]
pub struct ParsedDtd {
    entities: EntityTable,
    atoms: Vec<Atom>,
    diagnostics: Vec<DtdError>,
}

impl ParsedDtd {
    /// Name under which the document itself appears in dumps
    pub const DOCUMENT_NAME: &'static str = "#doc";

    /// Atoms recorded for the document, in input order
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    /// Look up a declared parameter entity
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get_by_name(name)
    }

    /// Every error found, in the order found
    pub fn diagnostics(&self) -> &[DtdError] {
        &self.diagnostics
    }

    pub fn is_well_formed(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// The DTD text with every parameter entity reference replaced by the
    /// text of its expansion
    pub fn expanded_text(&self) -> String {
        let mut out = String::new();
        self.append_expanded(&self.atoms, &mut out);
        out
    }

    fn append_expanded(&self, atoms: &[Atom], out: &mut String) {
        for atom in atoms {
            match atom {
                Atom::Literal { text, .. } => out.push_str(text),
                Atom::Reference { entity, expansion } => {
                    if let Some(atoms) = self.entities.get(*entity).expansion(*expansion) {
                        self.append_expanded(atoms, out);
                    }
                }
            }
        }
    }

    /// Render the atom tree, see [`crate::dump`]
    pub fn dump(&self) -> String {
        crate::dump::dump_document(self)
    }
}
