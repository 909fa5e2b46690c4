//! RustyDTD - Incremental DTD parsing with parameter entity substitution
//!
//! Layers:
//! - core: scanner, tokenizer, prolog state machine, entity data model
//! - reader: sliding input buffer, external entity resolution
//! - parser: parse contexts, tokenize-retry loop, entity expansion
//! - dump: textual rendering of the recorded atom tree
//!
//! Input is read in fixed-size chunks, so a DTD never needs to fit in
//! memory as one piece. Parameter entity references are expanded inline
//! and recorded as a tree: each reference points at the atoms of its
//! expansion.

pub mod config;
pub mod core;
pub mod dump;
pub mod error;
pub mod parser;
pub mod reader;

pub use config::ParserConfig;
pub use crate::core::dtd::{Atom, Entity, EntityId, EntityTable, ExternalId};
pub use crate::core::prolog::{Action, DeclarationParser, Origin, PrologParser};
pub use crate::core::tokenizer::TokenKind;
pub use error::{DtdError, Location, Result};
pub use parser::{parse_dtd, DtdParser, ParsedDtd};
pub use reader::resolver::{EntityResolver, MapResolver, NoResolver};
