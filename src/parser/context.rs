//! Parse contexts and the tokenize-retry loop
//!
//! A [`ParseContext`] is one activation of the engine: the document itself,
//! or a child scan over one entity's replacement text. Each context owns its
//! buffer and the atoms it records. Everything that outlives a single
//! context (the entity table, the diagnostics, the resolver) lives in
//! [`Shared`] and is passed down by reference.

use super::substitution::{expand, Expansion};
use super::value::assemble_value;
use crate::config::ParserConfig;
use crate::core::dtd::{Atom, EntityId, EntityTable};
use crate::core::prolog::{Action, DeclarationParser, Origin, PrologParser};
use crate::core::tokenizer::{tokenize, Scan, ScanMode, Token, TokenKind};
use crate::error::{DtdError, Location, Result};
use crate::reader::buffered::SlidingBuffer;
use crate::reader::resolver::EntityResolver;
use tracing::debug;

/// State shared by every context of one top-level parse
pub(crate) struct Shared<'a> {
    pub table: EntityTable,
    pub diagnostics: Vec<DtdError>,
    pub resolver: Box<dyn EntityResolver + 'a>,
    pub config: ParserConfig,
}

impl<'a> Shared<'a> {
    pub fn new(resolver: Box<dyn EntityResolver + 'a>, config: ParserConfig) -> Self {
        Shared {
            table: EntityTable::new(),
            diagnostics: Vec::new(),
            resolver,
            config,
        }
    }

    /// Record a diagnostic and carry on; I/O errors are handed back
    pub fn recover(&mut self, err: DtdError) -> Result<()> {
        if let DtdError::Io(_) = err {
            return Err(err);
        }
        debug!(code = err.code(), error = %err, "recorded diagnostic");
        self.diagnostics.push(err);
        Ok(())
    }
}

/// Declaration currently being parsed, as far as entities are concerned
#[derive(Debug, Default)]
pub(crate) struct DeclState {
    /// Parameter entity being declared; None for general entities and for
    /// redeclarations, whose details are ignored
    pub entity: Option<EntityId>,
    /// The next token is the body of an ignored conditional section
    pub ignore_section: bool,
}

impl DeclState {
    fn scan_mode(&mut self) -> ScanMode {
        if std::mem::take(&mut self.ignore_section) {
            ScanMode::IgnoreSection
        } else {
            ScanMode::Prolog
        }
    }
}

/// One activation of the engine over a single input
pub(crate) struct ParseContext<'b> {
    pub buffer: SlidingBuffer<'b>,
    /// Entity whose text is scanned here, None for the document
    pub entity_name: Option<String>,
    pub atoms: Vec<Atom>,
}

impl<'b> ParseContext<'b> {
    pub fn new(buffer: SlidingBuffer<'b>, entity_name: Option<String>) -> Self {
        ParseContext {
            buffer,
            entity_name,
            atoms: Vec::new(),
        }
    }

    /// Location of the byte at `offset` in this context's buffer
    pub fn location_at(&self, offset: usize) -> Location {
        let pos = self.buffer.position_at(offset);
        Location {
            entity: self.entity_name.clone(),
            line: pos.line,
            column: pos.column,
            offset: self.buffer.stream_offset_at(offset),
        }
    }

    fn syntax_error(&self, offset: usize, message: &'static str) -> DtdError {
        DtdError::Syntax {
            location: self.location_at(offset),
            message,
        }
    }

    /// Text of the last token, copied out of the buffer
    pub fn token_text(&self) -> String {
        String::from_utf8_lossy(self.buffer.token()).into_owned()
    }

    /// Next complete token, refilling the buffer as often as needed
    ///
    /// Returns None once the input is exhausted between tokens. Invalid
    /// input in prolog mode is recorded and skipped; in the other modes it
    /// is an error.
    pub fn next_token(&mut self, mode: ScanMode, shared: &mut Shared<'_>) -> Result<Option<Token>> {
        loop {
            let start = self.buffer.buf_start();
            match tokenize(mode, self.buffer.window(), start) {
                Scan::Token(token) => {
                    self.buffer.commit(token.end);
                    return Ok(Some(token));
                }
                Scan::Empty => {
                    if !self.buffer.fill()? {
                        return Ok(None);
                    }
                }
                Scan::Partial => {
                    if !self.buffer.fill()? {
                        // fill may have moved the data
                        return Err(DtdError::UnclosedToken {
                            location: self.location_at(self.buffer.buf_start()),
                        });
                    }
                }
                Scan::Extensible(kind) => {
                    if !self.buffer.fill()? {
                        let end = self.buffer.buf_end();
                        self.buffer.commit(end);
                        return Ok(Some(Token {
                            kind,
                            end,
                            ref_char: None,
                        }));
                    }
                }
                Scan::Invalid(offset) => {
                    let err = DtdError::InvalidToken {
                        location: self.location_at(offset),
                    };
                    if mode != ScanMode::Prolog {
                        return Err(err);
                    }
                    shared.recover(err)?;
                    self.buffer.commit(offset + 1);
                }
                Scan::EndOfProlog => {
                    return Err(self.syntax_error(start, "element start tag inside a DTD"));
                }
            }
        }
    }

    /// Parse a sequence of declarations to the end of this context's input
    pub fn parse_decls(&mut self, shared: &mut Shared<'_>, origin: Origin) -> Result<()> {
        let mut pp = PrologParser::new(origin);
        let mut decl_state = DeclState::default();

        loop {
            let mode = decl_state.scan_mode();
            match self.next_token(mode, shared)? {
                Some(token) => self.prolog_action(token, shared, &mut pp, &mut decl_state)?,
                None => break,
            }
        }

        let end = self.buffer.buf_end();
        pp.end().map_err(|message| self.syntax_error(end, message))
    }

    /// Parse the text of a parameter entity referenced inside a declaration
    ///
    /// The tokens continue the enclosing declaration, so they go through the
    /// same grammar state. The text must leave the nesting level unchanged
    /// and must not close the declaration.
    pub fn parse_inner(
        &mut self,
        shared: &mut Shared<'_>,
        pp: &mut dyn DeclarationParser,
        decl_state: &mut DeclState,
    ) -> Result<()> {
        let level = pp.nesting_level();

        loop {
            // A section opened here and left for the caller to skip
            if decl_state.ignore_section && self.at_end()? {
                break;
            }
            let mode = decl_state.scan_mode();
            let token = match self.next_token(mode, shared)? {
                Some(token) => token,
                None => break,
            };
            if token.kind == TokenKind::CondSectClose {
                return Err(DtdError::PeGroupNesting {
                    location: self.location_at(self.buffer.token_start()),
                });
            }
            self.prolog_action(token, shared, pp, decl_state)?;
            if token.kind == TokenKind::DeclClose {
                return Err(DtdError::PeDeclNesting {
                    location: self.location_at(self.buffer.token_start()),
                });
            }
        }

        if pp.nesting_level() != level {
            return Err(DtdError::PeGroupNesting {
                location: self.location_at(self.buffer.buf_end()),
            });
        }
        Ok(())
    }

    /// True once every byte of this context's input has been consumed
    fn at_end(&mut self) -> Result<bool> {
        while self.buffer.buf_start() == self.buffer.buf_end() {
            if !self.buffer.fill()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Record a prolog token and carry out the action the grammar assigns it
    fn prolog_action(
        &mut self,
        token: Token,
        shared: &mut Shared<'_>,
        pp: &mut dyn DeclarationParser,
        decl_state: &mut DeclState,
    ) -> Result<()> {
        let start = self.buffer.token_start();
        if token.kind != TokenKind::ParamEntityRef {
            self.atoms.push(Atom::literal(token.kind, self.token_text()));
        }

        let action = pp
            .action(token.kind, self.buffer.token())
            .map_err(|message| self.syntax_error(start, message))?;

        match action {
            Action::None => {}
            Action::GeneralEntityName => decl_state.entity = None,
            Action::ParamEntityName => {
                let name = self.token_text();
                decl_state.entity = shared.table.declare(&name);
                match decl_state.entity {
                    Some(_) => debug!(entity = %name, "declared parameter entity"),
                    None => debug!(entity = %name, "ignored redeclaration"),
                }
            }
            Action::EntityValueWithPeRefs => {
                if let Some(id) = decl_state.entity {
                    match assemble_value(self, shared) {
                        Ok(text) => shared.table.get_mut(id).text = Some(text),
                        Err(err) => shared.recover(err)?,
                    }
                }
            }
            Action::EntitySystemId => {
                if let Some(id) = decl_state.entity {
                    shared.table.get_mut(id).external_id.system_id = Some(self.literal_text());
                }
            }
            Action::EntityPublicId => {
                if let Some(id) = decl_state.entity {
                    shared.table.get_mut(id).external_id.public_id = Some(self.literal_text());
                }
            }
            Action::EntityNotationName => {
                if let Some(id) = decl_state.entity {
                    shared.table.get_mut(id).notation = Some(self.token_text());
                }
            }
            Action::OuterParamEntityRef => {
                let name = self.reference_name();
                let result = expand(self, shared, &name, start, Expansion::Outer);
                self.recover_reference(shared, result)?;
            }
            Action::InnerParamEntityRef => {
                let name = self.reference_name();
                let expansion = Expansion::Inner { pp, decl_state };
                let result = expand(self, shared, &name, start, expansion);
                self.recover_reference(shared, result)?;
            }
            Action::IgnoreSectionStart => decl_state.ignore_section = true,
        }
        Ok(())
    }

    /// Reference errors in the prolog only cost the reference itself
    fn recover_reference(&self, shared: &mut Shared<'_>, result: Result<()>) -> Result<()> {
        match result {
            Err(err) if err.is_reference_error() => shared.recover(err),
            other => other,
        }
    }

    /// Name inside the last token, which is `%name;`
    pub fn reference_name(&self) -> String {
        let token = self.buffer.token();
        String::from_utf8_lossy(&token[1..token.len() - 1]).into_owned()
    }

    /// Contents of the last token, which is a quoted literal
    fn literal_text(&self) -> String {
        let token = self.buffer.token();
        String::from_utf8_lossy(&token[1..token.len() - 1]).into_owned()
    }
}
