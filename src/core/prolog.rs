//! Prolog declaration state machine
//!
//! Tracks which declaration is open and what role each token plays in it,
//! and tells the engine which semantic action a token implies. The machine
//! is deliberately permissive about content models and attribute types: it
//! checks the declaration skeleton and the nesting of groups and conditional
//! sections, which is what parameter-entity substitution depends on.

use super::tokenizer::TokenKind;

/// Semantic action implied by a prolog token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// The token names a general entity being declared
    GeneralEntityName,
    /// The token names a parameter entity being declared
    ParamEntityName,
    /// The token is an entity-value literal that may contain references
    EntityValueWithPeRefs,
    /// The token is the system literal of the entity being declared
    EntitySystemId,
    /// The token is the public literal of the entity being declared
    EntityPublicId,
    /// The token names the notation of an unparsed entity
    EntityNotationName,
    /// Parameter entity reference inside a declaration
    InnerParamEntityRef,
    /// Parameter entity reference between declarations
    OuterParamEntityRef,
    /// An ignored conditional section starts; the next token must be
    /// scanned in ignore-section mode
    IgnoreSectionStart,
}

/// Grammar collaborator consulted for every prolog token
pub trait DeclarationParser {
    /// Feed one token, with its source text, and get its action
    fn action(&mut self, kind: TokenKind, text: &[u8]) -> Result<Action, &'static str>;

    /// Current nesting depth of groups and conditional sections
    fn nesting_level(&self) -> usize;

    /// Accept end of input; fails if a declaration or section is still open
    fn end(&mut self) -> Result<(), &'static str>;
}

/// Where the declarations being parsed come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The external subset or an external parameter entity
    External,
    /// Replacement text of an internal parameter entity
    InternalEntity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between declarations
    Decls,
    EntityStart,
    EntityPercent,
    EntityName,
    EntityPublicLiteral,
    EntitySystemLiteral,
    EntityAfterExternalId,
    EntityNdata,
    ElementStart,
    ElementName,
    ElementGroup,
    ElementAfterGroup,
    AttlistStart,
    AttlistBody,
    NotationStart,
    NotationBody,
    CondSectStart,
    CondSectKeyword { ignore: bool },
    IgnoreBody,
    /// Only '>' may follow
    DeclEnd,
}

/// Default prolog grammar
#[derive(Debug)]
pub struct PrologParser {
    origin: Origin,
    state: State,
    group_level: usize,
    cond_level: usize,
    seen_token: bool,
}

impl PrologParser {
    pub fn new(origin: Origin) -> Self {
        PrologParser {
            origin,
            state: State::Decls,
            group_level: 0,
            cond_level: 0,
            seen_token: false,
        }
    }

    fn between_decls(
        &mut self,
        kind: TokenKind,
        text: &[u8],
        first: bool,
    ) -> Result<Action, &'static str> {
        match kind {
            TokenKind::Comment => Ok(Action::None),
            TokenKind::Pi => {
                if is_text_declaration(text) && (!first || self.origin != Origin::External) {
                    return Err("text declaration only allowed at the start of an external entity");
                }
                Ok(Action::None)
            }
            TokenKind::DeclOpen => {
                self.state = match &text[2..] {
                    b"ENTITY" => State::EntityStart,
                    b"ELEMENT" => State::ElementStart,
                    b"ATTLIST" => State::AttlistStart,
                    b"NOTATION" => State::NotationStart,
                    _ => return Err("unknown markup declaration"),
                };
                Ok(Action::None)
            }
            TokenKind::ParamEntityRef => Ok(Action::OuterParamEntityRef),
            TokenKind::CondSectOpen => {
                self.state = State::CondSectStart;
                Ok(Action::None)
            }
            TokenKind::CondSectClose => {
                if self.cond_level == 0 {
                    return Err("']]>' without an open conditional section");
                }
                self.cond_level -= 1;
                Ok(Action::None)
            }
            _ => Err("unexpected token between declarations"),
        }
    }

    fn open_group(&mut self) -> Action {
        self.group_level += 1;
        Action::None
    }

    fn close_group(&mut self) -> Result<Action, &'static str> {
        if self.group_level == 0 {
            return Err("')' without an open group");
        }
        self.group_level -= 1;
        Ok(Action::None)
    }

    fn close_declaration(&mut self) -> Result<Action, &'static str> {
        if self.group_level != 0 {
            return Err("declaration closed inside an open group");
        }
        self.state = State::Decls;
        Ok(Action::None)
    }
}

impl DeclarationParser for PrologParser {
    fn action(&mut self, kind: TokenKind, text: &[u8]) -> Result<Action, &'static str> {
        let first = !self.seen_token;
        self.seen_token = true;
        if kind == TokenKind::PrologS {
            return Ok(Action::None);
        }

        if self.state == State::Decls {
            return self.between_decls(kind, text, first);
        }

        // Inside a declaration a reference stands for tokens of this one
        if kind == TokenKind::ParamEntityRef {
            return Ok(Action::InnerParamEntityRef);
        }

        use TokenKind as T;
        match (self.state, kind) {
            (State::EntityStart, T::Percent) => {
                self.state = State::EntityPercent;
                Ok(Action::None)
            }
            (State::EntityStart, T::Name) => {
                self.state = State::EntityName;
                Ok(Action::GeneralEntityName)
            }
            (State::EntityPercent, T::Name) => {
                self.state = State::EntityName;
                Ok(Action::ParamEntityName)
            }
            (State::EntityName, T::Literal) => {
                self.state = State::DeclEnd;
                Ok(Action::EntityValueWithPeRefs)
            }
            (State::EntityName, T::Name) if text == b"SYSTEM" => {
                self.state = State::EntitySystemLiteral;
                Ok(Action::None)
            }
            (State::EntityName, T::Name) if text == b"PUBLIC" => {
                self.state = State::EntityPublicLiteral;
                Ok(Action::None)
            }
            (State::EntityPublicLiteral, T::Literal) => {
                self.state = State::EntitySystemLiteral;
                Ok(Action::EntityPublicId)
            }
            (State::EntitySystemLiteral, T::Literal) => {
                self.state = State::EntityAfterExternalId;
                Ok(Action::EntitySystemId)
            }
            (State::EntityAfterExternalId, T::Name) if text == b"NDATA" => {
                self.state = State::EntityNdata;
                Ok(Action::None)
            }
            (State::EntityAfterExternalId, T::DeclClose) => self.close_declaration(),
            (State::EntityNdata, T::Name) => {
                self.state = State::DeclEnd;
                Ok(Action::EntityNotationName)
            }

            (State::ElementStart, T::Name) => {
                self.state = State::ElementName;
                Ok(Action::None)
            }
            (State::ElementName, T::Name) if text == b"EMPTY" || text == b"ANY" => {
                self.state = State::DeclEnd;
                Ok(Action::None)
            }
            (State::ElementName, T::OpenParen) => {
                self.state = State::ElementGroup;
                Ok(self.open_group())
            }
            (State::ElementGroup, T::OpenParen) => Ok(self.open_group()),
            (State::ElementGroup, T::CloseParen) => {
                let action = self.close_group()?;
                if self.group_level == 0 {
                    self.state = State::ElementAfterGroup;
                }
                Ok(action)
            }
            (State::ElementGroup, T::Name | T::PoundName | T::Or | T::Comma | T::Occurrence) => {
                Ok(Action::None)
            }
            (State::ElementAfterGroup, T::Occurrence) => {
                self.state = State::DeclEnd;
                Ok(Action::None)
            }
            (State::ElementAfterGroup, T::DeclClose) => self.close_declaration(),

            (State::AttlistStart, T::Name) => {
                self.state = State::AttlistBody;
                Ok(Action::None)
            }
            (State::AttlistBody, T::OpenParen) => Ok(self.open_group()),
            (State::AttlistBody, T::CloseParen) => self.close_group(),
            (State::AttlistBody, T::Name | T::Nmtoken | T::PoundName | T::Literal | T::Or) => {
                Ok(Action::None)
            }
            (State::AttlistBody, T::DeclClose) => self.close_declaration(),

            (State::NotationStart, T::Name) => {
                self.state = State::NotationBody;
                Ok(Action::None)
            }
            (State::NotationBody, T::Name | T::Literal) => Ok(Action::None),
            (State::NotationBody, T::DeclClose) => self.close_declaration(),

            (State::CondSectStart, T::Name) if text == b"INCLUDE" || text == b"IGNORE" => {
                self.state = State::CondSectKeyword {
                    ignore: text == b"IGNORE",
                };
                Ok(Action::None)
            }
            (State::CondSectKeyword { ignore }, T::OpenBracket) => {
                self.cond_level += 1;
                if ignore {
                    self.state = State::IgnoreBody;
                    Ok(Action::IgnoreSectionStart)
                } else {
                    self.state = State::Decls;
                    Ok(Action::None)
                }
            }
            (State::IgnoreBody, T::IgnoreSect) => {
                self.cond_level -= 1;
                self.state = State::Decls;
                Ok(Action::None)
            }

            (State::DeclEnd, T::DeclClose) => self.close_declaration(),
            _ => Err("unexpected token in declaration"),
        }
    }

    fn nesting_level(&self) -> usize {
        self.group_level + self.cond_level
    }

    fn end(&mut self) -> Result<(), &'static str> {
        if self.state != State::Decls {
            return Err("input ended inside a declaration");
        }
        if self.cond_level != 0 {
            return Err("input ended inside a conditional section");
        }
        Ok(())
    }
}

/// `<?xml` followed by whitespace
fn is_text_declaration(text: &[u8]) -> bool {
    text.len() > 5 && text[2..5].eq_ignore_ascii_case(b"xml") && text[5].is_ascii_whitespace()
}
