//! Entity value assembly
//!
//! Turns the literal of an entity declaration into replacement text: data
//! and general entity references are copied as written, character
//! references are resolved, line breaks are normalized to `\n`, and
//! parameter entity references are expanded in place.

use super::context::{ParseContext, Shared};
use super::substitution::{expand, Expansion};
use crate::core::tokenizer::{ScanMode, TokenKind};
use crate::error::{DtdError, Result};
use crate::reader::buffered::SlidingBuffer;

/// Build the replacement text for the literal that is `parent`'s last token
///
/// The literal's contents are scanned in a child context that reports
/// positions in the parent's coordinates. A token cut off by the closing
/// quote is reported at the quote.
pub(crate) fn assemble_value(parent: &ParseContext<'_>, shared: &mut Shared<'_>) -> Result<String> {
    let literal = parent.buffer.token();
    let content_start = parent.buffer.token_start() + 1;
    let closing_quote = parent.buffer.buf_start() - 1;

    let buffer = SlidingBuffer::from_text(
        literal[1..literal.len() - 1].to_vec(),
        parent.buffer.position_at(content_start),
        parent.buffer.stream_offset_at(content_start),
    );
    let mut child = ParseContext::new(buffer, parent.entity_name.clone());

    let mut value = String::new();
    match child.parse_entity_value(shared, &mut value) {
        Ok(()) => Ok(value),
        Err(DtdError::UnclosedToken { .. }) => Err(DtdError::UnclosedToken {
            location: parent.location_at(closing_quote),
        }),
        Err(DtdError::InvalidToken { location }) => Err(DtdError::NotWellFormed { location }),
        Err(err) => Err(err),
    }
}

impl ParseContext<'_> {
    /// Append the expanded text of this context's input to `out`
    pub(crate) fn parse_entity_value(
        &mut self,
        shared: &mut Shared<'_>,
        out: &mut String,
    ) -> Result<()> {
        while let Some(token) = self.next_token(ScanMode::EntityValue, shared)? {
            match token.kind {
                TokenKind::DataChars | TokenKind::EntityRef | TokenKind::MagicEntityRef => {
                    out.push_str(&String::from_utf8_lossy(self.buffer.token()));
                }
                TokenKind::CharRef | TokenKind::CharPairRef => out.extend(token.ref_char),
                TokenKind::DataNewline => out.push('\n'),
                TokenKind::ParamEntityRef => {
                    let name = self.reference_name();
                    let at = self.buffer.token_start();
                    expand(self, shared, &name, at, Expansion::Value(&mut *out))?;
                }
                _ => {
                    return Err(DtdError::NotWellFormed {
                        location: self.location_at(self.buffer.token_start()),
                    })
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::core::position::Position;
    use crate::reader::resolver::NoResolver;

    fn shared() -> Shared<'static> {
        let mut shared = Shared::new(Box::new(NoResolver), ParserConfig::default());
        let id = shared.table.declare("p").unwrap();
        shared.table.get_mut(id).text = Some("foo".to_string());
        shared
    }

    /// Assemble the value of the single literal in `decl_prefix + literal`
    fn assemble(decl_prefix: &str, literal: &str, shared: &mut Shared<'_>) -> Result<String> {
        let input = format!("{}{}", decl_prefix, literal);
        let buffer = SlidingBuffer::from_text(input.into_bytes(), Position::start(), 0);
        let mut ctx = ParseContext::new(buffer, None);
        ctx.buffer.commit(decl_prefix.len());
        ctx.buffer.commit(decl_prefix.len() + literal.len());
        assemble_value(&ctx, shared)
    }

    #[test]
    fn test_plain_and_references() {
        let mut shared = shared();
        assert_eq!(assemble("", "\"abc\"", &mut shared).unwrap(), "abc");
        assert_eq!(assemble("", "\"%p;bar\"", &mut shared).unwrap(), "foobar");
        assert_eq!(assemble("", "'&amp;&x;'", &mut shared).unwrap(), "&amp;&x;");
    }

    #[test]
    fn test_char_refs_and_newlines() {
        let mut shared = shared();
        assert_eq!(assemble("", "\"&#37;a;\"", &mut shared).unwrap(), "%a;");
        assert_eq!(assemble("", "\"&#x1F600;\"", &mut shared).unwrap(), "\u{1F600}");
        assert_eq!(assemble("", "\"a\r\nb\rc\"", &mut shared).unwrap(), "a\nb\nc");
    }

    #[test]
    fn test_unclosed_reference_reported_at_quote() {
        let mut shared = shared();
        let err = assemble("<!ENTITY % e ", "\"a&amp\"", &mut shared).unwrap_err();
        assert_eq!(err.code(), "UNCLOSED_TOKEN");
        let location = err.location().unwrap();
        assert_eq!(location.offset, 19);
        assert_eq!(location.column, 19);
    }

    #[test]
    fn test_malformed_value() {
        let mut shared = shared();
        let err = assemble("<!ENTITY % e ", "\"a & b\"", &mut shared).unwrap_err();
        assert_eq!(err.code(), "NOT_WELL_FORMED");
        assert_eq!(err.location().unwrap().offset, 17);
    }

    #[test]
    fn test_undefined_reference_propagates() {
        let mut shared = shared();
        let err = assemble("", "\"%nope;\"", &mut shared).unwrap_err();
        assert_eq!(err.code(), "UNDEF_PEREF");
        assert!(shared.diagnostics.is_empty());
    }
}
