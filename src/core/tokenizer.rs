//! DTD Tokenizer - window-based token extraction
//!
//! Tokenizes a window `buf[start..]` of committed input in one of three modes:
//! - Prolog: declarations, literals, references, group punctuation
//! - EntityValue: the content of an entity-value literal
//! - IgnoreSection: the body of an `<![IGNORE[` section
//!
//! The window may end anywhere, including in the middle of a token. Instead of
//! guessing, the tokenizer reports what it knows as a [`Scan`] outcome and lets
//! the caller decide whether to fetch more input.

use super::entities::{decode_char_ref, is_predefined};
use super::scanner::{is_name_char, is_name_start_char, is_whitespace, Scanner};
use memchr::memchr2;

/// Type of DTD token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Whitespace between tokens
    PrologS,
    /// Processing instruction or text declaration: <?...?>
    Pi,
    /// Comment: <!--...-->
    Comment,
    /// Declaration keyword: <!ENTITY, <!ELEMENT, ...
    DeclOpen,
    /// Declaration close: >
    DeclClose,
    /// XML name
    Name,
    /// Name token that is not a name (starts with a digit, '-' or '.')
    Nmtoken,
    /// Reserved name: #PCDATA, #REQUIRED, ...
    PoundName,
    /// Quoted literal, including the quotes
    Literal,
    /// Lone '%' introducing a parameter entity declaration
    Percent,
    /// Parameter entity reference: %name;
    ParamEntityRef,
    /// (
    OpenParen,
    /// )
    CloseParen,
    /// |
    Or,
    /// ,
    Comma,
    /// ?, * or +
    Occurrence,
    /// [
    OpenBracket,
    /// ]
    CloseBracket,
    /// Conditional section open: <![
    CondSectOpen,
    /// Conditional section close: ]]>
    CondSectClose,
    /// Body of an ignored conditional section, through its closing ]]>
    IgnoreSect,
    /// Literal data inside an entity value
    DataChars,
    /// Line break inside an entity value (\n, \r or \r\n)
    DataNewline,
    /// General entity reference inside an entity value: &name;
    EntityRef,
    /// Reference to a predefined entity: &lt; &gt; &amp; &quot; &apos;
    MagicEntityRef,
    /// Character reference in the Basic Multilingual Plane
    CharRef,
    /// Character reference above U+FFFF
    CharPairRef,
}

/// A complete token ending at `end` (exclusive offset into the window buffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub end: usize,
    /// For character references: the resolved character
    pub ref_char: Option<char>,
}

/// Outcome of one tokenizer call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// A complete token
    Token(Token),
    /// The window is empty
    Empty,
    /// The window ends inside a token whose type cannot be decided yet
    Partial,
    /// The token runs to the end of the window and more input could extend it
    Extensible(TokenKind),
    /// Lexically invalid input at the given offset
    Invalid(usize),
    /// Start of the document element: the prolog is over
    EndOfProlog,
}

/// Which grammar the tokenizer applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Prolog,
    EntityValue,
    IgnoreSection,
}

#[inline]
fn token(kind: TokenKind, end: usize) -> Scan {
    Scan::Token(Token {
        kind,
        end,
        ref_char: None,
    })
}

/// Tokenize `buf[start..]` in the given mode
pub fn tokenize(mode: ScanMode, buf: &[u8], start: usize) -> Scan {
    match mode {
        ScanMode::Prolog => tokenize_prolog(buf, start),
        ScanMode::EntityValue => tokenize_entity_value(buf, start),
        ScanMode::IgnoreSection => tokenize_ignore_section(buf, start),
    }
}

/// Tokenize one prolog token
pub fn tokenize_prolog(buf: &[u8], start: usize) -> Scan {
    let mut s = Scanner::at(buf, start);
    let b = match s.peek() {
        Some(b) => b,
        None => return Scan::Empty,
    };

    match b {
        b if is_whitespace(b) => {
            s.skip_whitespace();
            if s.is_eof() {
                Scan::Extensible(TokenKind::PrologS)
            } else {
                token(TokenKind::PrologS, s.position())
            }
        }
        b'<' => scan_markup(buf, s),
        b'>' => token(TokenKind::DeclClose, start + 1),
        b'%' => match s.peek_at(1) {
            None => Scan::Partial,
            Some(c) if is_whitespace(c) => token(TokenKind::Percent, start + 1),
            Some(c) if is_name_start_char(c) => scan_reference(s, TokenKind::ParamEntityRef),
            Some(_) => Scan::Invalid(start + 1),
        },
        b'"' | b'\'' => {
            s.advance(1);
            match s.find_byte(b) {
                Some(close) => token(TokenKind::Literal, close + 1),
                None => Scan::Partial,
            }
        }
        b'(' => token(TokenKind::OpenParen, start + 1),
        b')' => token(TokenKind::CloseParen, start + 1),
        b'|' => token(TokenKind::Or, start + 1),
        b',' => token(TokenKind::Comma, start + 1),
        b'?' | b'*' | b'+' => token(TokenKind::Occurrence, start + 1),
        b'[' => token(TokenKind::OpenBracket, start + 1),
        b']' => match (s.peek_at(1), s.peek_at(2)) {
            (None, _) => Scan::Extensible(TokenKind::CloseBracket),
            (Some(b']'), None) => Scan::Partial,
            (Some(b']'), Some(b'>')) => token(TokenKind::CondSectClose, start + 3),
            _ => token(TokenKind::CloseBracket, start + 1),
        },
        b'#' => {
            s.advance(1);
            match s.peek() {
                None => Scan::Partial,
                Some(c) if is_name_start_char(c) => scan_name_like(s, TokenKind::PoundName),
                Some(_) => Scan::Invalid(start + 1),
            }
        }
        b if is_name_start_char(b) => scan_name_like(s, TokenKind::Name),
        b if is_name_char(b) => scan_name_like(s, TokenKind::Nmtoken),
        _ => Scan::Invalid(start),
    }
}

/// Scan markup starting with '<'
fn scan_markup(buf: &[u8], mut s: Scanner<'_>) -> Scan {
    let start = s.position();
    match s.peek_at(1) {
        None => Scan::Partial,
        Some(b'?') => {
            s.advance(2);
            match s.find_sequence(b"?>") {
                Some(close) => token(TokenKind::Pi, close + 2),
                None => Scan::Partial,
            }
        }
        Some(b'!') => match s.peek_at(2) {
            None => Scan::Partial,
            Some(b'-') => scan_comment(buf, s),
            Some(b'[') => token(TokenKind::CondSectOpen, start + 3),
            Some(c) if is_name_start_char(c) => {
                s.advance(2);
                s.skip_name_chars();
                // The keyword is only complete once something follows it
                if s.is_eof() {
                    Scan::Partial
                } else {
                    token(TokenKind::DeclOpen, s.position())
                }
            }
            Some(_) => Scan::Invalid(start + 2),
        },
        Some(c) if is_name_start_char(c) => Scan::EndOfProlog,
        Some(_) => Scan::Invalid(start + 1),
    }
}

/// Scan a comment starting with '<!-'
fn scan_comment(buf: &[u8], mut s: Scanner<'_>) -> Scan {
    let start = s.position();
    match s.peek_at(3) {
        None => return Scan::Partial,
        Some(b'-') => {}
        Some(_) => return Scan::Invalid(start + 3),
    }
    s.advance(4);
    match s.find_sequence(b"--") {
        None => Scan::Partial,
        Some(dashes) => match buf.get(dashes + 2) {
            None => Scan::Partial,
            Some(b'>') => token(TokenKind::Comment, dashes + 3),
            // "--" is not allowed inside a comment
            Some(_) => Scan::Invalid(dashes),
        },
    }
}

/// Scan `%name;` or `&name;` with the scanner on the introducing character
fn scan_reference(mut s: Scanner<'_>, kind: TokenKind) -> Scan {
    s.advance(1);
    s.skip_name_chars();
    match s.peek() {
        None => Scan::Partial,
        Some(b';') => token(kind, s.position() + 1),
        Some(_) => Scan::Invalid(s.position()),
    }
}

/// Scan a run of name characters that more input could extend
fn scan_name_like(mut s: Scanner<'_>, kind: TokenKind) -> Scan {
    s.skip_name_chars();
    if s.is_eof() {
        Scan::Extensible(kind)
    } else {
        token(kind, s.position())
    }
}

/// Tokenize one token of entity-value content
pub fn tokenize_entity_value(buf: &[u8], start: usize) -> Scan {
    let mut s = Scanner::at(buf, start);
    let b = match s.peek() {
        Some(b) => b,
        None => return Scan::Empty,
    };

    match b {
        b'%' => match s.peek_at(1) {
            None => Scan::Partial,
            Some(c) if is_name_start_char(c) => scan_reference(s, TokenKind::ParamEntityRef),
            Some(_) => Scan::Invalid(start + 1),
        },
        b'&' => match s.peek_at(1) {
            None => Scan::Partial,
            Some(b'#') => scan_char_ref(buf, s),
            Some(c) if is_name_start_char(c) => match scan_reference(s, TokenKind::EntityRef) {
                Scan::Token(t) if is_predefined(&buf[start + 1..t.end - 1]) => {
                    token(TokenKind::MagicEntityRef, t.end)
                }
                other => other,
            },
            Some(_) => Scan::Invalid(start + 1),
        },
        b'\n' => token(TokenKind::DataNewline, start + 1),
        b'\r' => match s.peek_at(1) {
            None => Scan::Extensible(TokenKind::DataNewline),
            Some(b'\n') => token(TokenKind::DataNewline, start + 2),
            Some(_) => token(TokenKind::DataNewline, start + 1),
        },
        _ => {
            s.advance(1);
            match s.find_value_break() {
                Some(brk) => token(TokenKind::DataChars, brk),
                None => Scan::Extensible(TokenKind::DataChars),
            }
        }
    }
}

/// Scan `&#...;` with the scanner on the '&'
fn scan_char_ref(buf: &[u8], mut s: Scanner<'_>) -> Scan {
    let start = s.position();
    s.advance(2);
    let digits_start = s.position();
    let hex = s.peek() == Some(b'x');
    if hex {
        s.advance(1);
    }
    while let Some(c) = s.peek() {
        let is_digit = if hex { c.is_ascii_hexdigit() } else { c.is_ascii_digit() };
        if !is_digit {
            break;
        }
        s.advance(1);
    }
    match s.peek() {
        None => Scan::Partial,
        Some(b';') => match decode_char_ref(&buf[digits_start..s.position()]) {
            Some(c) => Scan::Token(Token {
                kind: if c as u32 > 0xFFFF {
                    TokenKind::CharPairRef
                } else {
                    TokenKind::CharRef
                },
                end: s.position() + 1,
                ref_char: Some(c),
            }),
            None => Scan::Invalid(start),
        },
        Some(_) => Scan::Invalid(s.position()),
    }
}

/// Tokenize the body of an ignored conditional section through its `]]>`
///
/// Nested `<![ ... ]]>` pairs are balanced. Running out of input is always
/// `Partial`: an ignore section cannot end without its close.
pub fn tokenize_ignore_section(buf: &[u8], start: usize) -> Scan {
    let mut level = 0usize;
    let mut pos = start;

    while let Some(i) = memchr2(b'<', b']', &buf[pos..]) {
        let at = pos + i;
        let rest = &buf[at..];
        let pattern: &[u8] = if rest[0] == b'<' { b"<![" } else { b"]]>" };
        if rest.starts_with(pattern) {
            if rest[0] == b'<' {
                level += 1;
            } else if level == 0 {
                return token(TokenKind::IgnoreSect, at + 3);
            } else {
                level -= 1;
            }
            pos = at + 3;
        } else if pattern.starts_with(rest) {
            // Window ends inside a possible delimiter
            return Scan::Partial;
        } else {
            pos = at + 1;
        }
    }
    Scan::Partial
}
