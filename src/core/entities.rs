//! Character references and predefined entities
//!
//! Handles the parts of entity processing that need no entity table:
//! - Numeric character references: &#123; &#x7B;
//! - Recognition of the predefined entities: &lt; &gt; &amp; &quot; &apos;
//! - Escaping of token text for the tree dump
//!
//! Uses Cow for zero-copy when nothing needs escaping.

use memchr::memchr3;
use std::borrow::Cow;

/// Names of the five predefined general entities
const PREDEFINED: [&[u8]; 5] = [b"lt", b"gt", b"amp", b"quot", b"apos"];

/// Check if a general entity name is one of the predefined entities
#[inline]
pub fn is_predefined(name: &[u8]) -> bool {
    PREDEFINED.contains(&name)
}

/// Decode the digits of a character reference (without `&#` and `;`)
///
/// Accepts `x`-prefixed hexadecimal or plain decimal. Returns None when the
/// digits are malformed or the code point is not an XML Char.
pub fn decode_char_ref(digits: &[u8]) -> Option<char> {
    if digits.is_empty() {
        return None;
    }

    let codepoint = if digits[0] == b'x' {
        // Hexadecimal: &#xHHHH;
        let hex = std::str::from_utf8(&digits[1..]).ok()?;
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok()?
    } else {
        // Decimal: &#DDDD;
        if !digits.iter().all(|b| b.is_ascii_digit()) {
            return None;
        }
        std::str::from_utf8(digits).ok()?.parse::<u32>().ok()?
    };

    if !is_valid_xml_char(codepoint) {
        return None;
    }
    char::from_u32(codepoint)
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

/// Escape `<`, `>` and `&` for the tree dump
pub fn escape_text(input: &str) -> Cow<'_, str> {
    // Fast path: check if any escaping needed
    if memchr3(b'<', b'>', b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}
