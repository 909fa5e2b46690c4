//! SIMD-accelerated DTD scanning using memchr
//!
//! A cursor over one tokenizer window. The window always ends where the
//! committed data of the sliding buffer ends, so running off the end of the
//! input here means "no more data yet", never "end of document".

use memchr::{memchr, memchr3};

/// Scanner for DTD delimiter detection
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a scanner positioned at `pos` within `input`
    #[inline]
    pub fn at(input: &'a [u8], pos: usize) -> Self {
        Scanner { input, pos }
    }

    /// Get the current position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Check if we've reached the end of the window
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peek at byte at offset from current position
    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Advance by n bytes
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    /// Skip whitespace, returning true if any was skipped
    #[inline]
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !is_whitespace(b) {
                break;
            }
            self.pos += 1;
        }
        self.pos > start
    }

    /// Skip name characters, returning true if any were skipped
    #[inline]
    pub fn skip_name_chars(&mut self) -> bool {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !is_name_char(b) {
                break;
            }
            self.pos += 1;
        }
        self.pos > start
    }

    /// Find next occurrence of a specific byte
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Find the start of the next markup-significant byte in entity-value data
    #[inline]
    pub fn find_value_break(&self) -> Option<usize> {
        let rest = &self.input[self.pos..];
        let special = memchr3(b'%', b'&', b'\r', rest);
        let newline = memchr(b'\n', rest);
        match (special, newline) {
            (Some(a), Some(b)) => Some(self.pos + a.min(b)),
            (Some(a), None) | (None, Some(a)) => Some(self.pos + a),
            (None, None) => None,
        }
    }

    /// Find the next occurrence of a byte sequence
    pub fn find_sequence(&self, needle: &[u8]) -> Option<usize> {
        let first = *needle.first()?;
        let mut from = self.pos;
        while let Some(i) = memchr(first, &self.input[from..]) {
            let at = from + i;
            if self.input[at..].starts_with(needle) {
                return Some(at);
            }
            from = at + 1;
        }
        None
    }
}

/// XML whitespace (S production)
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Check if byte is valid XML name start character
/// Allows ASCII letters, underscore, colon, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

/// Check if byte is valid XML name character
/// Allows ASCII alphanumeric, punctuation, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_name_chars() {
        let mut scanner = Scanner::at(b"%element-name;", 1);
        assert!(scanner.skip_name_chars());
        assert_eq!(scanner.position(), 13);
        assert_eq!(scanner.peek(), Some(b';'));
    }

    #[test]
    fn test_skip_whitespace() {
        let mut scanner = Scanner::at(b"  \t\n hello", 0);
        assert!(scanner.skip_whitespace());
        assert_eq!(scanner.position(), 5);
        assert!(!scanner.skip_whitespace());
    }

    #[test]
    fn test_find_value_break() {
        let scanner = Scanner::at(b"abc\ndef%x;", 0);
        assert_eq!(scanner.find_value_break(), Some(3));
        let scanner = Scanner::at(b"abc\ndef%x;", 4);
        assert_eq!(scanner.find_value_break(), Some(7));
        let scanner = Scanner::at(b"plain", 0);
        assert_eq!(scanner.find_value_break(), None);
    }

    #[test]
    fn test_find_sequence() {
        let scanner = Scanner::at(b"<!-- a - b -->", 4);
        assert_eq!(scanner.find_sequence(b"--"), Some(11));
        assert_eq!(scanner.find_sequence(b"?>"), None);
    }
}
