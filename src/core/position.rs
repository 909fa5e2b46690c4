//! Line/column tracking
//!
//! Positions are not maintained per byte. The sliding buffer keeps a
//! checkpoint offset and only advances a `Position` over the bytes it is
//! about to discard, or over the short range up to an offset that needs
//! reporting.

use std::fmt;

/// A logical position in a character stream
#[derive(Debug, Clone, Copy)]
pub struct Position {
    /// 1-based line number
    pub line: usize,
    /// 0-based column, counted in Unicode scalar values
    pub column: usize,
    /// Last byte seen was `\r`, so a following `\n` is part of the same break
    pending_cr: bool,
}

impl Position {
    /// Position of the first character of a stream
    #[inline]
    pub const fn start() -> Self {
        Position {
            line: 1,
            column: 0,
            pending_cr: false,
        }
    }

    /// Move this position over `bytes`
    ///
    /// `\r\n`, `\r` and `\n` each count as one line break, including a
    /// `\r\n` pair split across two calls.
    pub fn advance(&mut self, bytes: &[u8]) {
        for &b in bytes {
            match b {
                b'\n' => {
                    if self.pending_cr {
                        self.pending_cr = false;
                    } else {
                        self.line += 1;
                        self.column = 0;
                    }
                }
                b'\r' => {
                    self.line += 1;
                    self.column = 0;
                    self.pending_cr = true;
                }
                // UTF-8 continuation byte: same character
                0x80..=0xBF => self.pending_cr = false,
                _ => {
                    self.column += 1;
                    self.pending_cr = false;
                }
            }
        }
    }

    /// Copy of this position moved over `bytes`
    #[inline]
    pub fn advanced(mut self, bytes: &[u8]) -> Self {
        self.advance(bytes);
        self
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}
