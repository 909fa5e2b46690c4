//! Sliding input buffer
//!
//! Holds a window of committed input over a `Read` source (or over an
//! in-memory entity text). Capacity is always a multiple of the read chunk
//! size, and reads are sized so that a complete read ends exactly at the end
//! of the store.
//!
//! Offsets into the store are only valid until the next [`fill`]: a refill
//! may compact or grow the store, and the last committed token is discarded
//! when it does. Callers copy token text out before asking for more input.
//!
//! [`fill`]: SlidingBuffer::fill

use crate::config::ParserConfig;
use crate::core::position::Position;
use std::io::{self, Read};
use tracing::trace;

/// Byte written over discarded storage when poisoning is enabled
pub const POISON: u8 = 0xFE;

/// Growable, compacting input window
pub struct SlidingBuffer<'a> {
    source: Option<Box<dyn Read + 'a>>,
    buf: Vec<u8>,
    read_size: usize,
    poison: bool,
    /// Start of the unconsumed data
    buf_start: usize,
    /// End of the committed data
    buf_end: usize,
    /// Start of the most recently committed token (it ends at `buf_start`)
    token_start: usize,
    /// Logical offset of `buf_end` within the whole stream
    stream_offset: u64,
    /// Position of the byte at `pos_off`
    pos: Position,
    pos_off: usize,
}

impl<'a> SlidingBuffer<'a> {
    /// Create a refillable buffer over a stream
    pub fn new<R: Read + 'a>(reader: R, config: &ParserConfig) -> Self {
        Self::from_boxed(Box::new(reader), config)
    }

    pub fn from_boxed(reader: Box<dyn Read + 'a>, config: &ParserConfig) -> Self {
        SlidingBuffer {
            source: Some(reader),
            buf: vec![0u8; config.initial_capacity()],
            read_size: config.chunk(),
            poison: config.poison_discarded,
            buf_start: 0,
            buf_end: 0,
            token_start: 0,
            stream_offset: 0,
            pos: Position::start(),
            pos_off: 0,
        }
    }

    /// Create a non-refillable buffer over text already in memory
    ///
    /// `origin` and `origin_offset` are the position and stream offset of the
    /// first byte of `text`.
    pub fn from_text(text: Vec<u8>, origin: Position, origin_offset: u64) -> Self {
        let len = text.len();
        SlidingBuffer {
            source: None,
            buf: text,
            read_size: len.max(1),
            poison: false,
            buf_start: 0,
            buf_end: len,
            token_start: 0,
            stream_offset: origin_offset + len as u64,
            pos: origin,
            pos_off: 0,
        }
    }

    /// Bring more input into the window
    ///
    /// Returns false once the source is exhausted, and always for in-memory
    /// text. Invalidates every offset except `buf_start` and `buf_end`, which
    /// are updated.
    pub fn fill(&mut self) -> io::Result<bool> {
        if self.source.is_none() {
            return Ok(false);
        }
        if self.buf_end == self.buf.len() {
            self.make_room();
        }

        let n = loop {
            let source = match self.source.as_mut() {
                Some(source) => source,
                None => return Ok(false),
            };
            match source.read(&mut self.buf[self.buf_end..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        if n == 0 {
            trace!(offset = self.stream_offset, "end of input");
            self.source = None;
            return Ok(false);
        }
        self.buf_end += n;
        self.stream_offset += n as u64;
        trace!(bytes = n, buf_end = self.buf_end, "buffer refilled");
        Ok(true)
    }

    /// Discard consumed data so that at least one chunk fits after the kept
    /// bytes, growing the store if it does not
    fn make_room(&mut self) {
        self.pos.advance(&self.buf[self.pos_off..self.buf_start]);

        let keep = self.buf_end - self.buf_start;
        // Kept bytes end on a chunk boundary so the free tail is whole chunks
        let new_end = keep.div_ceil(self.read_size) * self.read_size;
        if new_end + self.read_size > self.buf.len() {
            let capacity = self.buf.len() * 2;
            self.buf.resize(capacity, 0);
            trace!(keep, capacity, "buffer grown");
        } else {
            trace!(keep, discarded = self.buf_start, "buffer compacted");
        }

        let new_start = new_end - keep;
        self.buf.copy_within(self.buf_start..self.buf_end, new_start);
        self.buf_start = new_start;
        self.buf_end = new_end;
        self.token_start = new_start;
        self.pos_off = new_start;

        if self.poison {
            self.buf[..new_start].fill(POISON);
        }
    }

    /// Committed data; tokenizing starts at [`buf_start`](Self::buf_start)
    #[inline]
    pub fn window(&self) -> &[u8] {
        &self.buf[..self.buf_end]
    }

    #[inline]
    pub fn buf_start(&self) -> usize {
        self.buf_start
    }

    #[inline]
    pub fn buf_end(&self) -> usize {
        self.buf_end
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// True while more input may still arrive
    pub fn is_refillable(&self) -> bool {
        self.source.is_some()
    }

    /// Consume input up to `end`, making `[buf_start, end)` the current token
    #[inline]
    pub fn commit(&mut self, end: usize) {
        debug_assert!(self.buf_start <= end && end <= self.buf_end);
        self.token_start = self.buf_start;
        self.buf_start = end;
    }

    /// Text of the most recently committed token
    #[inline]
    pub fn token(&self) -> &[u8] {
        &self.buf[self.token_start..self.buf_start]
    }

    #[inline]
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Line and column of the byte at `offset`
    pub fn position_at(&self, offset: usize) -> Position {
        let from = self.pos_off.min(offset);
        self.pos.advanced(&self.buf[from..offset])
    }

    /// Logical stream offset of the byte at `offset`
    pub fn stream_offset_at(&self, offset: usize) -> u64 {
        self.stream_offset - (self.buf_end - offset) as u64
    }
}
