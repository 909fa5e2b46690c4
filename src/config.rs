//! Parser configuration

/// Default read chunk size in bytes
pub const DEFAULT_READ_SIZE: usize = 8192;

/// Tuning for the input buffer
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Bytes requested per read; the buffer capacity is always a multiple
    /// of this (default: 8192)
    pub read_size: usize,
    /// Initial buffer capacity, in chunks (default: 2)
    pub initial_chunks: usize,
    /// Overwrite the discarded prefix of the buffer after every compaction,
    /// so any span read after being discarded shows up as garbage
    pub poison_discarded: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            read_size: DEFAULT_READ_SIZE,
            initial_chunks: 2,
            poison_discarded: false,
        }
    }
}

impl ParserConfig {
    /// Set the read chunk size (at least 1)
    pub fn with_read_size(mut self, read_size: usize) -> Self {
        self.read_size = read_size.max(1);
        self
    }

    /// Set the initial capacity in chunks (at least 1)
    pub fn with_initial_chunks(mut self, chunks: usize) -> Self {
        self.initial_chunks = chunks.max(1);
        self
    }

    pub fn with_poison_discarded(mut self, poison: bool) -> Self {
        self.poison_discarded = poison;
        self
    }

    /// Chunk size actually used
    pub(crate) fn chunk(&self) -> usize {
        self.read_size.max(1)
    }

    /// Initial store capacity in bytes
    pub(crate) fn initial_capacity(&self) -> usize {
        self.chunk() * self.initial_chunks.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.read_size, 8192);
        assert_eq!(config.initial_chunks, 2);
        assert!(!config.poison_discarded);
        assert_eq!(config.initial_capacity(), 16384);
    }

    #[test]
    fn test_builders_clamp() {
        let config = ParserConfig::default()
            .with_read_size(0)
            .with_initial_chunks(0)
            .with_poison_discarded(true);
        assert_eq!(config.read_size, 1);
        assert_eq!(config.initial_capacity(), 1);
        assert!(config.poison_discarded);
    }

    #[test]
    fn test_fields_set_directly_are_clamped_on_use() {
        let config = ParserConfig {
            read_size: 0,
            initial_chunks: 0,
            poison_discarded: false,
        };
        assert_eq!(config.chunk(), 1);
        assert_eq!(config.initial_capacity(), 1);
    }
}
