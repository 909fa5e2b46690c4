//! DTD Input Module
//!
//! - SlidingBuffer: growable, compacting window over a stream or entity text
//! - EntityResolver: fetches the content of external parameter entities

pub mod buffered;
pub mod resolver;
