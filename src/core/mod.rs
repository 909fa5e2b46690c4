//! Core DTD parsing primitives
//!
//! This module contains the fundamental building blocks for DTD parsing:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: window-based token extraction with partial-token reporting
//! - Entities: character references and predefined entity names
//! - Position: line/column tracking over consumed input
//! - Prolog: declaration state machine that classifies tokens into actions
//! - DTD: parameter entity store and the recorded parse tree

pub mod dtd;
pub mod entities;
pub mod position;
pub mod prolog;
pub mod scanner;
pub mod tokenizer;
