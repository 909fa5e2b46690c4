//! Error types for DTD parsing
//!
//! Every failure the engine can report, each with the location where it was
//! detected. Only [`DtdError::Io`] ever aborts a parse from the caller's
//! point of view; everything else ends up in the diagnostics of the result.

use std::fmt;
use thiserror::Error;

/// Where in the input an error was detected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Name of the parameter entity being scanned, None for the document
    pub entity: Option<String>,
    /// 1-based line
    pub line: usize,
    /// 0-based column
    pub column: usize,
    /// Byte offset within the scanned entity or document
    pub offset: u64,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entity {
            Some(name) => write!(f, "%{};", name)?,
            None => f.write_str("document")?,
        }
        write!(f, " line {}, column {} (offset {})", self.line, self.column, self.offset)
    }
}

/// Errors that can occur during DTD parsing
#[derive(Error, Debug)]
pub enum DtdError {
    /// Reading the input failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The prolog grammar rejected the token stream
    #[error("syntax error at {location}: {message}")]
    Syntax {
        location: Location,
        message: &'static str,
    },

    #[error("undefined parameter entity '{name}' at {location}")]
    UndefPeRef { name: String, location: Location },

    #[error("recursive reference to parameter entity '{name}' at {location}")]
    Recursion { name: String, location: Location },

    #[error("reference to unparsed entity '{name}' at {location}")]
    UnparsedRef { name: String, location: Location },

    /// Malformed content inside an entity value literal
    #[error("entity value not well-formed at {location}")]
    NotWellFormed { location: Location },

    /// Input ended inside a token
    #[error("unclosed token at {location}")]
    UnclosedToken { location: Location },

    #[error("invalid token at {location}")]
    InvalidToken { location: Location },

    /// A parameter entity's text closed the declaration it was referenced in
    #[error("parameter entity crosses a declaration boundary at {location}")]
    PeDeclNesting { location: Location },

    /// A parameter entity's text left a group or conditional section unbalanced
    #[error("parameter entity crosses a group boundary at {location}")]
    PeGroupNesting { location: Location },
}

impl DtdError {
    /// Short taxonomy tag for this error
    pub fn code(&self) -> &'static str {
        match self {
            DtdError::Io(_) => "IO",
            DtdError::Syntax { .. } => "SYNTAX_ERROR",
            DtdError::UndefPeRef { .. } => "UNDEF_PEREF",
            DtdError::Recursion { .. } => "RECURSION",
            DtdError::UnparsedRef { .. } => "UNPARSED_REF",
            DtdError::NotWellFormed { .. } => "NOT_WELL_FORMED",
            DtdError::UnclosedToken { .. } => "UNCLOSED_TOKEN",
            DtdError::InvalidToken { .. } => "INVALID_TOKEN",
            DtdError::PeDeclNesting { .. } => "PE_DECL_NESTING",
            DtdError::PeGroupNesting { .. } => "PE_GROUP_NESTING",
        }
    }

    /// Location of the error, None for I/O failures
    pub fn location(&self) -> Option<&Location> {
        match self {
            DtdError::Io(_) => None,
            DtdError::Syntax { location, .. }
            | DtdError::UndefPeRef { location, .. }
            | DtdError::Recursion { location, .. }
            | DtdError::UnparsedRef { location, .. }
            | DtdError::NotWellFormed { location }
            | DtdError::UnclosedToken { location }
            | DtdError::InvalidToken { location }
            | DtdError::PeDeclNesting { location }
            | DtdError::PeGroupNesting { location } => Some(location),
        }
    }

    /// Errors scoped to a single reference; the scan can go on after them
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            DtdError::UndefPeRef { .. } | DtdError::Recursion { .. } | DtdError::UnparsedRef { .. }
        )
    }
}

/// Result type for DTD parsing
pub type Result<T> = std::result::Result<T, DtdError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(entity: Option<&str>) -> Location {
        Location {
            entity: entity.map(str::to_string),
            line: 3,
            column: 7,
            offset: 42,
        }
    }

    #[test]
    fn test_codes() {
        let err = DtdError::UndefPeRef {
            name: "x".to_string(),
            location: loc(None),
        };
        assert_eq!(err.code(), "UNDEF_PEREF");
        assert!(err.is_reference_error());

        let err = DtdError::PeGroupNesting { location: loc(None) };
        assert_eq!(err.code(), "PE_GROUP_NESTING");
        assert!(!err.is_reference_error());
    }

    #[test]
    fn test_display() {
        let err = DtdError::Recursion {
            name: "a".to_string(),
            location: loc(Some("b")),
        };
        let msg = err.to_string();
        assert!(msg.contains("'a'"));
        assert!(msg.contains("%b; line 3, column 7 (offset 42)"));

        let err = DtdError::UnclosedToken { location: loc(None) };
        assert!(err.to_string().contains("document line 3"));
    }

    #[test]
    fn test_io_has_no_location() {
        let err = DtdError::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(err.code(), "IO");
        assert!(err.location().is_none());
    }
}
