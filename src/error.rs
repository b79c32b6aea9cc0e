//! Crate error type.
//!
//! Argument misuse fails fast at every public entry point; persistence
//! trouble is captured by the storer as a sticky corruption flag instead of
//! being thrown at callers (see `storer`). The variants here cover both.

use std::fmt;

/// Error type for index, search, and persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// A required string argument was empty (or blank).
    EmptyArgument { name: &'static str },
    /// The type-tag filter was supplied but is empty or contains an empty tag.
    InvalidTypeTagFilter,
    /// Bulk reload was requested before a document builder was supplied.
    NoDocumentBuilder,
    /// A word was created with empty normalized text.
    EmptyWordText,
    /// A document with the same name is already present in an occurrence map.
    DuplicateDocumentName { name: String },
    /// A relevance value was finalized twice, or mutated after finalization.
    RelevanceAlreadyFinalized,
    /// Relevance normalization was requested before finalization.
    RelevanceNotFinalized,
    /// A relevance value went negative.
    NegativeRelevance,
    /// Relevance finalization was requested with a non-positive total.
    NonPositiveTotal,
    /// A storage backend operation failed.
    Storage { message: String },
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::EmptyArgument { name } => {
                write!(f, "argument '{}' must not be empty", name)
            }
            IndexError::InvalidTypeTagFilter => {
                write!(f, "type-tag filter must be non-empty and contain no empty tags")
            }
            IndexError::NoDocumentBuilder => {
                write!(f, "no document builder was supplied before bulk reload")
            }
            IndexError::EmptyWordText => {
                write!(f, "word text must be non-empty after normalization")
            }
            IndexError::DuplicateDocumentName { name } => {
                write!(f, "document '{}' is already present", name)
            }
            IndexError::RelevanceAlreadyFinalized => {
                write!(f, "relevance is already finalized")
            }
            IndexError::RelevanceNotFinalized => {
                write!(f, "relevance is not finalized yet")
            }
            IndexError::NegativeRelevance => {
                write!(f, "relevance must be non-negative")
            }
            IndexError::NonPositiveTotal => {
                write!(f, "finalization total must be positive")
            }
            IndexError::Storage { message } => {
                write!(f, "storage backend error: {}", message)
            }
        }
    }
}

impl std::error::Error for IndexError {}

impl IndexError {
    /// Build a `Storage` error from any displayable cause.
    pub fn storage(cause: impl fmt::Display) -> Self {
        IndexError::Storage {
            message: cause.to_string(),
        }
    }
}
