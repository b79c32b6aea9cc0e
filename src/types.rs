//! The building blocks of the index.
//!
//! These types define how occurrences, words, and persistence snapshots fit
//! together. The dumped snapshots (`DumpedDocument`, `DumpedWord`,
//! `DumpedMapping`, `DumpedChange`) are flat, storage-agnostic rows used to
//! ship index deltas to and from a backend; they carry serde derives so a
//! backend can persist them with whatever format it likes.
//!
//! # Invariants (the stuff that breaks if you ignore it)
//!
//! - **Occurrence**: equality compares all three fields, but ordering
//!   deliberately ignores `first_char_index` (location, then word_index).
//!   Two occurrences can be distinct by equality yet tie on the sort key.
//!   This asymmetry is load-bearing for the sorted-set semantics in `word`;
//!   do not "fix" it.
//! - **WordId**: a provisional ID is never merged with a committed one. The
//!   only way from provisional to committed is the remap carried by a
//!   [`StorerResult`].
//! - **WordLocation**: codes 1/2/3 are the stable serialization values;
//!   weights 2.0/1.5/1.0 feed relevance accumulation.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Hard cap on token character indices so positions always fit `u16`.
pub const MAX_CHAR_INDEX: usize = 65_500;

// =============================================================================
// WORD LOCATION
// =============================================================================

/// Weighted category of where a word occurred within a document.
///
/// Ordered `Title < Keywords < Content`; the ordering drives occurrence-set
/// sort order, the weights drive relevance accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WordLocation {
    /// Word appeared in the document title (weight 2.0).
    Title,
    /// Word appeared in the keyword set (weight 1.5).
    Keywords,
    /// Word appeared in the body content (weight 1.0).
    Content,
}

impl WordLocation {
    /// Relevance weight contributed by one occurrence at this location.
    #[inline]
    pub fn weight(self) -> f32 {
        match self {
            WordLocation::Title => 2.0,
            WordLocation::Keywords => 1.5,
            WordLocation::Content => 1.0,
        }
    }

    /// Stable small integer code used in persisted mappings.
    #[inline]
    pub fn code(self) -> u8 {
        match self {
            WordLocation::Title => 1,
            WordLocation::Keywords => 2,
            WordLocation::Content => 3,
        }
    }

    /// Decode a persisted location code. Unknown codes return `None` so
    /// mapping replay can skip them tolerantly.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(WordLocation::Title),
            2 => Some(WordLocation::Keywords),
            3 => Some(WordLocation::Content),
            _ => None,
        }
    }
}

// =============================================================================
// OCCURRENCES
// =============================================================================

/// One occurrence of a word inside one document.
///
/// Equality compares all three fields. Ordering compares `(location,
/// word_index)` only - `first_char_index` is deliberately excluded, so a
/// sorted set may hold two elements that are distinct by equality but tie on
/// the sort key. Binary-search containment checks therefore treat a sort-key
/// tie as "found" regardless of char offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    /// Character index of the first character of the matched word.
    pub first_char_index: u16,
    /// Sequential index of the word within its location stream.
    pub word_index: u16,
    /// Where in the document the word occurred.
    pub location: WordLocation,
}

impl Occurrence {
    /// Create a new occurrence.
    pub fn new(first_char_index: u16, word_index: u16, location: WordLocation) -> Self {
        Self {
            first_char_index,
            word_index,
            location,
        }
    }
}

impl Ord for Occurrence {
    fn cmp(&self, other: &Self) -> Ordering {
        // first_char_index intentionally not part of the sort key.
        self.location
            .cmp(&other.location)
            .then(self.word_index.cmp(&other.word_index))
    }
}

impl PartialOrd for Occurrence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An [`Occurrence`] plus the literal matched text.
///
/// Produced by the tokenizer and by search; equality and ordering
/// additionally key off the text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchedOccurrence {
    text: String,
    occurrence: Occurrence,
}

impl MatchedOccurrence {
    /// Create a matched occurrence. The text is expected to be normalized.
    pub fn new(
        text: String,
        first_char_index: u16,
        word_index: u16,
        location: WordLocation,
    ) -> Self {
        Self {
            text,
            occurrence: Occurrence::new(first_char_index, word_index, location),
        }
    }

    /// The literal matched text (normalized form).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The position part of the match.
    pub fn occurrence(&self) -> Occurrence {
        self.occurrence
    }

    /// Character index of the first character of the match.
    #[inline]
    pub fn first_char_index(&self) -> u16 {
        self.occurrence.first_char_index
    }

    /// Sequential word index within the location stream.
    #[inline]
    pub fn word_index(&self) -> u16 {
        self.occurrence.word_index
    }

    /// Where in the document the match occurred.
    #[inline]
    pub fn location(&self) -> WordLocation {
        self.occurrence.location
    }
}

impl Ord for MatchedOccurrence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.occurrence
            .cmp(&other.occurrence)
            .then_with(|| self.text.cmp(&other.text))
    }
}

impl PartialOrd for MatchedOccurrence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// =============================================================================
// WORD IDENTIFIERS
// =============================================================================

/// Identifier of a catalog word.
///
/// A freshly interned word has `Provisional(0)`. During a store batch every
/// new word receives a strictly-decreasing provisional placeholder starting
/// at `u64::MAX`, guaranteeing batch-local uniqueness ahead of persistence.
/// Persistence assigns the authoritative value, which arrives back through a
/// [`StorerResult`] remap and becomes `Committed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordId {
    /// Placeholder ID, unique only within one change batch.
    Provisional(u64),
    /// Authoritative ID assigned by the persistence layer.
    Committed(u64),
}

impl WordId {
    /// The raw numeric value, regardless of tag.
    #[inline]
    pub fn value(self) -> u64 {
        match self {
            WordId::Provisional(v) | WordId::Committed(v) => v,
        }
    }

    /// Whether persistence has assigned this ID.
    #[inline]
    pub fn is_committed(self) -> bool {
        matches!(self, WordId::Committed(_))
    }
}

impl Default for WordId {
    fn default() -> Self {
        WordId::Provisional(0)
    }
}

// =============================================================================
// DOCUMENT CAPABILITY
// =============================================================================

/// External document capability consumed (not implemented) by the index.
///
/// `name()` is the identity key: immutable and case-insensitively unique.
/// The numeric ID is mutable because persistence assigns it after the fact;
/// implementations use interior mutability (`AtomicU64`, `Cell`) so the
/// index can rewrite it through a shared reference.
pub trait Document: Send + Sync {
    /// Current numeric ID (0 until persistence assigns one).
    fn id(&self) -> u64;

    /// Rewrite the numeric ID with the authoritative persisted value.
    fn set_id(&self, id: u64);

    /// Immutable, case-insensitive unique name. This is the identity key.
    fn name(&self) -> &str;

    /// Display title; tokenized at `WordLocation::Title` when stored.
    fn title(&self) -> &str;

    /// Free-form type tag used by search filters.
    fn type_tag(&self) -> &str;

    /// Last-modified timestamp, round-tripped through dumped snapshots.
    fn date_time(&self) -> SystemTime;

    /// Tokenize body content into ordered matches at `WordLocation::Content`.
    ///
    /// The default delegates to the crate tokenizer; implementations may
    /// override to strip markup first.
    fn tokenize(&self, content: &str) -> Vec<MatchedOccurrence> {
        crate::tokenize::tokenize(content, WordLocation::Content)
    }
}

/// Shared document handle stored in occurrence maps and search results.
pub type DocumentRef = Arc<dyn Document>;

// =============================================================================
// DUMPED SNAPSHOTS
// =============================================================================

/// Flat snapshot of a document, mirroring a persisted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpedDocument {
    pub id: u64,
    pub name: String,
    pub title: String,
    pub type_tag: String,
    pub date_time: SystemTime,
}

impl DumpedDocument {
    /// Snapshot a live document.
    pub fn from_document(document: &dyn Document) -> Self {
        Self {
            id: document.id(),
            name: document.name().to_string(),
            title: document.title().to_string(),
            type_tag: document.type_tag().to_string(),
            date_time: document.date_time(),
        }
    }
}

/// Flat snapshot of a catalog word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpedWord {
    /// Raw ID value; provisional for words not yet persisted.
    pub id: u64,
    pub text: String,
}

/// Flat snapshot of one occurrence, tagged with its word and document IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpedMapping {
    pub word_id: u64,
    pub document_id: u64,
    pub first_char_index: u16,
    pub word_index: u16,
    /// Stable [`WordLocation`] code (see [`WordLocation::code`]).
    pub location_code: u8,
}

/// The delta produced by one store or remove operation.
///
/// For a document-added change, `words` holds the newly created words (with
/// provisional IDs) and `mappings` every occurrence recorded by the store.
/// For a document-removed change, `words` holds the pruned words and
/// `mappings` the removed occurrences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpedChange {
    pub document: DumpedDocument,
    pub words: Vec<DumpedWord>,
    pub mappings: Vec<DumpedMapping>,
}

/// Authoritative IDs returned by persistence after a document-added change.
///
/// `word_ids` maps word text to the committed ID; the index uses it to
/// reconcile provisional IDs, matched by text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorerResult {
    pub document_id: u64,
    pub word_ids: Vec<(String, u64)>,
}
