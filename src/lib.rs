//! In-memory inverted index with relevance-ranked search and a pluggable
//! persistence protocol.
//!
//! The index tokenizes documents (content, title, keywords) into positioned
//! occurrences, catalogs them under normalized words, and answers three
//! search modes (at-least-one-word, all-words, exact-phrase) with
//! percentage relevance scores. Every mutation raises exactly one change
//! notification carrying a dumped delta; an [`IndexStorer`] turns deltas
//! into durable rows and feeds authoritative IDs back.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ tokenize.rs  │────▶│   word.rs    │────▶│   index.rs   │
//! │ (normalize,  │     │ (Word,       │     │(InMemoryIndex│
//! │  tokenize)   │     │ OccurrenceMap)│    │ change proto)│
//! └──────────────┘     └──────────────┘     └──────┬───────┘
//!        │                                  ▲      │
//!        ▼                                  │      ▼
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ relevance.rs │────▶│  search.rs   │     │  storer.rs   │
//! │ (finalize-   │     │ (run_search, │     │ (IndexStorer,│
//! │  once score) │     │  3 modes)    │     │  backends)   │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use lexidex::{InMemoryIndex, SearchMode, SearchParameters};
//!
//! let index: InMemoryIndex = InMemoryIndex::new();
//! index.store_document(document, &["rust", "search"], body, &())?;
//!
//! let params = SearchParameters::new("inverted index", None, SearchMode::AllWords)?;
//! for result in index.search(&params)?.iter() {
//!     println!("{} {:.1}%", result.document().name(), result.relevance().value());
//! }
//! ```

mod error;
mod index;
mod relevance;
mod search;
mod storer;
mod tokenize;
mod types;
mod word;

#[doc(hidden)]
pub mod testing;

pub use error::IndexError;
pub use index::{DocumentBuilder, InMemoryIndex, IndexChange, IndexObserver};
pub use relevance::Relevance;
pub use search::{
    SearchMode, SearchParameters, SearchResult, SearchResultCollection, WordFetcher,
};
pub use storer::{IndexDump, IndexStorer, StorageBackend};
pub use tokenize::{cleanup_keywords, normalize_text, normalize_word, remove_stop_words, tokenize};
pub use types::{
    Document, DocumentRef, DumpedChange, DumpedDocument, DumpedMapping, DumpedWord,
    MatchedOccurrence, Occurrence, StorerResult, WordId, WordLocation, MAX_CHAR_INDEX,
};
pub use word::{OccurrenceMap, SortedOccurrenceSet, Word};
