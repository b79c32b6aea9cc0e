//! The in-memory index: catalog, mutations, and the change protocol.
//!
//! Pure in-memory structure with no implicit persistence. Every mutation
//! raises exactly one change notification carrying a dumped delta; a single
//! observer (normally an [`IndexStorer`](crate::storer::IndexStorer)) turns
//! the delta into durable writes and answers a document-added notification
//! with authoritative IDs, which the index uses to reconcile provisional
//! ones.
//!
//! # Concurrency
//!
//! One coarse mutex guards the catalog. Every mutating operation and every
//! statistics read serializes on it; there is no reader/writer split.
//! Notifications dispatch synchronously inside the caller's critical
//! section, so the observer must not call back into the index and must
//! complete quickly. Observer errors propagate out of the triggering call,
//! leaving the in-memory catalog already mutated and the durable side
//! untouched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::IndexError;
use crate::search::{run_search, SearchParameters, SearchResultCollection, WordFetcher};
use crate::tokenize::{cleanup_keywords, remove_stop_words, tokenize};
use crate::types::{
    Document, DocumentRef, DumpedChange, DumpedDocument, DumpedMapping, DumpedWord,
    MatchedOccurrence, StorerResult, WordId, WordLocation,
};
use crate::word::Word;

// =============================================================================
// CHANGE PROTOCOL
// =============================================================================

/// A change notification raised by the index.
///
/// Document-level changes carry the dumped delta produced by the triggering
/// operation; clearing carries no payload.
#[derive(Debug, Clone)]
pub enum IndexChange {
    /// A document's occurrences were stored.
    DocumentAdded(DumpedChange),
    /// A document's occurrences were removed (including pruned words).
    DocumentRemoved(DumpedChange),
    /// The whole catalog was emptied.
    IndexCleared,
}

/// Single-subscriber change observer, bound at construction time of the
/// owning application and detached on shutdown.
///
/// For a document-added change the observer may return a [`StorerResult`]
/// with the authoritative IDs; `Ok(None)` degrades the store call (it
/// returns 0) without failing it. The observer runs inside the index
/// critical section: it must not call back into the index.
pub trait IndexObserver<S>: Send + Sync {
    /// Handle one change notification with the caller's opaque state.
    fn on_index_change(
        &self,
        change: &IndexChange,
        state: &S,
    ) -> Result<Option<StorerResult>, IndexError>;
}

/// Rebuilds a live document from its dumped snapshot during bulk reload,
/// or reports it missing when the entity no longer exists.
pub type DocumentBuilder = Box<dyn Fn(&DumpedDocument) -> Option<DocumentRef> + Send>;

// =============================================================================
// INDEX
// =============================================================================

struct CatalogState {
    /// The inverted index proper: normalized text to catalog word.
    words: HashMap<String, Word>,
    document_builder: Option<DocumentBuilder>,
    stop_words: Vec<String>,
}

/// In-memory inverted index over tokenized documents.
///
/// `S` is the opaque caller state threaded through change notifications
/// (a connection handle, a tenant key - the index never inspects it).
pub struct InMemoryIndex<S = ()> {
    state: Mutex<CatalogState>,
    observer: Mutex<Option<Arc<dyn IndexObserver<S>>>>,
}

impl<S> Default for InMemoryIndex<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> InMemoryIndex<S> {
    /// Create an empty index with no observer, builder, or stop words.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CatalogState {
                words: HashMap::new(),
                document_builder: None,
                stop_words: Vec::new(),
            }),
            observer: Mutex::new(None),
        }
    }

    /// Attach the single change observer. Replaces (with a warning) any
    /// previously attached one.
    pub fn attach_observer(&self, observer: Arc<dyn IndexObserver<S>>) {
        let mut slot = self.observer.lock();
        if slot.is_some() {
            warn!("replacing an already attached index observer");
        }
        *slot = Some(observer);
    }

    /// Detach the observer (shutdown path). Later changes go unobserved.
    pub fn detach_observer(&self) {
        *self.observer.lock() = None;
    }

    /// Install the document builder used by [`initialize_data`](Self::initialize_data).
    pub fn set_document_builder(&self, builder: DocumentBuilder) {
        self.state.lock().document_builder = Some(builder);
    }

    /// Replace the stop-word set applied to content and title tokens.
    pub fn set_stop_words(&self, stop_words: Vec<String>) {
        self.state.lock().stop_words = stop_words;
    }

    fn notify(
        &self,
        change: &IndexChange,
        state: &S,
    ) -> Result<Option<StorerResult>, IndexError> {
        let observer = self.observer.lock().clone();
        match observer {
            Some(observer) => observer.on_index_change(change, state),
            None => Ok(None),
        }
    }

    // -------------------------------------------------------------------------
    // Statistics (same mutual-exclusion domain as mutations)
    // -------------------------------------------------------------------------

    /// Number of distinct words in the catalog.
    pub fn total_words(&self) -> usize {
        self.state.lock().words.len()
    }

    /// Number of distinct documents recorded across all words.
    pub fn total_documents(&self) -> usize {
        let guard = self.state.lock();
        let mut names: HashSet<String> = HashSet::new();
        for word in guard.words.values() {
            for (document, _) in word.occurrences().iter() {
                names.insert(document.name().to_lowercase());
            }
        }
        names.len()
    }

    /// Total occurrence count across the whole catalog.
    pub fn total_occurrences(&self) -> usize {
        let guard = self.state.lock();
        guard.words.values().map(Word::total_occurrences).sum()
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Store a document's title, keywords, and content in the catalog.
    ///
    /// Storing a name that is already present fully replaces its prior
    /// occurrences (raising a document-removed notification first, so the
    /// durable side can drop stale rows). Newly created words receive
    /// strictly-decreasing provisional IDs ahead of persistence; if the
    /// observer returns authoritative IDs they are reconciled in place,
    /// matched by word text.
    ///
    /// Returns the raw indexed token count (content + title + keywords), or
    /// 0 in degraded mode when no persistence result came back.
    pub fn store_document(
        &self,
        document: DocumentRef,
        keywords: &[&str],
        content: &str,
        state: &S,
    ) -> Result<usize, IndexError> {
        if document.name().trim().is_empty() {
            return Err(IndexError::EmptyArgument {
                name: "document name",
            });
        }

        let mut guard = self.state.lock();

        // Replace, not merge: drop prior occurrences of this name first.
        let present = guard
            .words
            .values()
            .any(|w| w.occurrences().contains_name(document.name()));
        if present {
            self.remove_document_locked(&mut guard, document.as_ref(), state)?;
        }

        let keywords = cleanup_keywords(keywords);
        let stop_words = guard.stop_words.clone();

        let mut tokens = remove_stop_words(document.tokenize(content), &stop_words);
        tokens.extend(remove_stop_words(
            tokenize(document.title(), WordLocation::Title),
            &stop_words,
        ));
        let mut keyword_offset: u16 = 0;
        for (position, keyword) in keywords.iter().enumerate() {
            tokens.push(MatchedOccurrence::new(
                keyword.clone(),
                keyword_offset,
                position as u16,
                WordLocation::Keywords,
            ));
            keyword_offset = keyword_offset.saturating_add(keyword.chars().count() as u16 + 1);
        }
        let token_count = tokens.len();

        // Intern every token, tracking which words are new to the catalog.
        let mut new_word_texts: Vec<String> = Vec::new();
        for token in &tokens {
            if !guard.words.contains_key(token.text()) {
                let word = Word::new(token.text().to_string())?;
                guard.words.insert(token.text().to_string(), word);
                new_word_texts.push(token.text().to_string());
            }
            if let Some(word) = guard.words.get_mut(token.text()) {
                word.add_occurrence(
                    &document,
                    token.first_char_index(),
                    token.word_index(),
                    token.location(),
                );
            }
        }

        // Provisional IDs: strictly decreasing from the maximum representable
        // value, unique within this batch.
        let mut next_provisional = u64::MAX;
        let mut new_words: Vec<DumpedWord> = Vec::with_capacity(new_word_texts.len());
        for text in &new_word_texts {
            if let Some(word) = guard.words.get_mut(text) {
                word.set_id(WordId::Provisional(next_provisional));
                new_words.push(word.dump());
                next_provisional -= 1;
            }
        }

        let document_id = document.id();
        let mappings: Vec<DumpedMapping> = tokens
            .iter()
            .map(|token| DumpedMapping {
                word_id: guard
                    .words
                    .get(token.text())
                    .map(|w| w.id().value())
                    .unwrap_or_default(),
                document_id,
                first_char_index: token.first_char_index(),
                word_index: token.word_index(),
                location_code: token.location().code(),
            })
            .collect();

        let change = DumpedChange {
            document: DumpedDocument::from_document(document.as_ref()),
            words: new_words,
            mappings,
        };
        debug!(
            document = document.name(),
            tokens = token_count,
            new_words = change.words.len(),
            "storing document"
        );

        match self.notify(&IndexChange::DocumentAdded(change), state)? {
            Some(result) => {
                document.set_id(result.document_id);
                for (text, id) in result.word_ids {
                    if let Some(word) = guard.words.get_mut(&text) {
                        word.set_id(WordId::Committed(id));
                    }
                }
                Ok(token_count)
            }
            // No active persistence, or persistence is corrupted: the
            // mutation stands, the call degrades.
            None => Ok(0),
        }
    }

    /// Remove every occurrence owned by the document with this name.
    ///
    /// Silent no-op when the name is not in the catalog; a document-removed
    /// notification is raised only when something was actually removed.
    pub fn remove_document(&self, document: &dyn Document, state: &S) -> Result<(), IndexError> {
        if document.name().trim().is_empty() {
            return Err(IndexError::EmptyArgument {
                name: "document name",
            });
        }
        let mut guard = self.state.lock();
        self.remove_document_locked(&mut guard, document, state)
    }

    fn remove_document_locked(
        &self,
        state_guard: &mut CatalogState,
        document: &dyn Document,
        state: &S,
    ) -> Result<(), IndexError> {
        // Resolve the canonical catalog instance by name; the caller may
        // hold a reconstructed instance of the same logical document.
        let canonical: Option<DocumentRef> = state_guard
            .words
            .values()
            .find_map(|w| w.occurrences().get_document(document.name()).cloned());
        let Some(canonical) = canonical else {
            return Ok(());
        };

        let mut removed: Vec<DumpedMapping> = Vec::new();
        for word in state_guard.words.values_mut() {
            removed.extend(word.remove_occurrences(canonical.as_ref()));
        }

        let mut pruned: Vec<DumpedWord> = Vec::new();
        state_guard.words.retain(|_, word| {
            if word.total_occurrences() == 0 {
                pruned.push(word.dump());
                false
            } else {
                true
            }
        });

        if removed.is_empty() {
            return Ok(());
        }

        debug!(
            document = canonical.name(),
            mappings = removed.len(),
            pruned_words = pruned.len(),
            "removing document"
        );
        let change = DumpedChange {
            document: DumpedDocument::from_document(canonical.as_ref()),
            words: pruned,
            mappings: removed,
        };
        self.notify(&IndexChange::DocumentRemoved(change), state)?;
        Ok(())
    }

    /// Empty the catalog and notify the observer with no change payload.
    pub fn clear(&self, state: &S) -> Result<(), IndexError> {
        let mut guard = self.state.lock();
        guard.words.clear();
        debug!("index cleared");
        self.notify(&IndexChange::IndexCleared, state)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Bulk reload
    // -------------------------------------------------------------------------

    /// Rebuild the whole catalog from dumped rows.
    ///
    /// Stop-the-world full replacement; callers serialize it externally
    /// against concurrent search (normally it runs before the index is
    /// exposed to queries). Documents the builder reports missing have all
    /// their mappings dropped; malformed word rows, mappings referencing
    /// unknown word or document IDs, and unknown location codes are skipped
    /// tolerantly - recovery from partial corruption. Fails only when no
    /// builder was ever supplied.
    pub fn initialize_data(
        &self,
        documents: &[DumpedDocument],
        words: &[DumpedWord],
        mappings: &[DumpedMapping],
    ) -> Result<(), IndexError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let builder = state
            .document_builder
            .as_ref()
            .ok_or(IndexError::NoDocumentBuilder)?;

        let mut live: HashMap<u64, DocumentRef> = HashMap::new();
        let mut missing: HashSet<u64> = HashSet::new();
        for dumped in documents {
            match builder(dumped) {
                Some(document) => {
                    live.insert(dumped.id, document);
                }
                None => {
                    missing.insert(dumped.id);
                }
            }
        }

        state.words.clear();
        let mut skipped = 0usize;
        let mut text_by_id: HashMap<u64, String> = HashMap::with_capacity(words.len());
        for dumped in words {
            // A malformed row is partial corruption, not a reason to abort
            // the whole reload; its mappings fall out via the ID lookup.
            let Ok(word) = Word::with_id(dumped.text.clone(), WordId::Committed(dumped.id))
            else {
                skipped += 1;
                continue;
            };
            text_by_id.insert(dumped.id, dumped.text.clone());
            state.words.insert(dumped.text.clone(), word);
        }

        for mapping in mappings {
            if missing.contains(&mapping.document_id) {
                continue;
            }
            let Some(text) = text_by_id.get(&mapping.word_id) else {
                skipped += 1;
                continue;
            };
            let Some(document) = live.get(&mapping.document_id) else {
                skipped += 1;
                continue;
            };
            let Some(location) = WordLocation::from_code(mapping.location_code) else {
                skipped += 1;
                continue;
            };
            if let Some(word) = state.words.get_mut(text) {
                word.add_occurrence(
                    document,
                    mapping.first_char_index,
                    mapping.word_index,
                    location,
                );
            }
        }
        if skipped > 0 {
            warn!(skipped, "skipped malformed or dangling rows during reload");
        }
        debug!(
            documents = live.len(),
            missing = missing.len(),
            words = state.words.len(),
            "catalog reloaded"
        );
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// Run a relevance-ranked search against the catalog.
    ///
    /// The word-fetch capability is a thin locked view over the catalog,
    /// scoped to this call.
    pub fn search(
        &self,
        parameters: &SearchParameters,
    ) -> Result<SearchResultCollection, IndexError> {
        let guard = self.state.lock();
        let fetcher = CatalogFetcher {
            words: &guard.words,
        };
        run_search(parameters, &fetcher)
    }
}

/// In-memory word fetcher over the locked catalog.
struct CatalogFetcher<'a> {
    words: &'a HashMap<String, Word>,
}

impl WordFetcher for CatalogFetcher<'_> {
    fn try_fetch(&self, term: &str) -> Option<&Word> {
        self.words.get(term)
    }
}
