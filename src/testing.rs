//! Test doubles shared by unit tests, integration tests, and benchmarks.
//!
//! Not part of the public API surface proper; exported `#[doc(hidden)]` so
//! the `tests/` directory and benches can reuse the same fixtures.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::error::IndexError;
use crate::storer::{IndexDump, StorageBackend};
use crate::types::{Document, DumpedChange, DumpedMapping, DumpedWord, StorerResult};

// =============================================================================
// MOCK DOCUMENT
// =============================================================================

/// Minimal [`Document`] with an interiorly mutable ID.
pub struct MockDocument {
    id: AtomicU64,
    name: String,
    title: String,
    type_tag: String,
    date_time: SystemTime,
}

impl MockDocument {
    pub fn new(name: &str, title: &str, type_tag: &str) -> Self {
        Self {
            id: AtomicU64::new(0),
            name: name.to_string(),
            title: title.to_string(),
            type_tag: type_tag.to_string(),
            date_time: SystemTime::UNIX_EPOCH,
        }
    }
}

impl Document for MockDocument {
    fn id(&self) -> u64 {
        self.id.load(Ordering::Relaxed)
    }

    fn set_id(&self, id: u64) {
        self.id.store(id, Ordering::Relaxed);
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn type_tag(&self) -> &str {
        &self.type_tag
    }

    fn date_time(&self) -> SystemTime {
        self.date_time
    }
}

/// Shorthand constructor used throughout the test suites.
pub fn mock_doc(name: &str, title: &str, type_tag: &str) -> Arc<MockDocument> {
    Arc::new(MockDocument::new(name, title, type_tag))
}

// =============================================================================
// MEMORY BACKEND
// =============================================================================

#[derive(Default)]
struct MemoryRows {
    documents: Vec<crate::types::DumpedDocument>,
    words: Vec<DumpedWord>,
    mappings: Vec<DumpedMapping>,
    next_document_id: u64,
    next_word_id: u64,
}

/// In-memory [`StorageBackend`] that assigns committed IDs the way a real
/// row store would, plus a one-shot load-failure toggle for corruption
/// paths.
#[derive(Default)]
pub struct MemoryBackend {
    rows: Mutex<MemoryRows>,
    fail_load: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `load` fail, exercising the sticky corruption flag.
    pub fn fail_next_load(&self) {
        self.fail_load.store(true, Ordering::Relaxed);
    }

    /// Current persisted row counts: (documents, words, mappings).
    pub fn row_counts(&self) -> (usize, usize, usize) {
        let rows = self.rows.lock();
        (rows.documents.len(), rows.words.len(), rows.mappings.len())
    }
}

impl StorageBackend<()> for MemoryBackend {
    fn load(&self, _state: &()) -> Result<IndexDump, IndexError> {
        if self.fail_load.swap(false, Ordering::Relaxed) {
            return Err(IndexError::storage("simulated unreadable index"));
        }
        let rows = self.rows.lock();
        Ok(IndexDump {
            documents: rows.documents.clone(),
            words: rows.words.clone(),
            mappings: rows.mappings.clone(),
        })
    }

    fn save(&self, change: &DumpedChange, _state: &()) -> Result<StorerResult, IndexError> {
        let mut rows = self.rows.lock();

        rows.next_document_id += 1;
        let document_id = rows.next_document_id;
        let mut document = change.document.clone();
        document.id = document_id;
        rows.documents.push(document);

        // Remap the batch's provisional word IDs to committed ones; mappings
        // referencing them are rewritten in the same pass.
        let mut word_ids: Vec<(String, u64)> = Vec::with_capacity(change.words.len());
        let mut remap: std::collections::HashMap<u64, u64> = std::collections::HashMap::new();
        for word in &change.words {
            rows.next_word_id += 1;
            let committed = rows.next_word_id;
            remap.insert(word.id, committed);
            rows.words.push(DumpedWord {
                id: committed,
                text: word.text.clone(),
            });
            word_ids.push((word.text.clone(), committed));
        }
        for mapping in &change.mappings {
            let mut row = *mapping;
            row.document_id = document_id;
            if let Some(&committed) = remap.get(&row.word_id) {
                row.word_id = committed;
            }
            rows.mappings.push(row);
        }

        Ok(StorerResult {
            document_id,
            word_ids,
        })
    }

    fn delete(&self, change: &DumpedChange, _state: &()) -> Result<(), IndexError> {
        let mut rows = self.rows.lock();
        let document_id = change.document.id;
        rows.documents.retain(|d| d.id != document_id);
        rows.mappings.retain(|m| m.document_id != document_id);
        let pruned: Vec<u64> = change.words.iter().map(|w| w.id).collect();
        rows.words.retain(|w| !pruned.contains(&w.id));
        Ok(())
    }

    fn reset(&self, _state: &()) -> Result<(), IndexError> {
        *self.rows.lock() = MemoryRows::default();
        Ok(())
    }

    fn size(&self, _state: &()) -> u64 {
        let rows = self.rows.lock();
        let documents: usize = rows
            .documents
            .iter()
            .map(|d| 8 + d.name.len() + d.title.len() + d.type_tag.len())
            .sum();
        let words: usize = rows.words.iter().map(|w| 8 + w.text.len()).sum();
        let mappings = rows.mappings.len() * std::mem::size_of::<DumpedMapping>();
        (documents + words + mappings) as u64
    }
}
