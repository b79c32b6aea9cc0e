//! Persistence adapter between the index change protocol and a storage
//! backend.
//!
//! The storer subscribes to [`IndexChange`] notifications and forwards them
//! to a [`StorageBackend`]. It owns a sticky corruption flag: once any load
//! or save fails, the storer stops forwarding notifications (answering
//! `Ok(None)`, which degrades store calls without failing them) until an
//! operator intervenes. The flag retains its original cause for diagnostics.

use parking_lot::Mutex;
use std::marker::PhantomData;
use tracing::{debug, warn};

use crate::error::IndexError;
use crate::index::{InMemoryIndex, IndexChange, IndexObserver};
use crate::types::{DumpedChange, DumpedDocument, DumpedMapping, DumpedWord, StorerResult};

/// Full dumped contents of a persisted index.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct IndexDump {
    pub documents: Vec<DumpedDocument>,
    pub words: Vec<DumpedWord>,
    pub mappings: Vec<DumpedMapping>,
}

/// Durable storage for dumped index rows.
///
/// `S` is the opaque caller state threaded through from the index; a
/// backend over a shared database would use it to pick a connection or
/// transaction.
pub trait StorageBackend<S>: Send + Sync {
    /// Load the full dumped index.
    fn load(&self, state: &S) -> Result<IndexDump, IndexError>;

    /// Persist a document-added delta, returning authoritative IDs for the
    /// document and every new word in the delta.
    fn save(&self, change: &DumpedChange, state: &S) -> Result<StorerResult, IndexError>;

    /// Delete a document's rows (and any words the delta reports pruned).
    fn delete(&self, change: &DumpedChange, state: &S) -> Result<(), IndexError>;

    /// Drop all persisted rows.
    fn reset(&self, state: &S) -> Result<(), IndexError>;

    /// Approximate persisted size in bytes.
    fn size(&self, state: &S) -> u64;
}

impl<S, B: StorageBackend<S> + ?Sized> StorageBackend<S> for std::sync::Arc<B> {
    fn load(&self, state: &S) -> Result<IndexDump, IndexError> {
        (**self).load(state)
    }

    fn save(&self, change: &DumpedChange, state: &S) -> Result<StorerResult, IndexError> {
        (**self).save(change, state)
    }

    fn delete(&self, change: &DumpedChange, state: &S) -> Result<(), IndexError> {
        (**self).delete(change, state)
    }

    fn reset(&self, state: &S) -> Result<(), IndexError> {
        (**self).reset(state)
    }

    fn size(&self, state: &S) -> u64 {
        (**self).size(state)
    }
}

/// Change observer that persists index deltas through a [`StorageBackend`].
pub struct IndexStorer<S, B> {
    backend: B,
    /// `Some(cause)` once any persistence operation has failed.
    corruption: Mutex<Option<IndexError>>,
    _state: PhantomData<fn(S)>,
}

impl<S, B: StorageBackend<S>> IndexStorer<S, B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            corruption: Mutex::new(None),
            _state: PhantomData,
        }
    }

    /// Whether persistence has been marked corrupted.
    pub fn data_corrupted(&self) -> bool {
        self.corruption.lock().is_some()
    }

    /// The failure that first marked persistence corrupted, if any.
    pub fn corruption_cause(&self) -> Option<IndexError> {
        self.corruption.lock().clone()
    }

    /// Clear the corruption flag after an operator has repaired the store.
    pub fn reset_corruption(&self) {
        *self.corruption.lock() = None;
    }

    /// Approximate persisted size in bytes.
    pub fn size(&self, state: &S) -> u64 {
        self.backend.size(state)
    }

    fn mark_corrupted(&self, cause: IndexError) {
        warn!(%cause, "marking persisted index as corrupted");
        let mut slot = self.corruption.lock();
        // Keep the first cause; later failures are downstream noise.
        if slot.is_none() {
            *slot = Some(cause);
        }
    }

    /// Load the persisted index into `index` via its bulk-reload path.
    ///
    /// Failures do not propagate: a load or reload error marks persistence
    /// corrupted (capturing the cause), leaving the index empty but the
    /// application running.
    pub fn load_index(&self, index: &InMemoryIndex<S>, state: &S) {
        let dump = match self.backend.load(state) {
            Ok(dump) => dump,
            Err(cause) => {
                self.mark_corrupted(cause);
                return;
            }
        };
        debug!(
            documents = dump.documents.len(),
            words = dump.words.len(),
            mappings = dump.mappings.len(),
            "loading persisted index"
        );
        if let Err(cause) = index.initialize_data(&dump.documents, &dump.words, &dump.mappings) {
            self.mark_corrupted(cause);
        }
    }
}

impl<S, B: StorageBackend<S>> IndexObserver<S> for IndexStorer<S, B> {
    fn on_index_change(
        &self,
        change: &IndexChange,
        state: &S,
    ) -> Result<Option<StorerResult>, IndexError> {
        // While corrupted, notifications are acknowledged but not persisted;
        // document-added answers carry no result, degrading the store call.
        if self.data_corrupted() {
            return Ok(None);
        }
        match change {
            IndexChange::DocumentAdded(delta) => match self.backend.save(delta, state) {
                Ok(result) => Ok(Some(result)),
                Err(cause) => {
                    self.mark_corrupted(cause.clone());
                    Err(cause)
                }
            },
            IndexChange::DocumentRemoved(delta) => {
                if let Err(cause) = self.backend.delete(delta, state) {
                    self.mark_corrupted(cause.clone());
                    return Err(cause);
                }
                Ok(None)
            }
            IndexChange::IndexCleared => {
                if let Err(cause) = self.backend.reset(state) {
                    self.mark_corrupted(cause.clone());
                    return Err(cause);
                }
                Ok(None)
            }
        }
    }
}
