//! Catalog entries: words and their occurrence sets.
//!
//! A [`Word`] is one inverted-index entry: normalized text plus an
//! occurrence map from document to a sorted set of positions. The map is
//! keyed by document *name* (case-insensitive), not instance identity,
//! because the same logical document may be rebuilt as a different instance
//! across reloads.
//!
//! # INVARIANTS (DO NOT VIOLATE)
//!
//! 1. **OCCURRENCE_SET_SORTED**: every set is fully sorted by
//!    `(location, word_index)` at all times; insertion is binary-search
//!    based, never a deferred sort.
//! 2. **NAME_CANONICAL**: one canonical document instance per lowercased
//!    name; inserting a second instance resolving to the same name is
//!    rejected.
//! 3. **NON_EMPTY_TEXT**: word text is non-empty and normalized.

use std::collections::HashMap;

use crate::error::IndexError;
use crate::types::{DocumentRef, DumpedMapping, DumpedWord, Occurrence, WordId, WordLocation};

// =============================================================================
// SORTED OCCURRENCE SET
// =============================================================================

/// Ordered, duplicate-tolerant set of occurrences within one document.
///
/// Ordered by the [`Occurrence`] sort key (location, then word index), which
/// deliberately ignores the char offset. Containment and removal are binary
/// searches over that key: a sort-key tie counts as "contained" even when the
/// char offsets differ, and removal drops whichever tying element the search
/// lands on. Preserved behavior - see the ordering note on `Occurrence`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedOccurrenceSet {
    items: Vec<Occurrence>,
}

impl SortedOccurrenceSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occurrences in the set.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Indexed access.
    pub fn get(&self, index: usize) -> Option<&Occurrence> {
        self.items.get(index)
    }

    /// Iterate in sort order.
    pub fn iter(&self) -> impl Iterator<Item = &Occurrence> {
        self.items.iter()
    }

    /// Binary-search insert, keeping the set sorted. Duplicates (by equality
    /// or by sort key) are tolerated and inserted adjacent to their ties.
    pub fn insert(&mut self, occurrence: Occurrence) {
        let at = match self.items.binary_search(&occurrence) {
            Ok(i) | Err(i) => i,
        };
        self.items.insert(at, occurrence);
    }

    /// Binary-search containment over the sort key. Ties on
    /// `(location, word_index)` count as contained regardless of offset.
    pub fn contains(&self, occurrence: &Occurrence) -> bool {
        self.items.binary_search(occurrence).is_ok()
    }

    /// Binary-search removal; drops the element the search lands on.
    /// Returns false if no element ties on the sort key.
    pub fn remove(&mut self, occurrence: &Occurrence) -> bool {
        match self.items.binary_search(occurrence) {
            Ok(i) => {
                self.items.remove(i);
                true
            }
            Err(_) => false,
        }
    }
}

// =============================================================================
// OCCURRENCE MAP
// =============================================================================

/// Document-to-occurrence-set map keyed by lowercased document name.
///
/// Each entry holds the canonical document instance alongside its set, which
/// doubles as the name-to-instance side index: lookups, inserts, and
/// removals are O(1) after the initial name resolution.
#[derive(Default)]
pub struct OccurrenceMap {
    entries: HashMap<String, (DocumentRef, SortedOccurrenceSet)>,
}

impl OccurrenceMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str) -> String {
        name.to_lowercase()
    }

    /// Number of documents recorded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no document is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a document with this name is recorded.
    pub fn contains_name(&self, name: &str) -> bool {
        self.entries.contains_key(&Self::key(name))
    }

    /// Canonical instance for a document name, if recorded.
    pub fn get_document(&self, name: &str) -> Option<&DocumentRef> {
        self.entries.get(&Self::key(name)).map(|(doc, _)| doc)
    }

    /// Occurrence set for a document name, if recorded.
    pub fn get(&self, name: &str) -> Option<&SortedOccurrenceSet> {
        self.entries.get(&Self::key(name)).map(|(_, set)| set)
    }

    /// Insert a new document with an empty set. Rejected if the name already
    /// resolves to an existing entry.
    pub fn insert(&mut self, document: DocumentRef) -> Result<(), IndexError> {
        let key = Self::key(document.name());
        if self.entries.contains_key(&key) {
            return Err(IndexError::DuplicateDocumentName {
                name: document.name().to_string(),
            });
        }
        self.entries
            .insert(key, (document, SortedOccurrenceSet::new()));
        Ok(())
    }

    /// Set for this document, creating an empty entry (with `document` as
    /// the canonical instance) if the name is new.
    pub fn entry_or_insert(&mut self, document: &DocumentRef) -> &mut SortedOccurrenceSet {
        let key = Self::key(document.name());
        &mut self
            .entries
            .entry(key)
            .or_insert_with(|| (document.clone(), SortedOccurrenceSet::new()))
            .1
    }

    /// Remove a document's entry, returning the canonical instance and set.
    pub fn remove(&mut self, name: &str) -> Option<(DocumentRef, SortedOccurrenceSet)> {
        self.entries.remove(&Self::key(name))
    }

    /// Iterate over `(canonical document, set)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&DocumentRef, &SortedOccurrenceSet)> {
        self.entries.values().map(|(doc, set)| (doc, set))
    }
}

// =============================================================================
// WORD
// =============================================================================

/// One catalog entry: normalized word text plus its occurrence map.
///
/// Identity and lookup key in the catalog is the text; the numeric ID is
/// persistence-assigned (see [`WordId`]).
pub struct Word {
    id: WordId,
    text: String,
    occurrences: OccurrenceMap,
}

impl Word {
    /// Create a word with the default (provisional zero) ID.
    pub fn new(text: String) -> Result<Self, IndexError> {
        Self::with_id(text, WordId::default())
    }

    /// Create a word with an explicit ID (bulk reload path).
    pub fn with_id(text: String, id: WordId) -> Result<Self, IndexError> {
        if text.is_empty() {
            return Err(IndexError::EmptyWordText);
        }
        Ok(Self {
            id,
            text,
            occurrences: OccurrenceMap::new(),
        })
    }

    /// Current word ID.
    pub fn id(&self) -> WordId {
        self.id
    }

    /// Rewrite the ID (provisional batch tagging or committed remap).
    pub fn set_id(&mut self, id: WordId) {
        self.id = id;
    }

    /// The normalized word text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The per-document occurrence map.
    pub fn occurrences(&self) -> &OccurrenceMap {
        &self.occurrences
    }

    /// Record one occurrence of this word in `document`.
    ///
    /// Inserts into the existing sorted set for that document, or creates a
    /// fresh set when the document is new to this word.
    pub fn add_occurrence(
        &mut self,
        document: &DocumentRef,
        first_char_index: u16,
        word_index: u16,
        location: WordLocation,
    ) {
        self.occurrences
            .entry_or_insert(document)
            .insert(Occurrence::new(first_char_index, word_index, location));
    }

    /// Remove and return, as dumped mappings tagged with this word's ID, the
    /// entire occurrence set for `document`. Empty result when the document
    /// was never recorded for this word.
    pub fn remove_occurrences(&mut self, document: &dyn crate::types::Document) -> Vec<DumpedMapping> {
        let Some((canonical, set)) = self.occurrences.remove(document.name()) else {
            return Vec::new();
        };
        let word_id = self.id.value();
        let document_id = canonical.id();
        set.iter()
            .map(|occ| DumpedMapping {
                word_id,
                document_id,
                first_char_index: occ.first_char_index,
                word_index: occ.word_index,
                location_code: occ.location.code(),
            })
            .collect()
    }

    /// Sum of all per-document set sizes.
    pub fn total_occurrences(&self) -> usize {
        self.occurrences.iter().map(|(_, set)| set.len()).sum()
    }

    /// Flat snapshot of this word for a change batch.
    pub fn dump(&self) -> DumpedWord {
        DumpedWord {
            id: self.id.value(),
            text: self.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock_doc;

    fn occ(first: u16, index: u16, location: WordLocation) -> Occurrence {
        Occurrence::new(first, index, location)
    }

    #[test]
    fn sorted_set_insert_keeps_order() {
        let mut set = SortedOccurrenceSet::new();
        set.insert(occ(10, 3, WordLocation::Content));
        set.insert(occ(0, 0, WordLocation::Content));
        set.insert(occ(5, 0, WordLocation::Title));
        set.insert(occ(2, 1, WordLocation::Content));

        let keys: Vec<(WordLocation, u16)> =
            set.iter().map(|o| (o.location, o.word_index)).collect();
        assert_eq!(
            keys,
            vec![
                (WordLocation::Title, 0),
                (WordLocation::Content, 0),
                (WordLocation::Content, 1),
                (WordLocation::Content, 3),
            ]
        );
    }

    #[test]
    fn sorted_set_tie_insertion_is_tolerated() {
        // Same (location, word_index), different char offset: distinct by
        // equality, tied on the sort key. Both must be held.
        let mut set = SortedOccurrenceSet::new();
        let a = occ(3, 1, WordLocation::Content);
        let b = occ(97, 1, WordLocation::Content);
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 2);

        // Containment is over the sort key: an occurrence with yet another
        // offset but the same key reports contained.
        assert!(set.contains(&occ(500, 1, WordLocation::Content)));
        assert!(!set.contains(&occ(3, 2, WordLocation::Content)));
    }

    #[test]
    fn sorted_set_tie_removal_drops_one_arbitrary_tie() {
        let mut set = SortedOccurrenceSet::new();
        let a = occ(3, 1, WordLocation::Content);
        let b = occ(97, 1, WordLocation::Content);
        set.insert(a);
        set.insert(b);

        // Removal by sort key drops exactly one of the tying elements,
        // regardless of which offset the probe carries.
        assert!(set.remove(&occ(1000, 1, WordLocation::Content)));
        assert_eq!(set.len(), 1);
        assert!(set.remove(&occ(1000, 1, WordLocation::Content)));
        assert!(set.is_empty());
        assert!(!set.remove(&occ(1000, 1, WordLocation::Content)));
    }

    #[test]
    fn occurrence_map_is_name_keyed_case_insensitive() {
        let mut map = OccurrenceMap::new();
        let doc: DocumentRef = mock_doc("Page One", "Page", "doc");
        map.insert(doc.clone()).unwrap();

        assert!(map.contains_name("page one"));
        assert!(map.contains_name("PAGE ONE"));
        assert!(map.get_document("page ONE").is_some());

        // Same name under a different instance is rejected.
        let dup: DocumentRef = mock_doc("PAGE ONE", "Other title", "doc");
        assert!(matches!(
            map.insert(dup),
            Err(IndexError::DuplicateDocumentName { .. })
        ));
    }

    #[test]
    fn entry_or_insert_reuses_canonical_instance() {
        let mut map = OccurrenceMap::new();
        let original: DocumentRef = mock_doc("page", "Page", "doc");
        original.set_id(7);
        map.entry_or_insert(&original)
            .insert(occ(0, 0, WordLocation::Content));

        // A reconstructed instance with the same name resolves to the same
        // entry; the canonical instance stays the first one.
        let rebuilt: DocumentRef = mock_doc("Page", "Page", "doc");
        map.entry_or_insert(&rebuilt)
            .insert(occ(4, 1, WordLocation::Content));

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("page").unwrap().len(), 2);
        assert_eq!(map.get_document("page").unwrap().id(), 7);
    }

    #[test]
    fn word_rejects_empty_text() {
        assert!(matches!(
            Word::new(String::new()),
            Err(IndexError::EmptyWordText)
        ));
    }

    #[test]
    fn word_add_and_remove_occurrences() {
        let mut word = Word::new("hello".into()).unwrap();
        word.set_id(WordId::Committed(11));

        let doc: DocumentRef = mock_doc("page", "Page", "doc");
        doc.set_id(3);
        word.add_occurrence(&doc, 0, 0, WordLocation::Content);
        word.add_occurrence(&doc, 8, 1, WordLocation::Content);
        word.add_occurrence(&doc, 0, 0, WordLocation::Title);
        assert_eq!(word.total_occurrences(), 3);

        let mappings = word.remove_occurrences(doc.as_ref());
        assert_eq!(mappings.len(), 3);
        assert!(mappings.iter().all(|m| m.word_id == 11 && m.document_id == 3));
        assert_eq!(word.total_occurrences(), 0);

        // Removing an unknown document is an empty-result no-op.
        let other: DocumentRef = mock_doc("other", "Other", "doc");
        assert!(word.remove_occurrences(other.as_ref()).is_empty());
    }
}
