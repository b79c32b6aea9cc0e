//! Query parsing, match accumulation, and relevance ranking.
//!
//! The algorithm consumes the catalog through the minimal [`WordFetcher`]
//! capability: lowercase and split the query, fetch each term's word,
//! accumulate weighted matches per document, filter by mode, then finalize
//! every surviving relevance into a percentage of the query's total weight.
//!
//! The fetcher is short-lived and scoped per call; the in-memory flavor is a
//! thin view over the locked catalog, but other strategies can slot in
//! without touching the ranking code.

use std::cmp::Ordering;

use crate::error::IndexError;
use crate::relevance::Relevance;
use crate::tokenize::{is_split_char, normalize_text};
use crate::types::{DocumentRef, MatchedOccurrence};
use crate::word::Word;

// =============================================================================
// PARAMETERS
// =============================================================================

/// Mode filtering applied after match accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Union: a document qualifies with at least one matching term.
    #[default]
    AtLeastOneWord,
    /// Intersection: a document must contain every term, in any order.
    AllWords,
    /// Terms must appear as a contiguous, in-order run of matches.
    ExactPhrase,
}

/// Validated search request.
///
/// The query is normalized on construction: split characters become spaces
/// (not deletions), then multi-word normalization collapses the rest.
#[derive(Debug, Clone)]
pub struct SearchParameters {
    query: String,
    type_tags: Option<Vec<String>>,
    mode: SearchMode,
}

impl SearchParameters {
    /// Create parameters, failing fast on caller misuse: empty query, or a
    /// supplied type-tag filter that is empty or contains empty tags.
    pub fn new(
        query: &str,
        type_tags: Option<&[&str]>,
        mode: SearchMode,
    ) -> Result<Self, IndexError> {
        if query.trim().is_empty() {
            return Err(IndexError::EmptyArgument { name: "query" });
        }
        let type_tags = match type_tags {
            Some(tags) => {
                if tags.is_empty() || tags.iter().any(|t| t.trim().is_empty()) {
                    return Err(IndexError::InvalidTypeTagFilter);
                }
                Some(tags.iter().map(|t| (*t).to_string()).collect())
            }
            None => None,
        };

        let spaced: String = query
            .chars()
            .map(|c| if is_split_char(c) { ' ' } else { c })
            .collect();

        Ok(Self {
            query: normalize_text(&spaced, false),
            type_tags,
            mode,
        })
    }

    /// The normalized query string.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Optional document type-tag filter.
    pub fn type_tags(&self) -> Option<&[String]> {
        self.type_tags.as_deref()
    }

    /// The requested mode.
    pub fn mode(&self) -> SearchMode {
        self.mode
    }
}

// =============================================================================
// WORD FETCH CAPABILITY
// =============================================================================

/// Minimal capability the algorithm uses to resolve a query term to its
/// catalog word. Acquire, query repeatedly, release - per search call.
pub trait WordFetcher {
    /// Resolve a normalized term, or `None` when the word is unknown.
    fn try_fetch(&self, term: &str) -> Option<&Word>;
}

// =============================================================================
// RESULTS
// =============================================================================

/// One search result: a document, its ordered matches, and a relevance.
pub struct SearchResult {
    document: DocumentRef,
    matches: Vec<MatchedOccurrence>,
    relevance: Relevance,
}

impl SearchResult {
    fn new(document: DocumentRef) -> Self {
        Self {
            document,
            matches: Vec::new(),
            relevance: Relevance::default(),
        }
    }

    /// The matched document.
    pub fn document(&self) -> &DocumentRef {
        &self.document
    }

    /// Matches, ordered by occurrence position then text.
    pub fn matches(&self) -> &[MatchedOccurrence] {
        &self.matches
    }

    /// The result's relevance (finalized by the time callers see it).
    pub fn relevance(&self) -> &Relevance {
        &self.relevance
    }

    /// Mutable relevance access, for post-finalization normalization.
    pub fn relevance_mut(&mut self) -> &mut Relevance {
        &mut self.relevance
    }

    /// Insert a match unless a duplicate `(text, first_char_index)` pair is
    /// already present. Returns whether the match was actually added.
    fn add_match(&mut self, matched: MatchedOccurrence) -> bool {
        let duplicate = self.matches.iter().any(|m| {
            m.text() == matched.text() && m.first_char_index() == matched.first_char_index()
        });
        if duplicate {
            return false;
        }
        let at = match self.matches.binary_search(&matched) {
            Ok(i) | Err(i) => i,
        };
        self.matches.insert(at, matched);
        true
    }
}

/// Ranked result container: one entry per unique document (by name identity
/// within a single search call), ordered by descending relevance.
#[derive(Default)]
pub struct SearchResultCollection {
    results: Vec<SearchResult>,
}

impl SearchResultCollection {
    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the search matched nothing.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate in rank order.
    pub fn iter(&self) -> impl Iterator<Item = &SearchResult> {
        self.results.iter()
    }

    /// Result at a rank position.
    pub fn get(&self, index: usize) -> Option<&SearchResult> {
        self.results.get(index)
    }

    /// Lookup by document name, case-insensitive. Uses the same lowercase
    /// folding as the catalog's name keys, so non-ASCII names resolve too.
    pub fn get_by_document(&self, name: &str) -> Option<&SearchResult> {
        let key = name.to_lowercase();
        self.results
            .iter()
            .find(|r| r.document.name().to_lowercase() == key)
    }
}

// =============================================================================
// ALGORITHM
// =============================================================================

/// Run a search against a word fetcher.
///
/// Accumulation: for every term's occurrences (skipping type-tag-excluded
/// documents), merge a matched occurrence into the document's lazily created
/// result, adding the location weight to both the document relevance and a
/// global total. Mode filtering removes non-qualifying results and subtracts
/// their weight from the total. Finalization turns each surviving relevance
/// into a percentage of the total, then results are ranked.
pub(crate) fn run_search<F>(
    parameters: &SearchParameters,
    fetcher: &F,
) -> Result<SearchResultCollection, IndexError>
where
    F: WordFetcher + ?Sized,
{
    let terms: Vec<String> = parameters
        .query()
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    let mut results: Vec<SearchResult> = Vec::new();
    let mut total_relevance: f32 = 0.0;

    for term in &terms {
        let Some(word) = fetcher.try_fetch(term) else {
            continue;
        };
        for (document, set) in word.occurrences().iter() {
            if let Some(tags) = parameters.type_tags() {
                if !tags.iter().any(|t| t == document.type_tag()) {
                    continue;
                }
            }

            let key = document.name().to_lowercase();
            let at = match results
                .iter()
                .position(|r| r.document.name().to_lowercase() == key)
            {
                Some(i) => i,
                None => {
                    results.push(SearchResult::new(document.clone()));
                    results.len() - 1
                }
            };
            let result = &mut results[at];

            for occ in set.iter() {
                let matched = MatchedOccurrence::new(
                    word.text().to_string(),
                    occ.first_char_index,
                    occ.word_index,
                    occ.location,
                );
                if result.add_match(matched) {
                    let weight = occ.location.weight();
                    result.relevance.add(weight)?;
                    total_relevance += weight;
                }
            }
        }
    }

    // Mode filtering: remove non-qualifying results and give their weight
    // back to the global total before finalization.
    match parameters.mode() {
        SearchMode::AtLeastOneWord => {}
        SearchMode::AllWords => {
            results.retain(|r| {
                let qualifies = r.matches.len() >= terms.len()
                    && terms
                        .iter()
                        .all(|t| r.matches.iter().any(|m| m.text() == t));
                if !qualifies {
                    total_relevance -= r.relevance.value();
                }
                qualifies
            });
        }
        SearchMode::ExactPhrase => {
            results.retain(|r| {
                let qualifies = phrase_aligns(&r.matches, &terms);
                if !qualifies {
                    total_relevance -= r.relevance.value();
                }
                qualifies
            });
        }
    }

    if total_relevance > 0.0 {
        for result in &mut results {
            result.relevance.finalize(total_relevance)?;
        }
    }

    results.sort_by(|a, b| {
        b.relevance
            .value()
            .partial_cmp(&a.relevance.value())
            .unwrap_or(Ordering::Equal)
    });

    Ok(SearchResultCollection { results })
}

/// Whether some alignment offset exists where consecutive matches' word
/// indices form exactly the query term sequence, in order.
fn phrase_aligns(matches: &[MatchedOccurrence], terms: &[String]) -> bool {
    if terms.is_empty() {
        return false;
    }
    matches
        .iter()
        .filter(|m| m.text() == terms[0])
        .any(|first| {
            let base = u32::from(first.word_index());
            terms.iter().enumerate().all(|(k, term)| {
                matches.iter().any(|m| {
                    m.text() == term.as_str() && u32::from(m.word_index()) == base + k as u32
                })
            })
        })
}
