//! Multilingual tests for tokenization and search.
//!
//! Normalization must keep the base letters of every script: stripping
//! diacritics may only remove combining marks, never the letters they
//! attach to. These tests cover the major script families:
//!
//! | Language | Script     | Combining marks                  |
//! |----------|------------|----------------------------------|
//! | French   | Latin      | acute, grave, circumflex         |
//! | Russian  | Cyrillic   | none in common text              |
//! | Hindi    | Devanagari | vowel signs, virama, anusvara    |
//! | Telugu   | Telugu     | vowel signs, virama              |
//! | Arabic   | Arabic     | optional harakat                 |
//! | Chinese  | Han        | none                             |

use lexidex::testing::mock_doc;
use lexidex::{
    tokenize, Document, InMemoryIndex, SearchMode, SearchParameters, WordLocation,
};

fn search_names(index: &InMemoryIndex, query: &str) -> Vec<String> {
    let params = SearchParameters::new(query, None, SearchMode::AtLeastOneWord).unwrap();
    index
        .search(&params)
        .unwrap()
        .iter()
        .map(|r| r.document().name().to_string())
        .collect()
}

// ============================================================================
// TOKENIZATION: BASE LETTERS SURVIVE NORMALIZATION
// ============================================================================

#[test]
fn devanagari_letters_survive_normalization() {
    let tokens = tokenize("नमस्ते दुनिया", WordLocation::Content);
    assert_eq!(tokens.len(), 2);
    assert!(!tokens[0].text().is_empty());
    assert!(!tokens[1].text().is_empty());
}

#[test]
fn telugu_letters_survive_normalization() {
    let tokens = tokenize("తెలుగు భాష", WordLocation::Content);
    assert_eq!(tokens.len(), 2);
    assert!(tokens.iter().all(|t| !t.text().is_empty()));
}

#[test]
fn cyrillic_letters_survive_normalization() {
    let tokens = tokenize("поисковая система", WordLocation::Content);
    let texts: Vec<&str> = tokens.iter().map(|t| t.text()).collect();
    assert_eq!(texts, vec!["поисковая", "система"]);
}

#[test]
fn arabic_letters_survive_normalization() {
    let tokens = tokenize("محرك البحث", WordLocation::Content);
    assert_eq!(tokens.len(), 2);
    assert!(tokens.iter().all(|t| !t.text().is_empty()));
}

#[test]
fn han_characters_survive_normalization() {
    let tokens = tokenize("搜索 引擎", WordLocation::Content);
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].text(), "搜索");
    assert_eq!(tokens[1].text(), "引擎");
}

#[test]
fn latin_diacritics_still_fold_to_base_letters() {
    let tokens = tokenize("déjà vu", WordLocation::Content);
    let texts: Vec<&str> = tokens.iter().map(|t| t.text()).collect();
    assert_eq!(texts, vec!["deja", "vu"]);
}

// ============================================================================
// END TO END: INDEX AND QUERY IN THE SAME SCRIPT
// ============================================================================

#[test]
fn hindi_content_is_indexed_and_searchable() {
    let index: InMemoryIndex = InMemoryIndex::new();
    let doc = mock_doc("hindi", "", "doc");
    index
        .store_document(doc, &[], "नमस्ते दुनिया", &())
        .unwrap();

    assert_eq!(index.total_occurrences(), 2);
    assert_eq!(search_names(&index, "दुनिया"), vec!["hindi".to_string()]);
}

#[test]
fn mixed_script_documents_rank_independently() {
    let index: InMemoryIndex = InMemoryIndex::new();
    let ru = mock_doc("ru", "", "doc");
    index
        .store_document(ru, &[], "поисковая система", &())
        .unwrap();
    let te = mock_doc("te", "", "doc");
    index.store_document(te, &[], "తెలుగు భాష", &()).unwrap();

    assert_eq!(search_names(&index, "система"), vec!["ru".to_string()]);
    assert_eq!(search_names(&index, "భాష"), vec!["te".to_string()]);
    assert!(search_names(&index, "система భాష").len() == 2);
}
