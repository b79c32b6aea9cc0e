//! Text normalization and tokenization.
//!
//! Raw text becomes a sequence of normalized word tokens with position
//! metadata. Normalization strips diacritics via NFD decomposition, keeps
//! only letters and digits, and lowercases; for whole strings (queries) the
//! stripped characters become single spaces so word boundaries survive, for
//! single words they are deleted outright.
//!
//! With the `unicode-normalization` feature disabled, normalization skips
//! decomposition and assumes pre-normalized or ASCII input.

use crate::types::{MatchedOccurrence, WordLocation, MAX_CHAR_INDEX};

#[cfg(feature = "unicode-normalization")]
use unicode_normalization::UnicodeNormalization;

/// True for any character that delimits words: anything that is not a
/// letter, combining mark, digit, or currency symbol.
pub fn is_split_char(ch: char) -> bool {
    !(ch.is_alphabetic() || ch.is_numeric() || is_combining_mark(ch) || is_currency_symbol(ch))
}

/// Check if a character is a combining mark (diacritic or dependent sign).
///
/// Covers the common mark blocks plus the mark subranges of Devanagari and
/// Telugu. The surrounding letters of those scripts are ordinary letters and
/// must NOT match here, or whole words vanish during normalization.
fn is_combining_mark(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}' |  // Combining Diacritical Marks
        '\u{0900}'..='\u{0903}' |  // Devanagari signs (candrabindu, anusvara, visarga)
        '\u{093A}'..='\u{094F}' |  // Devanagari vowel signs and virama
        '\u{0951}'..='\u{0957}' |  // Devanagari stress signs and vowel signs
        '\u{0962}'..='\u{0963}' |  // Devanagari vocalic vowel signs
        '\u{0C00}'..='\u{0C04}' |  // Telugu signs
        '\u{0C3E}'..='\u{0C56}' |  // Telugu vowel signs and virama
        '\u{0C62}'..='\u{0C63}' |  // Telugu vocalic vowel signs
        '\u{1DC0}'..='\u{1DFF}' |  // Combining Diacritical Marks Supplement
        '\u{20D0}'..='\u{20FF}' |  // Combining Diacritical Marks for Symbols
        '\u{FE20}'..='\u{FE2F}'    // Combining Half Marks
    )
}

/// Check if a character is a currency symbol (category Sc).
fn is_currency_symbol(c: char) -> bool {
    matches!(c,
        '$' |
        '\u{00A2}'..='\u{00A5}' |  // Cent, pound, currency, yen
        '\u{20A0}'..='\u{20CF}' |  // Currency Symbols block
        '\u{0E3F}' |               // Baht
        '\u{FDFC}'                 // Rial
    )
}

/// NFD-decompose and drop combining marks, so "café" compares as "cafe".
/// The mark check is the crate's full category-Mn table, so base letters of
/// any script survive.
#[cfg(feature = "unicode-normalization")]
fn decompose(text: &str) -> String {
    text.nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}

/// Fallback without the `unicode-normalization` feature: assume input is
/// ASCII or pre-normalized.
#[cfg(not(feature = "unicode-normalization"))]
fn decompose(text: &str) -> String {
    text.to_string()
}

/// Normalize text for indexing or querying.
///
/// Keeps letters and digits, lowercased, diacritics stripped. Every other
/// character is deleted when `single_word` is true; for whole strings it is
/// replaced by a single space (with runs collapsed), preserving word
/// boundaries for later splitting.
pub fn normalize_text(text: &str, single_word: bool) -> String {
    let decomposed = decompose(text);
    let mut out = String::with_capacity(decomposed.len());

    for ch in decomposed.chars() {
        if ch.is_alphabetic() || ch.is_numeric() {
            out.extend(ch.to_lowercase());
        } else if !single_word && !out.ends_with(' ') {
            out.push(' ');
        }
    }

    if single_word {
        out
    } else {
        out.trim().to_string()
    }
}

/// Single-word normalization: strip diacritics and punctuation outright.
pub fn normalize_word(word: &str) -> String {
    normalize_text(word, true)
}

/// Tokenize text into matched occurrences tagged with `location`.
///
/// Maximal runs of non-split characters become candidate words; each is
/// normalized and discarded if nothing survives. Character indices are
/// capped at [`MAX_CHAR_INDEX`] to bound positions - tokenization stops at
/// the cap rather than emitting unrepresentable offsets.
pub fn tokenize(text: &str, location: WordLocation) -> Vec<MatchedOccurrence> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0usize;
    let mut word_index: u16 = 0;

    while i < chars.len() {
        // Skip leading split characters
        while i < chars.len() && is_split_char(chars[i]) {
            i += 1;
        }
        if i >= chars.len() || i > MAX_CHAR_INDEX {
            break;
        }

        let start = i;
        while i < chars.len() && !is_split_char(chars[i]) {
            i += 1;
        }

        let candidate: String = chars[start..i].iter().collect();
        let normalized = normalize_word(&candidate);
        if !normalized.is_empty() {
            tokens.push(MatchedOccurrence::new(
                normalized,
                start as u16,
                word_index,
                location,
            ));
            word_index = match word_index.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }
    }

    tokens
}

/// Normalize keywords: strip internal spaces, single-word-normalize, drop
/// entries that normalize to empty.
pub fn cleanup_keywords(keywords: &[&str]) -> Vec<String> {
    keywords
        .iter()
        .map(|kw| {
            let despaced: String = kw.chars().filter(|c| !c.is_whitespace()).collect();
            normalize_word(&despaced)
        })
        .filter(|kw| !kw.is_empty())
        .collect()
}

/// Case-insensitive stop-word exclusion filter over tokens.
pub fn remove_stop_words(
    tokens: Vec<MatchedOccurrence>,
    stop_words: &[String],
) -> Vec<MatchedOccurrence> {
    if stop_words.is_empty() {
        return tokens;
    }
    tokens
        .into_iter()
        .filter(|tok| {
            !stop_words
                .iter()
                .any(|sw| sw.eq_ignore_ascii_case(tok.text()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_char_classes() {
        assert!(is_split_char(' '));
        assert!(is_split_char(','));
        assert!(is_split_char('-'));
        assert!(is_split_char('\n'));
        assert!(!is_split_char('a'));
        assert!(!is_split_char('Z'));
        assert!(!is_split_char('7'));
        assert!(!is_split_char('$'));
        assert!(!is_split_char('€'));
    }

    #[test]
    fn tokenize_simple() {
        let tokens = tokenize("hello world", WordLocation::Content);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text(), "hello");
        assert_eq!(tokens[0].first_char_index(), 0);
        assert_eq!(tokens[0].word_index(), 0);
        assert_eq!(tokens[1].text(), "world");
        assert_eq!(tokens[1].first_char_index(), 6);
        assert_eq!(tokens[1].word_index(), 1);
    }

    #[test]
    fn tokenize_skips_leading_split_chars() {
        let tokens = tokenize("  ...hello", WordLocation::Content);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].first_char_index(), 5);
    }

    #[test]
    fn tokenize_with_punctuation() {
        let tokens = tokenize("hello, world! (again)", WordLocation::Content);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text()).collect();
        assert_eq!(texts, vec!["hello", "world", "again"]);
    }

    #[test]
    fn split_chars_exclude_letters_and_marks_of_all_scripts() {
        // Base letters (Lo) and dependent signs must both stay inside a
        // token run.
        assert!(!is_split_char('न')); // Devanagari letter
        assert!(!is_split_char('\u{0941}')); // Devanagari vowel sign u
        assert!(!is_split_char('త')); // Telugu letter
        assert!(!is_split_char('\u{0C46}')); // Telugu vowel sign e
        assert!(!is_split_char('ж'));
        assert!(!is_split_char('搜'));
    }

    #[test]
    fn normalization_keeps_non_latin_base_letters() {
        // Stripping diacritics removes marks only, never whole scripts.
        assert!(!normalize_word("नमस्ते").is_empty());
        assert!(!normalize_word("తెలుగు").is_empty());
        assert_eq!(normalize_word("система"), "система");

        let tokens = tokenize("नमस्ते दुनिया", WordLocation::Content);
        assert_eq!(tokens.len(), 2);
        assert!(tokens.iter().all(|t| !t.text().is_empty()));
    }

    #[test]
    fn tokenize_normalizes_case_and_diacritics() {
        let tokens = tokenize("Café RÉSUMÉ", WordLocation::Content);
        assert_eq!(tokens[0].text(), "cafe");
        assert_eq!(tokens[1].text(), "resume");
    }

    #[test]
    fn tokenize_tags_location() {
        let tokens = tokenize("hello", WordLocation::Title);
        assert_eq!(tokens[0].location(), WordLocation::Title);
    }

    #[test]
    fn tokenize_discards_empty_normalizations() {
        // A run of symbols that normalizes to nothing must not produce a
        // token or consume a word index.
        let tokens = tokenize("hello *** world", WordLocation::Content);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].word_index(), 1);
    }

    #[test]
    fn tokenize_stops_at_position_cap() {
        let mut text = " ".repeat(MAX_CHAR_INDEX + 10);
        text.push_str("tail");
        let tokens = tokenize(&text, WordLocation::Content);
        assert!(tokens.is_empty());
    }

    #[test]
    fn normalize_text_multi_word_preserves_boundaries() {
        assert_eq!(normalize_text("hello---world", false), "hello world");
        assert_eq!(normalize_text("  lots   of,, space ", false), "lots of space");
    }

    #[test]
    fn normalize_text_single_word_deletes() {
        assert_eq!(normalize_text("it's", true), "its");
        assert_eq!(normalize_word("\"quoted\""), "quoted");
        assert_eq!(normalize_word("***"), "");
    }

    #[test]
    fn cleanup_keywords_strips_and_drops() {
        let cleaned = cleanup_keywords(&["full text", "  ", "Café", "!!!"]);
        assert_eq!(cleaned, vec!["fulltext".to_string(), "cafe".to_string()]);
    }

    #[test]
    fn stop_words_filter_is_case_insensitive() {
        let tokens = tokenize("The quick fox", WordLocation::Content);
        let filtered = remove_stop_words(tokens, &["the".to_string()]);
        let texts: Vec<&str> = filtered.iter().map(|t| t.text()).collect();
        assert_eq!(texts, vec!["quick", "fox"]);
    }
}
