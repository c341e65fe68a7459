//! Test helpers: a dictionary-backed lemmatizer and index invariant checks.

use std::collections::{HashMap, HashSet};

use crate::traits::lemmatizer::Lemmatizer;
use crate::traits::store::IndexStore;

/// Lemmatizer driven by an explicit word-form table.
///
/// Words without an entry are their own lemma, so tests can pin exactly
/// which forms share a lemma.
///
/// # Example
///
/// ```rust
/// use search_engine::testing::DictionaryLemmatizer;
/// use search_engine::traits::lemmatizer::Lemmatizer;
///
/// let lemmatizer = DictionaryLemmatizer::new().with_forms("кошка", &["кошки", "кошку"]);
/// assert_eq!(lemmatizer.lemma("кошки").as_deref(), Some("кошка"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DictionaryLemmatizer {
    forms: HashMap<String, String>,
    service_words: HashSet<String>,
}

impl DictionaryLemmatizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map each form (and the lemma itself) to `lemma`.
    pub fn with_forms(mut self, lemma: &str, forms: &[&str]) -> Self {
        self.forms.insert(lemma.to_lowercase(), lemma.to_lowercase());
        for form in forms {
            self.forms.insert(form.to_lowercase(), lemma.to_lowercase());
        }
        self
    }

    /// Words that never produce a lemma.
    pub fn with_service_words(mut self, words: &[&str]) -> Self {
        self.service_words
            .extend(words.iter().map(|w| w.to_lowercase()));
        self
    }
}

impl Lemmatizer for DictionaryLemmatizer {
    fn lemma(&self, word: &str) -> Option<String> {
        let word = word.to_lowercase();
        if word.is_empty() || self.service_words.contains(&word) {
            return None;
        }
        Some(self.forms.get(&word).cloned().unwrap_or(word))
    }
}

/// Panic unless every lemma's frequency equals its number of index rows.
pub async fn assert_frequency_invariant(store: &dyn IndexStore) {
    let sites = store.list_sites().await.expect("list sites");
    for site in sites {
        let lemmas = store.list_lemmas(site.id).await.expect("list lemmas");
        for lemma in lemmas {
            let rows = store
                .find_indexes_for_lemma(lemma.id)
                .await
                .expect("find indexes");
            assert_eq!(
                lemma.frequency as usize,
                rows.len(),
                "lemma '{}' on site '{}' has frequency {} but {} index rows",
                lemma.lemma,
                site.name,
                lemma.frequency,
                rows.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_words_are_their_own_lemma() {
        let lemmatizer = DictionaryLemmatizer::new()
            .with_forms("кошка", &["кошки"])
            .with_service_words(&["и"]);

        assert_eq!(lemmatizer.lemma("Кошки").as_deref(), Some("кошка"));
        assert_eq!(lemmatizer.lemma("слон").as_deref(), Some("слон"));
        assert!(lemmatizer.lemma("и").is_none());

        let counts = lemmatizer.lemmas_and_counts("Кошка и кошки");
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["кошка"], 2);
    }
}
