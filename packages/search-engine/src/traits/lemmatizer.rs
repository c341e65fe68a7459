//! Lemmatizer trait - word forms to normalized lemmas.

use std::collections::{BTreeSet, HashMap};

/// Maps text to lemmas.
///
/// Implementations are synchronous and cheap enough to call per word.
pub trait Lemmatizer: Send + Sync {
    /// Lemma of a single lowercase word, or `None` for service words and noise.
    fn lemma(&self, word: &str) -> Option<String>;

    /// Split text into lowercase words.
    fn words(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !is_cyrillic(c))
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect()
    }

    /// Count occurrences of each lemma in `text`.
    fn lemmas_and_counts(&self, text: &str) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for word in self.words(text) {
            if let Some(lemma) = self.lemma(&word) {
                *counts.entry(lemma).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Distinct lemmas of `text`, sorted.
    fn lemma_set(&self, text: &str) -> BTreeSet<String> {
        self.words(text)
            .iter()
            .filter_map(|word| self.lemma(word))
            .collect()
    }

    /// Whether `word` normalizes to `lemma`.
    fn word_matches_lemma(&self, lemma: &str, word: &str) -> bool {
        self.lemma(&word.to_lowercase()).as_deref() == Some(lemma)
    }
}

/// Letters matched by the word tokenizer and the snippet scanner.
pub fn is_cyrillic(c: char) -> bool {
    matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё')
}
