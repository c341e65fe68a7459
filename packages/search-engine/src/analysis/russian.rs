//! Russian lemmatizer backed by the Snowball stemmer.

use rust_stemmers::{Algorithm, Stemmer};

use crate::traits::lemmatizer::Lemmatizer;

/// Prepositions, conjunctions, particles and interjections.
///
/// These carry no meaning for search and are never indexed.
const SERVICE_WORDS: &[&str] = &[
    // prepositions
    "без", "в", "во", "для", "до", "за", "из", "изо", "к", "ко", "кроме", "между", "на", "над",
    "надо", "о", "об", "обо", "от", "ото", "перед", "передо", "по", "под", "подо", "при", "про",
    "ради", "с", "со", "сквозь", "среди", "у", "через", "около", "вокруг", "после", "против",
    // conjunctions
    "а", "и", "да", "но", "или", "либо", "то", "что", "чтобы", "как", "будто", "если", "когда",
    "хотя", "потому", "поэтому", "зато", "однако", "также", "тоже", "ибо", "пока", "словно",
    // particles
    "не", "ни", "бы", "ли", "же", "ведь", "вот", "вон", "даже", "уже", "лишь", "только", "разве",
    "неужели", "пусть", "пускай", "давай", "ка", "де", "мол", "уж", "вообще",
    // interjections
    "ах", "ох", "эх", "ой", "ай", "ух", "увы", "ура", "эй", "ага", "ну", "тьфу", "фу", "ого",
];

/// Lemmatizer for Russian text.
///
/// Folds `ё` to `е`, drops service words and reduces the rest to their
/// Snowball stem, which stands in for the dictionary normal form.
pub struct RussianLemmatizer {
    stemmer: Stemmer,
}

impl Default for RussianLemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RussianLemmatizer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::Russian),
        }
    }

    fn is_service_word(word: &str) -> bool {
        SERVICE_WORDS.contains(&word)
    }
}

impl Lemmatizer for RussianLemmatizer {
    fn lemma(&self, word: &str) -> Option<String> {
        let word = word.to_lowercase().replace('ё', "е");
        if word.is_empty() || Self::is_service_word(&word) {
            return None;
        }
        let stem = self.stemmer.stem(&word);
        if stem.is_empty() {
            None
        } else {
            Some(stem.into_owned())
        }
    }
}
