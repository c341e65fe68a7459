//! Snippet extraction and highlighting.
//!
//! Matches are scanned from a page's visible text, grouped into windows whose
//! match span fits the length budget, ranked, and the best windows are
//! formatted with `<b>` highlighting until every query lemma is covered or
//! the written excerpt reaches the budget. Lengths are measured in chars.

use regex::Regex;
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

use crate::traits::lemmatizer::Lemmatizer;

/// Context taken on each side of a window's match span.
const CONTEXT_CHARS: usize = 100;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[А-Яа-яЁё]+").unwrap());
static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\n?!.]+").unwrap());
static CAPITALIZED_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[А-ЯЁ]").unwrap());

/// A query word found in the text; offsets are byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Match {
    start: usize,
    end: usize,
    lemma: String,
    capitalized: bool,
}

#[derive(Debug)]
struct Candidate<'a> {
    matches: &'a [Match],
    lemmas: BTreeSet<&'a str>,
    capitalized: usize,
    span_chars: usize,
    text: String,
}

impl<'a> Candidate<'a> {
    fn new(source: &str, matches: &'a [Match]) -> Self {
        let first = &matches[0];
        let last = &matches[matches.len() - 1];
        Self {
            matches,
            lemmas: matches.iter().map(|m| m.lemma.as_str()).collect(),
            capitalized: matches.iter().filter(|m| m.capitalized).count(),
            span_chars: source[first.start..last.end].chars().count(),
            text: format_window(source, matches),
        }
    }
}

/// Builds highlighted excerpts for search results.
pub struct SnippetBuilder<'a> {
    lemmatizer: &'a dyn Lemmatizer,
    max_length: usize,
}

impl<'a> SnippetBuilder<'a> {
    pub fn new(lemmatizer: &'a dyn Lemmatizer, max_length: usize) -> Self {
        Self {
            lemmatizer,
            max_length,
        }
    }

    /// Excerpt of `text` highlighting words of `lemmas`.
    ///
    /// Lemmas that could not be placed are listed in a trailing
    /// "Не найдено" note. Newlines render as ` * `.
    pub fn build(&self, text: &str, lemmas: &BTreeSet<String>) -> String {
        let matches = self.find_matches(text, lemmas);
        let mut candidates: Vec<Candidate<'_>> = window_ranges(text, &matches, self.max_length)
            .into_iter()
            .map(|range| Candidate::new(text, &matches[range]))
            .collect();

        candidates.sort_by_key(|c| {
            (
                Reverse(c.lemmas.len()),
                Reverse(c.capitalized),
                Reverse(c.matches.len()),
                c.text.chars().count(),
                c.matches[0].start,
            )
        });

        let mut pending: BTreeSet<&str> = lemmas.iter().map(String::as_str).collect();
        let mut output = String::new();
        let mut output_chars = 0usize;
        for candidate in &candidates {
            if pending.is_empty() || output_chars >= self.max_length {
                break;
            }
            if !candidate.lemmas.iter().any(|l| pending.contains(l)) {
                continue;
            }
            // A window is taken only while its match span still fits after
            // what has been written so far.
            if output_chars + candidate.span_chars > self.max_length {
                continue;
            }
            for lemma in &candidate.lemmas {
                pending.remove(lemma);
            }
            output_chars += candidate.text.chars().count();
            output.push_str(&candidate.text);
        }

        if !pending.is_empty() {
            let missing: Vec<String> = pending.iter().map(|l| format!("<s>{l}</s>")).collect();
            output.push_str(&format!("<br/>Не найдено: {}.", missing.join(", ")));
        }

        output.replace('\n', " * ")
    }

    /// Query words in document order.
    ///
    /// A word that several lemmas accept counts as the first of them in
    /// sorted order.
    fn find_matches(&self, text: &str, lemmas: &BTreeSet<String>) -> Vec<Match> {
        WORD.find_iter(text)
            .filter_map(|word| {
                let surface = word.as_str();
                let lemma = lemmas
                    .iter()
                    .find(|lemma| self.lemmatizer.word_matches_lemma(lemma, surface))?;
                Some(Match {
                    start: word.start(),
                    end: word.end(),
                    lemma: lemma.clone(),
                    capitalized: surface.chars().next().is_some_and(char::is_uppercase),
                })
            })
            .collect()
    }
}

/// One window per starting match, grown while its match span fits.
///
/// A window always holds its first match, even a word longer than the budget.
fn window_ranges(text: &str, matches: &[Match], max_length: usize) -> Vec<Range<usize>> {
    (0..matches.len())
        .map(|i| {
            let start = matches[i].start;
            let mut end = i + 1;
            while end < matches.len() && text[start..matches[end].end].chars().count() <= max_length {
                end += 1;
            }
            i..end
        })
        .collect()
}

fn format_window(text: &str, matches: &[Match]) -> String {
    let span_start = matches[0].start;
    let span_end = matches[matches.len() - 1].end;
    let context_start = chars_before(text, span_start, CONTEXT_CHARS);
    let context_end = chars_after(text, span_end, CONTEXT_CHARS);

    let mut out = String::new();
    out.push_str(trim_prefix(&text[context_start..span_start], context_start > 0));

    let mut cursor = span_start;
    for m in matches {
        out.push_str(&text[cursor..m.start]);
        out.push_str("<b>");
        out.push_str(&text[m.start..m.end]);
        out.push_str("</b>");
        cursor = m.end;
    }

    out.push_str(trim_postfix(&text[span_end..context_end], context_end < text.len()));
    if !out.ends_with('\n') {
        out.push_str(" ... ");
    }
    out
}

/// Leading context cut to a clean start.
fn trim_prefix(prefix: &str, clipped: bool) -> &str {
    if let Some(end) = SENTENCE_END.find_iter(prefix).last() {
        return &prefix[end.end()..];
    }
    if !clipped {
        return prefix;
    }
    if let Some(word) = CAPITALIZED_WORD.find_iter(prefix).last() {
        return &prefix[word.start()..];
    }
    match prefix.find(char::is_whitespace) {
        Some(pos) => &prefix[pos..],
        None => "",
    }
}

/// Trailing context cut to a clean end.
fn trim_postfix(postfix: &str, clipped: bool) -> &str {
    if let Some(end) = SENTENCE_END.find(postfix) {
        return &postfix[..end.end()];
    }
    if !clipped {
        return postfix;
    }
    if let Some(word) = CAPITALIZED_WORD.find(postfix) {
        return &postfix[..word.start()];
    }
    match postfix.rfind(char::is_whitespace) {
        Some(pos) => &postfix[..pos],
        None => "",
    }
}

/// Byte offset `n` chars before `pos`, clamped to the start.
fn chars_before(text: &str, pos: usize, n: usize) -> usize {
    if n == 0 {
        return pos;
    }
    text[..pos]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte offset `n` chars after `pos`, clamped to the end.
fn chars_after(text: &str, pos: usize, n: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::DictionaryLemmatizer;
    use proptest::prelude::*;

    fn lemmas(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn lemmatizer() -> DictionaryLemmatizer {
        DictionaryLemmatizer::new()
            .with_forms("кошка", &["кошки", "кошку"])
            .with_forms("собака", &["собаки"])
    }

    #[test]
    fn test_highlights_single_match() {
        let lemmatizer = lemmatizer();
        let builder = SnippetBuilder::new(&lemmatizer, 200);

        let snippet = builder.build("Кошка сидит на окне.", &lemmas(&["кошка"]));

        assert_eq!(snippet, "<b>Кошка</b> сидит на окне. ... ");
    }

    #[test]
    fn test_prefers_window_covering_more_lemmas() {
        let lemmatizer = lemmatizer();
        let builder = SnippetBuilder::new(&lemmatizer, 200);

        let snippet = builder.build("Кошка и собака дружат.", &lemmas(&["кошка", "собака"]));

        assert_eq!(snippet, "<b>Кошка</b> и <b>собака</b> дружат. ... ");
        assert!(!snippet.contains("Не найдено"));
    }

    #[test]
    fn test_lists_missing_lemmas() {
        let lemmatizer = lemmatizer();
        let builder = SnippetBuilder::new(&lemmatizer, 200);

        let snippet = builder.build("Кошка сидит на окне.", &lemmas(&["кошка", "слон"]));

        assert_eq!(
            snippet,
            "<b>Кошка</b> сидит на окне. ... <br/>Не найдено: <s>слон</s>."
        );
    }

    #[test]
    fn test_no_matches_yields_only_note() {
        let lemmatizer = lemmatizer();
        let builder = SnippetBuilder::new(&lemmatizer, 200);

        let snippet = builder.build("Пустой текст", &lemmas(&["кошка"]));

        assert_eq!(snippet, "<br/>Не найдено: <s>кошка</s>.");
    }

    #[test]
    fn test_newline_ends_window_and_renders_as_separator() {
        let lemmatizer = lemmatizer();
        let builder = SnippetBuilder::new(&lemmatizer, 200);

        let snippet = builder.build("Заголовок\nКошка спит\nДалее текст", &lemmas(&["кошка"]));

        assert_eq!(snippet, "<b>Кошка</b> спит * ");
    }

    #[test]
    fn test_clipped_context_drops_partial_words() {
        let lemmatizer = lemmatizer();
        let builder = SnippetBuilder::new(&lemmatizer, 200);
        let filler = "слово ".repeat(30);
        let text = format!("{filler}кошка {filler}");

        let snippet = builder.build(&text, &lemmas(&["кошка"]));

        assert!(snippet.contains("<b>кошка</b>"));
        assert!(!snippet.starts_with("лово"));
        assert!(snippet.trim_start().starts_with("слово"));
        assert!(snippet.ends_with("слово ... "));
    }

    #[test]
    fn test_gap_between_matches_is_copied_verbatim() {
        let lemmatizer = lemmatizer();
        let builder = SnippetBuilder::new(&lemmatizer, 200);

        let snippet = builder.build("кошки, кошку!", &lemmas(&["кошка"]));

        assert_eq!(snippet, "<b>кошки</b>, <b>кошку</b>! ... ");
    }

    #[test]
    fn test_stops_once_output_reaches_length() {
        let lemmatizer = lemmatizer();
        let builder = SnippetBuilder::new(&lemmatizer, 200);
        let filler = "слово ".repeat(60);
        let text = format!("{filler}кошка {filler}собака {filler}слон {filler}");

        let snippet = builder.build(&text, &lemmas(&["кошка", "собака", "слон"]));

        let (excerpt, note) = snippet
            .split_once("<br/>")
            .expect("uncovered lemmas should be listed");
        assert_eq!(excerpt.matches("<b>").count(), 1);
        assert!(excerpt.chars().count() <= 200 + 2 * CONTEXT_CHARS);
        assert_eq!(note.matches("<s>").count(), 2);
    }

    #[test]
    fn test_adds_windows_while_output_is_short() {
        let lemmatizer = lemmatizer();
        let builder = SnippetBuilder::new(&lemmatizer, 40);
        let text = format!("Кошка спит.\n{}\nСобака лает.", "слово ".repeat(10));

        let snippet = builder.build(&text, &lemmas(&["кошка", "собака"]));

        assert_eq!(snippet, "<b>Кошка</b> спит. * <b>Собака</b> лает. ... ");
    }

    fn text_and_matches(words: &[(bool, usize)]) -> (String, Vec<Match>) {
        let mut text = String::new();
        let mut matches = Vec::new();
        for (is_match, len) in words {
            let start = text.len();
            text.push_str(&"ж".repeat(*len));
            if *is_match {
                matches.push(Match {
                    start,
                    end: text.len(),
                    lemma: "ж".to_string(),
                    capitalized: false,
                });
            }
            text.push(' ');
        }
        (text, matches)
    }

    proptest! {
        #[test]
        fn window_span_fits_budget(
            words in prop::collection::vec((any::<bool>(), 1usize..12), 1..60),
            max_length in 1usize..80,
        ) {
            let (text, matches) = text_and_matches(&words);
            for range in window_ranges(&text, &matches, max_length) {
                let window = &matches[range];
                prop_assert!(!window.is_empty());
                let span = text[window[0].start..window[window.len() - 1].end].chars().count();
                prop_assert!(window.len() == 1 || span <= max_length);
            }
        }
    }
}
