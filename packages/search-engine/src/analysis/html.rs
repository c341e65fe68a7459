//! HTML helpers: visible text, titles and outbound links.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose subtree is navigation or page chrome.
const BOILERPLATE_TAGS: [&str; 4] = ["nav", "aside", "header", "footer"];

/// Content blocks considered page text.
const CONTENT_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li";

/// Text a reader sees on a page, split into content blocks in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleText {
    pub title: String,
    pub blocks: Vec<String>,
}

impl VisibleText {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        Self {
            title: extract_title(&document).unwrap_or_default(),
            blocks: content_blocks(&document),
        }
    }

    /// Blocks joined by newlines; snippet boundaries rely on them.
    pub fn snippet_text(&self) -> String {
        self.blocks.join("\n")
    }

    /// Blocks joined by spaces, for lemma counting.
    pub fn lemma_text(&self) -> String {
        self.blocks.join(" ")
    }
}

/// Extract title from HTML document
pub fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;
    document
        .select(&title_selector)
        .next()
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

/// Absolute http(s) targets of `a[href]`, in document order.
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let link_selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return vec![],
    };

    document
        .select(&link_selector)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| {
            !(href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:"))
        })
        .filter_map(|href| base_url.join(href).ok())
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
        .map(String::from)
        .collect()
}

fn content_blocks(document: &Html) -> Vec<String> {
    let selector = match Selector::parse(CONTENT_SELECTOR) {
        Ok(s) => s,
        Err(_) => return vec![],
    };

    document
        .select(&selector)
        .filter(|el| !is_boilerplate(el))
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect()
}

fn is_boilerplate(element: &ElementRef) -> bool {
    if is_menu(element) {
        return true;
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| BOILERPLATE_TAGS.contains(&ancestor.value().name()) || is_menu(&ancestor))
}

fn is_menu(element: &ElementRef) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|class| class.to_lowercase().contains("menu"))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <html>
          <head><title> Кошки   и собаки </title></head>
          <body>
            <header><h1>Шапка сайта</h1></header>
            <nav><ul><li>Главная</li><li>Контакты</li></ul></nav>
            <ul class="main-menu"><li>Меню</li></ul>
            <h1>Кошки</h1>
            <p>Кошка спит на
               диване.</p>
            <ul><li>Первый пункт</li></ul>
            <aside><p>Реклама</p></aside>
            <footer><p>Подвал</p></footer>
            <a href="/about">О нас</a>
            <a href="https://other.test/page?x=1">Другой</a>
            <a href="mailto:cat@example.test">Почта</a>
            <a href="#top">Наверх</a>
          </body>
        </html>
    "##;

    #[test]
    fn test_visible_text_skips_boilerplate() {
        let text = VisibleText::parse(PAGE);

        assert_eq!(text.title, "Кошки и собаки");
        assert_eq!(
            text.blocks,
            vec!["Кошки", "Кошка спит на диване.", "Первый пункт"]
        );
        assert_eq!(text.snippet_text(), "Кошки\nКошка спит на диване.\nПервый пункт");
        assert_eq!(text.lemma_text(), "Кошки Кошка спит на диване. Первый пункт");
    }

    #[test]
    fn test_extract_links_resolves_relative_and_skips_non_http() {
        let document = Html::parse_document(PAGE);
        let base = Url::parse("http://example.test/cats/").unwrap();

        let links = extract_links(&document, &base);

        assert_eq!(
            links,
            vec![
                "http://example.test/about".to_string(),
                "https://other.test/page?x=1".to_string()
            ]
        );
    }

    #[test]
    fn test_missing_title_is_empty() {
        let text = VisibleText::parse("<p>Текст</p>");
        assert!(text.title.is_empty());
        assert_eq!(text.blocks, vec!["Текст"]);
    }
}
