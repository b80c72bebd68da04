//! Markup-query capability over scraped documents

use scraper::{Html, Selector};
use tracing::warn;

/// Compile a CSS selector. An invalid selector is logged and yields `None`.
pub fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(selector = %css, error = %e, "Invalid markup selector");
            None
        }
    }
}

/// A parsed document. Not `Send`; parse and query it between awaits.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Rendered, whitespace-collapsed text of every node matching `selector`,
    /// lazily and in document order
    pub fn texts<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = String> + 'a {
        self.html
            .select(selector)
            .map(|node| collapse_whitespace(&node.text().collect::<Vec<_>>().join(" ")))
    }

    /// First matching node with non-empty text
    pub fn first_text(&self, selector: &Selector) -> Option<String> {
        self.texts(selector).find(|t| !t.is_empty())
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <h1>  </h1>
          <h1> Tata   Consultancy
               Services Ltd </h1>
          <ul id="ratios">
            <li><span>Market Cap</span> <span>12,40,000</span> Cr.</li>
            <li><span>ROE</span><span>51.5</span> %</li>
          </ul>
        </body></html>
    "#;

    #[test]
    fn test_texts_in_document_order() {
        let doc = Document::parse(PAGE);
        let items = selector("#ratios li").unwrap();
        let texts: Vec<String> = doc.texts(&items).collect();
        assert_eq!(texts, vec!["Market Cap 12,40,000 Cr.", "ROE 51.5 %"]);
    }

    #[test]
    fn test_texts_iterate_on_demand() {
        let doc = Document::parse(PAGE);
        let items = selector("li").unwrap();
        let mut texts = doc.texts(&items);

        assert_eq!(texts.next().as_deref(), Some("Market Cap 12,40,000 Cr."));
        assert_eq!(texts.next().as_deref(), Some("ROE 51.5 %"));
        assert!(texts.next().is_none());
    }

    #[test]
    fn test_first_non_empty_text() {
        let doc = Document::parse(PAGE);
        assert_eq!(
            doc.first_text(&selector("h1").unwrap()).as_deref(),
            Some("Tata Consultancy Services Ltd")
        );
    }

    #[test]
    fn test_invalid_selector_is_none() {
        assert!(selector("li[").is_none());

        let doc = Document::parse(PAGE);
        assert!(doc.first_text(&selector("table").unwrap()).is_none());
    }
}
