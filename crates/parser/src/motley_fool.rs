use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h2.font-light").unwrap());
static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Follow-page parser for `www.fool.com`, the one publisher the
/// "read more" link in a Yahoo teaser is known to resolve to. Returns the
/// concatenated article body, or `None` if the page doesn't match the
/// expected layout.
pub fn parse_motley_fool_body(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    if document.select(&TITLE_SELECTOR).next().is_none() {
        return None;
    }

    let body = document
        .select(&PARAGRAPH_SELECTOR)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .collect::<Vec<String>>()
        .join(" ");

    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_paragraphs_outside_any_article_wrapper() {
        // fool.com doesn't reliably wrap its body in an <article> element,
        // so paragraphs must be picked up document-wide.
        let html = r#"
            <html><body>
              <h2 class="font-light">A Motley Fool Headline</h2>
              <div class="body-content">
                <p>  First part. </p>
                <p>Second part.</p>
              </div>
            </body></html>
        "#;
        assert_eq!(
            parse_motley_fool_body(html).as_deref(),
            Some("First part. Second part.")
        );
    }

    #[test]
    fn returns_none_without_expected_heading() {
        let html = "<html><body><p>Nothing special.</p></body></html>";
        assert_eq!(parse_motley_fool_body(html), None);
    }
}
