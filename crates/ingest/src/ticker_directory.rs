use std::collections::HashMap;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::warn;

use newsflow_fetch::HttpFetcher;

static TBODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody").unwrap());
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());

/// Holds the last-known symbol-to-display-name snapshot of the most-active
/// tickers page. Fetches are rate-limited by the caller (the scheduler
/// refreshes this on its own cadence); a failed fetch simply keeps the
/// previous snapshot rather than erroring.
#[derive(Default)]
pub struct TickerDirectory {
    tickers: HashMap<String, String>,
}

impl TickerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.tickers.keys().cloned().collect()
    }

    pub fn snapshot(&self) -> &HashMap<String, String> {
        &self.tickers
    }

    pub async fn refresh(&mut self, fetcher: &HttpFetcher, uri: &str) {
        match fetcher.fetch_text(uri).await {
            Ok(html) => {
                let parsed = parse_ticker_table(&html);
                if parsed.is_empty() {
                    warn!(uri, "ticker table fetch succeeded but no rows parsed");
                } else {
                    self.tickers = parsed;
                }
            }
            Err(e) => {
                warn!(uri, error = %e, "ticker directory refresh failed, keeping previous snapshot");
            }
        }
    }
}

fn parse_ticker_table(html: &str) -> HashMap<String, String> {
    let document = Html::parse_document(html);
    let mut tickers = HashMap::new();

    let Some(tbody) = document.select(&TBODY_SELECTOR).next() else {
        return tickers;
    };

    for row in tbody.select(&ROW_SELECTOR) {
        let cells: Vec<String> = row
            .select(&CELL_SELECTOR)
            .map(|c| c.text().collect::<String>().trim().to_string())
            .collect();
        if let [symbol, name, ..] = cells.as_slice() {
            if !symbol.is_empty() {
                tickers.insert(symbol.clone(), name.clone());
            }
        }
    }

    tickers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_symbol_and_name_from_rows() {
        let html = r#"
            <table><tbody>
              <tr><td>AAPL</td><td>Apple Inc.</td></tr>
              <tr><td>MSFT</td><td>Microsoft Corp.</td></tr>
            </tbody></table>
        "#;
        let tickers = parse_ticker_table(html);
        assert_eq!(tickers.get("AAPL").map(String::as_str), Some("Apple Inc."));
        assert_eq!(tickers.len(), 2);
    }

    #[test]
    fn missing_tbody_yields_empty_map() {
        let html = "<html><body><p>No table here.</p></body></html>";
        assert!(parse_ticker_table(html).is_empty());
    }
}
