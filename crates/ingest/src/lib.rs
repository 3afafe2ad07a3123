pub mod article_scraper;
pub mod ticker_directory;

pub use article_scraper::ArticleScraper;
pub use ticker_directory::TickerDirectory;
