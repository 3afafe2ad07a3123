pub mod extractor;
pub mod motley_fool;

pub use extractor::{ExtractedContent, HtmlExtractor};
