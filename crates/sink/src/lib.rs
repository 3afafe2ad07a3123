pub mod data_sink;
pub mod failed_sink;

pub use data_sink::DataSink;
pub use failed_sink::{FailedArticleSink, FileFailedArticleSink, NoopFailedArticleSink};
