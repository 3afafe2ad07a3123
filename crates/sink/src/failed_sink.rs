use std::path::PathBuf;

use newsflow_core::Article;
use tracing::warn;

/// Pluggability point for articles that survive every retry and still
/// can't be persisted. Production simply drops them (`NoopFailedArticleSink`);
/// a file-backed implementation is provided for local debugging.
pub trait FailedArticleSink: Send + Sync {
    fn store(&self, article: &Article);
}

#[derive(Default)]
pub struct NoopFailedArticleSink;

impl FailedArticleSink for NoopFailedArticleSink {
    fn store(&self, article: &Article) {
        warn!(uuid = %article.uuid, "dropping undeliverable article");
    }
}

pub struct FileFailedArticleSink {
    path: PathBuf,
}

impl FileFailedArticleSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl FailedArticleSink for FileFailedArticleSink {
    fn store(&self, article: &Article) {
        let line = match serde_json::to_string(article) {
            Ok(json) => json,
            Err(e) => {
                warn!(uuid = %article.uuid, error = %e, "failed to serialize article for dead-letter file");
                return;
            }
        };

        if let Err(e) = append_line(&self.path, &line) {
            warn!(uuid = %article.uuid, error = %e, "failed to write article to dead-letter file");
        }
    }
}

fn append_line(path: &PathBuf, line: &str) -> std::io::Result<()> {
    use std::io::Write;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{}", line)
}
