use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Append-only, line-oriented record of failed scrape attempts.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `[timestamp] Attempt N failed for <url>: <message>`.
    ///
    /// Logging failures are reported through tracing and otherwise ignored.
    pub async fn record_attempt(&self, attempt: u32, url: &str, message: &str) {
        let line = format!(
            "[{}] Attempt {} failed for {}: {}\n",
            Utc::now().to_rfc3339(),
            attempt,
            url,
            message.replace('\n', " ")
        );

        let result = async {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(line.as_bytes()).await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!("Could not write to error log {}: {}", self.path.display(), e);
        }
    }
}
