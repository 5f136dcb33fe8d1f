use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Durable metadata for one stored clone. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneRecord {
    pub id: Uuid,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub filename: String,
}

/// Directory of `{id}.html` bodies with `{id}.json` metadata sidecars.
#[derive(Debug, Clone)]
pub struct CloneStore {
    dir: PathBuf,
}

impl CloneStore {
    /// Opens the store, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the body first and the metadata second, so a crash in between
    /// leaves an orphan body that `list` never sees.
    pub async fn save(&self, url: &str, html: &str) -> Result<CloneRecord> {
        let id = Uuid::new_v4();
        let record = CloneRecord {
            id,
            url: url.to_string(),
            timestamp: Utc::now(),
            filename: format!("{}.html", id),
        };

        fs::write(self.dir.join(&record.filename), html).await?;
        let metadata = serde_json::to_vec_pretty(&record)?;
        fs::write(self.dir.join(format!("{}.json", id)), metadata).await?;

        info!("Saved clone {} of {}", record.filename, url);
        Ok(record)
    }

    /// All records with readable metadata, newest first.
    pub async fn list(&self) -> Result<Vec<CloneRecord>> {
        let mut records = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let parsed = fs::read(&path)
                .await
                .map_err(AppError::from)
                .and_then(|bytes| serde_json::from_slice::<CloneRecord>(&bytes).map_err(AppError::from));
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable metadata {}: {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        debug!("Listed {} clones", records.len());
        Ok(records)
    }

    /// Reads a stored body. Only `<uuid>.html` names are accepted.
    pub async fn read(&self, filename: &str) -> Result<String> {
        if !is_clone_filename(filename) {
            return Err(AppError::NotFoundError(filename.to_string()));
        }

        match fs::read_to_string(self.dir.join(filename)).await {
            Ok(html) => Ok(html),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFoundError(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn is_clone_filename(filename: &str) -> bool {
    filename
        .strip_suffix(".html")
        .is_some_and(|stem| Uuid::parse_str(stem).is_ok())
}
