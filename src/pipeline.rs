use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::generator::CloneGenerator;
use crate::scraper::ContentExtractor;
use crate::store::{CloneRecord, CloneStore};
use crate::validator;

/// Default ceiling on the UTF-8 size of a generated clone.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1_000_000;

#[derive(Debug, Clone, Serialize)]
pub struct ClonedPage {
    #[serde(flatten)]
    pub record: CloneRecord,
    pub html: String,
}

/// validate → extract → generate → size gate → save.
pub struct ClonePipeline {
    extractor: ContentExtractor,
    generator: CloneGenerator,
    store: CloneStore,
    max_output_bytes: usize,
}

impl ClonePipeline {
    pub fn new(extractor: ContentExtractor, generator: CloneGenerator, store: CloneStore) -> Self {
        Self {
            extractor,
            generator,
            store,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    pub fn store(&self) -> &CloneStore {
        &self.store
    }

    pub async fn clone_site(&self, url: &str) -> Result<ClonedPage> {
        let url = url.trim();
        if !validator::validate(url) {
            warn!("Rejected unsafe URL: {}", url);
            return Err(AppError::ValidationError(url.to_string()));
        }

        let page = self.extractor.extract(url).await?;
        let result = self.generator.generate(&page, false, false).await?;

        let size = result.html.len();
        if size > self.max_output_bytes {
            warn!("Generated clone of {} is {} bytes, over the {} byte limit", url, size, self.max_output_bytes);
            return Err(AppError::OversizeError {
                size,
                limit: self.max_output_bytes,
            });
        }

        let record = self.store.save(url, &result.html).await?;
        info!("Cloned {} into {} ({} bytes)", url, record.filename, size);

        Ok(ClonedPage {
            record,
            html: result.html,
        })
    }
}
