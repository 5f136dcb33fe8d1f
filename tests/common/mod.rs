#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use site_cloner::config::ScrapeConfig;
use site_cloner::generator::CloneGenerator;
use site_cloner::llm::{LlmError, TextGenerator};
use site_cloner::pipeline::ClonePipeline;
use site_cloner::scraper::{ContentExtractor, DocumentFetcher, FetchError};
use site_cloner::store::CloneStore;
use tempfile::TempDir;
use url::Url;

pub const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><style>h1 { color: navy; }</style></head>
<body>
  <header><h1>Acme</h1><img src="/hero.jpg" width="800" height="400"></header>
  <main><p>Welcome to Acme.</p></main>
</body>
</html>"#;

/// Fails the first `failures` fetches, then serves `PAGE` for every URL.
pub struct StaticFetcher {
    failures: usize,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            failures,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for StaticFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(FetchError::Http(format!("connection reset by {}", url)));
        }
        Ok(PAGE.to_string())
    }
}

/// Replays scripted answers in order and records the prompts it was given.
pub struct ScriptedGenerator {
    answers: Mutex<Vec<Result<String, LlmError>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(mut answers: Vec<Result<String, LlmError>>) -> Arc<Self> {
        answers.reverse();
        Arc::new(Self {
            answers: Mutex::new(answers),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(LlmError::new("no scripted answer left")))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub fetcher: Arc<StaticFetcher>,
    pub generator: Arc<ScriptedGenerator>,
    pub pipeline: ClonePipeline,
}

pub async fn harness(fetch_failures: usize, answers: Vec<Result<String, LlmError>>) -> Harness {
    let dir = TempDir::new().unwrap();
    let fetcher = StaticFetcher::new(fetch_failures);
    let generator = ScriptedGenerator::new(answers);

    let config = ScrapeConfig {
        backoff: Duration::ZERO,
        error_log: dir.path().join("scrape_errors.log"),
        ..ScrapeConfig::default()
    };
    let extractor = ContentExtractor::new(fetcher.clone(), config);
    let store = CloneStore::open(dir.path().join("clones")).await.unwrap();
    let pipeline = ClonePipeline::new(extractor, CloneGenerator::new(generator.clone()), store);

    Harness {
        dir,
        fetcher,
        generator,
        pipeline,
    }
}
