use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ScrapeConfig;
use crate::error::{AppError, Result};
use crate::error_log::ErrorLog;

/// Rule prepended to every collected stylesheet so images never overflow their container.
pub const BASELINE_CSS: &str = "img { max-width: 100%; height: auto; }";

static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("body").expect("Failed to parse body selector")
});

static STYLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("style").expect("Failed to parse style selector")
});

static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("link[rel][href]").expect("Failed to parse link selector")
});

/// Visible markup and styling captured from one successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedPage {
    pub content: String,
    pub styles: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Timeout fetching: {0}")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP {0} for: {1}")]
    Status(u16, String),
}

/// Network capability used by the extractor: GET a URL and return its body as text.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_text(&self, url: &Url) -> std::result::Result<String, FetchError>;
}

/// `DocumentFetcher` backed by a pooled reqwest client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> std::result::Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(10)
            .user_agent("Mozilla/5.0 (compatible; SiteCloner/0.1)")
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &Url) -> std::result::Result<String, FetchError> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16(), url.to_string()));
        }

        response.text().await.map_err(|e| FetchError::Http(e.to_string()))
    }
}

/// Drives the fetch capability with per-attempt timeouts and fixed backoff.
pub struct ContentExtractor {
    fetcher: Arc<dyn DocumentFetcher>,
    config: ScrapeConfig,
    error_log: ErrorLog,
}

impl ContentExtractor {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, config: ScrapeConfig) -> Self {
        let error_log = ErrorLog::new(config.error_log.clone());
        Self {
            fetcher,
            config,
            error_log,
        }
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    /// Fetches `url` up to `max_retries` times. Only exhausting every attempt is fatal.
    pub async fn extract(&self, url: &str) -> Result<ScrapedPage> {
        let target = Url::parse(url).map_err(|e| AppError::ValidationError(format!("{}: {}", url, e)))?;
        let attempts = self.config.max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            debug!("Scrape attempt {}/{} for {}", attempt, attempts, url);

            let message = match tokio::time::timeout(self.config.attempt_timeout, self.scrape_once(&target)).await {
                Ok(Ok(page)) => {
                    info!(
                        "Scraped {} ({} content chars, {} css chars)",
                        url,
                        page.content.len(),
                        page.styles.len()
                    );
                    return Ok(page);
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("timed out after {:?}", self.config.attempt_timeout),
            };

            warn!("Attempt {} failed for {}: {}", attempt, url, message);
            self.error_log.record_attempt(attempt, url, &message).await;
            last_error = message;

            if attempt < attempts {
                tokio::time::sleep(self.config.backoff).await;
            }
        }

        Err(AppError::ScrapeError {
            url: url.to_string(),
            attempts,
            message: last_error,
        })
    }

    async fn scrape_once(&self, url: &Url) -> std::result::Result<ScrapedPage, FetchError> {
        let html = self.fetcher.fetch_text(url).await?;

        let (inline, links) = collect_style_sources(&html, url);
        let linked = self.fetch_stylesheets(&links).await;

        let content = prune_document(&html, url, self.config.max_sections);
        let styles = truncate(&combine_styles(&inline, &linked), self.config.max_css_chars);

        Ok(ScrapedPage { content, styles })
    }

    /// Sheets that fail or overrun their budget are skipped so the attempt survives.
    async fn fetch_stylesheets(&self, links: &[Url]) -> Vec<String> {
        let budget = self.config.stylesheet_timeout.min(self.config.attempt_timeout / 2);

        let fetches = links.iter().map(|link| async move {
            match tokio::time::timeout(budget, self.fetcher.fetch_text(link)).await {
                Ok(Ok(css)) => Some(css),
                Ok(Err(e)) => {
                    warn!("Skipping stylesheet {}: {}", link, e);
                    None
                }
                Err(_) => {
                    warn!("Skipping stylesheet {}: timed out after {:?}", link, budget);
                    None
                }
            }
        });

        join_all(fetches).await.into_iter().flatten().collect()
    }
}

/// Prefix-cut to at most `max_chars` characters.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Returns inline `<style>` bodies and absolute URLs of linked stylesheets.
pub fn collect_style_sources(html: &str, base: &Url) -> (Vec<String>, Vec<Url>) {
    let document = Html::parse_document(html);

    let inline = document
        .select(&STYLE_SELECTOR)
        .map(|el| el.text().collect::<String>())
        .filter(|css| !css.trim().is_empty())
        .collect();

    let mut links: Vec<Url> = Vec::new();
    for el in document.select(&LINK_SELECTOR) {
        let is_stylesheet = el
            .value()
            .attr("rel")
            .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet")));
        if !is_stylesheet {
            continue;
        }
        if let Some(href) = el.value().attr("href")
            && let Ok(absolute) = base.join(href.trim())
            && matches!(absolute.scheme(), "http" | "https")
            && !links.contains(&absolute)
        {
            links.push(absolute);
        }
    }

    (inline, links)
}

/// Baseline rule first, then inline and linked CSS in document order.
pub fn combine_styles(inline: &[String], linked: &[String]) -> String {
    let mut css = String::from(BASELINE_CSS);
    for block in inline.iter().chain(linked.iter()) {
        css.push('\n');
        css.push_str(block.trim());
    }
    css
}

/// Strips noise, absolutizes image sources and keeps only the first `max_sections`
/// top-level body elements. Returns the body markup with blank lines collapsed.
///
/// The section limit matches on an explicit `<body>` start tag while streaming. Pages
/// that omit the tag (valid HTML5) keep every section.
pub fn prune_document(html: &str, base: &Url, max_sections: usize) -> String {
    let rewritten = rewrite_markup(html, base, max_sections);
    let body = extract_body(&rewritten).unwrap_or(rewritten);
    format_html(&body)
}

fn rewrite_markup(html: &str, base: &Url, max_sections: usize) -> String {
    let mut output: Vec<u8> = Vec::with_capacity(html.len());
    let mut sections = 0usize;

    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![
                lol_html::element!("script", |el| {
                    el.remove();
                    Ok(())
                }),
                lol_html::element!("style", |el| {
                    el.remove();
                    Ok(())
                }),
                lol_html::element!("noscript", |el| {
                    el.remove();
                    Ok(())
                }),
                lol_html::element!("body > *", |el| {
                    if matches!(el.tag_name().as_str(), "script" | "style" | "noscript") {
                        return Ok(());
                    }
                    sections += 1;
                    if sections > max_sections {
                        el.remove();
                    }
                    Ok(())
                }),
                lol_html::element!("img[src]", |el| {
                    if let Some(src) = el.get_attribute("src")
                        && !src.trim_start().starts_with("data:")
                        && let Ok(absolute) = base.join(src.trim())
                    {
                        el.set_attribute("src", absolute.as_str()).ok();
                    }
                    Ok(())
                }),
            ],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }
    if rewriter.end().is_err() {
        return html.to_string();
    }

    if output.is_empty() {
        html.to_string()
    } else {
        String::from_utf8_lossy(&output).into_owned()
    }
}

fn extract_body(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    document.select(&BODY_SELECTOR)
        .next()
        .map(|element| element.inner_html())
}

fn format_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());

    for line in html.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(trimmed);
    }

    result
}
