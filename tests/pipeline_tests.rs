mod common;

use common::harness;
use site_cloner::error::AppError;
use site_cloner::llm::LlmError;

const ANSWER: &str = "Here is the page:\n```html\n<!DOCTYPE html>\n<html><body><h1>Acme</h1><img src=\"https://example.com/hero.jpg\" width=\"800\" height=\"400\"></body></html>\n```";

/// Valid markup of exactly `size` bytes that the sanitizer leaves untouched.
fn html_of_size(size: usize) -> String {
    let prefix = "<html><body>";
    let suffix = "</body></html>";
    let filler_len = size - prefix.len() - suffix.len();
    let mut filler = "x ".repeat(filler_len / 2);
    if filler_len % 2 == 1 {
        filler.push('x');
    }
    format!("{}{}{}", prefix, filler, suffix)
}

fn clone_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn test_clone_end_to_end() {
    let h = harness(0, vec![Ok(ANSWER.to_string())]).await;

    let cloned = h.pipeline.clone_site("https://example.com/").await.unwrap();
    assert!(cloned.html.starts_with("<!DOCTYPE html>"));
    assert!(cloned.html.ends_with("</html>"));
    assert_eq!(cloned.record.url, "https://example.com/");

    let prompt = h.generator.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("Welcome to Acme."));
    assert!(prompt.contains("https://example.com/hero.jpg"));
    assert!(prompt.contains("h1 { color: navy; }"));

    let stored = h.pipeline.store().read(&cloned.record.filename).await.unwrap();
    assert_eq!(stored, cloned.html);
    assert_eq!(h.pipeline.store().list().await.unwrap(), vec![cloned.record]);
}

#[tokio::test]
async fn test_unsafe_url_short_circuits() {
    let h = harness(0, vec![Ok(ANSWER.to_string())]).await;

    let result = h.pipeline.clone_site("http://169.254.169.254/").await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));
    assert_eq!(h.fetcher.calls(), 0);
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn test_fetch_recovers_within_retries() {
    let h = harness(2, vec![Ok(ANSWER.to_string())]).await;

    let cloned = h.pipeline.clone_site("https://example.com/").await;
    assert!(cloned.is_ok());
    assert_eq!(h.fetcher.calls(), 3);

    let log = std::fs::read_to_string(h.dir.path().join("scrape_errors.log")).unwrap();
    let failures = log
        .lines()
        .filter(|line| line.contains("failed for https://example.com/: "))
        .count();
    assert_eq!(failures, 2);
}

#[tokio::test]
async fn test_fetch_exhaustion_is_scrape_error() {
    let h = harness(3, vec![Ok(ANSWER.to_string())]).await;

    let result = h.pipeline.clone_site("https://example.com/").await;
    assert!(matches!(result, Err(AppError::ScrapeError { attempts: 3, .. })));
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn test_oversize_output_is_not_persisted() {
    let h = harness(0, vec![Ok(html_of_size(1_000_001))]).await;

    let result = h.pipeline.clone_site("https://example.com/").await;
    assert!(matches!(
        result,
        Err(AppError::OversizeError { size: 1_000_001, limit: 1_000_000 })
    ));
    assert_eq!(clone_files(h.pipeline.store().dir()), 0);
}

#[tokio::test]
async fn test_output_at_limit_is_saved() {
    let h = harness(0, vec![Ok(html_of_size(1_000_000))]).await;

    let cloned = h.pipeline.clone_site("https://example.com/").await.unwrap();
    assert_eq!(cloned.html.len(), 1_000_000);
    assert_eq!(clone_files(h.pipeline.store().dir()), 2);
}

#[tokio::test]
async fn test_rate_limit_degrades_once() {
    let h = harness(
        0,
        vec![
            Err(LlmError::with_status(429, "Resource has been exhausted")),
            Ok(ANSWER.to_string()),
        ],
    )
    .await;

    let cloned = h.pipeline.clone_site("https://example.com/").await;
    assert!(cloned.is_ok());
    assert_eq!(h.generator.calls(), 2);
}

#[tokio::test]
async fn test_generation_failure_persists_nothing() {
    let h = harness(0, vec![Err(LlmError::with_status(500, "model overloaded"))]).await;

    let result = h.pipeline.clone_site("https://example.com/").await;
    match result {
        Err(AppError::GenerationError(msg)) => assert!(msg.contains("model overloaded")),
        other => panic!("expected GenerationError, got {:?}", other),
    }
    assert_eq!(h.generator.calls(), 1);
    assert_eq!(clone_files(h.pipeline.store().dir()), 0);
}

#[tokio::test]
async fn test_list_after_three_clones() {
    let answers = (0..3).map(|_| Ok(ANSWER.to_string())).collect();
    let h = harness(0, answers).await;

    for path in ["a", "b", "c"] {
        h.pipeline
            .clone_site(&format!("https://example.com/{}", path))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let records = h.pipeline.store().list().await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert_eq!(records[0].url, "https://example.com/c");
}
