//! VLM interaction: send one page image, get its Markdown back.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 responses are transient under load. Retries back off
//! exponentially (`retry_backoff_ms * 2^attempt`): with the defaults the waits
//! are 500 ms → 1 s → 2 s.

use crate::config::VisionSettings;
use crate::error::PageError;
use crate::prompts::PAGE_SYSTEM_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Convert a single rasterised page into Markdown via the VLM.
///
/// The request is the system prompt followed by a user turn carrying only
/// the page image; the image holds all the content.
pub async fn process_page(
    provider: &Arc<dyn LLMProvider>,
    page_num: usize,
    image_data: ImageData,
    settings: &VisionSettings,
) -> Result<String, PageError> {
    let start = Instant::now();
    let messages = vec![
        ChatMessage::system(PAGE_SYSTEM_PROMPT),
        ChatMessage::user_with_images("", vec![image_data]),
    ];
    let options = build_options(settings);

    let mut last_err = String::from("Unknown error");

    for attempt in 0..=settings.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(settings.retry_backoff_ms, attempt);
            warn!(
                "Page {}: retry {}/{} after {}ms",
                page_num, attempt, settings.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                debug!(
                    "Page {}: {} input tokens, {} output tokens, {:?}",
                    page_num,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                return Ok(response.content);
            }
            Err(e) => {
                last_err = e.to_string();
                warn!("Page {}: attempt {} failed: {}", page_num, attempt + 1, last_err);
            }
        }
    }

    Err(PageError::LlmFailed {
        page: page_num,
        retries: settings.max_retries,
        detail: last_err,
    })
}

/// Delay before retry number `attempt` (1-based).
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

fn build_options(settings: &VisionSettings) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(settings.temperature),
        max_tokens: Some(settings.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let opts = build_options(&VisionSettings::default());
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(4096));
    }

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 2), 1000);
        assert_eq!(backoff_ms(500, 3), 2000);
        assert_eq!(backoff_ms(u64::MAX, 5), u64::MAX);
    }
}
