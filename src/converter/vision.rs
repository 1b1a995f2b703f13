//! Vision backend: rasterise each page and let a vision LLM read it.
//!
//! Slower and paid, but handles scans, multi-column layouts and complex
//! tables that the text layer gets wrong. Pages are processed concurrently
//! (`VisionSettings::concurrency`); a page that fails after all retries is
//! left out with a warning, and the document fails only if every page does.

use super::{document_names, Converter};
use crate::config::VisionSettings;
use crate::error::{PageError, Pdf2MdError};
use crate::markdown::{render_document, PageContent};
use crate::pipeline::{encode, input, llm, pdfium, postprocess, render};
use async_trait::async_trait;
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Converter backed by a vision LLM.
pub struct VisionConverter {
    settings: VisionSettings,
    /// Resolved on first use, then reused for every later document.
    provider: OnceCell<Arc<dyn LLMProvider>>,
}

impl std::fmt::Debug for VisionConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionConverter")
            .field("settings", &self.settings)
            .field("provider_ready", &self.provider.initialized())
            .finish()
    }
}

impl VisionConverter {
    /// # Errors
    /// [`Pdf2MdError::BackendUnavailable`] when pdfium cannot be bound.
    pub fn new(settings: VisionSettings) -> Result<Self, Pdf2MdError> {
        pdfium::ensure_available("vision")?;
        Ok(Self {
            settings,
            provider: OnceCell::new(),
        })
    }

    async fn provider(&self) -> Result<&Arc<dyn LLMProvider>, Pdf2MdError> {
        self.provider
            .get_or_try_init(|| async {
                debug!("Resolving vision provider (first use)");
                let provider = resolve_provider(&self.settings)?;
                info!("Vision provider ready");
                Ok(provider)
            })
            .await
    }

    async fn process_pages(
        &self,
        provider: &Arc<dyn LLMProvider>,
        pages: Vec<(usize, edgequake_llm::ImageData)>,
    ) -> Vec<(usize, Result<String, PageError>)> {
        stream::iter(pages.into_iter().map(|(idx, image)| {
            let provider = Arc::clone(provider);
            let settings = &self.settings;
            async move {
                let page_num = idx + 1;
                let result = llm::process_page(&provider, page_num, image, settings).await;
                (page_num, result)
            }
        }))
        .buffer_unordered(self.settings.concurrency)
        .collect()
        .await
    }
}

#[async_trait]
impl Converter for VisionConverter {
    fn name(&self) -> &str {
        "vision"
    }

    async fn convert(&self, path: &Path) -> Result<String, Pdf2MdError> {
        let (title, file_name) = document_names(path);
        info!("Converting {} using vision model", file_name);

        input::check_pdf(path)?;
        let provider = self.provider().await?;

        let rendered = render::render_pages(path, &self.settings).await?;
        let total = rendered.len();

        let mut failures: Vec<PageError> = Vec::new();
        let mut encoded = Vec::with_capacity(total);
        for (idx, image) in &rendered {
            match encode::encode_page(idx + 1, image) {
                Ok(data) => encoded.push((*idx, data)),
                Err(e) => failures.push(e),
            }
        }
        drop(rendered);

        let mut pages: Vec<PageContent> = Vec::with_capacity(total);
        for (number, result) in self.process_pages(provider, encoded).await {
            match result {
                Ok(markdown) => pages.push(PageContent {
                    number,
                    text: postprocess::clean_page(&markdown),
                    tables: Vec::new(),
                }),
                Err(e) => failures.push(e),
            }
        }
        pages.sort_by_key(|p| p.number);

        if pages.is_empty() && total > 0 {
            let first = failures
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(Pdf2MdError::ConversionFailed {
                path: path.to_path_buf(),
                detail: format!("all {total} pages failed; first error: {first}"),
            });
        }
        for failure in &failures {
            warn!("{}: {}", file_name, failure);
        }

        info!(
            "Successfully converted {}/{} pages of {}",
            pages.len(),
            total,
            file_name
        );
        Ok(render_document(&title, &file_name, &pages))
    }
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Named provider** (`vision.provider`) with `vision.model` or
///    `gpt-4.1-nano`.
/// 2. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 3. **OpenAI** when `OPENAI_API_KEY` is set.
/// 4. **Full auto-detection** via `ProviderFactory::from_env`.
fn resolve_provider(settings: &VisionSettings) -> Result<Arc<dyn LLMProvider>, Pdf2MdError> {
    let model = settings.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = settings.provider {
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_vision_provider(&prov, &env_model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_vision_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2MdError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY or ANTHROPIC_API_KEY, or set [vision] provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, Pdf2MdError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2MdError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
