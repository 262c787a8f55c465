//! PDF page rendering and text extraction.
//!
//! Backed by `pdf_oxide`. The document is parsed from a scratch file on a
//! blocking thread, so the parser never stalls the runtime.

use std::io::Write;

use async_trait::async_trait;
use pdf_oxide::rendering::{render_page, RenderOptions};
use pdf_oxide::PdfDocument;

use crate::error::GazetteError;

/// Media type of rendered pages.
pub const PAGE_MEDIA_TYPE: &str = "image/png";

/// Turns an act PDF into page images and plain text.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Number of pages in the document.
    async fn page_count(&self, pdf: &[u8]) -> Result<usize, GazetteError>;

    /// One encoded image per page, in page order.
    async fn render_pages(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>, GazetteError>;

    /// Plain text of the whole document.
    async fn extract_text(&self, pdf: &[u8]) -> Result<String, GazetteError>;
}

/// [`PageRenderer`] backed by the `pdf_oxide` parser and rasteriser.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    resolution: u32,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfRenderer {
    /// Renderer producing PNG pages at 100 dpi.
    #[must_use]
    pub fn new() -> Self {
        Self { resolution: 100 }
    }

    /// Render resolution in dots per inch.
    #[must_use]
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Open `pdf` and run `task` on it off the async runtime.
    async fn with_document<T, F>(pdf: &[u8], task: F) -> Result<T, GazetteError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PdfDocument) -> pdf_oxide::Result<T> + Send + 'static,
    {
        let pdf = pdf.to_vec();
        tokio::task::spawn_blocking(move || -> Result<T, GazetteError> {
            let mut scratch = tempfile::NamedTempFile::new()?;
            scratch.write_all(&pdf)?;
            scratch.flush()?;

            let mut document = PdfDocument::open(scratch.path()).map_err(render_error)?;
            task(&mut document).map_err(render_error)
        })
        .await
        .map_err(|e| GazetteError::Render(format!("PDF task failed: {e}")))?
    }
}

fn render_error(err: pdf_oxide::Error) -> GazetteError {
    GazetteError::Render(err.to_string())
}

#[async_trait]
impl PageRenderer for PdfRenderer {
    async fn page_count(&self, pdf: &[u8]) -> Result<usize, GazetteError> {
        Self::with_document(pdf, |document| document.page_count()).await
    }

    async fn render_pages(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>, GazetteError> {
        let options = RenderOptions::with_dpi(self.resolution);
        let images = Self::with_document(pdf, move |document| {
            let count = document.page_count()?;
            let mut images = Vec::with_capacity(count);
            for page in 0..count {
                images.push(render_page(document, page, &options)?.data);
            }
            Ok(images)
        })
        .await?;

        tracing::debug!(pages = images.len(), "Rendered act pages");
        Ok(images)
    }

    async fn extract_text(&self, pdf: &[u8]) -> Result<String, GazetteError> {
        Self::with_document(pdf, |document| {
            let count = document.page_count()?;
            let mut pages = Vec::with_capacity(count);
            for page in 0..count {
                pages.push(document.extract_text(page)?);
            }
            Ok(pages.join("\n"))
        })
        .await
    }
}
