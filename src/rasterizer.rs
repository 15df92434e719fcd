//! The first-page rasteriser.
//!
//! [`PdfRasterizer`] owns a [`LibraryLoader`] and an [`ObjectUrlStore`] and
//! runs the pipeline in strict order for every call:
//!
//! ```text
//! load library ─▶ read bytes ─▶ parse ─▶ page 1 ─▶ 4× viewport ─▶ surface
//!      ─▶ render ─▶ PNG encode ─▶ named file + blob: URL
//! ```
//!
//! Concurrent calls share the loaded library and nothing else.

use crate::engine::{LibraryLoader, LibrarySource, PdfiumSource};
use crate::error::RasterizeError;
use crate::object_url::ObjectUrlStore;
use crate::output::{ConversionResult, RenderedImage};
use crate::pipeline::render::DocumentInfo;
use crate::pipeline::{encode, input, render};
use crate::upload::{Blob, ImageFile, PdfUpload, PNG_MIME};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Converts the first page of a PDF upload into a PNG.
#[derive(Debug)]
pub struct PdfRasterizer {
    loader: LibraryLoader,
    urls: Arc<ObjectUrlStore>,
}

impl PdfRasterizer {
    /// A rasteriser loading its library from `source`, with its own URL store.
    pub fn new(source: Arc<dyn LibrarySource>) -> Self {
        Self {
            loader: LibraryLoader::new(source),
            urls: Arc::new(ObjectUrlStore::new()),
        }
    }

    /// A rasteriser backed by pdfium.
    pub fn pdfium() -> Self {
        Self::new(Arc::new(PdfiumSource))
    }

    /// Allocate URLs from `urls` instead of a private store.
    pub fn with_url_store(mut self, urls: Arc<ObjectUrlStore>) -> Self {
        self.urls = urls;
        self
    }

    pub fn loader(&self) -> &LibraryLoader {
        &self.loader
    }

    pub fn url_store(&self) -> &Arc<ObjectUrlStore> {
        &self.urls
    }

    /// Rasterise page 1 of `upload`. Never fails: errors come back as a
    /// failure [`ConversionResult`].
    pub async fn rasterize_first_page(&self, upload: &PdfUpload) -> ConversionResult {
        match self.try_rasterize_first_page(upload).await {
            Ok(image) => ConversionResult::success(image),
            Err(e) => {
                error!("Conversion of '{}' failed: {}", upload.name(), e);
                ConversionResult::failure(e.user_message())
            }
        }
    }

    /// Same pipeline as [`Self::rasterize_first_page`], with a typed error.
    pub async fn try_rasterize_first_page(
        &self,
        upload: &PdfUpload,
    ) -> Result<RenderedImage, RasterizeError> {
        let start = Instant::now();
        info!("Starting conversion: {} ({} bytes)", upload.name(), upload.size());

        // ── Step 1: Library ──────────────────────────────────────────────
        let library = self.loader.ensure_loaded().await?;

        // ── Step 2: Bytes ────────────────────────────────────────────────
        let bytes = input::read_upload(upload).await?;

        // ── Steps 3–7: Parse, page 1, viewport, surface, render ──────────
        let surface = render::render_first_page(library, bytes).await?;

        // ── Step 8: PNG ──────────────────────────────────────────────────
        let png = encode::encode_surface(surface).await?;

        // ── Step 9: Named file + browsable handle ────────────────────────
        let blob = Blob::new(png, PNG_MIME);
        let file = ImageFile::new(upload.png_name(), blob.clone());
        let image_url = self.urls.create(blob);
        debug!("'{}' available at {}", file.name(), image_url);

        info!(
            "Converted '{}' → '{}' ({} bytes) in {}ms",
            upload.name(),
            file.name(),
            file.size(),
            start.elapsed().as_millis()
        );

        Ok(RenderedImage { image_url, file })
    }

    /// Page count and page-1 geometry without rendering.
    pub async fn inspect(&self, upload: &PdfUpload) -> Result<DocumentInfo, RasterizeError> {
        let library = self.loader.ensure_loaded().await?;
        let bytes = input::read_upload(upload).await?;
        render::inspect_document(library, bytes).await
    }

    /// Release a URL returned in a [`ConversionResult`].
    pub fn revoke_url(&self, url: &str) -> bool {
        self.urls.revoke(url)
    }
}

static DEFAULT_RASTERIZER: Lazy<PdfRasterizer> = Lazy::new(PdfRasterizer::pdfium);

/// The process-wide pdfium rasteriser.
pub fn default_rasterizer() -> &'static PdfRasterizer {
    &DEFAULT_RASTERIZER
}

/// Rasterise page 1 of `upload` with the process-wide pdfium rasteriser.
///
/// # Example
/// ```rust,no_run
/// use resume_pdf2img::{rasterize_first_page, PdfUpload};
///
/// # #[tokio::main]
/// # async fn main() -> std::io::Result<()> {
/// let upload = PdfUpload::open("resume.pdf").await?;
/// let result = rasterize_first_page(&upload).await;
/// match result.file() {
///     Some(file) => println!("{} → {}", file.name(), result.image_url()),
///     None => eprintln!("{}", result.error().unwrap_or_default()),
/// }
/// # Ok(())
/// # }
/// ```
pub async fn rasterize_first_page(upload: &PdfUpload) -> ConversionResult {
    DEFAULT_RASTERIZER.rasterize_first_page(upload).await
}
