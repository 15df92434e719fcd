//! Result types returned by the rasteriser and the batch driver.

use crate::error::{Pdf2ImgError, RasterizeError};
use crate::upload::ImageFile;
use serde::Serialize;

/// A successful rasterisation: the PNG and a browsable URL to the same bytes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedImage {
    pub image_url: String,
    pub file: ImageFile,
}

/// Outcome of [`crate::PdfRasterizer::rasterize_first_page`].
///
/// Either `file` is present and `image_url` is non-empty, or `file` is
/// absent, `image_url` is empty and `error` holds the cause. The fields are
/// private so no other combination can be built.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    image_url: String,
    file: Option<ImageFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ConversionResult {
    pub fn success(image: RenderedImage) -> Self {
        Self {
            image_url: image.image_url,
            file: Some(image.file),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            image_url: String::new(),
            file: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.file.is_some()
    }

    /// Browsable handle; empty on failure.
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn file(&self) -> Option<&ImageFile> {
        self.file.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Turn a failure into [`Pdf2ImgError::ConversionFailed`].
    ///
    /// `name` identifies the upload in the error.
    pub fn into_result(self, name: &str) -> Result<RenderedImage, Pdf2ImgError> {
        match (self.file, self.error) {
            (Some(file), _) => Ok(RenderedImage {
                image_url: self.image_url,
                file,
            }),
            (None, error) => Err(Pdf2ImgError::ConversionFailed {
                name: name.to_string(),
                message: error.unwrap_or_default(),
            }),
        }
    }
}

impl From<Result<RenderedImage, RasterizeError>> for ConversionResult {
    fn from(result: Result<RenderedImage, RasterizeError>) -> Self {
        match result {
            Ok(image) => Self::success(image),
            Err(e) => Self::failure(e.user_message()),
        }
    }
}

/// One upload's outcome inside a batch.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    /// 0-based position of the upload in the batch.
    pub index: usize,
    /// Name of the upload.
    pub source_name: String,
    pub result: ConversionResult,
    pub duration_ms: u64,
}

/// Aggregate counters for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total_files: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Sum of encoded PNG sizes.
    pub total_png_bytes: u64,
    pub total_duration_ms: u64,
}

/// Everything [`crate::convert::rasterize_many`] produced, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutput {
    pub files: Vec<FileResult>,
    pub stats: BatchStats,
}

impl BatchOutput {
    /// True when every upload converted.
    pub fn all_succeeded(&self) -> bool {
        self.stats.failed == 0
    }
}
