//! Error types for the resume-pdf2img library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`RasterizeError`]: a single rasterisation call failed (library not
//!   loaded, bytes not a PDF, render or encode failure). It never escapes
//!   [`crate::PdfRasterizer::rasterize_first_page`]; the boundary turns it
//!   into a [`crate::ConversionResult`] failure carrying
//!   [`RasterizeError::user_message`].
//!
//! * [`Pdf2ImgError`]: **Fatal** for the batch, file-output and CLI
//!   entry points (bad configuration, unreadable input path, output write
//!   failure).
//!
//! [`LoadError`] is split out because one failed library load is shared by
//! every caller that was waiting on it, so it must be `Clone`.

use std::path::PathBuf;
use thiserror::Error;

/// Prefix applied to every surfaced failure except [`RasterizeError::Encode`].
pub const CONVERT_FAILURE_PREFIX: &str = "Failed to convert PDF";

/// Literal message for a surface that produced no PNG bytes.
pub const BLOB_FAILURE_MESSAGE: &str = "Failed to create image blob";

/// The rendering library could not be initialised.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// `pdfium-render` could not bind to the platform library.
    #[error("Failed to bind to pdfium library at '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },

    /// Neither the bundled location nor the system search path has pdfium.
    #[error("pdfium library not found in '{dir}' or on the system library path: {reason}")]
    NotFound { dir: PathBuf, reason: String },

    /// The import task itself died before producing a library.
    #[error("Library import task failed: {0}")]
    ImportAborted(String),

    /// Any other import failure reported by a [`crate::engine::LibrarySource`].
    #[error("{0}")]
    Unavailable(String),
}

/// Failure of one first-page rasterisation.
#[derive(Debug, Error)]
pub enum RasterizeError {
    /// Step 1: the rendering library failed to initialise.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Step 2: the upload's bytes could not be read.
    #[error("Failed to read '{name}': {detail}")]
    Read { name: String, detail: String },

    /// Step 3: the bytes are not a parsable PDF.
    #[error("Invalid PDF structure: {detail}")]
    Parse { detail: String },

    /// Step 4: the requested page does not exist.
    #[error("Invalid page request: page {page} of {total}")]
    PageNotFound { page: u16, total: u16 },

    /// Step 7: the library failed mid-render.
    #[error("Rendering failed: {detail}")]
    Render { detail: String },

    /// Step 8: the surface produced no PNG bytes.
    #[error("{}", BLOB_FAILURE_MESSAGE)]
    Encode,
}

impl RasterizeError {
    /// The message surfaced in [`crate::ConversionResult::error`].
    ///
    /// Every variant is prefixed with `"Failed to convert PDF: "` except
    /// [`RasterizeError::Encode`], which is the bare literal
    /// `"Failed to create image blob"`. Existing callers match on both forms,
    /// so the two shapes are kept apart rather than unified.
    pub fn user_message(&self) -> String {
        match self {
            RasterizeError::Encode => BLOB_FAILURE_MESSAGE.to_string(),
            other => format!("{CONVERT_FAILURE_PREFIX}: {other}"),
        }
    }

    /// True for the errors a parser raises (bad bytes, missing page).
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            RasterizeError::Parse { .. } | RasterizeError::PageNotFound { .. }
        )
    }
}

/// All fatal errors returned by the batch, file-output and CLI entry points.
#[derive(Debug, Error)]
pub enum Pdf2ImgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The rasteriser returned a failure result.
    #[error("{message}")]
    ConversionFailed { name: String, message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PNG file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2ImgError {
    /// Classify an I/O error raised while opening an input path.
    pub fn from_input_io(path: PathBuf, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Pdf2ImgError::PermissionDenied { path },
            _ => Pdf2ImgError::FileNotFound { path },
        }
    }
}
