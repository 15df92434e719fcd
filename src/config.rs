//! Configuration for batch rasterisation and the fixed render constants.
//!
//! The two values that shape the output image are compile-time constants:
//! [`RENDER_SCALE`] and [`PDFIUM_LIBRARY_DIR`]. Everything that only affects
//! how many files are processed at once, or where they land, lives in
//! [`RasterizeConfig`], built via its [`RasterizeConfigBuilder`].

use crate::error::Pdf2ImgError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Oversampling factor applied to a page's native point size.
///
/// A 612 × 792 pt Letter page becomes a 2448 × 3168 px image. The large
/// factor keeps small resume fonts legible for downstream OCR/analysis.
pub const RENDER_SCALE: f32 = 4.0;

/// Directory searched for the platform pdfium library before the system
/// library path.
pub const PDFIUM_LIBRARY_DIR: &str = "./lib";

/// Largest RGBA surface a page may be rendered onto, in bytes.
///
/// An A0 poster at [`RENDER_SCALE`] needs about 514 MB. Pages whose
/// viewport exceeds this fail with a render error instead of allocating.
pub const MAX_SURFACE_BYTES: u64 = 768 * 1024 * 1024;

/// Page rasterised from every upload (one-based).
pub const FIRST_PAGE: u16 = 1;

/// Configuration for [`crate::convert::rasterize_many`] and the CLI.
///
/// Built via [`RasterizeConfig::builder()`] or using
/// [`RasterizeConfig::default()`].
///
/// # Example
/// ```rust
/// use resume_pdf2img::RasterizeConfig;
///
/// let config = RasterizeConfig::builder()
///     .concurrency(8)
///     .output_dir("out")
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 8);
/// ```
#[derive(Clone)]
pub struct RasterizeConfig {
    /// Number of uploads rasterised at once. Default: 4.
    ///
    /// Rendering at 4× is CPU- and memory-heavy (a Letter page is ~31 MB of
    /// RGBA before encoding), so the default stays well under typical core
    /// counts.
    pub concurrency: usize,

    /// Directory PNG files are written to. `None` writes next to each input.
    pub output_dir: Option<PathBuf>,

    /// Optional per-file progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RasterizeConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            output_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RasterizeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterizeConfig")
            .field("concurrency", &self.concurrency)
            .field("output_dir", &self.output_dir)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl RasterizeConfig {
    /// Create a new builder for `RasterizeConfig`.
    pub fn builder() -> RasterizeConfigBuilder {
        RasterizeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RasterizeConfig`].
#[derive(Debug)]
pub struct RasterizeConfigBuilder {
    config: RasterizeConfig,
}

impl RasterizeConfigBuilder {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RasterizeConfig, Pdf2ImgError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(Pdf2ImgError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if let Some(ref dir) = c.output_dir {
            if dir.as_os_str().is_empty() {
                return Err(Pdf2ImgError::InvalidConfig(
                    "Output directory must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
