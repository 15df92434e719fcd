//! # resume-pdf2img
//!
//! Turn the first page of an uploaded PDF résumé into a high-resolution PNG.
//!
//! ## Why this crate?
//!
//! Résumé screening tools want an image of the document: OCR engines and
//! vision models read pixels, and a thumbnail is what a reviewer sees first.
//! This crate renders page 1 of a PDF at 4× its native point size with
//! pdfium, encodes it losslessly and hands back both a named PNG file and a
//! browsable `blob:` URL to the same bytes.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PdfUpload
//!  │
//!  ├─ 1. Load    bind pdfium once per process (single-flight, retried on failure)
//!  ├─ 2. Input   read the upload's bytes
//!  ├─ 3. Render  parse, take page 1, draw at 4× onto an RGBA surface (spawn_blocking)
//!  ├─ 4. Encode  lossless PNG
//!  └─ 5. Output  ImageFile "<name>.png" + blob: URL, or an error message
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume_pdf2img::{rasterize_first_page, PdfUpload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let upload = PdfUpload::open("resume.pdf").await?;
//!     let result = rasterize_first_page(&upload).await;
//!     match result.file() {
//!         Some(file) => println!("{} ({} bytes) at {}", file.name(), file.size(), result.image_url()),
//!         None => eprintln!("{}", result.error().unwrap_or_default()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Output names come from the input name:
//!
//! ```rust
//! use resume_pdf2img::upload::png_file_name;
//!
//! assert_eq!(png_file_name("Jane_Doe.PDF"), "Jane_Doe.png");
//! assert_eq!(png_file_name("resume"), "resume.png");
//! ```
//!
//! ## Batches
//!
//! ```rust,no_run
//! use resume_pdf2img::{default_rasterizer, rasterize_many, PdfUpload, RasterizeConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let uploads = vec![
//!     PdfUpload::open("a.pdf").await?,
//!     PdfUpload::open("b.pdf").await?,
//! ];
//! let config = RasterizeConfig::builder().concurrency(2).build()?;
//! let batch = rasterize_many(default_rasterizer(), &uploads, &config).await;
//! eprintln!("{}/{} converted", batch.stats.succeeded, batch.stats.total_files);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2img` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! resume-pdf2img = { version = "0.1", default-features = false }
//! ```
//!
//! ## The pdfium library
//!
//! pdfium is looked up in [`PDFIUM_LIBRARY_DIR`] first and then on the
//! system library path. It is bound on first use, not at startup.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod object_url;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod rasterizer;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    RasterizeConfig, RasterizeConfigBuilder, MAX_SURFACE_BYTES, PDFIUM_LIBRARY_DIR, RENDER_SCALE,
};
pub use convert::{inspect, output_path_for, rasterize_many, rasterize_sync, rasterize_to_file};
pub use engine::{
    DocumentHandle, LibraryLoader, LibrarySource, PageHandle, PageSize, RasterSurface,
    RenderLibrary, Smoothing, Viewport,
};
pub use error::{LoadError, Pdf2ImgError, RasterizeError};
pub use object_url::ObjectUrlStore;
pub use output::{BatchOutput, BatchStats, ConversionResult, FileResult, RenderedImage};
pub use pipeline::render::DocumentInfo;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use rasterizer::{default_rasterizer, rasterize_first_page, PdfRasterizer};
pub use upload::{Blob, ImageFile, PdfUpload};
