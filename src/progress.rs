//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::RasterizeConfigBuilder::progress_callback`] to receive
//! events as [`crate::convert::rasterize_many`] works through its uploads.
//!
//! # Example
//!
//! ```rust
//! use resume_pdf2img::{BatchProgressCallback, RasterizeConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, name: &str, png_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {name}: {png_len} bytes", index + 1, total);
//!     }
//! }
//!
//! let config = RasterizeConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch driver as it processes each upload.
///
/// Files are rasterised concurrently, so `on_file_*` may be called from
/// different tasks at once. All methods default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any file is started.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a file's first page is rasterised.
    ///
    /// `index` is the 0-based position of the upload in the batch.
    fn on_file_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when a file was rasterised; `png_len` is the encoded size.
    fn on_file_complete(&self, index: usize, total: usize, name: &str, png_len: usize) {
        let _ = (index, total, name, png_len);
    }

    /// Called when a file failed; `error` is the surfaced failure message.
    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RasterizeConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
