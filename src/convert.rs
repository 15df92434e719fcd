//! Batch, file-output and blocking entry points built on [`PdfRasterizer`].
//!
//! [`PdfRasterizer::rasterize_first_page`] handles one upload and never
//! fails. The helpers here are for hosts that process many uploads at once,
//! want PNG files on disk, or are not async.

use crate::config::RasterizeConfig;
use crate::error::Pdf2ImgError;
use crate::output::{BatchOutput, BatchStats, ConversionResult, FileResult};
use crate::pipeline::render::DocumentInfo;
use crate::rasterizer::PdfRasterizer;
use crate::upload::{ImageFile, PdfUpload};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Rasterise the first page of every upload, at most `config.concurrency`
/// at a time.
///
/// Results come back in input order. All uploads share the rasteriser's
/// library, so the library is loaded once for the whole batch.
pub async fn rasterize_many(
    rasterizer: &PdfRasterizer,
    uploads: &[PdfUpload],
    config: &RasterizeConfig,
) -> BatchOutput {
    let total_start = Instant::now();
    let total = uploads.len();
    info!(
        "Starting batch: {} files, concurrency {}",
        total, config.concurrency
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut files: Vec<FileResult> = stream::iter(uploads.iter().enumerate().map(
        |(index, upload)| async move {
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_start(index, total, upload.name());
            }

            let start = Instant::now();
            let result = rasterizer.rasterize_first_page(upload).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            if let Some(ref cb) = config.progress_callback {
                match (result.file(), result.error()) {
                    (Some(file), _) => {
                        cb.on_file_complete(index, total, upload.name(), file.bytes().len())
                    }
                    (None, error) => {
                        cb.on_file_error(index, total, upload.name(), error.unwrap_or_default())
                    }
                }
            }

            FileResult {
                index,
                source_name: upload.name().to_string(),
                result,
                duration_ms,
            }
        },
    ))
    .buffer_unordered(config.concurrency.max(1))
    .collect()
    .await;

    // Sort by input position for consistent output
    files.sort_by_key(|f| f.index);

    let succeeded = files.iter().filter(|f| f.result.is_success()).count();
    let stats = BatchStats {
        total_files: total,
        succeeded,
        failed: total - succeeded,
        total_png_bytes: files
            .iter()
            .filter_map(|f| f.result.file())
            .map(ImageFile::size)
            .sum(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Batch complete: {}/{} files, {}ms total",
        stats.succeeded, stats.total_files, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }

    BatchOutput { files, stats }
}

/// Rasterise one upload and write the PNG to `output_path`.
///
/// Uses atomic write (temp file in the target directory + rename) to
/// prevent partial files.
pub async fn rasterize_to_file(
    rasterizer: &PdfRasterizer,
    upload: &PdfUpload,
    output_path: impl AsRef<Path>,
) -> Result<ImageFile, Pdf2ImgError> {
    let rendered = rasterizer
        .rasterize_first_page(upload)
        .await
        .into_result(upload.name())?;

    // The caller gets the file, not the URL.
    rasterizer.revoke_url(&rendered.image_url);

    write_png(output_path.as_ref(), &rendered.file).await?;
    Ok(rendered.file)
}

/// Where the PNG for `upload` lands: `output_dir` if set, otherwise next to
/// the input (or the current directory for in-memory uploads).
pub fn output_path_for(upload: &PdfUpload, output_dir: Option<&Path>) -> PathBuf {
    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => upload
            .path()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    dir.join(upload.png_name())
}

/// Write `file`'s bytes to `path` atomically.
pub async fn write_png(path: &Path, file: &ImageFile) -> Result<(), Pdf2ImgError> {
    let path_buf = path.to_path_buf();
    let bytes = file.bytes().to_vec();

    tokio::task::spawn_blocking(move || write_atomic(&path_buf, &bytes))
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Write task panicked: {}", e)))??;

    debug!("Wrote {} ({} bytes)", path.display(), file.size());
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Pdf2ImgError> {
    let write_failed = |source: std::io::Error| Pdf2ImgError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_failed)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_failed)?;
    tmp.write_all(bytes).map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;
    Ok(())
}

/// Blocking wrapper around [`PdfRasterizer::rasterize_first_page`].
///
/// Creates a temporary tokio runtime internally, so it must not be called
/// from inside an async context. Pass [`crate::default_rasterizer()`] to use the
/// process-wide pdfium rasteriser.
pub fn rasterize_sync(
    rasterizer: &PdfRasterizer,
    upload: &PdfUpload,
) -> Result<ConversionResult, Pdf2ImgError> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2ImgError::Internal(format!("Failed to create tokio runtime: {}", e)))?;
    Ok(runtime.block_on(rasterizer.rasterize_first_page(upload)))
}

/// Page count and page-1 geometry of a PDF on disk.
///
/// Loads the rendering library but renders nothing.
pub async fn inspect(
    rasterizer: &PdfRasterizer,
    path: impl AsRef<Path>,
) -> Result<DocumentInfo, Pdf2ImgError> {
    let path = path.as_ref();
    let upload = PdfUpload::open(path)
        .await
        .map_err(|e| Pdf2ImgError::from_input_io(path.to_path_buf(), &e))?;

    rasterizer
        .inspect(&upload)
        .await
        .map_err(|e| Pdf2ImgError::ConversionFailed {
            name: upload.name().to_string(),
            message: e.user_message(),
        })
}
