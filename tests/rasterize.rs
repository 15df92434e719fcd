//! Integration tests for the first-page rasteriser against a fake library.
//!
//! Run with:
//!   cargo test --test rasterize

mod common;

use common::{fake_pdf, fake_pdf_render_fails, FakeSource};
use resume_pdf2img::object_url::OBJECT_URL_PREFIX;
use resume_pdf2img::upload::PNG_MIME;
use resume_pdf2img::{
    inspect, rasterize_many, rasterize_sync, rasterize_to_file, BatchProgressCallback,
    LibrarySource, Pdf2ImgError, PdfRasterizer, PdfUpload, RasterizeConfig, PDFIUM_LIBRARY_DIR,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn rasterizer(source: &Arc<FakeSource>) -> PdfRasterizer {
    PdfRasterizer::new(Arc::clone(source) as Arc<dyn LibrarySource>)
}

fn letter(name: &str) -> PdfUpload {
    PdfUpload::from_bytes(name, fake_pdf(1, 612.0, 792.0))
}

fn assert_convert_failure(error: Option<&str>) {
    let error = error.expect("failure carries an error");
    assert!(
        error.starts_with("Failed to convert PDF: "),
        "unexpected error: {error}"
    );
}

// ── Success path ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn letter_page_becomes_4x_png() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let result = r.rasterize_first_page(&letter("Jane_Doe.PDF")).await;
    assert!(result.is_success(), "error: {:?}", result.error());
    assert!(result.error().is_none());

    let file = result.file().unwrap();
    assert_eq!(file.name(), "Jane_Doe.png");
    assert_eq!(file.mime_type(), PNG_MIME);
    assert_eq!(file.size() as usize, file.bytes().len());

    let decoded = image::load_from_memory(file.bytes()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (2448, 3168));

    assert!(result.image_url().starts_with(OBJECT_URL_PREFIX));
    let blob = r.url_store().resolve(result.image_url()).unwrap();
    assert!(blob.shares_bytes_with(file.blob()));
}

#[tokio::test]
async fn output_name_follows_input_name() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    for (input, expected) in [
        ("resume", "resume.png"),
        ("cv.pdf", "cv.png"),
        ("report.final.Pdf", "report.final.png"),
        ("notes.txt", "notes.txt.png"),
    ] {
        let result = r.rasterize_first_page(&letter(input)).await;
        assert_eq!(result.file().unwrap().name(), expected);
    }
}

#[tokio::test]
async fn only_first_page_is_rendered() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let upload = PdfUpload::from_bytes("multi.pdf", fake_pdf(5, 100.0, 50.0));
    let result = r.rasterize_first_page(&upload).await;

    let decoded = image::load_from_memory(result.file().unwrap().bytes()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (400, 200));
}

#[tokio::test]
async fn fractional_sizes_are_floored() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let upload = PdfUpload::from_bytes("odd.pdf", fake_pdf(1, 10.3, 7.9));
    let result = r.rasterize_first_page(&upload).await;

    let decoded = image::load_from_memory(result.file().unwrap().bytes()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (41, 31));
}

#[tokio::test]
async fn same_input_gives_same_pixels_and_new_urls() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let first = r.rasterize_first_page(&letter("cv.pdf")).await;
    let second = r.rasterize_first_page(&letter("cv.pdf")).await;

    assert_eq!(first.file().unwrap().bytes(), second.file().unwrap().bytes());
    assert_ne!(first.image_url(), second.image_url());
    assert_eq!(r.url_store().len(), 2);
}

#[tokio::test]
async fn mime_type_is_not_checked() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let upload = letter("cv.pdf").with_mime_type("text/plain");
    assert!(r.rasterize_first_page(&upload).await.is_success());
}

// ── Failure paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn non_pdf_bytes_fail_with_prefix() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let upload = PdfUpload::from_bytes("resume.pdf", b"hello world".to_vec());
    let result = r.rasterize_first_page(&upload).await;

    assert!(!result.is_success());
    assert!(result.file().is_none());
    assert_eq!(result.image_url(), "");
    assert_convert_failure(result.error());
    assert!(r.url_store().is_empty());
}

#[tokio::test]
async fn empty_upload_is_parsed_and_rejected() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let upload = PdfUpload::from_bytes("empty.pdf", Vec::new());
    let result = r.rasterize_first_page(&upload).await;

    assert_convert_failure(result.error());
    assert!(result.error().unwrap().contains("Invalid PDF structure"));
    // The library was still loaded for it.
    assert_eq!(source.loads(), 1);
}

#[tokio::test]
async fn document_without_pages_fails_with_prefix() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let upload = PdfUpload::from_bytes("blank.pdf", fake_pdf(0, 612.0, 792.0));
    let result = r.rasterize_first_page(&upload).await;

    assert_convert_failure(result.error());
    assert!(result.error().unwrap().contains("page 1 of 0"));
}

#[tokio::test]
async fn zero_size_page_is_blob_failure() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let upload = PdfUpload::from_bytes("flat.pdf", fake_pdf(1, 612.0, 0.0));
    let result = r.rasterize_first_page(&upload).await;

    assert_eq!(result.error(), Some("Failed to create image blob"));
    assert_eq!(result.image_url(), "");
    assert!(result.file().is_none());
}

#[tokio::test]
async fn huge_page_fails_instead_of_allocating() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let upload = PdfUpload::from_bytes("poster.pdf", fake_pdf(1, 200000.0, 200000.0));
    let result = r.rasterize_first_page(&upload).await;

    assert_convert_failure(result.error());
    assert!(result.error().unwrap().contains("too large"));
    assert!(r.url_store().is_empty());

    // The rasteriser is still usable afterwards.
    assert!(r.rasterize_first_page(&letter("cv.pdf")).await.is_success());
}

#[tokio::test]
async fn render_failure_fails_with_prefix() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let upload = PdfUpload::from_bytes("broken.pdf", fake_pdf_render_fails());
    let result = r.rasterize_first_page(&upload).await;

    assert_convert_failure(result.error());
    assert!(result.error().unwrap().contains("fake render failure"));
}

#[tokio::test]
async fn unreadable_upload_fails_with_prefix() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.pdf");
    std::fs::write(&path, fake_pdf(1, 10.0, 10.0)).unwrap();
    let upload = PdfUpload::open(&path).await.unwrap();
    std::fs::remove_file(&path).unwrap();

    let result = r.rasterize_first_page(&upload).await;
    assert_convert_failure(result.error());
    assert!(result.error().unwrap().contains("gone.pdf"));
}

// ── Library loading ──────────────────────────────────────────────────────────

#[tokio::test]
async fn library_is_configured_with_fixed_location() {
    let source = FakeSource::new();
    let r = rasterizer(&source);
    assert_eq!(source.last_location(), None);

    r.rasterize_first_page(&letter("cv.pdf")).await;
    assert_eq!(source.last_location(), Some(PathBuf::from(PDFIUM_LIBRARY_DIR)));
}

#[tokio::test]
async fn sequential_calls_load_once() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    for _ in 0..3 {
        assert!(r.rasterize_first_page(&letter("cv.pdf")).await.is_success());
    }
    assert_eq!(source.loads(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_calls_share_one_load() {
    let source = FakeSource::slow(Duration::from_millis(50));
    let r = Arc::new(rasterizer(&source));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let r = Arc::clone(&r);
            tokio::spawn(async move {
                r.rasterize_first_page(&letter(&format!("cv{i}.pdf"))).await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_success());
    }
    assert_eq!(source.loads(), 1);
    assert_eq!(r.url_store().len(), 8);
}

#[tokio::test]
async fn failed_load_is_retried_on_next_call() {
    let source = FakeSource::failing(1);
    let r = rasterizer(&source);

    let first = r.rasterize_first_page(&letter("cv.pdf")).await;
    assert_convert_failure(first.error());
    assert!(first.error().unwrap().contains("fake library refused to load"));
    assert!(!r.loader().is_loaded());

    let second = r.rasterize_first_page(&letter("cv.pdf")).await;
    assert!(second.is_success());
    assert_eq!(source.loads(), 2);
}

// ── URL lifecycle ────────────────────────────────────────────────────────────

#[tokio::test]
async fn revoked_url_no_longer_resolves() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let result = r.rasterize_first_page(&letter("cv.pdf")).await;
    let url = result.image_url().to_string();

    assert!(r.revoke_url(&url));
    assert!(r.url_store().resolve(&url).is_none());
    assert!(!r.revoke_url(&url));
    // The file outlives its URL.
    assert!(!result.file().unwrap().bytes().is_empty());
}

// ── Batch / file / sync entry points ─────────────────────────────────────────

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl BatchProgressCallback for RecordingCallback {
    fn on_batch_start(&self, total: usize) {
        self.events.lock().unwrap().push(format!("start {total}"));
    }

    fn on_file_complete(&self, index: usize, _total: usize, name: &str, png_len: usize) {
        assert!(png_len > 0);
        self.events.lock().unwrap().push(format!("ok {index} {name}"));
    }

    fn on_file_error(&self, index: usize, _total: usize, name: &str, error: &str) {
        assert!(error.starts_with("Failed to convert PDF: "));
        self.events.lock().unwrap().push(format!("err {index} {name}"));
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {success_count}/{total}"));
    }
}

#[tokio::test]
async fn batch_keeps_input_order_and_counts() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let uploads = vec![
        letter("a.pdf"),
        PdfUpload::from_bytes("b.pdf", b"junk".to_vec()),
        letter("c.pdf"),
    ];
    let callback = Arc::new(RecordingCallback::default());
    let config = RasterizeConfig::builder()
        .concurrency(2)
        .progress_callback(callback.clone())
        .build()
        .unwrap();

    let batch = rasterize_many(&r, &uploads, &config).await;

    let names: Vec<_> = batch.files.iter().map(|f| f.source_name.as_str()).collect();
    assert_eq!(names, ["a.pdf", "b.pdf", "c.pdf"]);
    assert_eq!(batch.stats.total_files, 3);
    assert_eq!(batch.stats.succeeded, 2);
    assert_eq!(batch.stats.failed, 1);
    assert!(batch.stats.total_png_bytes > 0);
    assert!(!batch.all_succeeded());
    assert_eq!(source.loads(), 1);

    let mut events = callback.events.lock().unwrap().clone();
    assert_eq!(events.first().map(String::as_str), Some("start 3"));
    assert_eq!(events.last().map(String::as_str), Some("done 2/3"));
    events.sort();
    assert!(events.contains(&"err 1 b.pdf".to_string()));
    assert!(events.contains(&"ok 0 a.pdf".to_string()));
    assert!(events.contains(&"ok 2 c.pdf".to_string()));
}

#[tokio::test]
async fn empty_batch() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let batch = rasterize_many(&r, &[], &RasterizeConfig::default()).await;
    assert!(batch.files.is_empty());
    assert!(batch.all_succeeded());
    assert_eq!(source.loads(), 0);
}

#[tokio::test]
async fn to_file_writes_png_and_releases_url() {
    let source = FakeSource::new();
    let r = rasterizer(&source);
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out/cv.png");

    let file = rasterize_to_file(&r, &letter("cv.pdf"), &target).await.unwrap();

    let written = std::fs::read(&target).unwrap();
    assert_eq!(written, file.bytes());
    assert_eq!(&written[..8], b"\x89PNG\r\n\x1a\n");
    assert!(r.url_store().is_empty());
}

#[tokio::test]
async fn to_file_reports_conversion_failure() {
    let source = FakeSource::new();
    let r = rasterizer(&source);
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("cv.png");

    let upload = PdfUpload::from_bytes("cv.pdf", b"nope".to_vec());
    let err = rasterize_to_file(&r, &upload, &target).await.unwrap_err();

    assert!(matches!(err, Pdf2ImgError::ConversionFailed { ref name, .. } if name == "cv.pdf"));
    assert!(err.to_string().starts_with("Failed to convert PDF: "));
    assert!(!target.exists());
}

#[test]
fn sync_wrapper_runs_outside_a_runtime() {
    let source = FakeSource::new();
    let r = rasterizer(&source);

    let result = rasterize_sync(&r, &letter("cv.pdf")).unwrap();
    assert!(result.is_success());
    assert_eq!(result.file().unwrap().name(), "cv.png");
}

#[test]
fn inspect_reports_first_page_geometry() {
    let source = FakeSource::new();
    let r = rasterizer(&source);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cv.pdf");
    std::fs::write(&path, fake_pdf(3, 612.0, 792.0)).unwrap();

    let info = tokio_test::block_on(inspect(&r, &path)).unwrap();
    assert_eq!(info.page_count, 3);
    let viewport = info.first_page_viewport.unwrap();
    assert_eq!((viewport.width, viewport.height), (2448, 3168));
}
