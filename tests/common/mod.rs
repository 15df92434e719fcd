//! In-process stand-in for pdfium used by the integration tests.
//!
//! Documents are plain text: `%PDF-fake;pages=N;w=W;h=H[;render=fail]`.
//! Anything else fails to parse. Every page has the same size in points and
//! renders as a vertical gradient, so the PNG is deterministic and not a
//! single colour.

#![allow(dead_code)]

use futures::FutureExt;
use image::{Rgba, RgbaImage};
use resume_pdf2img::engine::ImportFuture;
use resume_pdf2img::{
    DocumentHandle, LibrarySource, LoadError, PageHandle, PageSize, RasterSurface,
    RasterizeError, RenderLibrary, Viewport,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FAKE_MAGIC: &str = "%PDF-fake";

/// Bytes for a fake document with `pages` pages of `w`×`h` points.
pub fn fake_pdf(pages: u16, w: f32, h: f32) -> Vec<u8> {
    format!("{FAKE_MAGIC};pages={pages};w={w};h={h}").into_bytes()
}

/// A one-page document whose render step fails.
pub fn fake_pdf_render_fails() -> Vec<u8> {
    format!("{FAKE_MAGIC};pages=1;w=10;h=10;render=fail").into_bytes()
}

/// Counts imports, can fail the first few, and can be slowed down.
pub struct FakeSource {
    loads: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Duration,
    last_location: Mutex<Option<PathBuf>>,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Self::build(0, Duration::ZERO)
    }

    /// Imports take `delay` before resolving.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::build(0, delay)
    }

    /// The first `n` imports fail.
    pub fn failing(n: usize) -> Arc<Self> {
        Self::build(n, Duration::ZERO)
    }

    fn build(failures: usize, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            loads: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(failures),
            delay,
            last_location: Mutex::new(None),
        })
    }

    /// Number of imports started.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn last_location(&self) -> Option<PathBuf> {
        self.last_location.lock().unwrap().clone()
    }
}

impl LibrarySource for FakeSource {
    fn import(&self, location: &Path) -> ImportFuture {
        self.loads.fetch_add(1, Ordering::SeqCst);
        *self.last_location.lock().unwrap() = Some(location.to_path_buf());

        let fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let delay = self.delay;

        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if fail {
                return Err(LoadError::Unavailable("fake library refused to load".into()));
            }
            Ok(Arc::new(FakeLibrary) as Arc<dyn RenderLibrary>)
        }
        .boxed()
    }
}

pub struct FakeLibrary;

struct FakeDocument {
    pages: u16,
    size: PageSize,
    render_fails: bool,
}

struct FakePage {
    size: PageSize,
    render_fails: bool,
}

impl RenderLibrary for FakeLibrary {
    fn with_document(
        &self,
        bytes: &[u8],
        visit: &mut dyn FnMut(&dyn DocumentHandle) -> Result<(), RasterizeError>,
    ) -> Result<(), RasterizeError> {
        let document = parse(bytes).ok_or_else(|| RasterizeError::Parse {
            detail: "not a fake PDF".into(),
        })?;
        visit(&document)
    }
}

fn parse(bytes: &[u8]) -> Option<FakeDocument> {
    let text = std::str::from_utf8(bytes).ok()?;
    let mut fields = text.split(';');
    if fields.next()? != FAKE_MAGIC {
        return None;
    }

    let mut document = FakeDocument {
        pages: 1,
        size: PageSize::new(10.0, 10.0),
        render_fails: false,
    };
    for field in fields {
        let (key, value) = field.split_once('=')?;
        match key {
            "pages" => document.pages = value.parse().ok()?,
            "w" => document.size.width = value.parse().ok()?,
            "h" => document.size.height = value.parse().ok()?,
            "render" => document.render_fails = value == "fail",
            _ => return None,
        }
    }
    Some(document)
}

impl DocumentHandle for FakeDocument {
    fn page_count(&self) -> u16 {
        self.pages
    }

    fn page(&self, number: u16) -> Result<Box<dyn PageHandle + '_>, RasterizeError> {
        if number == 0 || number > self.pages {
            return Err(RasterizeError::PageNotFound {
                page: number,
                total: self.pages,
            });
        }
        Ok(Box::new(FakePage {
            size: self.size,
            render_fails: self.render_fails,
        }))
    }
}

impl PageHandle for FakePage {
    fn size(&self) -> PageSize {
        self.size
    }

    fn render(&self, viewport: &Viewport, surface: &mut RasterSurface) -> Result<(), RasterizeError> {
        if self.render_fails {
            return Err(RasterizeError::Render {
                detail: "fake render failure".into(),
            });
        }
        let height = viewport.height.max(1);
        let image = RgbaImage::from_fn(viewport.width, viewport.height, |_, y| {
            let shade = (y * 255 / height) as u8;
            Rgba([shade, shade, 255 - shade, 255])
        });
        surface.draw(&image);
        Ok(())
    }
}
