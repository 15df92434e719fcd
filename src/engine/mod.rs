//! The narrow rendering-library interface and the pixel types it draws into.
//!
//! Only four library operations are used, and those are all the traits
//! expose:
//!
//! 1. configure the library location: [`LibrarySource::import`] receives it
//! 2. parse bytes into a document: [`RenderLibrary::with_document`]
//! 3. fetch a page by one-based number: [`DocumentHandle::page`]
//! 4. render a page onto a surface: [`PageHandle::render`]
//!
//! pdfium documents and pages borrow the bound library, so a document is
//! lent to a visitor closure instead of being returned. The real backend
//! lives in [`pdfium`]; tests substitute their own implementations.

pub mod loader;
pub mod pdfium;

use crate::error::{LoadError, RasterizeError};
use futures::future::BoxFuture;
use image::{Rgba, RgbaImage};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

pub use loader::LibraryLoader;
pub use pdfium::{PdfiumLibrary, PdfiumSource};

/// Future returned by [`LibrarySource::import`].
pub type ImportFuture = BoxFuture<'static, Result<Arc<dyn RenderLibrary>, LoadError>>;

/// Produces a ready-to-use rendering library.
pub trait LibrarySource: Send + Sync {
    /// Start loading the library, configured to use `location`.
    fn import(&self, location: &Path) -> ImportFuture;
}

/// A loaded PDF rendering library.
///
/// Methods are called from the blocking thread pool.
pub trait RenderLibrary: Send + Sync {
    /// Parse `bytes` and lend the document to `visit`.
    ///
    /// Unparsable input must fail with [`RasterizeError::Parse`]. Errors
    /// returned by `visit` are passed through unchanged.
    fn with_document(
        &self,
        bytes: &[u8],
        visit: &mut dyn FnMut(&dyn DocumentHandle) -> Result<(), RasterizeError>,
    ) -> Result<(), RasterizeError>;
}

/// A parsed document.
pub trait DocumentHandle {
    fn page_count(&self) -> u16;

    /// Fetch page `number` (one-based). A missing page fails with
    /// [`RasterizeError::PageNotFound`].
    fn page(&self, number: u16) -> Result<Box<dyn PageHandle + '_>, RasterizeError>;
}

/// A single page of a [`DocumentHandle`].
pub trait PageHandle {
    /// Native page size in PDF points (1/72 in).
    fn size(&self) -> PageSize;

    /// Draw the page onto `surface`, scaled to `viewport`.
    fn render(&self, viewport: &Viewport, surface: &mut RasterSurface)
        -> Result<(), RasterizeError>;
}

/// Page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Pixel rectangle and scale a page is rendered at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

impl Viewport {
    /// Scale a page, flooring to whole pixels. Negative or non-finite
    /// dimensions collapse to zero.
    pub fn for_page(size: PageSize, scale: f32) -> Self {
        Self {
            width: to_pixels(size.width * scale),
            height: to_pixels(size.height * scale),
            scale,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Bytes an RGBA surface of this size needs, `None` on overflow.
    pub fn rgba_len(&self) -> Option<u64> {
        u64::from(self.width)
            .checked_mul(u64::from(self.height))?
            .checked_mul(4)
    }
}

fn to_pixels(v: f32) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.floor() as u32
    } else {
        0
    }
}

/// Interpolation used when the renderer resamples glyphs, paths and images.
///
/// pdfium only distinguishes on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Smoothing {
    #[default]
    Disabled,
    High,
}

impl Smoothing {
    pub fn is_enabled(self) -> bool {
        self != Smoothing::Disabled
    }
}

/// Offscreen RGBA pixel buffer a page is rendered onto.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
    smoothing: Smoothing,
}

impl RasterSurface {
    /// A transparent surface of exactly `viewport`'s pixel size.
    pub fn for_viewport(viewport: &Viewport) -> Self {
        Self {
            pixels: RgbaImage::new(viewport.width, viewport.height),
            smoothing: Smoothing::default(),
        }
    }

    pub fn set_smoothing(&mut self, smoothing: Smoothing) {
        self.smoothing = smoothing;
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Copy `image` onto the surface at the origin, clipped to its bounds.
    pub fn draw(&mut self, image: &RgbaImage) {
        image::imageops::replace(&mut self.pixels, image, 0, 0);
    }

    /// Paint every pixel with `color`.
    pub fn fill(&mut self, color: Rgba<u8>) {
        for px in self.pixels.pixels_mut() {
            *px = color;
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }
}
