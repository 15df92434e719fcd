//! pdfium backend for the [`RenderLibrary`] interface.
//!
//! ## Binding
//!
//! [`PdfiumSource`] looks for the platform library (`libpdfium.so`,
//! `libpdfium.dylib` or `pdfium.dll`) in the directory it is given and falls
//! back to the system library search path. Binding runs on the blocking pool
//! because it `dlopen`s a ~30 MB shared object.
//!
//! ## One instance per load
//!
//! The `Pdfium` bound at import time is kept for the library's lifetime, so
//! the shared object is opened and initialised once. pdfium is not
//! re-entrant: the instance sits behind a mutex and every
//! [`RenderLibrary::with_document`] call holds it while its document is
//! open. Documents borrow the instance and never leave the blocking thread
//! that opened them.

use super::{
    DocumentHandle, ImportFuture, LibrarySource, PageHandle, PageSize, RasterSurface,
    RenderLibrary, Viewport,
};
use crate::error::{LoadError, RasterizeError};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// [`LibrarySource`] that binds the real pdfium library.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumSource;

impl LibrarySource for PdfiumSource {
    fn import(&self, location: &Path) -> ImportFuture {
        let dir = location.to_path_buf();
        Box::pin(async move {
            let library = tokio::task::spawn_blocking(move || PdfiumLibrary::bind(&dir))
                .await
                .map_err(|e| LoadError::ImportAborted(e.to_string()))??;
            Ok::<_, LoadError>(Arc::new(library) as Arc<dyn RenderLibrary>)
        })
    }
}

/// A bound and initialised pdfium instance.
pub struct PdfiumLibrary {
    /// `None` when the system library is used.
    library_path: Option<PathBuf>,
    pdfium: Mutex<Pdfium>,
}

impl std::fmt::Debug for PdfiumLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfiumLibrary")
            .field("library_path", &self.library_path)
            .finish_non_exhaustive()
    }
}

impl PdfiumLibrary {
    /// Locate pdfium in `dir` (or on the system path), bind and initialise it.
    pub fn bind(dir: &Path) -> Result<Self, LoadError> {
        let candidate = PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(dir));

        let (bindings, library_path) = if candidate.exists() {
            let bindings = Pdfium::bind_to_library(&candidate).map_err(|e| LoadError::Bind {
                path: candidate.clone(),
                reason: format!("{:?}", e),
            })?;
            (bindings, Some(candidate))
        } else {
            debug!(
                "No pdfium library at {}, trying the system library",
                candidate.display()
            );
            let bindings = Pdfium::bind_to_system_library().map_err(|e| LoadError::NotFound {
                dir: dir.to_path_buf(),
                reason: format!("{:?}", e),
            })?;
            (bindings, None)
        };

        info!(
            "pdfium bound from {}",
            library_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "the system library path".to_string())
        );

        Ok(Self {
            library_path,
            pdfium: Mutex::new(Pdfium::new(bindings)),
        })
    }

    /// Path of the bound library, `None` for the system library.
    pub fn library_path(&self) -> Option<&Path> {
        self.library_path.as_deref()
    }
}

impl RenderLibrary for PdfiumLibrary {
    fn with_document(
        &self,
        bytes: &[u8],
        visit: &mut dyn FnMut(&dyn DocumentHandle) -> Result<(), RasterizeError>,
    ) -> Result<(), RasterizeError> {
        let pdfium = self.pdfium.lock().unwrap_or_else(PoisonError::into_inner);

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| RasterizeError::Parse {
                detail: format!("{:?}", e),
            })?;
        debug!("pdfium parsed document: {} pages", document.pages().len());

        let handle = PdfiumDocument { document };
        visit(&handle)
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl DocumentHandle for PdfiumDocument<'_> {
    fn page_count(&self) -> u16 {
        self.document.pages().len()
    }

    fn page(&self, number: u16) -> Result<Box<dyn PageHandle + '_>, RasterizeError> {
        let total = self.page_count();
        if number == 0 || number > total {
            return Err(RasterizeError::PageNotFound {
                page: number,
                total,
            });
        }

        let page = self
            .document
            .pages()
            .get(number - 1)
            .map_err(|e| RasterizeError::Parse {
                detail: format!("page {}: {:?}", number, e),
            })?;

        Ok(Box::new(PdfiumPage { page }))
    }
}

struct PdfiumPage<'a> {
    page: PdfPage<'a>,
}

impl PageHandle for PdfiumPage<'_> {
    fn size(&self) -> PageSize {
        PageSize::new(self.page.width().value, self.page.height().value)
    }

    fn render(
        &self,
        viewport: &Viewport,
        surface: &mut RasterSurface,
    ) -> Result<(), RasterizeError> {
        let too_large = |v: u32| RasterizeError::Render {
            detail: format!("viewport dimension {} exceeds the renderer limit", v),
        };
        let width = i32::try_from(viewport.width).map_err(|_| too_large(viewport.width))?;
        let height = i32::try_from(viewport.height).map_err(|_| too_large(viewport.height))?;

        let smooth = surface.smoothing().is_enabled();
        let config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height)
            .set_text_smoothing(smooth)
            .set_image_smoothing(smooth)
            .set_path_smoothing(smooth);

        let bitmap = self
            .page
            .render_with_config(&config)
            .map_err(|e| RasterizeError::Render {
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image().into_rgba8();
        debug!(
            "pdfium rendered {}x{} px onto {}x{} surface",
            image.width(),
            image.height(),
            surface.width(),
            surface.height()
        );
        surface.draw(&image);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_shareable<T: Send + Sync>() {}

    #[test]
    fn bound_instance_is_shareable() {
        assert_shareable::<PdfiumLibrary>();
    }

    #[test]
    fn missing_library_is_a_load_error() {
        let empty = tempfile::tempdir().unwrap();
        // With no pdfium in the directory this either falls back to a
        // system pdfium or reports where it looked.
        match PdfiumLibrary::bind(empty.path()) {
            Ok(library) => assert!(library.library_path().is_none()),
            Err(e) => {
                assert!(matches!(e, LoadError::NotFound { ref dir, .. } if dir == empty.path()))
            }
        }
    }
}
