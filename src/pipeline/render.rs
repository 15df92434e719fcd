//! Render stage: parse the bytes, take a page and draw it onto a surface.
//!
//! The viewport is the page's native point size times [`RENDER_SCALE`],
//! floored to whole pixels, and the surface is allocated at exactly that
//! size with smoothing at its highest setting. A page whose viewport has no
//! area is never handed to the library; the empty surface is returned and
//! the encode stage reports it.

use crate::config::{FIRST_PAGE, MAX_SURFACE_BYTES, RENDER_SCALE};
use crate::engine::{
    DocumentHandle, PageSize, RasterSurface, RenderLibrary, Smoothing, Viewport,
};
use crate::error::RasterizeError;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a document looks like without rendering it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentInfo {
    pub page_count: u16,
    /// Size of page 1 in points; `None` for a document without pages.
    pub first_page: Option<PageSize>,
    /// Pixel size page 1 would be rendered at.
    pub first_page_viewport: Option<Viewport>,
}

/// Render page 1 at [`RENDER_SCALE`] on the blocking pool.
pub async fn render_first_page(
    library: Arc<dyn RenderLibrary>,
    bytes: Vec<u8>,
) -> Result<RasterSurface, RasterizeError> {
    tokio::task::spawn_blocking(move || {
        render_page_blocking(library.as_ref(), &bytes, FIRST_PAGE, RENDER_SCALE)
    })
    .await
    .map_err(|e| RasterizeError::Render {
        detail: format!("Render task panicked: {}", e),
    })?
}

/// Blocking implementation of page rendering.
pub fn render_page_blocking(
    library: &dyn RenderLibrary,
    bytes: &[u8],
    page_number: u16,
    scale: f32,
) -> Result<RasterSurface, RasterizeError> {
    let mut rendered = None;

    library.with_document(bytes, &mut |document: &dyn DocumentHandle| {
        info!("PDF loaded: {} pages", document.page_count());

        let page = document.page(page_number)?;
        let size = page.size();
        let viewport = Viewport::for_page(size, scale);
        check_surface_budget(&viewport)?;

        let mut surface = RasterSurface::for_viewport(&viewport);
        surface.set_smoothing(Smoothing::High);

        if viewport.is_empty() {
            warn!(
                "Page {} is {}x{} pt; nothing to render at {}x",
                page_number, size.width, size.height, scale
            );
        } else {
            page.render(&viewport, &mut surface)?;
            debug!(
                "Rendered page {} → {}x{} px",
                page_number, viewport.width, viewport.height
            );
        }

        rendered = Some(surface);
        Ok(())
    })?;

    rendered.ok_or_else(|| RasterizeError::Parse {
        detail: "document was never opened".into(),
    })
}

/// Reject viewports whose surface would not fit in [`MAX_SURFACE_BYTES`].
fn check_surface_budget(viewport: &Viewport) -> Result<(), RasterizeError> {
    match viewport.rgba_len() {
        Some(len) if len <= MAX_SURFACE_BYTES => Ok(()),
        len => {
            warn!(
                "Viewport {}x{} px needs {:?} bytes, limit is {}",
                viewport.width, viewport.height, len, MAX_SURFACE_BYTES
            );
            Err(RasterizeError::Render {
                detail: format!(
                    "page too large to render ({}x{} px exceeds the {} byte surface limit)",
                    viewport.width, viewport.height, MAX_SURFACE_BYTES
                ),
            })
        }
    }
}

/// Read page count and page-1 geometry on the blocking pool.
pub async fn inspect_document(
    library: Arc<dyn RenderLibrary>,
    bytes: Vec<u8>,
) -> Result<DocumentInfo, RasterizeError> {
    tokio::task::spawn_blocking(move || inspect_document_blocking(library.as_ref(), &bytes))
        .await
        .map_err(|e| RasterizeError::Render {
            detail: format!("Inspect task panicked: {}", e),
        })?
}

/// Blocking implementation of document inspection.
fn inspect_document_blocking(
    library: &dyn RenderLibrary,
    bytes: &[u8],
) -> Result<DocumentInfo, RasterizeError> {
    let mut info = None;

    library.with_document(bytes, &mut |document: &dyn DocumentHandle| {
        let page_count = document.page_count();
        let first_page = if page_count == 0 {
            None
        } else {
            Some(document.page(FIRST_PAGE)?.size())
        };
        info = Some(DocumentInfo {
            page_count,
            first_page,
            first_page_viewport: first_page.map(|s| Viewport::for_page(s, RENDER_SCALE)),
        });
        Ok(())
    })?;

    info.ok_or_else(|| RasterizeError::Parse {
        detail: "document was never opened".into(),
    })
}
