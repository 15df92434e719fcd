//! Image encoding: [`RasterSurface`] → PNG bytes.
//!
//! PNG is lossless, so rendered text keeps its edges for downstream OCR.
//! The encoder runs at its best compression setting with adaptive
//! filtering; quality is never traded for size.

use crate::engine::RasterSurface;
use crate::error::RasterizeError;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use tracing::{debug, warn};

/// Encode the surface as PNG.
///
/// Returns `Ok(None)` for a surface with no pixels, mirroring a canvas
/// that yields no blob.
pub fn encode_png(surface: &RasterSurface) -> Result<Option<Vec<u8>>, image::ImageError> {
    if surface.is_empty() {
        return Ok(None);
    }

    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
    surface.pixels().write_with_encoder(encoder)?;

    debug!(
        "Encoded {}x{} surface → {} bytes PNG",
        surface.width(),
        surface.height(),
        buf.len()
    );
    Ok(Some(buf))
}

/// Encode on the blocking pool. Any failure is [`RasterizeError::Encode`].
pub async fn encode_surface(surface: RasterSurface) -> Result<Vec<u8>, RasterizeError> {
    let encoded = tokio::task::spawn_blocking(move || encode_png(&surface))
        .await
        .map_err(|e| {
            warn!("Encode task panicked: {}", e);
            RasterizeError::Encode
        })?;

    match encoded {
        Ok(Some(bytes)) if !bytes.is_empty() => Ok(bytes),
        Ok(_) => {
            warn!("Surface produced no image bytes");
            Err(RasterizeError::Encode)
        }
        Err(e) => {
            warn!("PNG encoding failed: {}", e);
            Err(RasterizeError::Encode)
        }
    }
}
