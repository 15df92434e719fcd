//! Input stage: pull an upload's bytes into memory.
//!
//! Nothing is rejected here. An empty buffer or one without the `%PDF`
//! header is logged and still handed to the parser, which is the only
//! authority on whether the bytes are a PDF.

use crate::error::RasterizeError;
use crate::upload::PdfUpload;
use tracing::{debug, warn};

/// Number of leading bytes echoed to the debug log.
const PEEK_LEN: usize = 20;

/// Read the whole upload.
pub async fn read_upload(upload: &PdfUpload) -> Result<Vec<u8>, RasterizeError> {
    let bytes = upload
        .read_bytes()
        .await
        .map_err(|e| RasterizeError::Read {
            name: upload.name().to_string(),
            detail: e.to_string(),
        })?;

    debug!(
        "Read '{}' ({}): {} bytes, reported size {}",
        upload.name(),
        upload.mime_type(),
        bytes.len(),
        upload.size()
    );

    if bytes.is_empty() {
        warn!("'{}' is empty; passing it to the parser anyway", upload.name());
    } else {
        debug!("First bytes: {:02x?}", &bytes[..bytes.len().min(PEEK_LEN)]);
        if !has_pdf_magic(&bytes) {
            warn!("'{}' does not start with %PDF", upload.name());
        }
    }

    Ok(bytes)
}

/// True when `bytes` starts with the `%PDF` header.
pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}
