//! File handles passed into and out of the rasteriser.
//!
//! [`PdfUpload`] is the caller-owned input: a name, a MIME type and either
//! in-memory bytes or a path read lazily when conversion starts.
//! [`ImageFile`] is the named PNG handed back on success; its bytes are the
//! same shared allocation the browsable URL points at.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// MIME type of every image produced by this crate.
pub const PNG_MIME: &str = "image/png";

/// MIME type assumed for uploads whose name ends in `.pdf`.
pub const PDF_MIME: &str = "application/pdf";

const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// Where an upload's bytes come from.
#[derive(Debug, Clone)]
enum UploadSource {
    Memory(Arc<[u8]>),
    Disk(PathBuf),
}

/// A PDF file handed to the rasteriser. Read-only to the rasteriser.
///
/// The MIME type is informational; whether the bytes are a PDF is decided
/// by the parser alone.
#[derive(Debug, Clone)]
pub struct PdfUpload {
    name: String,
    mime_type: String,
    size: u64,
    source: UploadSource,
}

impl PdfUpload {
    /// Wrap bytes already in memory. The MIME type is guessed from `name`.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let bytes: Arc<[u8]> = bytes.into();
        Self {
            mime_type: guess_mime(&name).to_string(),
            size: bytes.len() as u64,
            name,
            source: UploadSource::Memory(bytes),
        }
    }

    /// Open a file on disk without reading its contents yet.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("'{}' is not a regular file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            mime_type: guess_mime(&name).to_string(),
            size: metadata.len(),
            name,
            source: UploadSource::Disk(path.to_path_buf()),
        })
    }

    /// Override the MIME type reported for this upload.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Byte length reported when the upload was created.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The on-disk path, for uploads created with [`PdfUpload::open`].
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            UploadSource::Disk(p) => Some(p),
            UploadSource::Memory(_) => None,
        }
    }

    /// Read the whole upload into memory.
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            UploadSource::Memory(bytes) => Ok(bytes.to_vec()),
            UploadSource::Disk(path) => tokio::fs::read(path).await,
        }
    }

    /// Name of the PNG derived from this upload.
    pub fn png_name(&self) -> String {
        png_file_name(&self.name)
    }
}

/// Replace a trailing `.pdf` (any case) with `.png`, or append `.png`.
///
/// ```rust
/// use resume_pdf2img::upload::png_file_name;
///
/// assert_eq!(png_file_name("resume.pdf"), "resume.png");
/// assert_eq!(png_file_name("CV.PDF"), "CV.png");
/// assert_eq!(png_file_name("resume"), "resume.png");
/// ```
pub fn png_file_name(original: &str) -> String {
    let stem = strip_pdf_suffix(original);
    format!("{stem}.png")
}

fn strip_pdf_suffix(name: &str) -> &str {
    const SUFFIX: &str = ".pdf";
    if name.len() >= SUFFIX.len() {
        let split = name.len() - SUFFIX.len();
        if name.is_char_boundary(split) && name[split..].eq_ignore_ascii_case(SUFFIX) {
            return &name[..split];
        }
    }
    name
}

fn guess_mime(name: &str) -> &'static str {
    if strip_pdf_suffix(name).len() != name.len() {
        PDF_MIME
    } else {
        OCTET_STREAM_MIME
    }
}

/// Immutable bytes with a MIME type, shared between a file and its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Arc<[u8]>,
    mime_type: String,
}

impl Blob {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when both blobs point at the same allocation.
    pub fn shares_bytes_with(&self, other: &Blob) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

/// A named PNG produced from the first page of an upload.
#[derive(Debug, Clone, Serialize)]
pub struct ImageFile {
    name: String,
    #[serde(rename = "type")]
    mime_type: String,
    size: u64,
    #[serde(skip)]
    blob: Blob,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, blob: Blob) -> Self {
        Self {
            name: name.into(),
            mime_type: blob.mime_type().to_string(),
            size: blob.len() as u64,
            blob,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn bytes(&self) -> &[u8] {
        self.blob.bytes()
    }

    pub fn blob(&self) -> &Blob {
        &self.blob
    }

    /// Inline the image as a `data:` URL (base64).
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            STANDARD.encode(self.blob.bytes())
        )
    }
}
