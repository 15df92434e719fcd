//! Pipeline stages for first-page rasterisation.
//!
//! Each submodule implements one transformation step so each can be tested
//! on its own and the rendering backend can change without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode
//! (bytes)   (surface)  (PNG)
//! ```
//!
//! 1. [`input`]: read the upload into memory, logging what arrived
//! 2. [`render`]: parse, fetch page 1, size a 4× viewport and draw it;
//!    runs in `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]: lossless PNG encoding of the surface, also on the
//!    blocking pool

pub mod encode;
pub mod input;
pub mod render;
