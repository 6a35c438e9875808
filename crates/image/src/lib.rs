//! Image conversion for snapimg.
//!
//! This crate provides:
//! - Format detection from media types, extensions and magic bytes
//! - A [`Codec`] abstraction over decoding and encoding
//! - Alpha flattening for JPEG and PDF output
//! - A4 PDF pages and a combined-PDF packager
//! - The five [`ConversionMode`]s and their per-item [`ModeTransform`]

#![warn(missing_docs)]

mod alpha;
mod codec;
mod detect;
mod error;
mod mode;
pub mod pdf;

pub use alpha::{flatten_alpha, has_alpha_channel, WHITE};
pub use codec::{Codec, EncodeOptions, ImageCodec};
pub use detect::{detect_format, sniff_media_type, ImageFormat};
pub use error::{ImageError, Result};
pub use mode::{ConversionMode, ModeSettings, ModeTransform, MIN_COMPRESS_QUALITY};
pub use pdf::{build_pdf, fit_to_page, CombinedPdf, PdfPage, Placement};
