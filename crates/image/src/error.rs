//! Error types for the image crate.

use thiserror::Error;

/// Result type alias for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur during image operations.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Unknown image format
    #[error("Unknown image format")]
    UnknownFormat,

    /// Invalid image data
    #[error("Invalid image data: {0}")]
    InvalidData(String),

    /// Format can be read but not written
    #[error("Unsupported output format: {0:?}")]
    UnsupportedOutput(crate::ImageFormat),

    /// PDF assembly failed
    #[error("PDF error: {0}")]
    Pdf(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    ProcessingError(#[from] image::ImageError),
}

impl From<lopdf::Error> for ImageError {
    fn from(err: lopdf::Error) -> Self {
        ImageError::Pdf(err.to_string())
    }
}
