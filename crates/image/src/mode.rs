//! The five conversion modes and their per-item transform.

use crate::codec::{Codec, EncodeOptions, ImageCodec};
use crate::pdf::{build_pdf, PdfPage, PDF_MIME};
use crate::ImageFormat;
use serde::{Deserialize, Serialize};
use snapimg_batch::{AcceptList, ConversionError, InputFile, OutputNaming, ProcessedResult, Transform};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Lowest quality the compress mode accepts.
pub const MIN_COMPRESS_QUALITY: u8 = 10;

/// A conversion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    /// Shrink images, keeping their format
    Compress,
    /// Convert to JPEG
    Jpg,
    /// Convert to PNG
    Png,
    /// Convert to lossless WebP
    Webp,
    /// One A4 page per image
    Pdf,
}

impl ConversionMode {
    /// Every mode, in menu order.
    pub const ALL: [ConversionMode; 5] = [
        ConversionMode::Compress,
        ConversionMode::Jpg,
        ConversionMode::Png,
        ConversionMode::Webp,
        ConversionMode::Pdf,
    ];

    /// Lowercase mode name
    pub fn name(&self) -> &'static str {
        match self {
            ConversionMode::Compress => "compress",
            ConversionMode::Jpg => "jpg",
            ConversionMode::Png => "png",
            ConversionMode::Webp => "webp",
            ConversionMode::Pdf => "pdf",
        }
    }

    /// Output name rule
    pub fn naming(&self) -> OutputNaming {
        match self {
            ConversionMode::Compress => OutputNaming::prefix("compressed_"),
            ConversionMode::Jpg => OutputNaming::converted("jpg"),
            ConversionMode::Png => OutputNaming::converted("png"),
            ConversionMode::Webp => OutputNaming::converted("webp"),
            ConversionMode::Pdf => OutputNaming::converted("pdf"),
        }
    }

    /// Archive name used when several results are packaged
    pub fn archive_name(&self) -> &'static str {
        match self {
            ConversionMode::Compress => "compressed-images.zip",
            ConversionMode::Jpg | ConversionMode::Png | ConversionMode::Webp => "processed-images.zip",
            ConversionMode::Pdf => "snapimg-processed-pdfs.zip",
        }
    }

    /// Name of the combined document in pdf mode
    pub fn combined_name(&self) -> &'static str {
        "combined-images.pdf"
    }

    /// Media types this mode accepts
    pub fn accept(&self) -> AcceptList {
        AcceptList::images()
    }

    /// Quality used when none is configured
    pub fn default_quality(&self) -> u8 {
        match self {
            ConversionMode::Compress => 60,
            _ => 85,
        }
    }

    /// Whether the mode takes a quality setting at all
    pub fn uses_quality(&self) -> bool {
        matches!(self, ConversionMode::Compress | ConversionMode::Jpg | ConversionMode::Pdf)
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConversionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ConversionMode::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown mode '{s}'"))
    }
}

/// Quality knobs for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSettings {
    /// Lossy quality, 1-100
    pub quality: u8,
    /// Compress without loss (compress mode only)
    pub lossless: bool,
}

impl ModeSettings {
    /// Defaults for `mode`
    pub fn for_mode(mode: ConversionMode) -> Self {
        Self {
            quality: mode.default_quality(),
            lossless: false,
        }
    }

    /// Override the quality, clamped to what `mode` allows
    pub fn with_quality(mut self, mode: ConversionMode, quality: u8) -> Self {
        let floor = if mode == ConversionMode::Compress { MIN_COMPRESS_QUALITY } else { 1 };
        self.quality = quality.clamp(floor, 100);
        self
    }

    /// Toggle lossless compression
    pub fn with_lossless(mut self, lossless: bool) -> Self {
        self.lossless = lossless;
        self
    }
}

/// Per-item transform for a [`ConversionMode`].
pub struct ModeTransform<C = ImageCodec> {
    mode: ConversionMode,
    settings: ModeSettings,
    naming: OutputNaming,
    codec: C,
}

impl ModeTransform<ImageCodec> {
    /// Transform for `mode` with its default settings
    pub fn new(mode: ConversionMode) -> Self {
        Self::with_settings(mode, ModeSettings::for_mode(mode))
    }

    /// Transform for `mode` with explicit settings
    pub fn with_settings(mode: ConversionMode, settings: ModeSettings) -> Self {
        Self::with_codec(mode, settings, ImageCodec)
    }
}

impl<C: Codec> ModeTransform<C> {
    /// Transform using a custom codec
    pub fn with_codec(mode: ConversionMode, settings: ModeSettings, codec: C) -> Self {
        Self {
            mode,
            settings,
            naming: mode.naming(),
            codec,
        }
    }

    /// Active mode
    pub fn mode(&self) -> ConversionMode {
        self.mode
    }

    /// Active settings
    pub fn settings(&self) -> ModeSettings {
        self.settings
    }

    fn target(&self, source: ImageFormat) -> EncodeOptions {
        match self.mode {
            ConversionMode::Compress => {
                let format = if source.is_encodable() { source } else { ImageFormat::Jpeg };
                let quality = if self.settings.lossless { 100 } else { self.settings.quality };
                EncodeOptions::new(format, quality)
            }
            ConversionMode::Jpg | ConversionMode::Pdf => EncodeOptions::new(ImageFormat::Jpeg, self.settings.quality),
            ConversionMode::Png => EncodeOptions::new(ImageFormat::Png, 100),
            ConversionMode::Webp => EncodeOptions::new(ImageFormat::WebP, 100),
        }
    }

    fn convert(&self, file: &InputFile) -> Result<(Vec<u8>, &'static str), ConversionError> {
        let source = ImageFormat::from_mime_type(file.media_type()).unwrap_or(ImageFormat::Jpeg);

        if self.mode == ConversionMode::Jpg && source == ImageFormat::Jpeg {
            trace!(name = file.name(), "Already JPEG, passing through");
            return Ok((file.data().to_vec(), ImageFormat::Jpeg.mime_type()));
        }

        let decoded = self
            .codec
            .decode(file.data())
            .map_err(|e| ConversionError::new("Error loading image").with_source(e))?;
        let options = self.target(source);

        let encoded = if self.mode == ConversionMode::Pdf {
            PdfPage::from_image(&self.codec, &decoded, options.quality)
                .and_then(|page| build_pdf(std::slice::from_ref(&page)))
                .map(|data| (data, PDF_MIME))
        } else {
            self.codec
                .encode(&decoded, &options)
                .map(|data| (data, options.format.mime_type()))
        };
        drop(decoded);

        encoded.map_err(|e| ConversionError::new("Failed to convert image").with_source(e))
    }
}

impl<C: Codec> Transform for ModeTransform<C> {
    fn apply(&self, file: &InputFile) -> Result<ProcessedResult, ConversionError> {
        let (data, media_type) = self.convert(file)?;
        let name = self.naming.derive(file.name());
        trace!(input = file.name(), output = %name, bytes = data.len(), "Converted");
        Ok(ProcessedResult::new(file, name, media_type, data))
    }
}
