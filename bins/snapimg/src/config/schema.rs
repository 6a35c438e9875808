//! Configuration schema
//!
//! Every field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use snapimg_batch::CollisionPolicy;
use snapimg_image::ConversionMode;

/// Root configuration schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigSchema {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub compress: CompressConfig,

    #[serde(default)]
    pub jpg: QualityConfig,

    #[serde(default)]
    pub pdf: PdfConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,
}

impl ConfigSchema {
    /// Configured quality for `mode`, if the mode has one
    pub fn quality_for(&self, mode: ConversionMode) -> Option<u8> {
        match mode {
            ConversionMode::Compress => Some(self.compress.quality),
            ConversionMode::Jpg => Some(self.jpg.quality),
            ConversionMode::Pdf => Some(self.pdf.quality),
            ConversionMode::Png | ConversionMode::Webp => None,
        }
    }
}

/// Output and logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Where artifacts are saved
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Replace an existing artifact with the same name
    #[serde(default)]
    pub overwrite: bool,

    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Write logs as JSON lines
    #[serde(default)]
    pub log_json: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            overwrite: false,
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Compress mode settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressConfig {
    /// Lossy quality, 10-100
    #[serde(default = "default_compress_quality")]
    pub quality: u8,

    /// Keep full quality
    #[serde(default)]
    pub lossless: bool,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            quality: default_compress_quality(),
            lossless: false,
        }
    }
}

fn default_compress_quality() -> u8 {
    ConversionMode::Compress.default_quality()
}

/// Quality for a JPEG-producing mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
        }
    }
}

fn default_quality() -> u8 {
    85
}

/// PDF mode settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfConfig {
    /// JPEG quality of embedded pages
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Merge all pages into one document
    #[serde(default = "default_true")]
    pub combine: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            combine: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Archive settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Handling of duplicate output names
    #[serde(default)]
    pub collision: CollisionPolicy,
}
