//! Run summary, printed as text or JSON.

use serde::Serialize;
use snapimg_batch::{DownloadReceipt, ItemFailure};
use snapimg_cli::output::{format_count, format_duration, format_ratio, format_size, Status};
use snapimg_image::{ConversionMode, ModeSettings};
use std::time::Duration;

/// One skipped or failed file
#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub name: String,
    pub reason: String,
    pub unsupported: bool,
}

impl From<&ItemFailure> for FailureReport {
    fn from(failure: &ItemFailure) -> Self {
        Self {
            name: failure.name.clone(),
            reason: failure.error.to_string(),
            unsupported: failure.error.is_unsupported(),
        }
    }
}

/// What a run did.
#[derive(Debug, Serialize)]
pub struct Report {
    pub mode: ConversionMode,
    /// Lossy quality, absent for lossless modes
    pub quality: Option<u8>,
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<FailureReport>,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub elapsed_ms: u128,
    pub artifact: Option<DownloadReceipt>,
}

impl Report {
    pub fn new(mode: ConversionMode, total: usize, failures: &[ItemFailure]) -> Self {
        Self {
            mode,
            quality: None,
            total,
            succeeded: total.saturating_sub(failures.len()),
            failures: failures.iter().map(FailureReport::from).collect(),
            input_bytes: 0,
            output_bytes: 0,
            elapsed_ms: 0,
            artifact: None,
        }
    }

    /// Record the quality the run used, when the mode has one
    pub fn with_settings(mut self, settings: ModeSettings) -> Self {
        self.quality = self.mode.uses_quality().then_some(settings.quality);
        self
    }

    pub fn print_json(&self) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }

    /// Human-readable summary. Failures are listed separately.
    pub fn print_text(&self) {
        let Some(receipt) = &self.artifact else {
            Status::error("No valid images were processed.");
            return;
        };

        Status::success(&format!(
            "Saved {} ({}, {})",
            receipt.path.display(),
            format_count(receipt.entries, "file", "files"),
            format_size(receipt.bytes as u64)
        ));
        Status::info(&format!(
            "{} of {} converted with {}: {} -> {} ({}) in {}",
            self.succeeded,
            format_count(self.total, "file", "files"),
            self.mode,
            format_size(self.input_bytes),
            format_size(self.output_bytes),
            format_ratio(self.input_bytes, self.output_bytes),
            format_duration(Duration::from_millis(self.elapsed_ms as u64))
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapimg_batch::{ConversionError, ItemError};

    #[test]
    fn test_report_counts_and_json() {
        let failures = vec![
            ItemFailure {
                index: 1,
                name: "notes.txt".to_string(),
                error: ItemError::UnsupportedType {
                    media_type: "text/plain".to_string(),
                },
            },
            ItemFailure {
                index: 2,
                name: "broken.png".to_string(),
                error: ItemError::Conversion(ConversionError::new("Error loading image")),
            },
        ];

        let report = Report::new(ConversionMode::Jpg, 5, &failures);
        assert_eq!(report.succeeded, 3);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "jpg");
        assert_eq!(json["failures"][0]["unsupported"], true);
        assert_eq!(json["failures"][1]["unsupported"], false);
        assert!(json["artifact"].is_null());
    }

    #[test]
    fn test_quality_only_for_lossy_modes() {
        let report = Report::new(ConversionMode::Pdf, 1, &[]).with_settings(ModeSettings::for_mode(ConversionMode::Pdf));
        assert_eq!(report.quality, Some(85));

        let report = Report::new(ConversionMode::Png, 1, &[]).with_settings(ModeSettings::for_mode(ConversionMode::Png));
        assert_eq!(report.quality, None);
        assert!(serde_json::to_value(&report).unwrap()["quality"].is_null());
    }
}
