//! Packaging: turn successful results into one downloadable artifact.
//!
//! One result is offered as-is; several results go into a zip archive.

use crate::error::{BatchError, Result};
use crate::file::ProcessedResult;
use crate::naming::split_extension;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// What kind of artifact was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// A single processed file
    Single,
    /// A zip archive of processed files
    Archive,
    /// A document assembled from every result, e.g. a multi-page PDF
    Document,
}

/// The final downloadable output.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Suggested file name
    pub name: String,
    /// Media type of the payload
    pub media_type: String,
    /// Payload
    pub data: Vec<u8>,
    /// Kind of artifact
    pub kind: ArtifactKind,
    /// Number of results packed into the artifact
    pub entries: usize,
}

/// What to do when two results derive the same output name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Rename later duplicates to `stem (1).ext`, `stem (2).ext`, ...
    #[default]
    Disambiguate,
    /// Keep one entry per name holding the last payload written
    LastWriteWins,
}

/// Resolve colliding output names into unique archive entries.
///
/// Returns `(entry name, payload)` pairs in result order.
pub fn archive_entries(results: &[ProcessedResult], policy: CollisionPolicy) -> Vec<(String, &[u8])> {
    match policy {
        CollisionPolicy::Disambiguate => {
            let mut taken: HashSet<String> = results.iter().map(|r| r.output_name.clone()).collect();
            let mut seen = HashSet::new();
            let mut entries = Vec::with_capacity(results.len());

            for result in results {
                let name = if seen.insert(result.output_name.clone()) {
                    result.output_name.clone()
                } else {
                    let (stem, ext) = split_extension(&result.output_name);
                    let unique = (1..)
                        .map(|n| format!("{} ({}){}", stem, n, ext))
                        .find(|candidate| !taken.contains(candidate))
                        .unwrap_or_else(|| result.output_name.clone());
                    taken.insert(unique.clone());
                    unique
                };
                entries.push((name, result.data.as_slice()));
            }
            entries
        }
        CollisionPolicy::LastWriteWins => {
            let mut position: HashMap<&str, usize> = HashMap::new();
            let mut entries: Vec<(String, &[u8])> = Vec::with_capacity(results.len());

            for result in results {
                match position.get(result.output_name.as_str()) {
                    Some(&i) => entries[i].1 = result.data.as_slice(),
                    None => {
                        position.insert(result.output_name.as_str(), entries.len());
                        entries.push((result.output_name.clone(), result.data.as_slice()));
                    }
                }
            }
            entries
        }
    }
}

/// Archive capability: bundle named payloads into one binary.
pub trait Archiver {
    /// Build an archive from `(name, payload)` pairs
    fn create_archive(&self, entries: &[(String, &[u8])]) -> Result<Vec<u8>>;

    /// Media type of the produced archive
    fn media_type(&self) -> &'static str;
}

/// Zip archiver with deflate compression.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver {
    /// Deflate level (0-9); `None` uses the library default
    pub level: Option<i64>,
}

impl Archiver for ZipArchiver {
    fn create_archive(&self, entries: &[(String, &[u8])]) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(self.level.map(|l| l.clamp(0, 9)));

        for (name, data) in entries {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    fn media_type(&self) -> &'static str {
        "application/zip"
    }
}

/// Packaging step: results in, one artifact out.
pub trait Package {
    /// Package `results` into a downloadable artifact
    ///
    /// # Errors
    /// [`BatchError::NothingToDownload`] if `results` is empty.
    fn package(&self, results: &[ProcessedResult]) -> Result<Artifact>;
}

/// Single file for one result, archive for several.
pub struct Packager<A = ZipArchiver> {
    archive_name: String,
    collisions: CollisionPolicy,
    archiver: A,
}

impl Packager<ZipArchiver> {
    /// Packager producing `archive_name` zips for multi-file batches
    pub fn new(archive_name: impl Into<String>) -> Self {
        Self::with_archiver(archive_name, ZipArchiver::default())
    }
}

impl<A: Archiver> Packager<A> {
    /// Packager using a custom archive capability
    pub fn with_archiver(archive_name: impl Into<String>, archiver: A) -> Self {
        Self {
            archive_name: archive_name.into(),
            collisions: CollisionPolicy::default(),
            archiver,
        }
    }

    /// Set the collision policy
    pub fn collisions(mut self, policy: CollisionPolicy) -> Self {
        self.collisions = policy;
        self
    }

    /// Archive file name used for multi-file batches
    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }
}

impl<A: Archiver> Package for Packager<A> {
    fn package(&self, results: &[ProcessedResult]) -> Result<Artifact> {
        match results {
            [] => Err(BatchError::NothingToDownload),
            [single] => Ok(Artifact {
                name: single.output_name.clone(),
                media_type: single.media_type.clone(),
                data: single.data.clone(),
                kind: ArtifactKind::Single,
                entries: 1,
            }),
            many => {
                let entries = archive_entries(many, self.collisions);
                let data = self.archiver.create_archive(&entries)?;
                Ok(Artifact {
                    name: self.archive_name.clone(),
                    media_type: self.archiver.media_type().to_string(),
                    data,
                    kind: ArtifactKind::Archive,
                    entries: entries.len(),
                })
            }
        }
    }
}
