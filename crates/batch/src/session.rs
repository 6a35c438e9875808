//! Per-mode session state machine.
//!
//! ```text
//! Idle -> Selecting -> Processing -> Processed -> Downloading -> Idle
//!                                             \-> Reset -------> Idle
//! ```
//!
//! Only one run may be active at a time; a second request while processing
//! is rejected, never queued.

use crate::cancel::CancellationToken;
use crate::error::{BatchError, ItemFailure, Result};
use crate::event::{BatchEvent, Observer};
use crate::file::{AcceptList, InputFile, ProcessedResult};
use crate::package::{ArtifactKind, Package};
use crate::pipeline::{self, BatchOutcome, Transform};
use crate::sink::DownloadSink;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No files selected
    Idle,
    /// Files selected, nothing processed yet
    Selecting,
    /// A run is active
    Processing,
    /// Results are ready for download
    Processed,
    /// An artifact is being packaged and saved
    Downloading,
}

impl Phase {
    /// Lowercase name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Selecting => "selecting",
            Phase::Processing => "processing",
            Phase::Processed => "processed",
            Phase::Downloading => "downloading",
        }
    }
}

/// Summary of a saved artifact.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadReceipt {
    /// Where the artifact was saved
    pub path: PathBuf,
    /// Artifact file name
    pub name: String,
    /// Kind of artifact
    pub kind: ArtifactKind,
    /// Number of results inside
    pub entries: usize,
    /// Payload size in bytes
    pub bytes: usize,
}

/// Files, progress and results for one conversion mode.
#[derive(Debug)]
pub struct Session {
    phase: Phase,
    files: Vec<InputFile>,
    results: Vec<ProcessedResult>,
    failures: Vec<ItemFailure>,
    progress: u8,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Empty session in [`Phase::Idle`]
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            files: Vec::new(),
            results: Vec::new(),
            failures: Vec::new(),
            progress: 0,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Selected files in insertion order
    pub fn files(&self) -> &[InputFile] {
        &self.files
    }

    /// Results of the last successful run
    pub fn results(&self) -> &[ProcessedResult] {
        &self.results
    }

    /// Skipped and failed items of the last completed run
    pub fn failures(&self) -> &[ItemFailure] {
        &self.failures
    }

    /// Progress of the current or last run, 0 to 100
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Whether a run is active
    pub fn is_processing(&self) -> bool {
        self.phase == Phase::Processing
    }

    /// Total size of the selected files in bytes
    pub fn total_size(&self) -> usize {
        self.files.iter().map(InputFile::size).sum()
    }

    /// Append files to the selection.
    ///
    /// Adding to a processed session discards its results. Returns the new
    /// selection length.
    pub fn add_files<I>(&mut self, files: I) -> Result<usize>
    where
        I: IntoIterator<Item = InputFile>,
    {
        match self.phase {
            Phase::Processing | Phase::Downloading => return Err(self.invalid("add files")),
            Phase::Processed => self.clear_results(),
            Phase::Idle | Phase::Selecting => {}
        }

        self.files.extend(files);
        self.phase = if self.files.is_empty() { Phase::Idle } else { Phase::Selecting };
        Ok(self.files.len())
    }

    /// Remove the file at `index` from the selection.
    pub fn remove_file(&mut self, index: usize) -> Result<InputFile> {
        if self.phase != Phase::Selecting {
            return Err(self.invalid("remove a file"));
        }
        if index >= self.files.len() {
            return Err(BatchError::FileIndexOutOfRange {
                index,
                len: self.files.len(),
            });
        }

        let removed = self.files.remove(index);
        if self.files.is_empty() {
            self.phase = Phase::Idle;
        }
        Ok(removed)
    }

    /// Clear files and results and return to [`Phase::Idle`].
    pub fn reset(&mut self) -> Result<()> {
        if matches!(self.phase, Phase::Processing | Phase::Downloading) {
            return Err(self.invalid("reset"));
        }
        self.files.clear();
        self.clear_results();
        self.phase = Phase::Idle;
        Ok(())
    }

    /// Enter [`Phase::Processing`] and return the files to run over.
    ///
    /// Pair with [`Session::finish_run`]. Prefer [`Session::process`] unless
    /// the run happens somewhere else.
    pub fn begin_run(&mut self) -> Result<Vec<InputFile>> {
        match self.phase {
            Phase::Selecting => {}
            Phase::Idle => return Err(BatchError::EmptyBatch),
            Phase::Processing => return Err(BatchError::AlreadyProcessing),
            Phase::Processed | Phase::Downloading => return Err(self.invalid("start processing")),
        }

        self.clear_results();
        self.phase = Phase::Processing;
        debug!(files = self.files.len(), "Run started");
        Ok(self.files.clone())
    }

    /// Record progress reported during the active run.
    pub fn record_progress(&mut self, percent: u8) {
        if self.phase == Phase::Processing {
            self.progress = self.progress.max(percent.min(100));
        }
    }

    /// Leave [`Phase::Processing`] with the outcome of the run.
    ///
    /// Success moves to [`Phase::Processed`]; a batch error returns to
    /// [`Phase::Selecting`] with the selection kept and is passed back.
    pub fn finish_run(&mut self, outcome: Result<BatchOutcome>) -> Result<&[ProcessedResult]> {
        if self.phase != Phase::Processing {
            return Err(self.invalid("finish a run"));
        }

        match outcome {
            Ok(outcome) => {
                self.results = outcome.results;
                self.failures = outcome.failures;
                self.progress = 100;
                self.phase = Phase::Processed;
                Ok(&self.results)
            }
            Err(err) => {
                self.phase = if self.files.is_empty() { Phase::Idle } else { Phase::Selecting };
                Err(err)
            }
        }
    }

    /// Run `transform` over the selection.
    ///
    /// Events are forwarded to `observer`; progress is also tracked on the
    /// session.
    pub fn process<T>(
        &mut self,
        transform: &T,
        accept: &AcceptList,
        observer: &mut dyn Observer,
        cancel: &CancellationToken,
    ) -> Result<&[ProcessedResult]>
    where
        T: Transform + ?Sized,
    {
        let files = self.begin_run()?;

        let outcome = {
            let progress = &mut self.progress;
            let mut tracking = |event: &BatchEvent| {
                if let BatchEvent::Progress(percent) = event {
                    *progress = (*progress).max(*percent);
                }
                observer.on_event(event);
            };
            pipeline::run(&files, transform, accept, &mut tracking, cancel)
        };

        self.finish_run(outcome)
    }

    /// Package the results and hand them to `sink`.
    ///
    /// On success the session is cleared and returns to [`Phase::Idle`]; on
    /// failure it stays in [`Phase::Processed`].
    pub fn download(&mut self, packager: &dyn Package, sink: &mut dyn DownloadSink) -> Result<DownloadReceipt> {
        match self.phase {
            Phase::Processed => {}
            Phase::Processing | Phase::Downloading => return Err(self.invalid("download")),
            Phase::Idle | Phase::Selecting => return Err(BatchError::NothingToDownload),
        }
        if self.results.is_empty() {
            return Err(BatchError::NothingToDownload);
        }

        self.phase = Phase::Downloading;
        let saved = packager
            .package(&self.results)
            .and_then(|artifact| sink.save(&artifact).map(|path| (artifact, path)));

        match saved {
            Ok((artifact, path)) => {
                self.files.clear();
                self.clear_results();
                self.phase = Phase::Idle;
                Ok(DownloadReceipt {
                    path,
                    name: artifact.name,
                    kind: artifact.kind,
                    entries: artifact.entries,
                    bytes: artifact.data.len(),
                })
            }
            Err(err) => {
                self.phase = Phase::Processed;
                Err(err)
            }
        }
    }

    fn clear_results(&mut self) {
        self.results.clear();
        self.failures.clear();
        self.progress = 0;
    }

    fn invalid(&self, operation: &'static str) -> BatchError {
        BatchError::InvalidState {
            operation,
            phase: self.phase.name(),
        }
    }
}
