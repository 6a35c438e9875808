//! Batch file-processing pipeline for snapimg.
//!
//! This crate provides:
//! - A generic pipeline running a per-file [`Transform`] with progress events
//!   and per-item error isolation
//! - A [`Session`] state machine owning the selection and the results
//! - Packaging into a single file or a zip archive, with explicit handling of
//!   colliding output names
//! - A [`DownloadSink`] abstraction for saving the final artifact
//!
//! # Example
//!
//! ```
//! use snapimg_batch::{
//!     AcceptList, CancellationToken, ConversionError, InputFile, MemorySink, NoopObserver,
//!     OutputNaming, Packager, ProcessedResult, Session,
//! };
//!
//! let naming = OutputNaming::converted("txt");
//! let shout = |file: &InputFile| -> Result<ProcessedResult, ConversionError> {
//!     let data = file.data().to_ascii_uppercase();
//!     Ok(ProcessedResult::new(file, naming.derive(file.name()), "text/plain", data))
//! };
//!
//! let mut session = Session::new();
//! session.add_files([InputFile::new("hello.md", "text/markdown", b"hi".to_vec())]).unwrap();
//! session
//!     .process(&shout, &AcceptList::new(["text/markdown"]), &mut NoopObserver, &CancellationToken::new())
//!     .unwrap();
//!
//! let mut sink = MemorySink::default();
//! let receipt = session.download(&Packager::new("texts.zip"), &mut sink).unwrap();
//! assert_eq!(receipt.name, "hello_converted.txt");
//! ```

#![warn(missing_docs)]

mod cancel;
mod error;
mod event;
mod file;
mod naming;
mod package;
pub mod pipeline;
mod session;
mod sink;

pub use cancel::CancellationToken;
pub use error::{BatchError, ConversionError, ItemError, ItemFailure, Result};
pub use event::{BatchEvent, ChannelObserver, EventLog, NoopObserver, Observer};
pub use file::{AcceptList, InputFile, ProcessedResult};
pub use naming::{split_extension, strip_extension, OutputNaming};
pub use package::{archive_entries, Archiver, Artifact, ArtifactKind, CollisionPolicy, Package, Packager, ZipArchiver};
pub use pipeline::{run, BatchOutcome, Transform};
pub use session::{DownloadReceipt, Phase, Session};
pub use sink::{DirectorySink, DownloadSink, MemorySink};
