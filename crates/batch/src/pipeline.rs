//! The batch pipeline: validate, transform, report, collect.
//!
//! Items run one after another. Each transform finishes before the next one
//! starts, which keeps progress reporting monotonic and result order equal to
//! input order.

use crate::cancel::CancellationToken;
use crate::error::{BatchError, ConversionError, ItemError, ItemFailure, Result};
use crate::event::{BatchEvent, Observer};
use crate::file::{AcceptList, InputFile, ProcessedResult};
use tracing::{debug, info, warn};

/// Per-file operation turning one input into one result.
pub trait Transform {
    /// Transform a single file. Failing only drops this file from the batch.
    fn apply(&self, file: &InputFile) -> std::result::Result<ProcessedResult, ConversionError>;
}

impl<F> Transform for F
where
    F: Fn(&InputFile) -> std::result::Result<ProcessedResult, ConversionError>,
{
    fn apply(&self, file: &InputFile) -> std::result::Result<ProcessedResult, ConversionError> {
        self(file)
    }
}

/// Everything a completed run produced.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Successful results in input order
    pub results: Vec<ProcessedResult>,
    /// Skipped and failed items in input order
    pub failures: Vec<ItemFailure>,
    /// Number of items in the batch
    pub total: usize,
}

impl BatchOutcome {
    /// Items skipped because of their media type
    pub fn unsupported_count(&self) -> usize {
        self.failures.iter().filter(|f| f.error.is_unsupported()).count()
    }

    /// Items whose transform failed
    pub fn conversion_failure_count(&self) -> usize {
        self.failures.len() - self.unsupported_count()
    }
}

/// Progress after `completed` of `total` items, rounded down.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed.min(total) * 100) / total) as u8
}

/// Run `transform` over `files`.
///
/// Files whose media type is not in `accept` are skipped and recorded as
/// [`ItemError::UnsupportedType`]. A failing transform is logged and recorded,
/// and the run continues with the next file. Progress is reported to
/// `observer` after every file and ends at exactly 100.
///
/// # Errors
/// - [`BatchError::EmptyBatch`] if `files` is empty
/// - [`BatchError::Cancelled`] if `cancel` was set before a file started
/// - [`BatchError::NoValidResults`] if no file produced a result
pub fn run<T>(
    files: &[InputFile],
    transform: &T,
    accept: &AcceptList,
    observer: &mut dyn Observer,
    cancel: &CancellationToken,
) -> Result<BatchOutcome>
where
    T: Transform + ?Sized,
{
    if files.is_empty() {
        return Err(BatchError::EmptyBatch);
    }

    let total = files.len();
    let mut results = Vec::with_capacity(total);
    let mut failures = Vec::new();

    observer.on_event(&BatchEvent::Started { total });

    for (index, file) in files.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(completed = index, total, "Batch cancelled");
            return Err(BatchError::Cancelled { completed: index, total });
        }

        observer.on_event(&BatchEvent::ItemStarted {
            index,
            name: file.name().to_string(),
        });

        match process_item(file, transform, accept) {
            Ok(result) => {
                debug!(
                    file = %file.name(),
                    output = %result.output_name,
                    bytes_in = file.size(),
                    bytes_out = result.size(),
                    "Processed file"
                );
                observer.on_event(&BatchEvent::ItemSucceeded {
                    index,
                    name: file.name().to_string(),
                    output_name: result.output_name.clone(),
                });
                results.push(result);
            }
            Err(error) => {
                warn!(file = %file.name(), error = %error, "Error processing file");
                observer.on_event(&BatchEvent::ItemFailed {
                    index,
                    name: file.name().to_string(),
                    reason: error.to_string(),
                });
                failures.push(ItemFailure {
                    index,
                    name: file.name().to_string(),
                    error,
                });
            }
        }

        observer.on_event(&BatchEvent::Progress(progress_percent(index + 1, total)));
    }

    observer.on_event(&BatchEvent::Finished {
        succeeded: results.len(),
        failed: failures.len(),
    });
    info!(total, succeeded = results.len(), failed = failures.len(), "Batch finished");

    if results.is_empty() {
        return Err(BatchError::NoValidResults { total, failures });
    }

    Ok(BatchOutcome {
        results,
        failures,
        total,
    })
}

fn process_item<T>(
    file: &InputFile,
    transform: &T,
    accept: &AcceptList,
) -> std::result::Result<ProcessedResult, ItemError>
where
    T: Transform + ?Sized,
{
    if !accept.accepts(file.media_type()) {
        return Err(ItemError::UnsupportedType {
            media_type: file.media_type().to_string(),
        });
    }
    Ok(transform.apply(file)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventLog, NoopObserver};
    use proptest::prelude::*;

    fn png(name: &str) -> InputFile {
        InputFile::new(name, "image/png", name.as_bytes().to_vec())
    }

    fn upper(file: &InputFile) -> std::result::Result<ProcessedResult, ConversionError> {
        Ok(ProcessedResult::new(
            file,
            format!("{}.out", file.name()),
            "application/octet-stream",
            file.data().to_ascii_uppercase(),
        ))
    }

    fn failing_on(bad: &'static str) -> impl Fn(&InputFile) -> std::result::Result<ProcessedResult, ConversionError> {
        move |file| {
            if file.name() == bad {
                Err(ConversionError::new("Failed to convert image."))
            } else {
                upper(file)
            }
        }
    }

    #[test]
    fn test_empty_batch_fails_fast() {
        let mut log = EventLog::default();
        let err = run(&[], &upper, &AcceptList::images(), &mut log, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, BatchError::EmptyBatch));
        assert!(log.events.is_empty());
    }

    #[test]
    fn test_unsupported_type_is_skipped() {
        let files = vec![png("a.png"), InputFile::new("b.txt", "text/plain", b"hello".to_vec())];
        let accept = AcceptList::new(["image/png", "image/jpeg"]);
        let mut log = EventLog::default();

        let outcome = run(&files, &upper, &accept, &mut log, &CancellationToken::new()).unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].source.name(), "a.png");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.unsupported_count(), 1);
        assert_eq!(outcome.failures[0].name, "b.txt");
        assert_eq!(log.progress(), vec![50, 100]);
    }

    #[test]
    fn test_failed_item_does_not_abort_batch() {
        let files = vec![png("a.png"), png("b.png"), png("c.png")];
        let mut log = EventLog::default();

        let outcome = run(
            &files,
            &failing_on("b.png"),
            &AcceptList::images(),
            &mut log,
            &CancellationToken::new(),
        )
        .unwrap();

        let names: Vec<_> = outcome.results.iter().map(|r| r.source.name()).collect();
        assert_eq!(names, vec!["a.png", "c.png"]);
        assert_eq!(outcome.conversion_failure_count(), 1);
        assert_eq!(log.progress(), vec![33, 66, 100]);
        assert_eq!(
            log.events.last(),
            Some(&BatchEvent::Finished { succeeded: 2, failed: 1 })
        );
    }

    #[test]
    fn test_all_failures_yield_no_valid_results() {
        let files = vec![png("a.png"), png("b.png")];
        let always_fail = |_: &InputFile| -> std::result::Result<ProcessedResult, ConversionError> {
            Err(ConversionError::new("Error loading image."))
        };
        let mut log = EventLog::default();

        let err = run(&files, &always_fail, &AcceptList::images(), &mut log, &CancellationToken::new())
            .unwrap_err();

        match err {
            BatchError::NoValidResults { total, failures } => {
                assert_eq!(total, 2);
                assert_eq!(failures.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(log.progress().last(), Some(&100));
    }

    #[test]
    fn test_cancel_between_items() {
        let files = vec![png("a.png"), png("b.png"), png("c.png")];
        let token = CancellationToken::new();
        let trigger = token.clone();
        let mut observer = |event: &BatchEvent| {
            if matches!(event, BatchEvent::ItemSucceeded { index: 0, .. }) {
                trigger.cancel();
            }
        };

        let err = run(&files, &upper, &AcceptList::images(), &mut observer, &token).unwrap_err();
        assert!(matches!(err, BatchError::Cancelled { completed: 1, total: 3 }));
    }

    #[test]
    fn test_boxed_transform() {
        let boxed: Box<dyn Transform> = Box::new(upper);
        let outcome = run(
            &[png("a.png")],
            boxed.as_ref(),
            &AcceptList::images(),
            &mut NoopObserver,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(outcome.results[0].data, b"A.PNG");
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(5, 3), 100);
    }

    fn batch_strategy() -> impl Strategy<Value = Vec<(bool, bool)>> {
        // (accepted media type, transform succeeds)
        prop::collection::vec((any::<bool>(), any::<bool>()), 1..40)
    }

    proptest! {
        #[test]
        fn results_are_an_ordered_subset(layout in batch_strategy()) {
            let files: Vec<InputFile> = layout
                .iter()
                .enumerate()
                .map(|(i, (accepted, ok))| {
                    let media = if *accepted { "image/png" } else { "text/plain" };
                    let name = format!("{}-{}", i, if *ok { "ok" } else { "bad" });
                    InputFile::new(name, media, vec![i as u8])
                })
                .collect();
            let transform = |file: &InputFile| {
                if file.name().ends_with("bad") {
                    Err(ConversionError::new("boom"))
                } else {
                    upper(file)
                }
            };
            let accept = AcceptList::new(["image/png"]);
            let mut log = EventLog::default();

            match run(&files, &transform, &accept, &mut log, &CancellationToken::new()) {
                Ok(outcome) => {
                    prop_assert!(outcome.results.len() <= files.len());
                    prop_assert_eq!(outcome.results.len() + outcome.failures.len(), files.len());
                    prop_assert!(outcome.results.iter().all(|r| accept.accepts(r.source.media_type())));

                    let expected: Vec<&str> = files
                        .iter()
                        .zip(&layout)
                        .filter(|(_, (accepted, ok))| *accepted && *ok)
                        .map(|(f, _)| f.name())
                        .collect();
                    let actual: Vec<&str> = outcome.results.iter().map(|r| r.source.name()).collect();
                    prop_assert_eq!(actual, expected);
                }
                Err(BatchError::NoValidResults { failures, .. }) => {
                    prop_assert_eq!(failures.len(), files.len());
                }
                Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
            }

            let progress = log.progress();
            prop_assert_eq!(progress.len(), files.len());
            prop_assert!(progress.windows(2).all(|w| w[0] <= w[1]));
            prop_assert_eq!(progress.last().copied(), Some(100));
        }
    }
}
