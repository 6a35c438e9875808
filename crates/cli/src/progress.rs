//! Progress indicators
//!
//! A batch progress bar fed by pipeline events.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use snapimg_batch::{BatchEvent, Observer};
use std::time::Duration;

/// Progress bar measured in percent, as reported by the pipeline
pub fn percent_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}") {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb
}

/// [`Observer`] drawing batch events on a progress bar.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    /// Draw on the terminal
    pub fn new() -> Self {
        Self { bar: percent_bar() }
    }

    /// Draw nothing (for `--json` and non-interactive runs)
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Draw only when stderr is a terminal
    pub fn for_stderr() -> Self {
        if console::Term::stderr().is_term() {
            Self::new()
        } else {
            Self::hidden()
        }
    }

    /// Underlying bar
    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_event(&mut self, event: &BatchEvent) {
        match event {
            BatchEvent::Started { .. } => {
                self.bar.set_position(0);
                self.bar.enable_steady_tick(Duration::from_millis(100));
            }
            BatchEvent::ItemStarted { name, .. } => self.bar.set_message(name.clone()),
            BatchEvent::ItemFailed { name, reason, .. } => {
                self.bar.println(format!("{} {}: {}", "✗".red(), name, reason));
            }
            BatchEvent::Progress(percent) => self.bar.set_position(u64::from(*percent)),
            BatchEvent::Finished { .. } => self.bar.finish_and_clear(),
            BatchEvent::ItemSucceeded { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_tracks_progress() {
        let mut observer = ProgressObserver::hidden();
        observer.on_event(&BatchEvent::Started { total: 2 });
        observer.on_event(&BatchEvent::Progress(50));
        assert_eq!(observer.bar().position(), 50);

        observer.on_event(&BatchEvent::Progress(100));
        observer.on_event(&BatchEvent::Finished { succeeded: 2, failed: 0 });
        assert_eq!(observer.bar().position(), 100);
        assert!(observer.bar().is_finished());
    }
}
