//! Terminal plumbing for snapimg
//!
//! Provides shared CLI functionality:
//! - Status messages and size formatting
//! - A progress bar driven by batch events
//! - Tracing subscriber setup

#![warn(missing_docs)]

pub mod output;
pub mod progress;
pub mod telemetry;
