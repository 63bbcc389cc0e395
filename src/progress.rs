//! Progress-callback trait for per-stage conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages. The CLI uses this to drive
//! its spinner; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use md2pdf::{ConversionConfig, ConversionProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Log;
//!
//! impl ConversionProgressCallback for Log {
//!     fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
//!         eprintln!("{stage} done in {elapsed_ms}ms");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Log))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::TransformWarning;
use crate::output::ConversionStats;
use std::fmt;
use std::sync::Arc;

/// One step of the conversion pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Building the stylesheet from the theme.
    Style,
    /// Markdown → typed block sequence.
    Transform,
    /// Blocks → full HTML document(s).
    Compose,
    /// Printing the standalone cover document (separate-cover mode only).
    PrintCover,
    /// Printing the content document.
    PrintContent,
    /// Concatenating cover and content PDFs (separate-cover mode only).
    Merge,
    /// Writing the final PDF to disk.
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Style => "Building stylesheet",
            Stage::Transform => "Transforming Markdown",
            Stage::Compose => "Composing HTML",
            Stage::PrintCover => "Printing cover page",
            Stage::PrintContent => "Printing content",
            Stage::Merge => "Merging PDFs",
            Stage::Write => "Writing output",
        };
        f.write_str(label)
    }
}

/// Called by the conversion pipeline as it moves through its stages.
///
/// Implementations must be `Send + Sync` (the print stage runs on tokio's
/// blocking pool). All methods have default no-op implementations so callers
/// only override what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    ///
    /// # Arguments
    /// * `stage`: the stage that finished
    /// * `elapsed_ms`: wall-clock time spent in the stage
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called once per non-fatal transform warning, after the transform stage.
    fn on_warning(&self, warning: &TransformWarning) {
        let _ = warning;
    }

    /// Called once after the PDF has been produced.
    fn on_conversion_complete(&self, stats: &ConversionStats) {
        let _ = stats;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ConversionProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start:{stage:?}"));
        }

        fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
            self.events.lock().unwrap().push(format!("done:{stage:?}"));
        }

        fn on_warning(&self, warning: &TransformWarning) {
            self.events.lock().unwrap().push(format!("warn:{warning}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Style);
        cb.on_stage_complete(Stage::Style, 3);
        cb.on_warning(&TransformWarning::UnknownLanguage {
            language: "x".into(),
        });
        cb.on_conversion_complete(&ConversionStats::default());
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::Transform);
        rec.on_warning(&TransformWarning::UnknownLanguage {
            language: "zz".into(),
        });
        rec.on_stage_complete(Stage::Transform, 1);

        let events = rec.events.lock().unwrap();
        assert_eq!(events[0], "start:Transform");
        assert!(events[1].starts_with("warn:"));
        assert_eq!(events[2], "done:Transform");
    }

    #[test]
    fn stage_labels_are_human_readable() {
        assert_eq!(Stage::PrintContent.to_string(), "Printing content");
        assert_eq!(Stage::Merge.to_string(), "Merging PDFs");
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ConversionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::Write);
    }
}
