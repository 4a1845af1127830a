//! # logsift
//!
//! Concurrent byte-range analysis for large line-oriented log files. A file
//! is split into contiguous byte ranges, each range is scanned by one
//! worker after correcting for mid-line boundaries, and the per-range
//! results are reduced into a single aggregate report. The worker pool
//! underneath is generic: any set of keyed work items with a per-item
//! timeout, streamed back in completion order.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod logging;
pub mod pool;
pub mod range;
pub mod scan;

pub use aggregate::{AggregateReport, RangeStats, reduce};
pub use engine::{AnalyzeOptions, analyze_file};
pub use error::EngineError;
pub use extract::{JsonFieldMatcher, LogRecord, PatternMatcher, RecordExtractor};
pub use pool::{CancelToken, OutcomeStatus, Outcomes, TaskOutcome, WorkItem, WorkerPool};
pub use range::{ByteRange, plan_ranges};
pub use scan::{RangeScanner, scan_range};
