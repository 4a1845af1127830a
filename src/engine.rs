//! # Analysis Engine
//!
//! Orchestrates a full run: stat the file, plan byte ranges, scan each
//! range on the worker pool with an independently opened file handle, and
//! reduce the outcome stream into one report.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use crate::aggregate::{AggregateReport, RangeStats, reduce};
use crate::error::EngineError;
use crate::extract::RecordExtractor;
use crate::pool::{CancelToken, WorkItem, WorkerPool};
use crate::range::{ByteRange, plan_ranges};
use crate::scan::scan_range;

/// Caller-supplied knobs for one run. No environment coupling: defaults are
/// filled in here, overrides come from whatever frontend drives the engine.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Number of ranges and concurrent execution slots.
    pub workers: u32,
    /// Budget for scanning a single range.
    pub per_range_timeout: Duration,
    /// External stop signal; the engine never cancels on its own.
    pub cancel: CancelToken,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            workers: num_cpus::get() as u32,
            per_range_timeout: Duration::from_secs(30),
            cancel: CancelToken::new(),
        }
    }
}

/// Scan `path` concurrently and aggregate every matching line.
///
/// Each worker opens its own file handle, so no seek cursor is ever shared.
/// A range that hits an I/O error mid-scan resolves as that range's failure
/// and the rest of the run continues.
pub fn analyze_file(
    path: &Path,
    extractor: Arc<dyn RecordExtractor>,
    options: &AnalyzeOptions,
) -> Result<AggregateReport, EngineError> {
    let file_size = std::fs::metadata(path)?.len();
    let ranges = plan_ranges(file_size, options.workers)?;
    if ranges.is_empty() {
        info!(path = %path.display(), "empty file; nothing to scan");
        return Ok(AggregateReport::default());
    }

    let pool = WorkerPool::new(options.workers, options.per_range_timeout)?;
    info!(
        path = %path.display(),
        file_size,
        workers = options.workers,
        "starting range scan"
    );

    let items: Vec<WorkItem<ByteRange>> = ranges
        .into_iter()
        .enumerate()
        .map(|(i, range)| WorkItem::new(format!("range-{i}"), range))
        .collect();

    let scan_path = path.to_path_buf();
    let worker_fn = move |range: ByteRange| -> anyhow::Result<RangeStats> {
        let file = File::open(&scan_path)
            .with_context(|| format!("open {} for range scan", scan_path.display()))?;
        let stats = scan_range(file, range, extractor.as_ref())?;
        Ok(stats)
    };

    let outcomes = pool.run(items, worker_fn, options.cancel.clone());
    let report = reduce(outcomes);

    info!(
        "run_summary total_count={} lines_scanned={} ranges_completed={} failed={} timed_out={} cancelled={}",
        report.total_count,
        report.lines_scanned,
        report.ranges_completed,
        report.failed_ranges.len(),
        report.timed_out_ranges.len(),
        report.cancelled_ranges.len()
    );

    Ok(report)
}
