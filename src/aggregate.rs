//! # Result Aggregation
//!
//! Single-threaded reduction of per-range results into one report. Workers
//! never touch shared counters; everything is folded here as outcomes
//! arrive off the pool's output stream.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::extract::LogRecord;
use crate::pool::{OutcomeStatus, TaskOutcome};

/// Per-range partial result. Produced by exactly one worker, never mutated
/// after it is returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RangeStats {
    pub match_count: u64,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub lines_scanned: u64,
}

impl RangeStats {
    /// Fold one matching record in, in file order within the range.
    pub fn record(&mut self, record: &LogRecord) {
        self.match_count += 1;
        if let Some(ts) = record.timestamp {
            if self.first_seen.is_none_or(|first| ts < first) {
                self.first_seen = Some(ts);
            }
            if self.last_seen.is_none_or(|last| ts > last) {
                self.last_seen = Some(ts);
            }
        }
    }

    /// Commutative, associative merge: totals sum, first/last take the
    /// min/max of the non-empty timestamps. Cross-range arrival order
    /// therefore cannot affect the final report.
    pub fn merge(mut self, other: RangeStats) -> RangeStats {
        self.match_count += other.match_count;
        self.lines_scanned += other.lines_scanned;
        self.first_seen = min_opt(self.first_seen, other.first_seen);
        self.last_seen = max_opt(self.last_seen, other.last_seen);
        self
    }
}

fn min_opt(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn max_opt(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Final report over every range outcome. Non-success outcomes contribute
/// nothing numerically; their keys are kept so a caller can judge how much
/// confidence the totals deserve.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateReport {
    pub total_count: u64,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    pub lines_scanned: u64,
    pub ranges_completed: u64,
    pub failed_ranges: BTreeSet<String>,
    pub timed_out_ranges: BTreeSet<String>,
    pub cancelled_ranges: BTreeSet<String>,
}

impl AggregateReport {
    /// Fold one outcome into the report.
    pub fn consume(&mut self, outcome: TaskOutcome<RangeStats>) {
        match outcome.status {
            OutcomeStatus::Success(stats) => {
                self.total_count += stats.match_count;
                self.lines_scanned += stats.lines_scanned;
                self.earliest = min_opt(self.earliest, stats.first_seen);
                self.latest = max_opt(self.latest, stats.last_seen);
                self.ranges_completed += 1;
            }
            OutcomeStatus::Failure(_) => {
                self.failed_ranges.insert(outcome.key);
            }
            OutcomeStatus::Timeout => {
                self.timed_out_ranges.insert(outcome.key);
            }
            OutcomeStatus::Cancelled => {
                self.cancelled_ranges.insert(outcome.key);
            }
        }
    }

    /// True when every range resolved successfully; a false value marks the
    /// totals as lower bounds.
    pub fn is_complete(&self) -> bool {
        self.failed_ranges.is_empty()
            && self.timed_out_ranges.is_empty()
            && self.cancelled_ranges.is_empty()
    }
}

/// Streaming single-pass reduction of the pool's output.
pub fn reduce(outcomes: impl IntoIterator<Item = TaskOutcome<RangeStats>>) -> AggregateReport {
    let mut report = AggregateReport::default();
    for outcome in outcomes {
        report.consume(outcome);
    }
    report
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn stats(count: u64, first: Option<i64>, last: Option<i64>) -> RangeStats {
        RangeStats {
            match_count: count,
            first_seen: first.map(ts),
            last_seen: last.map(ts),
            lines_scanned: count,
        }
    }

    #[test]
    fn record_tracks_first_and_last() {
        let mut s = RangeStats::default();
        s.record(&LogRecord {
            timestamp: Some(ts(50)),
        });
        s.record(&LogRecord { timestamp: None });
        s.record(&LogRecord {
            timestamp: Some(ts(10)),
        });
        assert_eq!(s.match_count, 3);
        assert_eq!(s.first_seen, Some(ts(10)));
        assert_eq!(s.last_seen, Some(ts(50)));
    }

    #[test]
    fn merge_ignores_empty_timestamps() {
        let merged = stats(2, Some(100), Some(200)).merge(stats(0, None, None));
        assert_eq!(merged.match_count, 2);
        assert_eq!(merged.first_seen, Some(ts(100)));
        assert_eq!(merged.last_seen, Some(ts(200)));
    }

    #[test]
    fn merge_is_order_independent() {
        let parts = [
            stats(1, Some(300), Some(300)),
            stats(4, Some(10), Some(250)),
            stats(0, None, None),
            stats(2, Some(90), Some(400)),
        ];
        let forward = parts
            .iter()
            .cloned()
            .fold(RangeStats::default(), RangeStats::merge);
        let reverse = parts
            .iter()
            .rev()
            .cloned()
            .fold(RangeStats::default(), RangeStats::merge);
        let rotated = parts
            .iter()
            .cycle()
            .skip(2)
            .take(parts.len())
            .cloned()
            .fold(RangeStats::default(), RangeStats::merge);
        assert_eq!(forward, reverse);
        assert_eq!(forward, rotated);
        assert_eq!(forward.match_count, 7);
        assert_eq!(forward.first_seen, Some(ts(10)));
        assert_eq!(forward.last_seen, Some(ts(400)));
    }

    #[test]
    fn reduce_records_non_success_keys() {
        let outcomes = vec![
            TaskOutcome {
                key: "range-0".to_string(),
                status: OutcomeStatus::Success(stats(3, Some(5), Some(9))),
            },
            TaskOutcome {
                key: "range-1".to_string(),
                status: OutcomeStatus::Failure("disk gone".to_string()),
            },
            TaskOutcome {
                key: "range-2".to_string(),
                status: OutcomeStatus::Timeout,
            },
            TaskOutcome {
                key: "range-3".to_string(),
                status: OutcomeStatus::Cancelled,
            },
        ];
        let report = reduce(outcomes);
        assert_eq!(report.total_count, 3);
        assert_eq!(report.ranges_completed, 1);
        assert!(report.failed_ranges.contains("range-1"));
        assert!(report.timed_out_ranges.contains("range-2"));
        assert!(report.cancelled_ranges.contains("range-3"));
        assert!(!report.is_complete());
    }
}
