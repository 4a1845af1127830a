//! Exactly-once line coverage: for any split of a file into byte ranges,
//! the union of all range scans visits every line once, with no duplicates
//! and no omissions, even when boundaries straddle lines by a single byte.

use std::fs::File;
use std::io::Write;

use logsift::range::{ByteRange, plan_ranges};
use logsift::scan::RangeScanner;

fn write_fixture(lines: &[&str]) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("input.log");
    let mut file = File::create(&path).expect("create fixture");
    for line in lines {
        writeln!(file, "{line}").expect("write line");
    }
    (dir, path)
}

fn lines_in_range(path: &std::path::Path, range: ByteRange) -> Vec<String> {
    let file = File::open(path).expect("open");
    RangeScanner::new(file, range)
        .expect("scanner")
        .map(|l| l.expect("line"))
        .collect()
}

#[test]
fn planner_invariants_hold_for_all_worker_counts() {
    for workers in 1..=64u32 {
        for file_size in [1u64, 2, 63, 64, 65, 1024, 99_991] {
            let ranges = plan_ranges(file_size, workers).expect("plan");
            assert_eq!(ranges.len(), workers as usize);
            assert_eq!(ranges[0].start, 0);
            assert_eq!(ranges.last().unwrap().end, file_size);
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end, pair[1].start, "ranges must be contiguous");
            }
        }
    }
}

#[test]
fn every_line_scanned_exactly_once_for_all_worker_counts() {
    let lines = ["first", "second entry", "x", "a somewhat longer line", ""];
    let (_dir, path) = write_fixture(&lines);
    let file_size = std::fs::metadata(&path).expect("stat").len();

    for workers in 1..=16u32 {
        let ranges = plan_ranges(file_size, workers).expect("plan");
        let mut visited = Vec::new();
        for range in ranges {
            visited.extend(lines_in_range(&path, range));
        }
        assert_eq!(
            visited,
            lines.iter().map(|l| l.to_string()).collect::<Vec<_>>(),
            "workers={workers}"
        );
    }
}

#[test]
fn coverage_survives_boundaries_straddling_lines_by_one_byte() {
    // Line lengths chosen so two-way split points sweep across every
    // interesting position: before, on, and after each newline.
    let lines = ["aa", "bbbb", "c", "ddddddd", "ee"];
    let (_dir, path) = write_fixture(&lines);
    let file_size = std::fs::metadata(&path).expect("stat").len();

    for split in 1..file_size {
        let first = lines_in_range(&path, ByteRange {
            start: 0,
            end: split,
        });
        let second = lines_in_range(&path, ByteRange {
            start: split,
            end: file_size,
        });
        let mut visited = first;
        visited.extend(second);
        assert_eq!(
            visited,
            lines.iter().map(|l| l.to_string()).collect::<Vec<_>>(),
            "split at byte {split}"
        );
    }
}

#[test]
fn file_without_trailing_newline_is_fully_covered() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("input.log");
    std::fs::write(&path, "one\ntwo\nthree").expect("write");
    let file_size = std::fs::metadata(&path).expect("stat").len();

    for workers in 1..=6u32 {
        let ranges = plan_ranges(file_size, workers).expect("plan");
        let visited: Vec<String> = ranges
            .into_iter()
            .flat_map(|r| lines_in_range(&path, r))
            .collect();
        assert_eq!(visited, vec!["one", "two", "three"], "workers={workers}");
    }
}
