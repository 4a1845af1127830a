//! # Aligned Range Scanning
//!
//! Reads the complete lines belonging to one byte range of a larger file.
//! A range that begins mid-line discards that partial line (the previous
//! range owns it); the line that starts before the range's end is consumed
//! in full even when it runs past the nominal end, so every line in the file
//! is visited by exactly one range.

use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

use tracing::debug;

use crate::aggregate::RangeStats;
use crate::extract::RecordExtractor;
use crate::range::ByteRange;

/// Iterator over the complete lines owned by one byte range.
///
/// Not restartable: it consumes the reader's position. One reader per
/// worker; two scanners must never share a cursor.
pub struct RangeScanner<R> {
    reader: BufReader<R>,
    range: ByteRange,
    /// Offset of the next unread byte, tracked locally to avoid seek calls.
    pos: u64,
    done: bool,
    buf: Vec<u8>,
}

impl<R: Read + Seek> RangeScanner<R> {
    pub fn new(inner: R, range: ByteRange) -> std::io::Result<Self> {
        let mut reader = BufReader::new(inner);
        reader.seek(SeekFrom::Start(range.start))?;

        let mut scanner = Self {
            reader,
            range,
            pos: range.start,
            done: range.is_empty(),
            buf: Vec::new(),
        };

        // A non-zero start is almost certainly mid-line; the line in
        // progress at `start` belongs to the previous range. Skipped
        // unconditionally, even when `start` lands exactly on a line
        // boundary: the previous scanner reads through its `end`, so the
        // line starting there is already accounted for.
        if !scanner.done && range.start != 0 {
            let skipped = scanner.read_raw_line()?;
            debug!(
                start = range.start,
                skipped_bytes = skipped,
                "aligned to next line boundary"
            );
        }

        Ok(scanner)
    }

    /// Reads one raw line into the internal buffer, returning bytes read
    /// (0 at end of file). Advances `pos` past the line and its newline.
    fn read_raw_line(&mut self) -> std::io::Result<usize> {
        self.buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> Iterator for RangeScanner<R> {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        // Checked before the read, so a line is consumed whole even when it
        // runs past `end`. Strictly greater: the line starting exactly at
        // `end` is still ours, because the next range's alignment skip will
        // discard it.
        if self.pos > self.range.end {
            self.done = true;
            return None;
        }
        match self.read_raw_line() {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                let mut line = String::from_utf8_lossy(&self.buf).into_owned();
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Some(Ok(line))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Scan one range and fold every extracted record into a [`RangeStats`].
///
/// Lines the extractor rejects are skipped, never fatal; an I/O error mid
/// range aborts this range only and is reported by the caller as that
/// range's failure.
pub fn scan_range<R: Read + Seek>(
    inner: R,
    range: ByteRange,
    extractor: &dyn RecordExtractor,
) -> std::io::Result<RangeStats> {
    let mut stats = RangeStats::default();
    for line in RangeScanner::new(inner, range)? {
        let line = line?;
        stats.lines_scanned += 1;
        if let Some(record) = extractor.extract(&line) {
            stats.record(&record);
        }
    }
    Ok(stats)
}
