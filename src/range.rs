use serde::Serialize;

use crate::error::EngineError;

/// Half-open span `[start, end)` of file offsets assigned to one worker.
///
/// A scanner may read past `end` to finish the last line that starts inside
/// the range; the planner itself never produces overlapping spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Split `[0, file_size)` into `workers` contiguous ranges.
///
/// Integer division sizes every range except the last, which absorbs the
/// remainder so no trailing bytes are dropped. A zero-length file plans to
/// no ranges at all.
pub fn plan_ranges(file_size: u64, workers: u32) -> Result<Vec<ByteRange>, EngineError> {
    if workers == 0 {
        return Err(EngineError::InvalidConfiguration(
            "workers must be at least 1".to_string(),
        ));
    }
    if file_size == 0 {
        return Ok(Vec::new());
    }

    let workers = workers as u64;
    let chunk = file_size / workers;
    let mut ranges = Vec::with_capacity(workers as usize);

    for i in 0..workers {
        let start = i * chunk;
        let end = if i == workers - 1 {
            file_size
        } else {
            (i + 1) * chunk
        };
        ranges.push(ByteRange { start, end });
    }

    Ok(ranges)
}
