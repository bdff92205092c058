//! Offset-range restriction and its tracker.

use super::{Progress, RestrictionSplit, RestrictionTracker};
use serde::{Deserialize, Serialize};

/// The half-open offset interval `[from, to)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OffsetRange {
    pub from: i64,
    pub to: i64,
}

impl OffsetRange {
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    pub fn size(&self) -> i64 {
        (self.to - self.from).max(0)
    }
}

/// Claims offsets in strictly increasing order within an [`OffsetRange`].
pub struct OffsetRangeTracker {
    range: OffsetRange,
    last_claimed: Option<i64>,
    last_attempted: Option<i64>,
}

impl OffsetRangeTracker {
    pub fn new(range: OffsetRange) -> Self {
        Self {
            range,
            last_claimed: None,
            last_attempted: None,
        }
    }
}

impl RestrictionTracker for OffsetRangeTracker {
    type Restriction = OffsetRange;
    type Position = i64;

    fn current_restriction(&self) -> OffsetRange {
        self.range
    }

    fn try_claim(&mut self, position: i64) -> bool {
        debug_assert!(
            self.last_attempted.map_or(true, |last| position > last),
            "claims must be strictly increasing: {position} after {:?}",
            self.last_attempted
        );
        self.last_attempted = Some(position);
        if position < self.range.from || position >= self.range.to {
            return false;
        }
        self.last_claimed = Some(position);
        true
    }

    fn try_split(&mut self, fraction_of_remainder: f64) -> Option<RestrictionSplit<OffsetRange>> {
        // Split positions are measured from the last attempted offset; the
        // max(1) keeps the split point past anything already attempted, so a
        // checkpoint (fraction 0) hands back everything not yet started.
        let cur = self.last_attempted.unwrap_or(self.range.from - 1);
        let by_fraction = (self.range.to - cur) as f64 * fraction_of_remainder;
        let split_offset = cur + (by_fraction.max(1.0) as i64);
        if split_offset >= self.range.to {
            return None;
        }
        let residual = OffsetRange::new(split_offset, self.range.to);
        self.range = OffsetRange::new(self.range.from, split_offset);
        Some(RestrictionSplit {
            primary: self.range,
            residual,
        })
    }

    fn check_done(&self) -> anyhow::Result<()> {
        if self.range.size() == 0 {
            return Ok(());
        }
        match self.last_attempted {
            Some(last) if last >= self.range.to - 1 => Ok(()),
            last => Err(anyhow::anyhow!(
                "offset range [{}, {}) has unprocessed offsets: last attempted {:?}",
                self.range.from,
                self.range.to,
                last
            )),
        }
    }

    fn progress(&self) -> Option<Progress> {
        let done = self
            .last_attempted
            .map(|last| (last + 1 - self.range.from).clamp(0, self.range.size()))
            .unwrap_or(0);
        Some(Progress {
            completed: done as f64,
            remaining: (self.range.size() - done) as f64,
        })
    }
}
