use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use vitalmon_common::types::{Reading, ReadingKind};

/// A subject's readings over a trailing window, ordered oldest first.
pub struct ReadingHistory {
    now: DateTime<Utc>,
    readings: Vec<Reading>,
}

impl ReadingHistory {
    pub fn new(mut readings: Vec<Reading>, now: DateTime<Utc>) -> Self {
        readings.sort_by_key(|r| r.observed_at);
        Self { now, readings }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Readings observed within `window` of now.
    pub fn within(&self, window: Duration) -> impl Iterator<Item = &Reading> {
        let cutoff = self.now - window;
        self.readings
            .iter()
            .filter(move |r| r.observed_at >= cutoff && r.observed_at <= self.now)
    }

    /// The last `n` readings of `kind` within `window`, oldest first.
    /// Fewer than `n` are returned when the window holds fewer.
    pub fn latest(&self, kind: &ReadingKind, window: Duration, n: usize) -> Vec<&Reading> {
        let matching: Vec<&Reading> = self.within(window).filter(|r| &r.kind == kind).collect();
        let skip = matching.len().saturating_sub(n);
        matching.into_iter().skip(skip).collect()
    }

    pub fn kinds_within(&self, window: Duration) -> HashSet<ReadingKind> {
        self.within(window).map(|r| r.kind.clone()).collect()
    }

    pub fn count_within(&self, window: Duration) -> usize {
        self.within(window).count()
    }
}
