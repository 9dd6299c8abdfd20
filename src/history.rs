//! Wattage sample history buffer.
//!
//! [`History`] keeps the samples retained for the current session: a
//! capacity-bounded, contiguous run of seconds anchored at a start timestamp.
//! Seconds for which no reading was received are kept as `None` slots rather
//! than dropped, so an index always maps to the same wall-clock second and
//! the buffer length reflects elapsed time, not the number of readings.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::profile::PowerProfile;

/// Sampling interval of the meter in seconds. The device reports exactly one
/// wattage value per second; all index/timestamp arithmetic goes through this
/// constant.
pub const SAMPLE_RATE_SECS: i64 = 1;

/// One wattage observation at 1-second resolution.
///
/// `value` is `None` when the meter delivered no reading for that second.
/// Zero watts and "unknown" are distinct states and must never be conflated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PowerSample {
    /// Wall-clock second this sample belongs to
    pub timestamp: DateTime<Utc>,
    /// Measured wattage, `None` for a gap
    pub value: Option<i32>,
}

/// Capacity-bounded, gap-tolerant store of wattage samples.
///
/// Batches arrive from the meter as [`PowerProfile`]s and are merged at the
/// tail with [`add`](History::add) or at the head with
/// [`prepend`](History::prepend); both detect overlap with already-stored
/// seconds and gaps in the timeline. Index `i` always denotes
/// `startts + i * SAMPLE_RATE_SECS`.
///
/// All accessors are total: out-of-range reads yield `None`, never an error,
/// so the render path can probe freely while data streams in.
#[derive(Clone, Debug, Serialize)]
pub struct History {
    data: Vec<Option<i32>>,
    startts: Option<DateTime<Utc>>,
    capacity: usize,
}

impl History {
    /// Create an empty history retaining at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::new(),
            startts: None,
            capacity,
        }
    }

    /// Maximum number of samples retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the retention limit. Shrinking trims immediately, discarding
    /// the oldest samples first.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.trim_front();
    }

    /// Number of samples currently stored, gap slots included.
    pub fn count(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Timestamp of the first stored sample.
    pub fn startts(&self) -> Option<DateTime<Utc>> {
        self.startts
    }

    /// Timestamp of the last stored sample, `None` while the buffer is empty.
    pub fn endts(&self) -> Option<DateTime<Utc>> {
        if self.data.is_empty() {
            return None;
        }
        self.startts
            .map(|start| start + Duration::seconds((self.data.len() as i64 - 1) * SAMPLE_RATE_SECS))
    }

    /// Largest wattage currently stored, ignoring gap slots.
    pub fn max_value(&self) -> Option<i32> {
        self.data.iter().flatten().copied().max()
    }

    /// Append a profile at the tail.
    ///
    /// The first batch anchors the buffer at the profile's start. Later
    /// batches are merged against the current end of the timeline: seconds
    /// the buffer already holds are skipped, and if the device clock ran
    /// ahead of the last batch the missing seconds are filled with gap slots
    /// so the timeline stays contiguous.
    pub fn add(&mut self, profile: &PowerProfile) {
        match self.endts() {
            Some(endts) => {
                let gap =
                    (profile.startts() - endts).num_seconds() - SAMPLE_RATE_SECS;
                if gap > 0 {
                    tracing::debug!(missing = gap, "gap before new batch, filling with unknowns");
                    self.data.extend(std::iter::repeat(None).take(gap as usize));
                    self.data.extend(profile.values.iter().map(|&v| Some(v)));
                } else {
                    // overlapping or contiguous: drop the leading values that
                    // duplicate seconds we already hold
                    let skip = (-gap) as usize;
                    if skip < profile.values.len() {
                        self.data
                            .extend(profile.values[skip..].iter().map(|&v| Some(v)));
                    }
                }
            }
            None => {
                self.startts = Some(profile.startts());
                self.data = profile.values.iter().map(|&v| Some(v)).collect();
            }
        }
        self.trim_front();
    }

    /// Insert an older profile before the current start.
    ///
    /// Trailing values that duplicate the buffer's leading seconds are
    /// dropped (the already-stored values win); a gap between the profile's
    /// end and the current start is padded with gap slots. Ignored while the
    /// buffer has no anchor yet, and when the overlap swallows the whole
    /// batch.
    pub fn prepend(&mut self, profile: &PowerProfile) {
        let Some(startts) = self.startts else {
            tracing::debug!("prepend on an empty history ignored");
            return;
        };
        if profile.values.is_empty() {
            return;
        }

        let mut block: Vec<Option<i32>> = profile.values.iter().map(|&v| Some(v)).collect();
        let overlap = block.len() as i64
            - (startts - profile.startts()).num_seconds() / SAMPLE_RATE_SECS;
        if overlap > 0 {
            let keep = block.len().saturating_sub(overlap as usize);
            block.truncate(keep);
        } else if overlap < 0 {
            // older batch ends before our start: pad up to the head
            block.extend(std::iter::repeat(None).take((-overlap) as usize));
        }
        if block.is_empty() {
            return;
        }

        self.startts = Some(startts - Duration::seconds(block.len() as i64 * SAMPLE_RATE_SECS));
        self.data.splice(0..0, block);
        // capacity still bounds the total span, so a large prepend may lose
        // part of what it just inserted
        self.trim_front();
    }

    /// Drop all samples and the timeline anchor. Capacity is kept.
    pub fn purge(&mut self) {
        self.data.clear();
        self.startts = None;
    }

    /// Sample at `index`, `None` when the buffer is unanchored or the index
    /// is past the end.
    pub fn get_sample(&self, index: usize) -> Option<PowerSample> {
        let start = self.startts?;
        if index >= self.data.len() {
            return None;
        }
        Some(PowerSample {
            timestamp: start + Duration::seconds(index as i64 * SAMPLE_RATE_SECS),
            value: self.data[index],
        })
    }

    /// Sample at `index` with the value replaced by the rounded mean of the
    /// present values in `data[index..index + block_size]` (clipped at the
    /// buffer end). A block with no readings at all keeps the `None` value,
    /// so a gap still renders as a gap after resampling.
    pub fn get_sample_averaged(&self, index: usize, block_size: usize) -> Option<PowerSample> {
        let base = self.get_sample(index)?;
        if block_size <= 1 {
            return Some(base);
        }
        let end = (index + block_size).min(self.data.len());
        let mut sum: i64 = 0;
        let mut present: i64 = 0;
        for value in self.data[index..end].iter().flatten() {
            sum += *value as i64;
            present += 1;
        }
        if present == 0 {
            return Some(base);
        }
        Some(PowerSample {
            timestamp: base.timestamp,
            value: Some((sum as f64 / present as f64).round() as i32),
        })
    }

    /// Iterate all stored samples in timeline order.
    pub fn samples(&self) -> impl Iterator<Item = PowerSample> + '_ {
        (0..self.data.len()).filter_map(|i| self.get_sample(i))
    }

    fn trim_front(&mut self) {
        if self.data.len() <= self.capacity {
            return;
        }
        let excess = self.data.len() - self.capacity;
        self.data.drain(..excess);
        if let Some(start) = self.startts {
            self.startts =
                Some(start + Duration::seconds(excess as i64 * SAMPLE_RATE_SECS));
        }
        tracing::trace!(trimmed = excess, "dropped oldest samples over capacity");
    }
}
