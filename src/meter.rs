//! HTTP client for the meter device and the fetch orchestration around it.
//!
//! The device answers `GET /InstantView/request/getPowerProfile.html` with a
//! power profile document; `ts` selects the unix second of the last wanted
//! sample (`0` for "now") and `n` the number of samples ending there.
//! [`MeterSession`] owns the [`History`] and drives it from fetched profiles:
//! periodic tail updates and an abortable backfill loop for older data. All
//! buffer mutation happens on the caller's thread; the session only enforces
//! the at-most-one-in-flight rule with a pending flag.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::history::{History, SAMPLE_RATE_SECS};
use crate::profile::{PowerProfile, ProfileError};

/// Samples requested for the very first tail fetch.
const INITIAL_BATCH: usize = 300;

/// Upper bound on samples per request; the device truncates anyway.
const MAX_BATCH: usize = 1000;

/// Samples requested per backfill step.
const BACKFILL_BATCH: usize = 100;

/// Errors raised by the meter client.
#[derive(Debug, Error)]
pub enum MeterError {
    /// The meter answered with a non-success HTTP status
    #[error("meter returned HTTP status {0}")]
    Status(u16),

    /// The request never completed
    #[error("network error talking to the meter: {0}")]
    Network(String),

    /// The response body was not a usable profile document
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Blocking HTTP client for one meter device.
pub struct PowerMeter {
    host: String,
}

impl PowerMeter {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn profile_url(&self, ts: i64, n: usize) -> String {
        format!(
            "http://{}/InstantView/request/getPowerProfile.html?ts={}&n={}",
            self.host, ts, n
        )
    }

    /// Fetch a profile of `n` samples ending at `endts` (`None` for the
    /// meter's current time). Blocking; run on a worker thread when driving
    /// a UI.
    pub fn read_power_profile(
        &self,
        endts: Option<DateTime<Utc>>,
        n: usize,
    ) -> Result<PowerProfile, MeterError> {
        let ts = endts.map(|t| t.timestamp()).unwrap_or(0);
        let url = self.profile_url(ts, n);
        tracing::debug!(%url, "requesting power profile");

        let mut response = match ureq::get(&url).call() {
            Ok(resp) => resp,
            Err(ureq::Error::StatusCode(status)) => return Err(MeterError::Status(status)),
            Err(e) => return Err(MeterError::Network(e.to_string())),
        };
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| MeterError::Network(e.to_string()))?;

        let profile = PowerProfile::parse(&body)?;
        tracing::debug!(samples = profile.values.len(), "profile received");
        Ok(profile)
    }

    /// Read the wattage of the most recent sample. `Ok(None)` when the meter
    /// answered with an empty profile.
    pub fn read_current_wattage(&self) -> Result<Option<i32>, MeterError> {
        let profile = self.read_power_profile(None, 1)?;
        Ok(profile.values.last().copied())
    }
}

/// A polling session against one meter: the client plus the history it feeds.
///
/// `update` and `backfill` are guarded by a shared pending flag so a slow
/// request cannot be stacked under a second one by the caller's timer.
pub struct MeterSession {
    meter: PowerMeter,
    history: History,
    request_pending: bool,
}

impl MeterSession {
    pub fn new(meter: PowerMeter, capacity: usize) -> Self {
        Self {
            meter,
            history: History::new(capacity),
            request_pending: false,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    /// Fetch the newest samples and append them. Returns the number of
    /// samples the history grew by; `Ok(0)` and no request when one is
    /// already pending.
    pub fn update(&mut self) -> Result<usize, MeterError> {
        if self.request_pending {
            tracing::debug!("update skipped, request already pending");
            return Ok(0);
        }
        self.request_pending = true;
        let result = self.fetch_tail();
        self.request_pending = false;
        result
    }

    fn fetch_tail(&mut self) -> Result<usize, MeterError> {
        let n = match self.history.endts() {
            // one sample per elapsed second since the last one we hold,
            // plus one for the current second
            Some(endts) => ((Utc::now() - endts).num_seconds().max(0) as usize + 1)
                .min(MAX_BATCH),
            None => INITIAL_BATCH.min(self.history.capacity().max(1)),
        };
        let profile = self.meter.read_power_profile(None, n)?;
        let before = self.history.count();
        self.history.add(&profile);
        let grown = self.history.count().saturating_sub(before);
        tracing::info!(appended = grown, total = self.history.count(), "history updated");
        Ok(grown)
    }

    /// Fetch older profiles and prepend them until the history spans `span`,
    /// capacity is reached, or the meter runs out of data. `abort` is checked
    /// between batches, mirroring how an interactive caller cancels a long
    /// backfill. Returns the number of samples gained.
    pub fn backfill(
        &mut self,
        span: Duration,
        abort: impl Fn() -> bool,
    ) -> Result<usize, MeterError> {
        if self.request_pending {
            tracing::debug!("backfill skipped, request already pending");
            return Ok(0);
        }
        self.request_pending = true;
        let result = self.fetch_backwards(span, abort);
        self.request_pending = false;
        result
    }

    fn fetch_backwards(
        &mut self,
        span: Duration,
        abort: impl Fn() -> bool,
    ) -> Result<usize, MeterError> {
        let mut gained = 0;
        loop {
            if abort() {
                tracing::debug!("backfill aborted");
                break;
            }
            let (Some(startts), Some(endts)) = (self.history.startts(), self.history.endts())
            else {
                // nothing to prepend before; the first update has to run first
                break;
            };
            if endts - startts >= span || self.history.count() >= self.history.capacity() {
                break;
            }

            let batch_end = startts - Duration::seconds(SAMPLE_RATE_SECS);
            let profile = self
                .meter
                .read_power_profile(Some(batch_end), BACKFILL_BATCH)?;
            if profile.values.is_empty() {
                tracing::debug!("meter has no older data, backfill done");
                break;
            }

            let before = self.history.count();
            self.history.prepend(&profile);
            let step = self.history.count().saturating_sub(before);
            if step == 0 {
                // fully overlapped batch, no progress to be made
                break;
            }
            gained += step;
        }
        if gained > 0 {
            tracing::info!(prepended = gained, total = self.history.count(), "backfill finished");
        }
        Ok(gained)
    }
}
