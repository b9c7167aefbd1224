//! Pure time-window arithmetic for freshness and deadline classification.
//!
//! "Now" and the timezone are injected by the caller; nothing in here reads
//! the wall clock, which keeps the predicates independently testable.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use chrono_tz::Tz;

use crate::{errors::Error, Result};

/// Fixed tracker timestamp pattern: fractional seconds + numeric UTC offset,
/// e.g. `2017-06-11T05:16:01.339000+0300`.
pub const TRACKER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Parse a tracker timestamp with the fixed format.
pub fn parse_tracker_timestamp(field: &'static str, value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, TRACKER_TIME_FORMAT).map_err(|_| Error::Parse {
        field,
        value: value.to_string(),
    })
}

/// Freshness / warn-band predicates anchored to a single "now" instant.
#[derive(Clone, Copy, Debug)]
pub struct TimeWindow {
    now: DateTime<Tz>,
    freshness: Duration,
    warn_lead_start: Duration,
    warn_lead_end: Duration,
}

impl TimeWindow {
    /// Anchor a window at an explicit instant.
    pub fn at(
        now: DateTime<Tz>,
        freshness: Duration,
        warn_lead_start: Duration,
        warn_lead_end: Duration,
    ) -> Self {
        Self {
            now,
            freshness,
            warn_lead_start,
            warn_lead_end,
        }
    }

    /// Anchor a window at the current wall-clock instant in `tz`.
    pub fn current(
        tz: Tz,
        freshness: Duration,
        warn_lead_start: Duration,
        warn_lead_end: Duration,
    ) -> Self {
        Self::at(
            Utc::now().with_timezone(&tz),
            freshness,
            warn_lead_start,
            warn_lead_end,
        )
    }

    pub fn now(&self) -> DateTime<Tz> {
        self.now
    }

    /// The trailing cutoff: anything at or after `now - freshness` counts as
    /// recently created/updated.
    pub fn freshness_cutoff(&self) -> DateTime<Tz> {
        self.now - self.freshness
    }

    pub fn is_recent(&self, ts: DateTime<FixedOffset>) -> bool {
        ts >= self.freshness_cutoff()
    }

    /// True when `now` falls inside `[fail_at - warn_lead_start,
    /// fail_at - warn_lead_end]`, i.e. the issue will fail soon enough to
    /// warrant a warning but is not already being warned about.
    pub fn is_in_warn_band(&self, fail_at: DateTime<FixedOffset>) -> bool {
        let band_start = fail_at - self.warn_lead_start;
        let band_end = fail_at - self.warn_lead_end;
        band_start <= self.now && self.now <= band_end
    }
}
