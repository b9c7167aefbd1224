//! Selects raw issues that are recently changed or soon-to-fail.
//!
//! Runs BEFORE normalization so the raw `createdAt`/`updatedAt` fields are
//! still present. Unlike normalization this filter is all-or-nothing: one
//! record without the expected keys aborts the whole call to an empty set,
//! which the pipeline surfaces as "no fresh issues" rather than an error.

use tracing::warn;

use crate::domain::RawIssue;
use crate::timewindow::{parse_tracker_timestamp, TimeWindow};
use crate::Result;

/// An issue is fresh when it was created or updated inside the freshness
/// window, or its first SLA deadline is inside the warn band.
fn is_fresh(raw: &RawIssue, window: &TimeWindow) -> Result<bool> {
    let created_at = parse_tracker_timestamp("createdAt", raw.created_at()?)?;
    let updated_at = parse_tracker_timestamp("updatedAt", raw.updated_at()?)?;
    if window.is_recent(created_at) || window.is_recent(updated_at) {
        return Ok(true);
    }

    let fail_at = parse_tracker_timestamp("sla[0].failAt", raw.sla_fail_at()?)?;
    Ok(window.is_in_warn_band(fail_at))
}

/// Stable filter: surviving issues keep their input order.
pub fn select_fresh(raws: Vec<RawIssue>, window: &TimeWindow) -> Vec<RawIssue> {
    let mut out = Vec::with_capacity(raws.len());
    for raw in raws {
        match is_fresh(&raw, window) {
            Ok(true) => out.push(raw),
            Ok(false) => {}
            Err(e) => {
                warn!("freshness filter aborted, malformed record: {e}");
                return Vec::new();
            }
        }
    }
    out
}
