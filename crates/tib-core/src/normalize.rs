//! Raw issue → [`NormalizedIssue`] conversion.
//!
//! Normalization is best-effort: a malformed record is logged and dropped,
//! never allowed to abort the batch.

use tracing::warn;

use crate::domain::{NormalizedIssue, RawIssue};
use crate::timewindow::parse_tracker_timestamp;
use crate::Result;

/// Normalize a single raw issue, or report why it cannot be.
pub fn try_normalize(raw: &RawIssue) -> Result<NormalizedIssue> {
    let title = raw.summary()?.to_string();
    let status = raw.status_display()?.to_string();
    let deadline = parse_tracker_timestamp("sla[0].failAt", raw.sla_fail_at()?)?;
    let warn_at = parse_tracker_timestamp("sla[0].warnAt", raw.sla_warn_at()?)?;

    Ok(NormalizedIssue {
        title,
        status,
        deadline,
        warn_at,
    })
}

/// Normalize a batch, preserving order and skipping records that fail.
/// Empty input yields empty output.
pub fn normalize_all(raws: &[RawIssue]) -> Vec<NormalizedIssue> {
    best_effort(raws, "normalize issue", try_normalize)
}

/// Apply a fallible transform to each item, logging and dropping failures.
///
/// This is the batch-robustness primitive: one malformed record must never
/// block the rest.
pub fn best_effort<T, U>(items: &[T], what: &str, f: impl Fn(&T) -> Result<U>) -> Vec<U> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match f(item) {
            Ok(v) => out.push(v),
            Err(e) => warn!("skipping record, {what} failed: {e}"),
        }
    }
    out
}
