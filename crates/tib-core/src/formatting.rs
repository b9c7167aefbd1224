//! Rendering of normalized issues for Telegram HTML parse mode.

use chrono::{DateTime, TimeZone};

use crate::domain::NormalizedIssue;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// An issue is imminent once "now" has reached its soft warning timestamp.
pub fn is_imminent<Tz: TimeZone>(issue: &NormalizedIssue, now: &DateTime<Tz>) -> bool {
    *now >= issue.warn_at
}

/// One message per issue. Imminent issues get the urgent styling.
pub fn render_issue<Tz: TimeZone>(issue: &NormalizedIssue, now: &DateTime<Tz>) -> String {
    let title = escape_html(&issue.title);
    let status = escape_html(&issue.status);
    let deadline = issue.deadline.format("%Y-%m-%d %H:%M (%z)");

    if is_imminent(issue, now) {
        format!(
            "❗❗❗ <b>This issue is on fire!</b> ❗❗❗\n\
             <b>Issue</b>: {title}\n\
             <b>Status</b>: {status}\n\
             🔥🔥🔥 <b>Deadline</b>: {deadline}"
        )
    } else {
        format!(
            "<b>Issue</b>: {title}\n\
             <b>Status</b>: {status}\n\
             <b>Deadline</b>: {deadline}"
        )
    }
}

pub fn issue_list_header() -> &'static str {
    "Your current open issues:"
}
