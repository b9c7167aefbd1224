//! Orchestrator: token → headers → raw issues → (filter) → normalized issues.
//!
//! Both entry points are linear, stateless compositions. Authentication
//! always precedes the listing call; the freshness filter, when applied,
//! runs before normalization so the raw date fields it needs still exist.

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::domain::NormalizedIssue;
use crate::freshness::select_fresh;
use crate::normalize::normalize_all;
use crate::ports::IssueFetchClient;
use crate::timewindow::TimeWindow;
use crate::Result;

pub struct IssuePipeline {
    client: Arc<dyn IssueFetchClient>,
    timezone: chrono_tz::Tz,
    freshness_window: chrono::Duration,
    warn_lead_start: chrono::Duration,
    warn_lead_end: chrono::Duration,
}

impl IssuePipeline {
    pub fn new(cfg: &Config, client: Arc<dyn IssueFetchClient>) -> Self {
        Self {
            client,
            timezone: cfg.timezone,
            freshness_window: cfg.freshness_window,
            warn_lead_start: cfg.warn_lead_start,
            warn_lead_end: cfg.warn_lead_end,
        }
    }

    /// All open issues assigned to the token's user.
    ///
    /// `Err(Auth/Fetch/..)` means the round failed and the user has to act;
    /// `Ok(vec![])` means the user legitimately has zero open issues.
    pub async fn fetch_all_open_issues(&self, token: &str) -> Result<Vec<NormalizedIssue>> {
        let headers = self.client.authenticate(token).await?;
        let raws = self.client.list_assigned_open_issues(&headers).await?;
        Ok(normalize_all(&raws))
    }

    /// Open issues that changed in the trailing freshness window or entered
    /// the pre-deadline warn band, relative to wall-clock "now".
    pub async fn fetch_latest_issues(&self, token: &str) -> Result<Vec<NormalizedIssue>> {
        let headers = self.client.authenticate(token).await?;
        let raws = self.client.list_assigned_open_issues(&headers).await?;

        let window = self.window_now();
        let fresh = select_fresh(raws, &window);
        info!("freshness filter kept {} issue(s)", fresh.len());
        Ok(normalize_all(&fresh))
    }

    /// The window anchored at the current instant. The cutoff is recomputed
    /// per lookup, never frozen at process start.
    pub fn window_now(&self) -> TimeWindow {
        TimeWindow::current(
            self.timezone,
            self.freshness_window,
            self.warn_lead_start,
            self.warn_lead_end,
        )
    }

    pub fn timezone(&self) -> chrono_tz::Tz {
        self.timezone
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AuthHeaders, RawIssue, RawSlaEntry, RawStatus};
    use crate::errors::Error;
    use async_trait::async_trait;
    use chrono::Utc;

    struct FakeTracker {
        token: &'static str,
        issues: Vec<RawIssue>,
        fetch_fails: bool,
    }

    #[async_trait]
    impl IssueFetchClient for FakeTracker {
        async fn authenticate(&self, token: &str) -> crate::Result<AuthHeaders> {
            if token == self.token {
                AuthHeaders::oauth(token)
            } else {
                Err(Error::Auth("server returned status 401".to_string()))
            }
        }

        async fn list_assigned_open_issues(
            &self,
            _headers: &AuthHeaders,
        ) -> crate::Result<Vec<RawIssue>> {
            if self.fetch_fails {
                return Err(Error::Fetch("server returned status 500".to_string()));
            }
            Ok(self.issues.clone())
        }
    }

    fn pipeline(tracker: FakeTracker) -> IssuePipeline {
        IssuePipeline {
            client: Arc::new(tracker),
            timezone: chrono_tz::Europe::Moscow,
            freshness_window: chrono::Duration::minutes(20),
            warn_lead_start: chrono::Duration::minutes(240),
            warn_lead_end: chrono::Duration::minutes(210),
        }
    }

    fn issue(summary: &str, fail_at: &str) -> RawIssue {
        RawIssue {
            summary: Some(summary.to_string()),
            status: Some(RawStatus {
                code: Some("open".to_string()),
                display: Some("open".to_string()),
            }),
            sla: vec![RawSlaEntry {
                fail_at: Some(fail_at.to_string()),
                warn_at: Some(fail_at.to_string()),
            }],
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn valid_token_yields_normalized_issues() {
        let p = pipeline(FakeTracker {
            token: "good",
            issues: vec![issue("A", "2099-01-01T00:00:00.000000+0000")],
            fetch_fails: false,
        });
        let out = p.fetch_all_open_issues("good").await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "A");
        assert_eq!(out[0].status, "open");
    }

    #[tokio::test]
    async fn invalid_token_is_an_auth_error() {
        let p = pipeline(FakeTracker {
            token: "good",
            issues: Vec::new(),
            fetch_fails: false,
        });
        let err = p.fetch_all_open_issues("bad").await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn fetch_failure_short_circuits() {
        let p = pipeline(FakeTracker {
            token: "good",
            issues: Vec::new(),
            fetch_fails: true,
        });
        let err = p.fetch_latest_issues("good").await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }

    #[tokio::test]
    async fn unparseable_record_is_dropped_not_fatal() {
        let p = pipeline(FakeTracker {
            token: "good",
            issues: vec![issue("broken", "str")],
            fetch_fails: false,
        });
        let out = p.fetch_all_open_issues("good").await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn zero_open_issues_is_ok_empty() {
        let p = pipeline(FakeTracker {
            token: "good",
            issues: Vec::new(),
            fetch_fails: false,
        });
        let out = p.fetch_all_open_issues("good").await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn latest_keeps_just_updated_issue() {
        let fmt = "%Y-%m-%dT%H:%M:%S%.6f%z";
        let now = Utc::now();
        let mut fresh = issue("fresh", &(now + chrono::Duration::days(30)).format(fmt).to_string());
        fresh.created_at = Some((now - chrono::Duration::days(1)).format(fmt).to_string());
        fresh.updated_at = Some(now.format(fmt).to_string());

        let mut stale = issue("stale", &(now + chrono::Duration::days(30)).format(fmt).to_string());
        stale.created_at = Some((now - chrono::Duration::days(1)).format(fmt).to_string());
        stale.updated_at = Some((now - chrono::Duration::minutes(21)).format(fmt).to_string());

        let p = pipeline(FakeTracker {
            token: "good",
            issues: vec![fresh, stale],
            fetch_fails: false,
        });
        let out = p.fetch_latest_issues("good").await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "fresh");
    }
}
