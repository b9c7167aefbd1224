//! Tracker HTTP adapter (reqwest).
//!
//! Implements the `tib-core` IssueFetchClient port against the tracker REST
//! API: `GET myself` for the auth check, `GET issues?filter=...` for the
//! assigned-open listing.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use tracing::warn;

use tib_core::{
    config::Config,
    domain::{AuthHeaders, RawIssue},
    errors::Error,
    ports::IssueFetchClient,
    Result,
};

#[derive(Clone, Debug)]
pub struct TrackerClient {
    base_url: String,
    queue: String,
    http: reqwest::Client,
}

impl TrackerClient {
    pub fn new(cfg: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(cfg.http_timeout)
            .build()
            .expect("reqwest client build");
        Self {
            base_url: cfg.tracker_api_url.clone(),
            queue: cfg.tracker_queue.clone(),
            http,
        }
    }

    fn myself_url(&self) -> String {
        format!("{}myself", self.base_url)
    }

    fn issues_url(&self) -> String {
        format!(
            "{}issues?filter=queue:{}&filter=assignee:me()&filter=status:open&",
            self.base_url, self.queue
        )
    }
}

#[async_trait]
impl IssueFetchClient for TrackerClient {
    async fn authenticate(&self, token: &str) -> Result<AuthHeaders> {
        let headers = AuthHeaders::oauth(token)?;

        let resp = self
            .http
            .get(self.myself_url())
            .header(AUTHORIZATION, headers.authorization())
            .send()
            .await
            .map_err(|e| Error::Auth(format!("auth request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            warn!("auth check returned status {status}");
            return Err(Error::Auth(format!("tracker returned status {status}")));
        }

        Ok(headers)
    }

    async fn list_assigned_open_issues(&self, headers: &AuthHeaders) -> Result<Vec<RawIssue>> {
        let resp = self
            .http
            .get(self.issues_url())
            .header(AUTHORIZATION, headers.authorization())
            .send()
            .await
            .map_err(|e| Error::MalformedRequest(format!("listing request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                "listing returned status {status}: {}",
                body.chars().take(200).collect::<String>()
            );
            return Err(Error::Fetch(format!("tracker returned status {status}")));
        }

        resp.json::<Vec<RawIssue>>()
            .await
            .map_err(|e| Error::Fetch(format!("undecodable listing body: {e}")))
    }
}
