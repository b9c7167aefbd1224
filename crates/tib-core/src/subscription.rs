//! Per-chat update subscriptions.
//!
//! One long-lived task per subscribed chat. Each task owns its token and
//! cancellation token exclusively; nothing is shared between chats.
//! Cancellation is observed at the top of every iteration and again right
//! after waking from the sleep — never mid-fetch.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::ChatId;
use crate::formatting::render_issue;
use crate::pipeline::IssuePipeline;
use crate::ports::MessagingPort;

pub struct SubscriptionService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    pipeline: Arc<IssuePipeline>,
    messenger: Arc<dyn MessagingPort>,
    poll_interval: Duration,
    state: tokio::sync::Mutex<HashMap<i64, SubscriptionEntry>>,
}

struct SubscriptionEntry {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl SubscriptionService {
    pub fn new(
        pipeline: Arc<IssuePipeline>,
        messenger: Arc<dyn MessagingPort>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                pipeline,
                messenger,
                poll_interval,
                state: tokio::sync::Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Start (or restart) the poll loop for a chat. The task owns a clone of
    /// the token; the caller keeps the session state.
    pub async fn subscribe(&self, chat_id: ChatId, token: String) {
        self.unsubscribe(chat_id).await;

        let cancel = CancellationToken::new();
        let inner = self.inner.clone();
        let cancel_for_task = cancel.clone();
        let handle = tokio::spawn(async move {
            poll_loop(inner, chat_id, token, cancel_for_task).await;
        });

        let mut st = self.inner.state.lock().await;
        st.insert(chat_id.0, SubscriptionEntry { cancel, handle });
        info!("chat {} subscribed to issue updates", chat_id.0);
    }

    /// Stop the poll loop for a chat, if any. Returns whether one existed.
    pub async fn unsubscribe(&self, chat_id: ChatId) -> bool {
        let entry = {
            let mut st = self.inner.state.lock().await;
            st.remove(&chat_id.0)
        };
        match entry {
            Some(entry) => {
                entry.cancel.cancel();
                entry.handle.abort(); // best-effort
                info!("chat {} unsubscribed", chat_id.0);
                true
            }
            None => false,
        }
    }

    pub async fn is_subscribed(&self, chat_id: ChatId) -> bool {
        self.inner.state.lock().await.contains_key(&chat_id.0)
    }
}

async fn poll_loop(
    inner: Arc<ServiceInner>,
    chat_id: ChatId,
    token: String,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            return;
        }

        // A failed round only skips this notification; the loop survives.
        match inner.pipeline.fetch_latest_issues(&token).await {
            Ok(issues) => {
                if !issues.is_empty() {
                    let now = inner.pipeline.window_now().now();
                    for issue in &issues {
                        let html = render_issue(issue, &now);
                        if let Err(e) = inner.messenger.send_html(chat_id, &html).await {
                            warn!("chat {}: failed to send update: {e}", chat_id.0);
                        }
                    }
                }
            }
            Err(e) => warn!("chat {}: update round failed: {e}", chat_id.0),
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = sleep(inner.poll_interval) => {}
        }
        if cancel.is_cancelled() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AuthHeaders, RawIssue, RawSlaEntry, RawStatus};
    use crate::pipeline::IssuePipeline;
    use crate::ports::IssueFetchClient;
    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Mutex;

    struct FreshTracker;

    #[async_trait]
    impl IssueFetchClient for FreshTracker {
        async fn authenticate(&self, token: &str) -> crate::Result<AuthHeaders> {
            AuthHeaders::oauth(token)
        }

        async fn list_assigned_open_issues(
            &self,
            _headers: &AuthHeaders,
        ) -> crate::Result<Vec<RawIssue>> {
            let fmt = "%Y-%m-%dT%H:%M:%S%.6f%z";
            let now = Utc::now();
            Ok(vec![RawIssue {
                summary: Some("hot".to_string()),
                status: Some(RawStatus {
                    code: Some("open".to_string()),
                    display: Some("Open".to_string()),
                }),
                sla: vec![RawSlaEntry {
                    fail_at: Some((now + chrono::Duration::days(30)).format(fmt).to_string()),
                    warn_at: Some((now + chrono::Duration::days(30)).format(fmt).to_string()),
                }],
                created_at: Some(now.format(fmt).to_string()),
                updated_at: Some(now.format(fmt).to_string()),
            }])
        }
    }

    #[derive(Default)]
    struct RecordingMessenger {
        sent: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl MessagingPort for RecordingMessenger {
        async fn send_html(&self, chat_id: ChatId, html: &str) -> crate::Result<()> {
            self.sent.lock().await.push((chat_id.0, html.to_string()));
            Ok(())
        }
    }

    fn pipeline() -> Arc<IssuePipeline> {
        let cfg = test_config();
        Arc::new(IssuePipeline::new(&cfg, Arc::new(FreshTracker)))
    }

    fn test_config() -> crate::config::Config {
        crate::config::Config {
            telegram_bot_token: "t".to_string(),
            tracker_api_url: "https://tracker.example/v2/".to_string(),
            tracker_queue: "PCR".to_string(),
            http_timeout: Duration::from_secs(1),
            timezone: chrono_tz::Europe::Moscow,
            freshness_window: chrono::Duration::minutes(20),
            warn_lead_start: chrono::Duration::minutes(240),
            warn_lead_end: chrono::Duration::minutes(210),
            poll_interval: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn subscribe_polls_and_sends_updates() {
        let messenger = Arc::new(RecordingMessenger::default());
        let svc = SubscriptionService::new(pipeline(), messenger.clone(), Duration::from_millis(5));

        svc.subscribe(ChatId(42), "tok".to_string()).await;
        assert!(svc.is_subscribed(ChatId(42)).await);

        tokio::time::sleep(Duration::from_millis(100)).await;
        svc.unsubscribe(ChatId(42)).await;

        let sent = messenger.sent.lock().await;
        assert!(!sent.is_empty());
        assert_eq!(sent[0].0, 42);
        assert!(sent[0].1.contains("hot"));
    }

    #[tokio::test]
    async fn unsubscribe_stops_the_loop() {
        let messenger = Arc::new(RecordingMessenger::default());
        let svc = SubscriptionService::new(
            pipeline(),
            messenger.clone(),
            Duration::from_millis(5),
        );

        svc.subscribe(ChatId(1), "tok".to_string()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(svc.unsubscribe(ChatId(1)).await);
        assert!(!svc.is_subscribed(ChatId(1)).await);

        let count_after_cancel = messenger.sent.lock().await.len();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(messenger.sent.lock().await.len(), count_after_cancel);
    }

    #[tokio::test]
    async fn unsubscribe_without_subscription_is_false() {
        let messenger = Arc::new(RecordingMessenger::default());
        let svc = SubscriptionService::new(pipeline(), messenger, Duration::from_millis(5));
        assert!(!svc.unsubscribe(ChatId(9)).await);
    }
}
