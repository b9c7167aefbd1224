//! Per-chat conversation state.
//!
//! The dialogue is a small finite-state machine driven by user messages:
//! token entry → subscription choice → subscribed. State lives in memory
//! only; `/cancel` (or restart) wipes it.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::ChatId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the user to paste their tracker OAuth token.
    AwaitingToken,
    /// Token accepted; waiting for a yes/no on periodic updates.
    AwaitingSubscriptionChoice { token: String },
    /// A poll loop is running for this chat.
    Subscribed { token: String },
}

impl SessionState {
    /// The stored token, when the dialogue has one.
    pub fn token(&self) -> Option<&str> {
        match self {
            SessionState::AwaitingToken => None,
            SessionState::AwaitingSubscriptionChoice { token }
            | SessionState::Subscribed { token } => Some(token),
        }
    }
}

/// In-memory session store keyed by chat. Each chat owns its state
/// exclusively; the map mutex is only held for lookups and swaps.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<i64, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, chat_id: ChatId) -> Option<SessionState> {
        self.inner.lock().await.get(&chat_id.0).cloned()
    }

    pub async fn set(&self, chat_id: ChatId, state: SessionState) {
        self.inner.lock().await.insert(chat_id.0, state);
    }

    /// Remove the session entirely (token included). Returns the previous
    /// state so the caller can tear down a running subscription.
    pub async fn clear(&self, chat_id: ChatId) -> Option<SessionState> {
        self.inner.lock().await.remove(&chat_id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dialogue_progression() {
        let store = SessionStore::new();
        let chat = ChatId(7);

        assert_eq!(store.get(chat).await, None);

        store.set(chat, SessionState::AwaitingToken).await;
        assert_eq!(store.get(chat).await.unwrap().token(), None);

        store
            .set(
                chat,
                SessionState::AwaitingSubscriptionChoice {
                    token: "t".to_string(),
                },
            )
            .await;
        assert_eq!(store.get(chat).await.unwrap().token(), Some("t"));

        store
            .set(
                chat,
                SessionState::Subscribed {
                    token: "t".to_string(),
                },
            )
            .await;
        assert!(matches!(
            store.get(chat).await,
            Some(SessionState::Subscribed { .. })
        ));

        let prev = store.clear(chat).await;
        assert!(prev.is_some());
        assert_eq!(store.get(chat).await, None);
    }

    #[tokio::test]
    async fn chats_are_independent() {
        let store = SessionStore::new();
        store.set(ChatId(1), SessionState::AwaitingToken).await;
        assert_eq!(store.get(ChatId(2)).await, None);
    }
}
