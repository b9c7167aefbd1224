use async_trait::async_trait;

use crate::domain::{AuthHeaders, ChatId, RawIssue};
use crate::Result;

/// Hexagonal port for the issue tracker API.
///
/// The HTTP adapter lives in `tib-tracker`; tests plug in mocks.
#[async_trait]
pub trait IssueFetchClient: Send + Sync {
    /// Validate a user token and produce the credential bundle for
    /// subsequent calls. `Error::Auth` means "no such user / bad token";
    /// it is never retried automatically.
    async fn authenticate(&self, token: &str) -> Result<AuthHeaders>;

    /// List open issues assigned to the authenticated user.
    async fn list_assigned_open_issues(&self, headers: &AuthHeaders) -> Result<Vec<RawIssue>>;
}

/// Hexagonal port for outbound messaging.
///
/// Telegram is the first implementation; the subscription loop only needs
/// plain HTML sends, so the port stays minimal.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<()>;
}
