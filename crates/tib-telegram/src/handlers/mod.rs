//! Telegram update handlers.
//!
//! The dialogue is text-only: commands route to `commands`, everything else
//! is fed into the session state machine in `text`.

use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode};

use tib_core::formatting::render_issue;
use tib_core::domain::NormalizedIssue;

use crate::router::AppState;

mod commands;
mod text;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(txt) = msg.text() else {
        bot.send_message(msg.chat.id, "I only understand text. Try /start.")
            .await?;
        return Ok(());
    };

    if txt.starts_with('/') {
        return commands::handle_command(bot, msg, state).await;
    }

    // Bare "cancel" works like the command, from any state.
    if txt.trim().eq_ignore_ascii_case("cancel") {
        return commands::cancel(bot, msg, state).await;
    }

    text::handle_text(bot, msg, state).await
}

/// One message per issue, imminent ones styled urgently.
pub(crate) async fn send_issues(
    bot: &Bot,
    chat: teloxide::types::ChatId,
    state: &AppState,
    issues: &[NormalizedIssue],
) -> ResponseResult<()> {
    let now = state.pipeline.window_now().now();
    for issue in issues {
        bot.send_message(chat, render_issue(issue, &now))
            .parse_mode(ParseMode::Html)
            .await?;
    }
    Ok(())
}
