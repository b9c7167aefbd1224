use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup, KeyboardRemove},
};

use tib_core::domain::ChatId;
use tib_core::formatting::issue_list_header;
use tib_core::session::SessionState;

use crate::handlers::send_issues;
use crate::router::AppState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Choice {
    Yes,
    No,
}

fn parse_choice(text: &str) -> Option<Choice> {
    match text.trim().to_lowercase().as_str() {
        "yes" => Some(Choice::Yes),
        "no" => Some(Choice::No),
        _ => None,
    }
}

fn choice_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new("yes"),
        KeyboardButton::new("no"),
    ]])
    .resize_keyboard(true)
}

pub async fn handle_text(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat = ChatId(msg.chat.id.0);
    let Some(text) = msg.text().map(|s| s.trim().to_string()) else {
        return Ok(());
    };
    if text.is_empty() {
        return Ok(());
    }

    match state.sessions.get(chat).await {
        None => {
            bot.send_message(msg.chat.id, "Send /start to begin.").await?;
        }
        Some(SessionState::AwaitingToken) => {
            process_token(bot, msg, state, text).await?;
        }
        Some(SessionState::AwaitingSubscriptionChoice { token }) => {
            process_choice(bot, msg, state, token, &text).await?;
        }
        Some(SessionState::Subscribed { .. }) => {
            bot.send_message(
                msg.chat.id,
                "You are subscribed to updates. /status shows all your open \
                 issues, /cancel stops the updates.",
            )
            .await?;
        }
    }

    Ok(())
}

/// The message is treated as the tracker token: validate it by fetching the
/// full issue list, then offer the subscription.
async fn process_token(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
    token: String,
) -> ResponseResult<()> {
    let chat = ChatId(msg.chat.id.0);

    match state.pipeline.fetch_all_open_issues(&token).await {
        Err(e) => {
            tracing::warn!("chat {}: token check failed: {e}", chat.0);
            // Stay in AwaitingToken so the user can retry.
            bot.send_message(msg.chat.id, "Invalid token. Please try again.")
                .await?;
            return Ok(());
        }
        Ok(issues) if issues.is_empty() => {
            bot.send_message(msg.chat.id, "You have no open issues yet.")
                .await?;
        }
        Ok(issues) => {
            bot.send_message(msg.chat.id, issue_list_header()).await?;
            send_issues(&bot, msg.chat.id, &state, &issues).await?;
        }
    }

    state
        .sessions
        .set(chat, SessionState::AwaitingSubscriptionChoice { token })
        .await;

    bot.send_message(
        msg.chat.id,
        "Would you like to subscribe to your tracker updates?",
    )
    .reply_markup(choice_keyboard())
    .await?;

    Ok(())
}

async fn process_choice(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
    token: String,
    text: &str,
) -> ResponseResult<()> {
    let chat = ChatId(msg.chat.id.0);

    match parse_choice(text) {
        None => {
            bot.send_message(msg.chat.id, "Wrong choice. Please use the keyboard.")
                .await?;
        }
        Some(Choice::No) => {
            state.sessions.clear(chat).await;
            bot.send_message(msg.chat.id, "No it is, then. Come back any time with /start.")
                .reply_markup(KeyboardRemove::new())
                .await?;
        }
        Some(Choice::Yes) => {
            state
                .sessions
                .set(
                    chat,
                    SessionState::Subscribed {
                        token: token.clone(),
                    },
                )
                .await;
            state.subscriptions.subscribe(chat, token).await;

            let minutes = state.cfg.poll_interval.as_secs() / 60;
            bot.send_message(
                msg.chat.id,
                format!(
                    "From now on you will get updates every {minutes} minutes, \
                     whenever there are any. Send /cancel to stop."
                ),
            )
            .reply_markup(KeyboardRemove::new())
            .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_parsing_is_case_insensitive() {
        assert_eq!(parse_choice("yes"), Some(Choice::Yes));
        assert_eq!(parse_choice(" YES "), Some(Choice::Yes));
        assert_eq!(parse_choice("No"), Some(Choice::No));
        assert_eq!(parse_choice("maybe"), None);
        assert_eq!(parse_choice(""), None);
    }
}
