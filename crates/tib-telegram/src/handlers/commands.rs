use std::sync::Arc;

use teloxide::prelude::*;

use tib_core::domain::ChatId;
use tib_core::formatting::issue_list_header;
use tib_core::session::SessionState;

use crate::handlers::send_issues;
use crate::router::AppState;

const OAUTH_URL: &str =
    "https://oauth.yandex-team.ru/authorize?response_type=token&client_id=5f671d781aca402ab7460fde4050267b";

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let (cmd, _args) = parse_command(msg.text().unwrap_or(""));

    match cmd.as_str() {
        "start" => start(bot, msg, state).await,
        "cancel" => cancel(bot, msg, state).await,
        "status" => status(bot, msg, state).await,
        _ => {
            bot.send_message(msg.chat.id, "Unknown command. I know /start, /status and /cancel.")
                .await?;
            Ok(())
        }
    }
}

/// Entry point of the dialogue: wipe any stale session and ask for a token.
async fn start(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat = ChatId(msg.chat.id.0);

    // The user may restart mid-dialogue; tear down whatever was running.
    if state.sessions.clear(chat).await.is_some() {
        state.subscriptions.unsubscribe(chat).await;
    }
    state.sessions.set(chat, SessionState::AwaitingToken).await;

    bot.send_message(
        msg.chat.id,
        format!(
            "Hi! Let's get started. To work with your issue list I need your \
             organization token. Open this link under the right account and \
             send me the token generated there: {OAUTH_URL}"
        ),
    )
    .await?;
    bot.send_message(
        msg.chat.id,
        "The link takes you to the tracker's authentication page. The token \
         is kept inside this dialogue only. Send /cancel whenever you want to \
         wipe it and finish the conversation.",
    )
    .await?;

    Ok(())
}

/// `/cancel` (or a bare "cancel"): stop updates and forget everything.
pub async fn cancel(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat = ChatId(msg.chat.id.0);

    if state.sessions.clear(chat).await.is_none() {
        return Ok(());
    }
    state.subscriptions.unsubscribe(chat).await;

    bot.send_message(
        msg.chat.id,
        "Aloha! (which means both 'hello' and 'goodbye' in Hawaiian)",
    )
    .await?;
    Ok(())
}

/// `/status`: every open issue assigned to the user, right now.
async fn status(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat = ChatId(msg.chat.id.0);

    let Some(token) = state
        .sessions
        .get(chat)
        .await
        .and_then(|s| s.token().map(str::to_string))
    else {
        bot.send_message(
            msg.chat.id,
            "No token on file. Send /start and your token first.",
        )
        .await?;
        return Ok(());
    };

    match state.pipeline.fetch_all_open_issues(&token).await {
        Err(e) => {
            tracing::warn!("chat {}: /status failed: {e}", chat.0);
            bot.send_message(
                msg.chat.id,
                "Invalid token or no such user. Please try again.",
            )
            .await?;
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

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_addressed_commands() {
        assert_eq!(parse_command("/start"), ("start".to_string(), String::new()));
        assert_eq!(
            parse_command("/status@tracker_issue_bot"),
            ("status".to_string(), String::new())
        );
        assert_eq!(
            parse_command("/cancel now please"),
            ("cancel".to_string(), "now please".to_string())
        );
        assert_eq!(parse_command("/STATUS"), ("status".to_string(), String::new()));
    }
}
