use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tib_core::{
    config::Config, pipeline::IssuePipeline, ports::MessagingPort, session::SessionStore,
    subscription::SubscriptionService,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub pipeline: Arc<IssuePipeline>,
    pub sessions: Arc<SessionStore>,
    pub subscriptions: Arc<SubscriptionService>,
}

pub async fn run_polling(cfg: Arc<Config>, pipeline: Arc<IssuePipeline>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        tracing::info!("tib started: @{}", me.username());
    }
    tracing::info!(
        "queue {}, poll interval {:?}",
        cfg.tracker_queue,
        cfg.poll_interval
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let subscriptions = Arc::new(SubscriptionService::new(
        pipeline.clone(),
        messenger,
        cfg.poll_interval,
    ));

    let state = Arc::new(AppState {
        cfg,
        pipeline,
        sessions: Arc::new(SessionStore::new()),
        subscriptions,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
