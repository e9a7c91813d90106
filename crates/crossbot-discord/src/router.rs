use std::sync::Arc;

use serenity::http::Http;
use serenity::prelude::*;

use tracing::info;

use crossbot_core::{
    classify::Classifier,
    config::Config,
    domain::UserId,
    ports::{ChatPort, MappingStore},
    relay::RelayDispatcher,
};

use crate::handlers::Handler;
use crate::DiscordChat;

pub struct AppState {
    pub cfg: Arc<Config>,
    pub classifier: Arc<Classifier>,
    pub dispatcher: Arc<RelayDispatcher>,
    pub self_id: serenity::model::id::UserId,
}

/// Connect to the gateway and dispatch events until shutdown.
///
/// Serenity owns the reconnect/backoff loop; one task per event keeps relay
/// waits from blocking anything else.
pub async fn run(cfg: Arc<Config>, store: Arc<dyn MappingStore>) -> anyhow::Result<()> {
    let http = Arc::new(Http::new(&cfg.token));
    let current = http.get_current_user().await?;
    info!("starting as {} ({})", current.name, current.id);
    info!(
        routes = cfg.routes.len(),
        "crosspost routes loaded from configuration"
    );

    let classifier = Arc::new(Classifier::new(cfg.clone(), UserId(current.id.get())));
    let chat: Arc<dyn ChatPort> = Arc::new(DiscordChat::new(http));
    let dispatcher = Arc::new(RelayDispatcher::new(
        cfg.clone(),
        classifier.clone(),
        chat,
        store,
    ));

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        classifier,
        dispatcher,
        self_id: current.id,
    });

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;

    let mut client = Client::builder(&cfg.token, intents)
        .event_handler(Handler::new(state))
        .await?;

    client.start().await?;
    Ok(())
}
