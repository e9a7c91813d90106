use std::sync::Arc;

use crossbot_core::config::Config;
use crossbot_store::SqliteMappingStore;

#[tokio::main]
async fn main() -> Result<(), crossbot_core::Error> {
    crossbot_core::logging::init("crossbot")?;

    let cfg = Arc::new(Config::load()?);
    let store = Arc::new(SqliteMappingStore::open(&cfg.database_path)?);

    crossbot_discord::router::run(cfg, store)
        .await
        .map_err(|e| crossbot_core::Error::Platform(format!("discord gateway failed: {e}")))?;

    Ok(())
}
