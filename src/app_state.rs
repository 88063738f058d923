use std::sync::Arc;

use crate::{config::Config, error::AppResult, infrastructure::EntityStore};

/// Shared by every handler: the single storage handle plus configuration
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EntityStore>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let store = EntityStore::connect(
            &config.database.url,
            config.database.max_connections,
            config.server.node_id,
        )
        .await?;
        store.init().await?;

        Ok(Self {
            store: Arc::new(store),
            config,
        })
    }

    pub fn with_store(store: Arc<EntityStore>, config: Config) -> Self {
        Self { store, config }
    }
}
