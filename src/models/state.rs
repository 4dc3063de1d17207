use std::sync::Arc;

use super::{Config, Error};
use crate::{
    db,
    features::history::{JobHistoryRepository, MemoryJobHistory, PgJobHistory},
};

pub struct AppState {
    pub instance_id: String,
    pub config: Config,
    pub history: Arc<dyn JobHistoryRepository>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("instance_id", &self.instance_id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub async fn new(config: Config, migrate: bool) -> Result<Arc<AppState>, Error> {
        let instance_id = instance_id();
        let pool = db::connect(&config, &instance_id).await?;
        if migrate {
            db::migrate(&pool).await?;
        }
        let history = Arc::new(PgJobHistory::new(pool));
        Ok(AppState::with_history(instance_id, config, history))
    }

    pub fn in_memory(config: Config) -> Arc<AppState> {
        AppState::with_history(instance_id(), config, Arc::new(MemoryJobHistory::new()))
    }

    pub fn with_history(
        instance_id: String,
        config: Config,
        history: Arc<dyn JobHistoryRepository>,
    ) -> Arc<AppState> {
        Arc::new(AppState {
            instance_id,
            config,
            history,
        })
    }
}

fn instance_id() -> String {
    let hostname = whoami::hostname();
    format!("{}:1", hostname)
}
