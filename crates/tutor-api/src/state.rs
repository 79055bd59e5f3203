use std::sync::Arc;

use tracing::error;

use tutor_db::Database;
use tutor_llm::LlmClient;

use crate::config::Config;
use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: Config,
    llm: Option<Arc<dyn LlmClient>>,
}

impl AppStateInner {
    pub fn new(db: Database, config: Config, llm: Option<Arc<dyn LlmClient>>) -> AppState {
        Arc::new(Self { db, config, llm })
    }

    /// The configured model client, or a 500 when no API key was provided.
    pub fn llm(&self) -> Result<Arc<dyn LlmClient>, ApiError> {
        self.llm.clone().ok_or(ApiError::MissingApiKey)
    }
}

/// Run blocking DB work off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed"))
        })?
        .map_err(ApiError::Internal)
}
