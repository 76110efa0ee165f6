use std::sync::Arc;

use anyhow::anyhow;
use tracing::error;

use workchat_db::Database;
use workchat_identity::Identity;

use crate::config::Config;
use crate::error::ServiceError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub identity: Arc<dyn Identity>,
    pub config: Config,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, identity: Arc<dyn Identity>, config: Config) -> AppState {
        Arc::new(Self { db, identity, config })
    }
}

/// Run store and password-hashing work off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ServiceError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ServiceError::Store(anyhow!("blocking task failed: {}", e))
        })?
}
