use std::sync::Arc;

use crate::config::Config;
use crate::db::store::RecordStore;
use crate::middleware::auth::{create_principal_cache, PrincipalCache};
use crate::utils::credentials::Credentials;

/// Shared by every handler through axum's `State`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub config: Arc<Config>,
    pub credentials: Credentials,
    pub principals: PrincipalCache,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, config: Config) -> Self {
        Self {
            credentials: Credentials::from_config(&config),
            principals: create_principal_cache(config.principal_cache_ttl),
            store,
            config: Arc::new(config),
        }
    }
}
