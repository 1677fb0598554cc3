use std::sync::Arc;

use anyhow::Result;

use crate::backend::{BackendApi, HttpBackend};
use crate::config::Config;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn BackendApi>,
}

impl AppState {
    /// State backed by the real HTTP backend client
    pub fn new(config: Config) -> Result<SharedState> {
        let backend = HttpBackend::new(&config)?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    pub fn with_backend(config: Config, backend: Arc<dyn BackendApi>) -> SharedState {
        Arc::new(Self { config, backend })
    }
}
