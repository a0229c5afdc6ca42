pub mod handlers;
pub mod models;
pub mod routes;

use std::sync::Arc;

use crate::config::Config;
use crate::model::CompletionProvider;

/// Shared, read-only state handed to every handler.
pub struct AppState {
    pub config: Config,
    pub provider: Arc<dyn CompletionProvider>,
}

impl AppState {
    pub fn new(config: Config, provider: Arc<dyn CompletionProvider>) -> Self {
        Self { config, provider }
    }
}
