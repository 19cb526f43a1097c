pub mod api;
pub mod config;
pub mod error;
pub mod notion;

use std::sync::Arc;
use config::Config;
use notion::PageCreator;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub notion: Arc<dyn PageCreator>,
}
