//! Application state for dependency injection.

use std::sync::Arc;

use user_service_lib::service::UserService;

use crate::config::GatewayConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserService>,
    pub config: GatewayConfig,
}

impl AppState {
    /// Create new app state.
    pub fn new(users: Arc<dyn UserService>, config: GatewayConfig) -> Self {
        Self { users, config }
    }
}
