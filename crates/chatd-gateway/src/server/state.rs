//! Gateway state
//!
//! Shared state handed to every connection handler.

use chatd_common::AppConfig;
use chatd_presence::PresenceHandle;
use std::sync::Arc;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    /// Handle into the presence coordination core
    presence: PresenceHandle,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(presence: PresenceHandle, config: AppConfig) -> Self {
        Self {
            presence,
            config: Arc::new(config),
        }
    }

    /// Get the presence handle
    pub fn presence(&self) -> &PresenceHandle {
        &self.presence
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("presence", &self.presence)
            .finish()
    }
}
