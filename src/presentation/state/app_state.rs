use std::sync::Arc;

use crate::application::services::GatewayService;
use crate::presentation::config::SessionSettings;

/// Shared handler state. Holds no per-request or per-user data.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<GatewayService>,
    pub session: Arc<SessionSettings>,
}

impl AppState {
    pub fn new(gateway: Arc<GatewayService>, session: SessionSettings) -> Self {
        Self {
            gateway,
            session: Arc::new(session),
        }
    }
}
