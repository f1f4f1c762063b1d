use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{BackendClient, BackendError};
use crate::presentation::config::{BackendSettings, ScaffoldSettings};

use super::http_backend_client::HttpBackendClient;
use super::in_memory_backend::InMemoryBackend;

const SCAFFOLD_STAGE_INTERVAL: Duration = Duration::from_secs(2);

pub struct BackendClientFactory;

impl BackendClientFactory {
    pub fn create(
        settings: &BackendSettings,
        scaffold: &ScaffoldSettings,
    ) -> Result<Arc<dyn BackendClient>, BackendError> {
        if scaffold.enabled {
            tracing::info!(
                mock_response_delay_ms = scaffold.mock_response_delay_ms,
                "Scaffold mode: using in-memory backend"
            );
            let backend = InMemoryBackend::new()
                .with_latency(Duration::from_millis(scaffold.mock_response_delay_ms))
                .with_auto_progress(SCAFFOLD_STAGE_INTERVAL);
            return Ok(Arc::new(backend));
        }

        let url = settings.url.trim();
        if url.is_empty() {
            return Err(BackendError::Transport("backend.url is required".to_string()));
        }
        let client = HttpBackendClient::new(url, Duration::from_secs(settings.request_timeout_secs))?;
        tracing::info!(backend_url = %client.base_url(), "Using HTTP backend");
        Ok(Arc::new(client))
    }
}
