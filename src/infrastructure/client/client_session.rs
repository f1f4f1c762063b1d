use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;

use crate::application::ports::ClientError;
use crate::application::services::{
    DEFAULT_POLL_INTERVAL, JobStatusStore, PollingHandle, PollingScheduler,
};

use super::gateway_client::{ClientSubmission, GatewayClient, SessionUser};
use super::response_interceptor::{ResponseLogger, SessionExpiryInterceptor};

/// One principal's view of the gateway: client, job store and poller.
///
/// The store is emptied as soon as the gateway rejects the session, and
/// polling stops on the same rejection. Logging out does both explicitly.
pub struct ClientSession {
    client: Arc<GatewayClient>,
    store: Arc<JobStatusStore>,
    expiry: Arc<SessionExpiryInterceptor>,
    poll_interval: Duration,
    polling: Mutex<Option<PollingHandle>>,
}

impl ClientSession {
    /// Polls every [`DEFAULT_POLL_INTERVAL`] unless told otherwise.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let store = Arc::new(JobStatusStore::new());
        let expired_store = Arc::clone(&store);
        let expiry = Arc::new(SessionExpiryInterceptor::new(move || {
            expired_store.clear();
        }));

        let client = GatewayClient::new(base_url)?
            .with_interceptor(Arc::new(ResponseLogger))
            .with_interceptor(expiry.clone());

        Ok(Self {
            client: Arc::new(client),
            store,
            expiry,
            poll_interval: DEFAULT_POLL_INTERVAL,
            polling: Mutex::new(None),
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    pub fn store(&self) -> Arc<JobStatusStore> {
        Arc::clone(&self.store)
    }

    /// True once the gateway has rejected this session's token.
    pub fn is_expired(&self) -> bool {
        self.expiry.has_fired()
    }

    pub fn is_polling(&self) -> bool {
        self.polling
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(PollingHandle::is_running)
    }

    /// Logs in and starts polling the principal's jobs.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionUser, ClientError> {
        self.stop_polling().await;
        self.store.clear();

        let user = self.client.login(username, password).await?;
        self.expiry.reset();

        let handle = PollingScheduler::new(
            self.client.clone(),
            Arc::clone(&self.store),
            self.poll_interval,
        )
        .start();
        *self.polling.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(user)
    }

    /// Submits a job and asks for an immediate refresh so it shows up without
    /// waiting for the next tick.
    pub async fn submit(&self, submission: ClientSubmission) -> Result<Value, ClientError> {
        let accepted = self.client.submit_job(submission).await?;
        if let Some(handle) = self
            .polling
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            handle.request_refresh();
        }
        Ok(accepted)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.stop_polling().await;
        self.store.clear();
        self.client.logout().await
    }

    async fn stop_polling(&self) {
        let handle = self
            .polling
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }
}
