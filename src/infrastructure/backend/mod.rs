mod backend_factory;
mod http_backend_client;
mod in_memory_backend;

pub use backend_factory::BackendClientFactory;
pub use http_backend_client::HttpBackendClient;
pub use in_memory_backend::{InMemoryBackend, SEED_ADMIN_PASSWORD, SEED_ADMIN_USERNAME};
