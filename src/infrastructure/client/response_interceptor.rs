use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::{Method, StatusCode};

/// What an interceptor sees of each gateway response.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    /// Whether the request carried a session token.
    pub authenticated: bool,
}

/// Hook run, in registration order, on every response the client receives.
pub trait ResponseInterceptor: Send + Sync {
    fn on_response(&self, context: &ResponseContext);
}

/// Fires its callback once when an authenticated request comes back 401.
///
/// A 401 on an unauthenticated request (a failed login) is not an expiry.
pub struct SessionExpiryInterceptor {
    fired: AtomicBool,
    on_expired: Box<dyn Fn() + Send + Sync>,
}

impl SessionExpiryInterceptor {
    pub fn new(on_expired: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            fired: AtomicBool::new(false),
            on_expired: Box::new(on_expired),
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Re-arms the interceptor after a fresh login.
    pub fn reset(&self) {
        self.fired.store(false, Ordering::SeqCst);
    }
}

impl ResponseInterceptor for SessionExpiryInterceptor {
    fn on_response(&self, context: &ResponseContext) {
        if !context.authenticated || context.status != StatusCode::UNAUTHORIZED {
            return;
        }
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!(
            method = %context.method,
            path = %context.path,
            "Session rejected by gateway, ending client session"
        );
        (self.on_expired)();
    }
}

/// Logs every non-2xx response at debug level.
pub struct ResponseLogger;

impl ResponseInterceptor for ResponseLogger {
    fn on_response(&self, context: &ResponseContext) {
        if !context.status.is_success() {
            tracing::debug!(
                method = %context.method,
                path = %context.path,
                status = context.status.as_u16(),
                "Gateway returned an error status"
            );
        }
    }
}
