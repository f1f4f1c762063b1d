mod client_session;
mod gateway_client;
mod response_interceptor;

pub use client_session::ClientSession;
pub use gateway_client::{ClientSubmission, DownloadedArtifact, GatewayClient, SessionUser};
pub use response_interceptor::{
    ResponseContext, ResponseInterceptor, ResponseLogger, SessionExpiryInterceptor,
};
