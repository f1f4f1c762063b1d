mod access_policy;
mod gateway_error;
mod gateway_service;
mod job_status_store;
mod polling_scheduler;
mod prompt_selector;

pub use access_policy::{AccessRequirement, TokenResolution};
pub use gateway_error::GatewayError;
pub use gateway_service::{
    Acknowledgement, ArtifactDownload, CreateUserInput, DownloadTarget, GatewayService,
    LoginInput, SubmissionInput,
};
pub use job_status_store::{JobStatusStore, ReconcileSummary};
pub use polling_scheduler::{DEFAULT_POLL_INTERVAL, PollingHandle, PollingScheduler, refresh_once};
pub use prompt_selector::ActiveResourceSelector;
