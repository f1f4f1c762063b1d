mod auth;
mod downloads;
mod health;
mod process;
pub mod prompts;
mod reports;
mod transcriptions;
mod users;

pub use auth::{login_handler, logout_handler, session_handler};
pub use downloads::{
    admin_download_word_handler, download_by_job_handler, download_user_text_handler,
    download_word_handler,
};
pub use health::health_handler;
pub use process::{MAX_UPLOAD_BYTES, process_handler};
pub use reports::{logs_handler, stats_handler};
pub use transcriptions::{
    delete_transcription_handler, list_all_transcriptions_handler,
    list_own_transcriptions_handler,
};
pub use users::{create_user_handler, delete_user_handler, list_users_handler};
