mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    BackendSettings, LoggingSettings, ScaffoldSettings, ServerSettings,
    SessionSettings, Settings,
};
