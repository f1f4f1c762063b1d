use std::net::SocketAddr;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
    pub scaffold: ScaffoldSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    pub url: String,
    pub request_timeout_secs: u64,
}

#[derive(Clone, Deserialize)]
pub struct SessionSettings {
    pub secret: String,
    pub ttl_minutes: i64,
    pub cookie_name: String,
    pub secure_cookie: bool,
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("secret", &"[REDACTED]")
            .field("ttl_minutes", &self.ttl_minutes)
            .field("cookie_name", &self.cookie_name)
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

/// Scaffold mode serves the gateway against the in-memory backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScaffoldSettings {
    pub enabled: bool,
    pub mock_response_delay_ms: u64,
}

impl Settings {
    /// Defaults, then `appsettings.{environment}.toml`, then `APP__*` variables.
    ///
    /// The short variables `BACKEND_URL`, `SCAFFOLD_MODE` and
    /// `MOCK_RESPONSE_DELAY` override their nested keys when set.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("backend.url", "http://localhost:5000")?
            .set_default("backend.request_timeout_secs", 30)?
            .set_default("session.secret", "")?
            .set_default("session.ttl_minutes", 720)?
            .set_default("session.cookie_name", "scribe_session")?
            .set_default("session.secure_cookie", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.enable_json", false)?
            .set_default("scaffold.enabled", false)?
            .set_default("scaffold.mock_response_delay_ms", 0)?
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(url) = non_empty_var("BACKEND_URL") {
            builder = builder.set_override("backend.url", url)?;
        }
        if let Some(flag) = non_empty_var("SCAFFOLD_MODE") {
            let enabled = flag.eq_ignore_ascii_case("true") || flag == "1";
            builder = builder.set_override("scaffold.enabled", enabled)?;
        }
        if let Some(delay) = non_empty_var("MOCK_RESPONSE_DELAY").and_then(|v| v.parse::<u64>().ok())
        {
            builder = builder.set_override("scaffold.mock_response_delay_ms", delay)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
