use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client runtime configuration.
///
/// Defaults are overridable by an `estate.toml` next to the binary and by
/// `ESTATE_*` environment variables.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub log_level: String,

    /// The single durable piece of client state: where the auth token
    /// lives between runs.
    pub token_path: String,

    pub request_timeout_secs: u64,

    /// Notification poll cadence while authenticated.
    pub notification_poll_secs: u64,

    /// How long a confirmed trade stays on screen before the modal closes.
    pub success_display_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:4000/api".to_string(),
            log_level: "info".to_string(),
            token_path: ".estate/session.token".to_string(),
            request_timeout_secs: 10,
            notification_poll_secs: 30,
            success_display_ms: 2000,
        }
    }
}

impl ClientConfig {
    pub fn load() -> anyhow::Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Config::try_from(&ClientConfig::default())?)
            .add_source(config::File::with_name("estate").required(false))
            .add_source(config::Environment::with_prefix("ESTATE"))
            .build()
            .context("Failed to assemble configuration")?;

        cfg.try_deserialize()
            .context("Invalid configuration values")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.notification_poll_secs)
    }

    pub fn success_display(&self) -> Duration {
        Duration::from_millis(self.success_display_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_poll_every_thirty_seconds() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.poll_interval(), Duration::from_secs(30));
        assert_eq!(cfg.success_display(), Duration::from_millis(2000));
    }
}
