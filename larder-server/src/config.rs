//! Server configuration from environment variables.

use std::time::Duration;

use anyhow::{Context, Result};
use larder_ai::LlmProvider;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a single model call. `None` leaves calls unbounded.
    pub ai_timeout: Option<Duration>,
    pub provider: LlmProvider,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let ai_timeout = match std::env::var("AI_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().context("Invalid AI_TIMEOUT_SECS")?;
                if secs == 0 {
                    anyhow::bail!("AI_TIMEOUT_SECS must be greater than zero");
                }
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,
            ai_timeout,
            provider: LlmProvider::from_env()?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
