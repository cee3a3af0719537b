//! Typed errors for recipe generation.

use std::time::Duration;
use thiserror::Error;

/// Failures from the text generation capability, classified by cause.
#[derive(Debug, Error)]
pub enum AiError {
    /// The API key is missing or was rejected by the provider.
    #[error("credential rejected by {provider}: {detail}")]
    Credential { provider: String, detail: String },

    /// The provider reports exhausted usage quota.
    #[error("quota exhausted at {provider}: {detail}")]
    Quota { provider: String, detail: String },

    /// The configured request timeout elapsed before a response arrived.
    #[error("no response from {provider} within {after:?}")]
    Timeout { provider: String, after: Duration },

    /// Any other failure: transport, unexpected status, malformed payload.
    #[error("upstream failure at {provider}: {detail}")]
    Upstream { provider: String, detail: String },
}

impl AiError {
    pub fn upstream(provider: &str, detail: impl Into<String>) -> Self {
        AiError::Upstream {
            provider: provider.to_string(),
            detail: detail.into(),
        }
    }

    /// Short machine-friendly name of the failure kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AiError::Credential { .. } => "credential",
            AiError::Quota { .. } => "quota",
            AiError::Timeout { .. } => "timeout",
            AiError::Upstream { .. } => "upstream",
        }
    }
}
