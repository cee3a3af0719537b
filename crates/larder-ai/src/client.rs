//! LLM API client for recipe generation

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AiError;
use crate::generator::TextGenerator;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com";

const CREDENTIAL_MARKERS: &[&str] = &[
    "UNAUTHENTICATED",
    "PERMISSION_DENIED",
    "API_KEY_INVALID",
    "invalid_api_key",
];
const QUOTA_MARKERS: &[&str] = &["RESOURCE_EXHAUSTED", "insufficient_quota", "rate_limit_exceeded"];
const MAX_DETAIL_CHARS: usize = 500;

/// LLM provider configuration
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Gemini {
        api_key: String,
        model: String,
        base_url: String,
    },
    OpenAI {
        api_key: String,
        model: String,
        base_url: String,
    },
}

impl LlmProvider {
    /// Gemini with the default model and endpoint.
    pub fn gemini(api_key: impl Into<String>) -> Self {
        LlmProvider::Gemini {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE.to_string(),
        }
    }

    /// Pick a provider from environment variables.
    ///
    /// `GEMINI_API_KEY` wins over `OPENAI_API_KEY`. With neither set the
    /// provider is Gemini with an empty key, so the missing credential is
    /// reported on the first generation request instead of at startup.
    pub fn from_env() -> Result<Self> {
        let provider = if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
            LlmProvider::Gemini {
                api_key,
                model: env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                base_url: env_or("GEMINI_API_BASE", DEFAULT_GEMINI_BASE),
            }
        } else if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            LlmProvider::OpenAI {
                api_key,
                model: env_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
                base_url: env_or("OPENAI_API_BASE", DEFAULT_OPENAI_BASE),
            }
        } else {
            LlmProvider::Gemini {
                api_key: String::new(),
                model: env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                base_url: env_or("GEMINI_API_BASE", DEFAULT_GEMINI_BASE),
            }
        };

        url::Url::parse(provider.base_url())
            .with_context(|| format!("Invalid API base URL '{}'", provider.base_url()))?;
        Ok(provider)
    }

    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Gemini { .. } => "gemini",
            LlmProvider::OpenAI { .. } => "openai",
        }
    }

    /// Human-readable source used in document footers.
    pub fn label(&self) -> &'static str {
        match self {
            LlmProvider::Gemini { .. } => "Google Gemini AI",
            LlmProvider::OpenAI { .. } => "OpenAI",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            LlmProvider::Gemini { model, .. } | LlmProvider::OpenAI { model, .. } => model,
        }
    }

    fn api_key(&self) -> &str {
        match self {
            LlmProvider::Gemini { api_key, .. } | LlmProvider::OpenAI { api_key, .. } => api_key,
        }
    }

    fn base_url(&self) -> &str {
        match self {
            LlmProvider::Gemini { base_url, .. } | LlmProvider::OpenAI { base_url, .. } => base_url,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// LLM client for generating recipes
#[derive(Debug)]
pub struct LlmClient {
    provider: LlmProvider,
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl LlmClient {
    pub fn new(provider: LlmProvider) -> Self {
        Self {
            provider,
            client: reqwest::Client::new(),
            timeout: None,
        }
    }

    /// Create a client from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(LlmProvider::from_env()?))
    }

    /// Bound every generation request by `timeout`. Unbounded when never set.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    async fn call_gemini(&self, prompt: &str) -> Result<String, AiError> {
        #[derive(Serialize)]
        struct GeminiRequest<'a> {
            contents: Vec<GeminiRequestContent<'a>>,
        }

        #[derive(Serialize)]
        struct GeminiRequestContent<'a> {
            role: &'static str,
            parts: Vec<GeminiRequestPart<'a>>,
        }

        #[derive(Serialize)]
        struct GeminiRequestPart<'a> {
            text: &'a str,
        }

        let request = GeminiRequest {
            contents: vec![GeminiRequestContent {
                role: "user",
                parts: vec![GeminiRequestPart { text: prompt }],
            }],
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.provider.base_url().trim_end_matches('/'),
            self.provider.model()
        );
        debug!("Calling Gemini API with model: {}", self.provider.model());

        let builder = self
            .client
            .post(url)
            .header("x-goog-api-key", self.provider.api_key())
            .json(&request);
        let body = self.send(builder).await?;

        let text = extract_gemini_text(self.provider.name(), &body)?;
        info!("Received response from Gemini");
        Ok(text)
    }

    async fn call_openai(&self, prompt: &str) -> Result<String, AiError> {
        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            model: &'a str,
            messages: Vec<OpenAIMessage<'a>>,
        }

        #[derive(Serialize)]
        struct OpenAIMessage<'a> {
            role: &'static str,
            content: &'a str,
        }

        let request = OpenAIRequest {
            model: self.provider.model(),
            messages: vec![OpenAIMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(
            "Calling OpenAI-compatible API at {} with model: {}",
            self.provider.base_url(),
            self.provider.model()
        );

        let builder = self
            .client
            .post(format!(
                "{}/v1/chat/completions",
                self.provider.base_url().trim_end_matches('/')
            ))
            .bearer_auth(self.provider.api_key())
            .json(&request);
        let body = self.send(builder).await?;

        let text = extract_openai_text(self.provider.name(), &body)?;
        info!("Received response from OpenAI");
        Ok(text)
    }

    /// Send a prepared request and return the body of a successful response.
    async fn send(&self, mut builder: reqwest::RequestBuilder) -> Result<String, AiError> {
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(classify_failure(self.provider.name(), status, &body));
        }
        Ok(body)
    }

    fn transport_error(&self, err: reqwest::Error) -> AiError {
        match self.timeout {
            Some(after) if err.is_timeout() => AiError::Timeout {
                provider: self.provider.name().to_string(),
                after,
            },
            _ => AiError::upstream(self.provider.name(), err.to_string()),
        }
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        if self.provider.api_key().trim().is_empty() {
            return Err(AiError::Credential {
                provider: self.provider.name().to_string(),
                detail: "no API key configured".to_string(),
            });
        }

        match &self.provider {
            LlmProvider::Gemini { .. } => self.call_gemini(prompt).await,
            LlmProvider::OpenAI { .. } => self.call_openai(prompt).await,
        }
    }

    fn model(&self) -> &str {
        self.provider.model()
    }

    fn provider_label(&self) -> &str {
        self.provider.label()
    }
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiPromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

/// Pull the generated text out of a Gemini `generateContent` response.
fn extract_gemini_text(provider: &str, body: &str) -> Result<String, AiError> {
    let response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| AiError::upstream(provider, format!("malformed response: {}", e)))?;

    let text: String = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("prompt blocked: {}", r))
            .unwrap_or_else(|| "response contained no text".to_string());
        return Err(AiError::upstream(provider, reason));
    }
    Ok(text)
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessageContent,
}

#[derive(Deserialize)]
struct OpenAIMessageContent {
    content: Option<String>,
}

fn extract_openai_text(provider: &str, body: &str) -> Result<String, AiError> {
    let response: OpenAIResponse = serde_json::from_str(body)
        .map_err(|e| AiError::upstream(provider, format!("malformed response: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.is_empty())
        .ok_or_else(|| AiError::upstream(provider, "response contained no text"))
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

/// Union of the Google and OpenAI error shapes.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
    code: Option<serde_json::Value>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// Classify a non-success provider response by HTTP status and the
/// structured fields of the error payload.
pub fn classify_failure(provider: &str, status: StatusCode, body: &str) -> AiError {
    let error = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error);

    let mut markers: Vec<String> = Vec::new();
    let detail = match &error {
        Some(err) => {
            markers.extend(err.status.clone());
            markers.extend(err.kind.clone());
            if let Some(serde_json::Value::String(code)) = &err.code {
                markers.push(code.clone());
            }
            markers.extend(err.details.iter().filter_map(|d| d.reason.clone()));
            format!("{} {}", status, err.message)
        }
        None => format!("{} {}", status, body.chars().take(MAX_DETAIL_CHARS).collect::<String>()),
    };
    let has_marker = |set: &[&str]| markers.iter().any(|m| set.contains(&m.as_str()));

    let provider = provider.to_string();
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || has_marker(CREDENTIAL_MARKERS)
    {
        AiError::Credential { provider, detail }
    } else if status == StatusCode::TOO_MANY_REQUESTS || has_marker(QUOTA_MARKERS) {
        AiError::Quota { provider, detail }
    } else {
        AiError::Upstream { provider, detail }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "GEMINI_API_KEY",
            "GEMINI_MODEL",
            "GEMINI_API_BASE",
            "OPENAI_API_KEY",
            "OPENAI_MODEL",
            "OPENAI_API_BASE",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_from_env_prefers_gemini() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("GEMINI_API_KEY", "g-key");
        std::env::set_var("OPENAI_API_KEY", "o-key");

        let provider = LlmProvider::from_env().unwrap();
        assert!(matches!(provider, LlmProvider::Gemini { ref api_key, .. } if api_key == "g-key"));
        assert_eq!(provider.model(), DEFAULT_GEMINI_MODEL);

        clear_env();
    }

    #[test]
    fn test_from_env_openai() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "o-key");
        std::env::set_var("OPENAI_MODEL", "local-llama");
        std::env::set_var("OPENAI_API_BASE", "http://localhost:8080");

        let provider = LlmProvider::from_env().unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "local-llama");
        assert_eq!(provider.base_url(), "http://localhost:8080");

        clear_env();
    }

    #[test]
    fn test_from_env_rejects_bad_base_url() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("GEMINI_API_KEY", "g-key");
        std::env::set_var("GEMINI_API_BASE", "not a url");

        let result = LlmProvider::from_env();
        assert!(result.is_err());

        clear_env();
    }

    #[tokio::test]
    async fn test_missing_key_is_credential_error_on_first_use() {
        let provider = {
            let _lock = ENV_LOCK.lock().unwrap();
            clear_env();
            LlmProvider::from_env().unwrap()
        };
        let client = LlmClient::new(provider);

        let err = client.generate("anything").await.unwrap_err();
        assert!(matches!(err, AiError::Credential { .. }));
    }

    #[test]
    fn test_classify_gemini_invalid_key() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"@type":"type.googleapis.com/google.rpc.ErrorInfo","reason":"API_KEY_INVALID"}]}}"#;
        let err = classify_failure("gemini", StatusCode::BAD_REQUEST, body);
        match err {
            AiError::Credential { detail, .. } => assert!(detail.contains("API key not valid")),
            other => panic!("expected credential error, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_quota() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = classify_failure("gemini", StatusCode::TOO_MANY_REQUESTS, body);
        assert!(matches!(err, AiError::Quota { .. }));

        let body = r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota","code":"insufficient_quota"}}"#;
        let err = classify_failure("openai", StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, AiError::Quota { .. }));
    }

    #[test]
    fn test_classify_unauthorized_status_without_body() {
        let err = classify_failure("openai", StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, AiError::Credential { .. }));
    }

    #[test]
    fn test_classify_other_failures_as_upstream() {
        let err = classify_failure("gemini", StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        match err {
            AiError::Upstream { detail, .. } => assert!(detail.contains("bad gateway")),
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_gemini_text_concatenates_parts() {
        let body = r##"{"candidates":[{"content":{"role":"model","parts":[{"text":"# Fried Rice\n"},{"text":"Cook it."}]},"finishReason":"STOP"}]}"##;
        let text = extract_gemini_text("gemini", body).unwrap();
        assert_eq!(text, "# Fried Rice\nCook it.");
    }

    #[test]
    fn test_extract_gemini_text_blocked_prompt() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = extract_gemini_text("gemini", body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_extract_openai_text() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"A recipe"}}]}"#;
        assert_eq!(extract_openai_text("openai", body).unwrap(), "A recipe");

        let err = extract_openai_text("openai", r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, AiError::Upstream { .. }));
    }

    #[test]
    fn test_malformed_body_is_upstream() {
        let err = extract_gemini_text("gemini", "not json").unwrap_err();
        assert!(matches!(err, AiError::Upstream { .. }));
    }

    #[test]
    fn test_provider_labels() {
        let provider = LlmProvider::gemini("key");
        assert_eq!(provider.label(), "Google Gemini AI");
        assert_eq!(provider.model(), "gemini-1.5-flash");
    }

    /// Accept one connection, read the whole request, then answer with
    /// `status` and a JSON `body`.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}", addr)
    }

    fn gemini_at(base_url: String) -> LlmClient {
        LlmClient::new(LlmProvider::Gemini {
            api_key: "g-key".to_string(),
            model: "gemini-test".to_string(),
            base_url,
        })
    }

    #[tokio::test]
    async fn test_generate_returns_text_from_server() {
        let base = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":"Omelette"}]}}]}"#,
        )
        .await;

        let text = gemini_at(base).generate("eggs").await.unwrap();
        assert_eq!(text, "Omelette");
    }

    #[tokio::test]
    async fn test_error_response_is_classified() {
        let base = serve_once(
            "400 Bad Request",
            r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#,
        )
        .await;

        let err = gemini_at(base).generate("eggs").await.unwrap_err();
        match err {
            AiError::Credential { provider, detail } => {
                assert_eq!(provider, "gemini");
                assert!(detail.contains("API key not valid."));
            }
            other => panic!("expected credential error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_quota_response_is_classified() {
        let base = serve_once(
            "429 Too Many Requests",
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .await;

        let err = gemini_at(base).generate("eggs").await.unwrap_err();
        assert!(matches!(err, AiError::Quota { .. }));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let client = gemini_at(format!("http://{}", addr)).with_timeout(Duration::from_millis(300));
        let err = client.generate("eggs").await.unwrap_err();
        match err {
            AiError::Timeout { provider, after } => {
                assert_eq!(provider, "gemini");
                assert_eq!(after, Duration::from_millis(300));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
