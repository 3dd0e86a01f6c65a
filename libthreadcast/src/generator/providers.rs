//! Groq and Gemini completion clients (HTTP direct, no SDK)

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::prompt::SYSTEM_PROMPT;
use super::{CompletionProvider, MAX_OUTPUT_TOKENS, TEMPERATURE};
use crate::bluesky::truncate_detail;
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{Result, ThreadcastError};

const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const GROQ_MODEL: &str = "llama-3.3-70b-versatile";

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Default timeout for one completion request
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| ThreadcastError::Generation(format!("Failed to create HTTP client: {}", e)))
}

fn request_failed(provider: &str, err: reqwest::Error) -> ThreadcastError {
    // Gemini carries the key in the URL
    ThreadcastError::Generation(format!("{} request failed: {}", provider, err.without_url()))
}

async fn read_success(provider: &str, response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| request_failed(provider, e))?;

    if !status.is_success() {
        return Err(ThreadcastError::Generation(format!(
            "{} returned status {}: {}",
            provider,
            status.as_u16(),
            truncate_detail(&body)
        )));
    }
    Ok(body)
}

fn malformed(provider: &str, detail: impl std::fmt::Display) -> ThreadcastError {
    ThreadcastError::Generation(format!("{} returned an unexpected response: {}", provider, detail))
}

/// Groq's OpenAI-compatible chat completions API
pub struct GroqProvider {
    http_client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl GroqProvider {
    pub fn new(api_key: SecretString, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http_client: build_client(timeout)?,
            api_key,
            base_url: GROQ_API_BASE.to_string(),
        })
    }

    /// Point the client at another server (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_request(prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": GROQ_MODEL,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_OUTPUT_TOKENS,
        })
    }
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose_secret()))
            .map_err(|_| ThreadcastError::Generation("Invalid Groq API key format".to_string()))?;

        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .json(&Self::build_request(prompt))
            .send()
            .await
            .map_err(|e| request_failed(self.name(), e))?;

        let body = read_success(self.name(), response).await?;
        let completion: ChatCompletion =
            serde_json::from_str(&body).map_err(|e| malformed(self.name(), e))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| malformed(self.name(), "no choices"))
    }
}

/// Google Gemini `generateContent` API
pub struct GeminiProvider {
    http_client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    text: Option<String>,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http_client: build_client(timeout)?,
            api_key,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Point the client at another server (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_request(prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            },
        })
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let endpoint = format!("{}/models/{}:generateContent", self.base_url, GEMINI_MODEL);
        let url = Url::parse_with_params(&endpoint, &[("key", self.api_key.expose_secret())])
            .map_err(|e| ThreadcastError::Generation(format!("Invalid Gemini URL: {}", e)))?;

        let response = self
            .http_client
            .post(url)
            .json(&Self::build_request(prompt))
            .send()
            .await
            .map_err(|e| request_failed(self.name(), e))?;

        let body = read_success(self.name(), response).await?;
        let generated: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| malformed(self.name(), e))?;

        generated
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(|| malformed(self.name(), "no candidates"))
    }
}

/// Build the provider described by a `[[generator.providers]]` entry
pub fn provider_from_config(
    config: &ProviderConfig,
    timeout: Duration,
) -> Result<Box<dyn CompletionProvider>> {
    let api_key = SecretString::from(config.api_key.clone());

    let provider: Box<dyn CompletionProvider> = match config.kind {
        ProviderKind::Groq => {
            let provider = GroqProvider::new(api_key, timeout)?;
            match &config.base_url {
                Some(url) => Box::new(provider.with_base_url(url.as_str())),
                None => Box::new(provider),
            }
        }
        ProviderKind::Gemini => {
            let provider = GeminiProvider::new(api_key, timeout)?;
            match &config.base_url {
                Some(url) => Box::new(provider.with_base_url(url.as_str())),
                None => Box::new(provider),
            }
        }
    };

    Ok(provider)
}
