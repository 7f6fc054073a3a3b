use crate::types::ClassifierError;
use async_trait::async_trait;
use interfaces::Headline;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Trait for LLM adapters that classify headlines
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Get the name of this LLM adapter
    fn adapter_name(&self) -> String;

    /// Classify one headline, returning the raw reply text
    async fn classify_headline(&self, headline: &Headline) -> Result<String, ClassifierError>;
}

pub fn classification_prompt(headline: &Headline) -> String {
    format!(
        r#"
You are classifying political news for market relevance.

Headline:
"{headline}"

Return your answer in EXACTLY this format:
MarketRelevant: Yes or No
Category: MonetaryPolicy, FiscalPolicy, Regulation, Geopolitics, Other
Sentiment: Positive, Negative, Neutral
Confidence: 0-100
Explanation: One sentence explanation
"#
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub api_base: String,
    pub api_key_env: String,
    pub temperature: f64,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
            timeout_seconds: 30,
        }
    }
}

impl LlmConfig {
    pub fn api_key(&self) -> Result<String, ClassifierError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ClassifierError::MissingApiKey(self.api_key_env.clone()))
    }
}

/// Chat-completions adapter for OpenAI and compatible endpoints
pub struct OpenAiAdapter {
    config: LlmConfig,
    api_key: String,
    client: Client,
}

impl OpenAiAdapter {
    pub fn new(config: LlmConfig, api_key: String) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ClassifierError::Request(e.to_string()))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// Reads the API key from the environment variable named in `config`
    pub fn from_env(config: LlmConfig) -> Result<Self, ClassifierError> {
        let api_key = config.api_key()?;
        Self::new(config, api_key)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

/// Pulls `choices[0].message.content` out of a chat-completions body
pub fn extract_reply(body: &serde_json::Value) -> Result<String, ClassifierError> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ClassifierError::MalformedResponse("missing choices[0].message.content".into()))
}

#[async_trait]
impl LlmAdapter for OpenAiAdapter {
    fn adapter_name(&self) -> String {
        format!("OpenAI ({})", self.config.model)
    }

    async fn classify_headline(&self, headline: &Headline) -> Result<String, ClassifierError> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "user",
                    "content": classification_prompt(headline)
                }
            ],
            "temperature": self.config.temperature
        });

        debug!("Requesting classification from {}", self.endpoint());

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ClassifierError::Request(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(ClassifierError::Authentication),
            StatusCode::TOO_MANY_REQUESTS => return Err(ClassifierError::RateLimited),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(ClassifierError::Api {
                    status: status.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;

        extract_reply(&body)
    }
}

pub const DRY_RUN_REPLY: &str = "MarketRelevant: No\n\
Category: Other\n\
Sentiment: Neutral\n\
Confidence: 0\n\
Explanation: Dry run, no classifier was called.";

/// Mock LLM adapter for development and testing
pub struct MockLlmAdapter {
    name: String,
    replies: HashMap<String, String>,
    failures: HashSet<String>,
    default_reply: String,
    response_delay_ms: u64,
    calls: Mutex<Vec<String>>,
}

impl MockLlmAdapter {
    pub fn new(name: String) -> Self {
        Self {
            name,
            replies: HashMap::new(),
            failures: HashSet::new(),
            default_reply: DRY_RUN_REPLY.to_string(),
            response_delay_ms: 0,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(mut self, headline: &str, reply: &str) -> Self {
        self.replies.insert(headline.to_string(), reply.to_string());
        self
    }

    pub fn with_failure(mut self, headline: &str) -> Self {
        self.failures.insert(headline.to_string());
        self
    }

    pub fn with_default_reply(mut self, reply: &str) -> Self {
        self.default_reply = reply.to_string();
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.response_delay_ms = delay_ms;
        self
    }

    /// Headlines passed to `classify_headline`, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl LlmAdapter for MockLlmAdapter {
    fn adapter_name(&self) -> String {
        format!("Mock LLM Adapter ({})", self.name)
    }

    async fn classify_headline(&self, headline: &Headline) -> Result<String, ClassifierError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(headline.to_string());

        if self.response_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.response_delay_ms)).await;
        }

        if self.failures.contains(headline.as_str()) {
            info!("Mock adapter failing on purpose for: {}", headline);
            return Err(ClassifierError::Request("mock failure".into()));
        }

        Ok(self
            .replies
            .get(headline.as_str())
            .cloned()
            .unwrap_or_else(|| self.default_reply.clone()))
    }
}
