use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{Config, API_KEY_VAR};
use crate::error::{AnalyzerError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "system")]
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Anything that can turn a list of role-tagged messages into one completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

/// Client for an OpenAI-style chat-completion gateway.
pub struct GatewayClient {
    url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl GatewayClient {
    pub fn new(config: &Config) -> Self {
        info!("Using AI gateway at {} with model {}", config.gateway_url, config.model);

        Self {
            url: config.gateway_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl CompletionProvider for GatewayClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AnalyzerError::MissingConfig(API_KEY_VAR))?;

        let payload = json!({
            "model": self.model,
            "messages": messages,
        });

        info!("Sending {} messages to AI gateway", messages.len());
        debug!("Payload: {}", payload);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => AnalyzerError::RateLimited,
                StatusCode::PAYMENT_REQUIRED => AnalyzerError::PaymentRequired,
                _ => {
                    let body = response.text().await.unwrap_or_default();
                    error!("AI gateway error: {} {}", status.as_u16(), body);
                    AnalyzerError::Gateway {
                        status: status.as_u16(),
                        body,
                    }
                }
            });
        }

        let response_json: Value = response.json().await?;
        debug!("Response JSON: {}", response_json);

        let content = extract_content(&response_json)?;
        info!("Response length: {} characters", content.len());
        Ok(content)
    }
}

/// Pulls `choices[0].message.content` out of a completion body.
pub fn extract_content(body: &Value) -> Result<String> {
    body.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            AnalyzerError::MalformedCompletion("missing choices[0].message.content".to_string())
        })
}
