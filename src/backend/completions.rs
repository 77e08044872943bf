//! Direct chat-completion API client
//!
//! Used by the routine fallback, the chat assistant and the proxy server.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::types::{ChatMessage, CompletionRequest};
use crate::config::Settings;
use crate::error::FallbackError;

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send `messages` with a bearer credential; returns the raw response body
    async fn complete(&self, api_key: &str, messages: &[ChatMessage]) -> Result<Value, FallbackError>;
}

pub struct CompletionClient {
    client: Client,
    url: String,
    model: String,
    max_tokens: u32,
}

impl CompletionClient {
    pub fn new(client: Client, url: &str, model: &str, max_tokens: u32) -> Self {
        Self {
            client,
            url: url.to_string(),
            model: model.to_string(),
            max_tokens,
        }
    }

    pub fn from_settings(client: Client, settings: &Settings) -> Self {
        Self::new(
            client,
            &settings.completions_url,
            &settings.model,
            settings.max_tokens,
        )
    }
}

#[async_trait]
impl ChatCompletion for CompletionClient {
    async fn complete(&self, api_key: &str, messages: &[ChatMessage]) -> Result<Value, FallbackError> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        };
        tracing::debug!("POST {} model={} messages={}", self.url, self.model, messages.len());

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| FallbackError::Transport(e.to_string()))?;

        let raw = response
            .text()
            .await
            .map_err(|e| FallbackError::Transport(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| FallbackError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::Role;

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::system("be brief"), ChatMessage::user("hi")];
        let body = CompletionRequest {
            model: "gpt-4o",
            messages: &messages,
            max_tokens: 700,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["max_tokens"], 700);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 256,
            ..Settings::default()
        };
        let client = CompletionClient::from_settings(Client::new(), &settings);
        assert_eq!(client.model, "gpt-4o-mini");
        assert_eq!(client.max_tokens, 256);
        assert_eq!(client.url, settings.completions_url);
    }
}
