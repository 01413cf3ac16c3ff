//! Learned-fallback language-model collaborator (C9, spec.md §4.9/§6).
//!
//! `generate(prompt, max_tokens, timeout) -> (text, ok)`: on `ok = false`
//! or timeout, the caller degrades to minimal-holding. Grounded on
//! `llm/google.rs`'s `GoogleGeminiProvider` (reqwest client, API-key auth,
//! status-code error mapping), narrowed to the single plain-text
//! completion this system needs instead of the teacher's full chat/tool
//! surface.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::LanguageModelConfig;
use crate::error::ExternalUnavailable;

/// The external language-model contract the learned-fallback path
/// depends on.
#[async_trait]
pub trait EmissionLanguageModel: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<String, ExternalUnavailable>;
}

/// HTTP-backed implementation calling an OpenAI-compatible chat
/// completions endpoint.
pub struct HttpEmissionLanguageModel {
    client: reqwest::Client,
    config: LanguageModelConfig,
}

impl HttpEmissionLanguageModel {
    pub fn new(config: LanguageModelConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn api_key(&self) -> String {
        self.config
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().to_string())
            .unwrap_or_default()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl EmissionLanguageModel for HttpEmissionLanguageModel {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<String, ExternalUnavailable> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let response = tokio::time::timeout(
            timeout,
            self.client
                .post(&url)
                .bearer_auth(self.api_key())
                .json(&request)
                .send(),
        )
        .await
        .map_err(|_| ExternalUnavailable::Timeout {
            collaborator: "language_model",
            elapsed_ms: timeout.as_millis() as u64,
        })?
        .map_err(|e| ExternalUnavailable::Failed {
            collaborator: "language_model",
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(ExternalUnavailable::Failed {
                collaborator: "language_model",
                reason: format!("HTTP {}", response.status()),
            });
        }

        let body: ChatResponse = response.json().await.map_err(|e| ExternalUnavailable::Failed {
            collaborator: "language_model",
            reason: format!("invalid response body: {e}"),
        })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ExternalUnavailable::Failed {
                collaborator: "language_model",
                reason: "empty completion".to_string(),
            })
    }
}

/// Deterministic stand-in for tests and offline runs: echoes a fixed
/// phrase derived from the prompt's first line, never touches the
/// network.
pub struct DeterministicEmissionLanguageModel;

#[async_trait]
impl EmissionLanguageModel for DeterministicEmissionLanguageModel {
    async fn generate(
        &self,
        prompt: &str,
        _max_tokens: u32,
        _timeout: Duration,
    ) -> Result<String, ExternalUnavailable> {
        let topic = prompt.lines().next().unwrap_or("this").trim();
        Ok(format!("I'm with you on {topic}."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deterministic_model_never_errors() {
        let model = DeterministicEmissionLanguageModel;
        let result = model.generate("grief\nsome context", 64, Duration::from_secs(1)).await;
        assert!(result.unwrap().contains("grief"));
    }
}
