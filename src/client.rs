use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;

use crate::conversation::Message;

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [Message],
}

/// HTTP client for the tutor backend's chat endpoint.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send the full conversation history and return the assistant reply.
    /// Non-success statuses, transport failures, and replies that do not
    /// parse as a `{role, content}` message are all errors; callers see no
    /// further distinction.
    pub async fn send(&self, messages: &[Message]) -> Result<Message> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { messages })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Backend request failed with status: {}",
                response.status()
            ));
        }

        let reply: Message = response.json().await?;
        Ok(reply)
    }
}
