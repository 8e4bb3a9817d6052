use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::client::ChatClient;

/// Shown in the transcript whenever the backend is unreachable or errors.
pub const FALLBACK_TEXT: &str = "Error: Could not get response from backend.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only transcript for one session, plus the pending-request flag
/// that gates overlapping submissions. Messages are never edited, removed,
/// or reordered; insertion order is display order.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    pending: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True strictly between `begin_submit` and `finish_submit`.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Start one round trip: append the user message, raise the pending
    /// flag, and return the full history to send. Whitespace-only input
    /// and submissions while a request is outstanding are rejected before
    /// any side effect.
    pub fn begin_submit(&mut self, input: &str) -> Option<Vec<Message>> {
        if self.pending || input.trim().is_empty() {
            return None;
        }

        self.push(Message::user(input));
        self.pending = true;
        Some(self.messages.clone())
    }

    /// Complete the round trip started by `begin_submit`. Any error becomes
    /// the fixed fallback message; the pending flag always clears.
    pub fn finish_submit(&mut self, result: Result<Message>) {
        let message = result.unwrap_or_else(|_| Message::assistant(FALLBACK_TEXT));
        self.push(message);
        self.pending = false;
    }

    /// One full round trip against the backend. Returns false if the guard
    /// rejected the input; an accepted submission appends exactly two
    /// messages whatever the backend does, and triggers exactly one request.
    pub async fn submit(&mut self, client: &ChatClient, input: &str) -> bool {
        let Some(history) = self.begin_submit(input) else {
            return false;
        };

        let result = client.send(&history).await;
        self.finish_submit(result);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn push_preserves_insertion_order() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("first"));
        conversation.push(Message::assistant("second"));
        conversation.push(Message::user("third"));

        let contents: Vec<&str> = conversation
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn begin_submit_rejects_blank_input() {
        let mut conversation = Conversation::new();

        assert!(conversation.begin_submit("").is_none());
        assert!(conversation.begin_submit("   \n\t").is_none());
        assert!(conversation.messages().is_empty());
        assert!(!conversation.is_pending());
    }

    #[test]
    fn begin_submit_rejects_while_pending() {
        let mut conversation = Conversation::new();

        assert!(conversation.begin_submit("first question").is_some());
        assert!(conversation.is_pending());

        assert!(conversation.begin_submit("second question").is_none());
        assert_eq!(conversation.messages().len(), 1);
    }

    #[test]
    fn begin_submit_returns_full_history() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("hello"));
        conversation.push(Message::assistant("hi there"));

        let history = conversation.begin_submit("how are you?").unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[2], Message::user("how are you?"));
    }

    #[test]
    fn finish_submit_appends_reply_and_clears_pending() {
        let mut conversation = Conversation::new();
        conversation.begin_submit("hello").unwrap();

        conversation.finish_submit(Ok(Message::assistant("hi there")));

        assert!(!conversation.is_pending());
        assert_eq!(conversation.messages().len(), 2);
        assert_eq!(conversation.messages()[1], Message::assistant("hi there"));
    }

    #[test]
    fn finish_submit_error_appends_fallback() {
        let mut conversation = Conversation::new();
        conversation.begin_submit("hello").unwrap();

        conversation.finish_submit(Err(anyhow!("boom")));

        assert!(!conversation.is_pending());
        assert_eq!(conversation.messages().len(), 2);
        assert_eq!(conversation.messages()[1].role, Role::Assistant);
        assert_eq!(conversation.messages()[1].content, FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn submit_appends_reply_on_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/chat")
                    .json_body(json!({
                        "messages": [{"role": "user", "content": "hello"}]
                    }));
                then.status(200)
                    .json_body(json!({"role": "assistant", "content": "hi there"}));
            })
            .await;

        let client = ChatClient::new(&server.base_url());
        let mut conversation = Conversation::new();

        assert!(conversation.submit(&client, "hello").await);

        mock.assert_async().await;
        assert!(!conversation.is_pending());
        assert_eq!(
            conversation.messages(),
            &[Message::user("hello"), Message::assistant("hi there")]
        );
    }

    #[tokio::test]
    async fn submit_appends_fallback_on_server_error() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(500);
            })
            .await;

        let client = ChatClient::new(&server.base_url());
        let mut conversation = Conversation::new();

        assert!(conversation.submit(&client, "hello").await);

        mock.assert_async().await;
        assert!(!conversation.is_pending());
        assert_eq!(
            conversation.messages(),
            &[Message::user("hello"), Message::assistant(FALLBACK_TEXT)]
        );
    }

    #[tokio::test]
    async fn submit_appends_fallback_when_backend_unreachable() {
        // Discard port, nothing listens there
        let client = ChatClient::new("http://127.0.0.1:9");
        let mut conversation = Conversation::new();

        assert!(conversation.submit(&client, "hello").await);

        assert!(!conversation.is_pending());
        assert_eq!(
            conversation.messages(),
            &[Message::user("hello"), Message::assistant(FALLBACK_TEXT)]
        );
    }

    #[tokio::test]
    async fn submit_rejects_blank_input_without_a_request() {
        // An escaped request would hit the dead port and append the fallback
        let client = ChatClient::new("http://127.0.0.1:9");
        let mut conversation = Conversation::new();

        assert!(!conversation.submit(&client, "   ").await);

        assert!(conversation.messages().is_empty());
        assert!(!conversation.is_pending());
    }

    #[test]
    fn roles_serialize_lowercase() {
        let message = Message::user("hello");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "hello"}));

        let reply: Message =
            serde_json::from_value(json!({"role": "assistant", "content": "hi"})).unwrap();
        assert_eq!(reply.role, Role::Assistant);
    }
}
