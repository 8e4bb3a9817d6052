use anyhow::Result;
use tokio::task::JoinHandle;

use crate::client::ChatClient;
use crate::config::Config;
use crate::conversation::{Conversation, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Input box state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Transcript state
    pub conversation: Conversation,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Backend
    pub backend_url: String,
    pub client: ChatClient,
    pub submit_task: Option<JoinHandle<Result<Message>>>,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let backend_url = config.resolve_backend_url();
        let client = ChatClient::new(&backend_url);

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            input: String::new(),
            cursor: 0,

            conversation: Conversation::new(),
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            backend_url,
            client,
            submit_task: None,
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Fold a finished request task back into the conversation. No-op while
    /// the request is still in flight.
    pub async fn poll_submit(&mut self) {
        let finished = self
            .submit_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.submit_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(anyhow::anyhow!("request task failed: {}", e)),
            };
            self.conversation.finish_submit(result);
            self.scroll_chat_to_bottom();
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Scroll the transcript so the latest message (or "Thinking...") is
    /// visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.conversation.messages() {
            total_lines += 1; // Role line ("You:" or "Tutor:")
            for line in msg.content.lines() {
                // Character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.conversation.is_pending() {
            total_lines += 2; // "Tutor:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Message;

    fn test_app() -> App {
        App::new(&Config {
            backend_url: Some("http://127.0.0.1:9".to_string()),
        })
    }

    #[test]
    fn animation_only_advances_while_pending() {
        let mut app = test_app();

        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.conversation.begin_submit("hello").unwrap();
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 2);
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
    }

    #[test]
    fn scroll_to_bottom_accounts_for_wrapped_lines() {
        let mut app = test_app();
        app.chat_width = 10;
        app.chat_height = 5;

        // 25 chars wraps to 3 lines at width 10, plus role line and blank
        app.conversation
            .push(Message::assistant("a".repeat(25)));
        app.conversation.push(Message::user("hi"));

        app.scroll_chat_to_bottom();
        // 5 lines for the reply + 3 for the user message = 8 total, height 5
        assert_eq!(app.chat_scroll, 3);
    }

    #[test]
    fn scroll_to_bottom_resets_when_everything_fits() {
        let mut app = test_app();
        app.chat_width = 80;
        app.chat_height = 20;
        app.chat_scroll = 7;

        app.conversation.push(Message::user("hi"));
        app.scroll_chat_to_bottom();

        assert_eq!(app.chat_scroll, 0);
    }
}
