use crate::controller::ChatController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Chat pane
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub follow_tail: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub server_url: String,
    pub controller: ChatController,
}

impl App {
    pub fn new(controller: ChatController, server_url: &str) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            input: String::new(),
            cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            follow_tail: true,
            animation_frame: 0,
            server_url: server_url.to_string(),
            controller,
        }
    }

    /// Send whatever is in the input box, empty or not
    pub fn submit(&mut self) {
        self.controller.on_submit(&mut self.input);
        self.cursor = 0;
        self.follow_tail = true;
        self.scroll_to_bottom();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.controller.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_tail = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_tail = self.chat_scroll == max;
    }

    /// Scroll chat to bottom so the newest entry (or the sending indicator) is visible
    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.total_chat_lines().saturating_sub(visible_height)
    }

    fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for entry in self.controller.transcript().entries() {
            for line in entry.to_string().lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add(((char_count / wrap_width) + 1) as u16);
            }
        }

        if self.controller.is_sending() {
            total_lines = total_lines.saturating_add(1);
        }

        total_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Artifact;
    use crate::audio::SilentPlayer;
    use crate::exchange::ChatClient;
    use crate::identity::IdentityProvider;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        // Nothing listens on port 9; submits in these tests only check local state
        let endpoint = Arc::new(ChatClient::new("http://127.0.0.1:9", None).unwrap());
        let controller = ChatController::new(
            IdentityProvider::fixed("abc-123"),
            Artifact::B,
            endpoint,
            Arc::new(SilentPlayer),
            tx,
        );
        App::new(controller, "http://127.0.0.1:9")
    }

    #[tokio::test]
    async fn test_submit_clears_input_and_cursor() {
        let mut app = app();
        app.input = "hi".to_string();
        app.cursor = 2;

        app.submit();

        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert_eq!(app.controller.transcript().lines(), vec!["나: hi"]);
        assert!(app.controller.is_sending());
    }

    #[tokio::test]
    async fn test_animation_only_ticks_while_sending() {
        let mut app = app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.submit();
        app.tick_animation();
        assert_eq!(app.animation_frame, 1);
    }

    #[tokio::test]
    async fn test_scroll_follows_tail() {
        let mut app = app();
        app.chat_height = 2;
        app.chat_width = 40;
        for i in 0..5 {
            app.input = format!("message {}", i);
            app.submit();
        }
        // 5 entries + the sending indicator in a 2-line pane
        assert_eq!(app.chat_scroll, 4);

        app.scroll_up(3);
        assert!(!app.follow_tail);
        app.scroll_down(10);
        assert_eq!(app.chat_scroll, 4);
        assert!(app.follow_tail);
    }
}
