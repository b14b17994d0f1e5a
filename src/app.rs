use anyhow::Result;
use tokio::sync::mpsc;

use crate::client::{ChatClient, ChatRequest};
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

/// One rendered message in the transcript. Content is plain text; it is
/// never interpreted as markup, whatever the backend sends.
#[derive(Debug, Clone)]
pub struct Bubble {
    pub role: Role,
    pub content: String,
}

impl Bubble {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self.role {
            Role::User => "You:",
            Role::Bot => "Bot:",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Input line state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Transcript state (append-only)
    pub transcript: Vec<Bubble>,
    pub transcript_scroll: u16,
    pub transcript_height: u16, // Height of transcript area for scroll calculations
    pub transcript_width: u16,  // Width of transcript area for wrap calculations

    // In-flight requests. Outcomes arrive on the channel in completion
    // order, which is the order bot bubbles are appended in.
    pub pending: usize,
    replies_tx: mpsc::UnboundedSender<Result<String>>,
    replies_rx: mpsc::UnboundedReceiver<Result<String>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Backend
    pub client: ChatClient,
    pub session_id: String,
    pub model: String,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            input: String::new(),
            cursor: 0,

            transcript: Vec::new(),
            transcript_scroll: 0,
            transcript_height: 0,
            transcript_width: 0,

            pending: 0,
            replies_tx,
            replies_rx,

            animation_frame: 0,

            client: ChatClient::new(&config.endpoint()),
            session_id: config.session_id(),
            model: config.model(),
        }
    }

    /// Submit the current input line.
    ///
    /// The user bubble is appended and the input cleared before the request
    /// task is spawned, so the prompt is visible immediately regardless of
    /// how the request turns out. Whitespace-only input is dropped without
    /// touching the transcript or the network.
    pub fn submit(&mut self) {
        let prompt = self.input.trim().to_string();
        if prompt.is_empty() {
            tracing::warn!("ignoring submission: input is empty");
            return;
        }

        self.transcript.push(Bubble::user(prompt.clone()));
        self.input.clear();
        self.cursor = 0;

        let request = ChatRequest {
            session_id: self.session_id.clone(),
            model: self.model.clone(),
            message: prompt,
        };

        let client = self.client.clone();
        let tx = self.replies_tx.clone();
        self.pending += 1;

        tokio::spawn(async move {
            // The receiver only goes away on shutdown.
            let _ = tx.send(client.send(&request).await);
        });
    }

    /// Collect finished requests. Called every event-loop turn.
    ///
    /// Replies are appended as they arrive; when overlapping submissions
    /// resolve out of order, so do their bubbles. A failed request appends
    /// nothing: the error goes to the log and the conversation stands as it
    /// was, user bubble included.
    pub fn drain_replies(&mut self) {
        while let Ok(outcome) = self.replies_rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            match outcome {
                Ok(reply) => {
                    self.transcript.push(Bubble::bot(reply));
                    self.scroll_to_bottom();
                }
                Err(err) => {
                    tracing::error!("failed to get a reply from the chat backend: {err:#}");
                }
            }
        }
    }

    /// Lines the transcript occupies at the given wrap width, including the
    /// pending indicator. Mirrors how the render pass lays bubbles out.
    pub fn transcript_line_count(&self, wrap_width: usize) -> u16 {
        let wrap_width = wrap_width.max(1);
        let mut total: u16 = 0;

        for bubble in &self.transcript {
            for (i, line) in bubble.content.lines().enumerate() {
                // Use character count, not byte length, for proper UTF-8 handling
                let mut char_count = line.chars().count();
                if i == 0 {
                    // First line carries the "You: " / "Bot: " prefix
                    char_count += bubble.label().chars().count() + 1;
                }
                // An empty line still takes one row; a full line takes
                // exactly one, not two
                total += char_count.max(1).div_ceil(wrap_width) as u16;
            }
            if bubble.content.is_empty() {
                total += 1;
            }
            total += 1; // Blank line after each bubble
        }

        if self.pending > 0 {
            total += 1; // "Bot is thinking" line
        }

        total
    }

    /// Scroll so the newest line is visible.
    pub fn scroll_to_bottom(&mut self) {
        let wrap_width = if self.transcript_width > 0 {
            self.transcript_width as usize
        } else {
            50
        };
        let visible_height = if self.transcript_height > 0 {
            self.transcript_height
        } else {
            20
        };

        let total_lines = self.transcript_line_count(wrap_width);
        self.transcript_scroll = total_lines.saturating_sub(visible_height);
    }

    // Manual transcript scrolling
    pub fn scroll_down(&mut self) {
        let wrap_width = self.transcript_width.max(1) as usize;
        let max_scroll = self
            .transcript_line_count(wrap_width)
            .saturating_sub(self.transcript_height);
        if self.transcript_scroll < max_scroll {
            self.transcript_scroll = self.transcript_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.transcript_height / 2;
        let wrap_width = self.transcript_width.max(1) as usize;
        let max_scroll = self
            .transcript_line_count(wrap_width)
            .saturating_sub(self.transcript_height);
        self.transcript_scroll = (self.transcript_scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.transcript_height / 2;
        self.transcript_scroll = self.transcript_scroll.saturating_sub(half_page);
    }

    pub fn scroll_to_top(&mut self) {
        self.transcript_scroll = 0;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.pending > 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
