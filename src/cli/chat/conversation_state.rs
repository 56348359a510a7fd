use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// What produced a message. Failure placeholders are kept apart from real
/// answers and captions so a renderer can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Greeting,
    Question,
    Answer,
    Visualization,
    Failure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    sender: Sender,
    kind: MessageKind,
    text: String,
    image: Option<String>,
    created_at: DateTime<Local>,
}

impl Message {
    fn new(sender: Sender, kind: MessageKind, text: &str, image: Option<String>) -> Self {
        Self {
            sender,
            kind,
            text: text.to_string(),
            image,
            created_at: Local::now(),
        }
    }

    pub fn greeting(text: &str) -> Self {
        Self::new(Sender::Assistant, MessageKind::Greeting, text, None)
    }

    pub fn question(text: &str) -> Self {
        Self::new(Sender::User, MessageKind::Question, text, None)
    }

    pub fn answer(text: &str) -> Self {
        Self::new(Sender::Assistant, MessageKind::Answer, text, None)
    }

    pub fn visualization(caption: &str, image: &str) -> Self {
        Self::new(
            Sender::Assistant,
            MessageKind::Visualization,
            caption,
            Some(image.to_string()),
        )
    }

    pub fn failure(text: &str) -> Self {
        Self::new(Sender::Assistant, MessageKind::Failure, text, None)
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn is_failure(&self) -> bool {
        self.kind == MessageKind::Failure
    }
}

/// Append-only transcript. Entries are never edited, removed or reordered.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }
}

#[derive(Debug)]
pub struct ConversationState {
    pub messages: MessageLog,
    pub pending_input: String,
    pub is_analyzing: bool,
    pub is_visualizing: bool,
    pub last_assistant_answer: Option<String>,
}

impl ConversationState {
    /// Starts a session whose transcript holds only `greeting`.
    pub fn new(greeting: Message) -> Self {
        let mut messages = MessageLog::new();
        messages.append(greeting);
        Self {
            messages,
            pending_input: String::new(),
            is_analyzing: false,
            is_visualizing: false,
            last_assistant_answer: None,
        }
    }

    pub fn get_messages(&self) -> &[Message] {
        self.messages.all()
    }

    /// Suggestions need an exchange beyond the greeting and nothing in flight.
    pub fn suggestions_visible(&self) -> bool {
        self.messages.all().len() > 1 && !self.is_analyzing && !self.is_visualizing
    }
}
