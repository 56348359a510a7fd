use std::sync::Arc;

use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::conversation_state::{ConversationState, Message};
use super::welcome;
use crate::assistant_client::AssistantService;

pub const ANALYSIS_FAILURE_TEXT: &str =
    "Sorry, I couldn't look into that right now. Please try asking again.";
pub const VISUALIZATION_CAPTION: &str = "Here's how these pieces could come together in a room:";
pub const VISUALIZATION_FAILURE_TEXT: &str =
    "Sorry, I couldn't create a visualization right now. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Analysis,
    Visualization,
}

/// Snapshot of the flags a surface needs to render controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UiFlags {
    pub is_analyzing: bool,
    pub is_visualizing: bool,
    pub suggestions_visible: bool,
}

/// Builds the image prompt around the most recent answer. With no answer yet
/// the quoted segment is left empty.
pub fn visualization_prompt(last_answer: Option<&str>) -> String {
    format!(
        "Create a realistic image of a cozy living room in a modern minimalist style \
         featuring these products: \"{}\". Use warm lighting, wood flooring and neutral walls.",
        last_answer.unwrap_or("")
    )
}

/// Owns the conversation and drives both request kinds through
/// idle -> pending -> idle, appending exactly one assistant message per
/// settled request.
pub struct ConversationController {
    state: ConversationState,
    service: Arc<dyn AssistantService>,
    flags: watch::Sender<UiFlags>,
}

impl ConversationController {
    pub fn new(greeting: Message, service: Arc<dyn AssistantService>) -> Self {
        let state = ConversationState::new(greeting);
        let (flags, _) = watch::channel(flags_of(&state));
        Self {
            state,
            service,
            flags,
        }
    }

    /// Starts a session seeded with a greeting drawn from `rng`.
    pub fn start<R: Rng + ?Sized>(rng: &mut R, service: Arc<dyn AssistantService>) -> Self {
        Self::new(welcome::init(rng), service)
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        self.state.get_messages()
    }

    pub fn flags(&self) -> UiFlags {
        flags_of(&self.state)
    }

    pub fn subscribe(&self) -> watch::Receiver<UiFlags> {
        self.flags.subscribe()
    }

    pub fn set_pending_input(&mut self, text: &str) {
        self.state.pending_input = text.to_string();
    }

    pub async fn submit_pending_input(&mut self) -> bool {
        let text = self.state.pending_input.clone();
        self.submit_question(&text).await
    }

    /// Sends `text` for analysis. Blank input is ignored and returns `false`.
    pub async fn submit_question(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            debug!("Ignoring blank question");
            return false;
        }

        self.state.messages.append(Message::question(text));
        self.state.pending_input.clear();

        let service = Arc::clone(&self.service);
        let mut pending = InFlight::begin(self, OperationKind::Analysis);

        match service.analyze(text).await {
            Ok(answer) => {
                info!("Analysis succeeded ({} bytes)", answer.len());
                let state = pending.state();
                state.messages.append(Message::answer(&answer));
                state.last_assistant_answer = Some(answer);
            }
            Err(e) => {
                error!("{}", e);
                pending.state().messages.append(Message::failure(ANALYSIS_FAILURE_TEXT));
            }
        }

        true
    }

    /// Asks for an image of the last answer. Gating on `suggestions_visible`
    /// is up to the caller.
    pub async fn request_visualization(&mut self) {
        let prompt = visualization_prompt(self.state.last_assistant_answer.as_deref());
        debug!("Visualization prompt: {}", prompt);

        let service = Arc::clone(&self.service);
        let mut pending = InFlight::begin(self, OperationKind::Visualization);

        match service.visualize(&prompt).await {
            Ok(image_url) => {
                info!("Visualization ready at {}", image_url);
                pending
                    .state()
                    .messages
                    .append(Message::visualization(VISUALIZATION_CAPTION, &image_url));
            }
            Err(e) => {
                error!("{}", e);
                pending
                    .state()
                    .messages
                    .append(Message::failure(VISUALIZATION_FAILURE_TEXT));
            }
        }
    }

    fn set_pending(&mut self, kind: OperationKind, pending: bool) {
        match kind {
            OperationKind::Analysis => self.state.is_analyzing = pending,
            OperationKind::Visualization => self.state.is_visualizing = pending,
        }
        self.flags.send_replace(flags_of(&self.state));
    }
}

fn flags_of(state: &ConversationState) -> UiFlags {
    UiFlags {
        is_analyzing: state.is_analyzing,
        is_visualizing: state.is_visualizing,
        suggestions_visible: state.suggestions_visible(),
    }
}

/// Holds one operation kind pending. The flag is cleared on drop, so it also
/// clears when the request future is dropped or unwinds.
struct InFlight<'a> {
    controller: &'a mut ConversationController,
    kind: OperationKind,
}

impl<'a> InFlight<'a> {
    fn begin(controller: &'a mut ConversationController, kind: OperationKind) -> Self {
        controller.set_pending(kind, true);
        Self { controller, kind }
    }

    fn state(&mut self) -> &mut ConversationState {
        &mut self.controller.state
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.controller.set_pending(self.kind, false);
    }
}
