pub mod command;
pub mod controller;
pub mod conversation_state;
pub mod prompt;
pub mod render;
pub mod welcome;

#[cfg(test)]
mod testing;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use command::Command;
use controller::{ConversationController, UiFlags};
use conversation_state::Sender;
use eyre::Result;
use prompt::generate_prompt;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::assistant_client::AssistantService;
use crate::config::ClientConfig;

const HELP_TEXT: &str = "
Room Assistant

Type a question about furniture or decor and press enter.

/visualize    Generate an image of the last suggestion
/designer     Show how to contact a designer
/clear        Start a new conversation
/help         Show this help dialogue
/quit         Quit the application
";

const NOT_YET_TEXT: &str = "Ask me about your room first, then I can visualize it or connect you with a designer.";
const BUSY_TEXT: &str = "Still working on your last request, one moment.";
const EMPTY_QUESTION_TEXT: &str = "Nothing to ask: the question given with --input is blank.";

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    config: ClientConfig,
    service: Arc<dyn AssistantService>,
    controller: ConversationController,
    rendered: usize,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        interactive: bool,
        config: ClientConfig,
        service: Arc<dyn AssistantService>,
    ) -> Self {
        let controller = ConversationController::start(&mut rand::thread_rng(), Arc::clone(&service));
        Self {
            output,
            input,
            interactive,
            config,
            service,
            controller,
            rendered: 0,
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        info!("Using assistant service at {}", self.config.base_url());

        // Single question, no REPL and no greeting
        if let Some(input) = self.input.take() {
            if input.trim().is_empty() {
                writeln!(self.output, "{}", EMPTY_QUESTION_TEXT)?;
                return Ok(ExitCode::FAILURE);
            }
            self.rendered = self.controller.messages().len();
            self.ask(&input).await?;
            let failed = self
                .controller
                .messages()
                .last()
                .map_or(true, |message| message.is_failure());
            return Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS });
        }

        self.render_new_messages()?;

        if self.interactive {
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            let prompt_text = generate_prompt(self.controller.flags().suggestions_visible);
            let readline = rl.readline(&prompt_text);

            match readline {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str());
                    }

                    match self.handle_input(&line).await {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(e) => {
                            writeln!(self.output, "Error: {}", e)?;
                        }
                    }
                }
                Err(e) => {
                    debug!("Line editor closed: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Returns `false` once the user asks to quit.
    async fn handle_input(&mut self, input: &str) -> Result<bool> {
        match Command::parse(input) {
            Command::Empty => {}
            Command::Ask(question) => self.ask(&question).await?,
            Command::Visualize => {
                if self.suggestions_available()? {
                    self.visualize().await?;
                }
            }
            Command::Designer => {
                if self.suggestions_available()? {
                    writeln!(
                        self.output,
                        "You can reach one of our designers at {}\n",
                        self.config.designer_contact
                    )?;
                }
            }
            Command::Clear => {
                self.controller =
                    ConversationController::start(&mut rand::thread_rng(), Arc::clone(&self.service));
                self.rendered = 0;
                self.render_new_messages()?;
            }
            Command::Help => {
                writeln!(self.output, "{}", HELP_TEXT)?;
            }
            Command::Quit => return Ok(false),
            Command::Unknown(command) => {
                writeln!(self.output, "Unknown command {}. Type /help for options.", command)?;
            }
        }

        Ok(true)
    }

    async fn ask(&mut self, question: &str) -> Result<()> {
        self.controller.set_pending_input(question);
        let flags = self.progress_flags();
        let (_, progress) = tokio::join!(
            self.controller.submit_pending_input(),
            show_progress(self.output.as_mut(), flags, "Analyzing...")
        );
        progress?;
        self.render_new_messages()
    }

    async fn visualize(&mut self) -> Result<()> {
        let flags = self.progress_flags();
        let ((), progress) = tokio::join!(
            self.controller.request_visualization(),
            show_progress(self.output.as_mut(), flags, "Generating visualization...")
        );
        progress?;
        self.render_new_messages()
    }

    /// Progress lines use cursor movement, so they are only drawn for an
    /// interactive session.
    fn progress_flags(&self) -> Option<watch::Receiver<UiFlags>> {
        self.interactive.then(|| self.controller.subscribe())
    }

    /// Admission control for the suggestion commands.
    fn suggestions_available(&mut self) -> Result<bool> {
        let flags = self.controller.flags();
        if flags.suggestions_visible {
            return Ok(true);
        }

        let reason = if is_busy(&flags) {
            BUSY_TEXT
        } else {
            NOT_YET_TEXT
        };
        writeln!(self.output, "{}\n", reason)?;
        Ok(false)
    }

    fn render_new_messages(&mut self) -> Result<()> {
        let messages = self.controller.messages();
        for message in &messages[self.rendered.min(messages.len())..] {
            // The line editor already echoed what the user typed.
            if self.interactive && message.sender() == Sender::User {
                continue;
            }
            render::render_message(self.output.as_mut(), message)?;
        }
        self.rendered = messages.len();
        self.output.flush()?;
        Ok(())
    }
}

fn is_busy(flags: &UiFlags) -> bool {
    flags.is_analyzing || flags.is_visualizing
}

/// Shows `status` while a request is pending and erases it once it settles.
async fn show_progress(
    output: &mut dyn Write,
    flags: Option<watch::Receiver<UiFlags>>,
    status: &str,
) -> Result<()> {
    let Some(mut flags) = flags else {
        return Ok(());
    };

    let busy = is_busy(&flags.borrow_and_update());
    if !busy {
        return Ok(());
    }

    render::show_status(output, status)?;
    // The sender lives in the controller, which outlives this future.
    let _ = flags.wait_for(|f| !is_busy(f)).await;
    render::clear_status(output)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::sync::oneshot;

    use super::*;
    use crate::cli::chat::controller::{ANALYSIS_FAILURE_TEXT, VISUALIZATION_CAPTION};
    use crate::cli::chat::testing::MockAssistantService;
    use crate::config::DEFAULT_DESIGNER_CONTACT;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn chat_with(
        service: &Arc<MockAssistantService>,
        input: Option<&str>,
    ) -> (ChatContext, SharedBuffer) {
        build_chat(service, input, false)
    }

    fn build_chat(
        service: &Arc<MockAssistantService>,
        input: Option<&str>,
        interactive: bool,
    ) -> (ChatContext, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let config = ClientConfig::new("http://localhost:5000", DEFAULT_DESIGNER_CONTACT).unwrap();
        let service: Arc<dyn AssistantService> = service.clone();
        let chat = ChatContext::new(
            Box::new(buffer.clone()),
            input.map(str::to_string),
            interactive,
            config,
            service,
        );
        (chat, buffer)
    }

    #[tokio::test]
    async fn single_question_prints_answer() {
        let service = Arc::new(MockAssistantService::new());
        service.queue_answer("Try a loveseat.");
        let (mut chat, buffer) = chat_with(&service, Some("What sofa fits a small room?"));

        chat.run().await.unwrap();

        let output = buffer.contents();
        assert!(output.contains("What sofa fits a small room?"));
        assert!(output.contains("Try a loveseat."));
    }

    #[tokio::test]
    async fn failed_question_prints_placeholder_not_diagnostic() {
        let service = Arc::new(MockAssistantService::new());
        service.queue_analysis_error("dns lookup failed");
        let (mut chat, buffer) = chat_with(&service, Some("Hello?"));

        chat.run().await.unwrap();

        let output = buffer.contents();
        assert!(output.contains(ANALYSIS_FAILURE_TEXT));
        assert!(!output.contains("dns lookup failed"));
    }

    #[tokio::test]
    async fn suggestions_are_refused_before_first_answer() {
        let service = Arc::new(MockAssistantService::new());
        let (mut chat, buffer) = chat_with(&service, None);

        assert!(chat.handle_input("/visualize").await.unwrap());
        assert!(chat.handle_input("/designer").await.unwrap());

        assert!(buffer.contents().contains(NOT_YET_TEXT));
        assert!(service.prompts.lock().unwrap().is_empty());
        assert_eq!(chat.controller.messages().len(), 1);
    }

    #[tokio::test]
    async fn visualize_after_answer_shows_image() {
        let service = Arc::new(MockAssistantService::new());
        service.queue_answer("A linen sofa.");
        service.queue_image("http://x/img.png");
        let (mut chat, buffer) = chat_with(&service, None);

        chat.handle_input("Which sofa?").await.unwrap();
        chat.handle_input("/visualize").await.unwrap();
        chat.handle_input("/designer").await.unwrap();

        let output = buffer.contents();
        assert!(output.contains(VISUALIZATION_CAPTION));
        assert!(output.contains("http://x/img.png"));
        assert!(output.contains(DEFAULT_DESIGNER_CONTACT));
        assert!(service.prompts.lock().unwrap()[0].contains("A linen sofa."));
    }

    #[tokio::test]
    async fn clear_starts_a_fresh_session() {
        let service = Arc::new(MockAssistantService::new());
        service.queue_answer("Answer.");
        let (mut chat, _buffer) = chat_with(&service, None);

        chat.handle_input("question").await.unwrap();
        assert_eq!(chat.controller.messages().len(), 3);

        chat.handle_input("/clear").await.unwrap();
        assert_eq!(chat.controller.messages().len(), 1);
        assert!(chat.controller.state().last_assistant_answer.is_none());
    }

    #[tokio::test]
    async fn quit_and_blank_lines() {
        let service = Arc::new(MockAssistantService::new());
        let (mut chat, _buffer) = chat_with(&service, None);

        assert!(chat.handle_input("   ").await.unwrap());
        assert_eq!(chat.controller.messages().len(), 1);
        assert!(!chat.handle_input("/quit").await.unwrap());
    }

    #[tokio::test]
    async fn single_question_output_has_no_progress_line() {
        let (release, gate) = oneshot::channel();
        let service = Arc::new(MockAssistantService::gated(gate));
        service.queue_answer("Try a loveseat.");
        let (mut chat, buffer) = chat_with(&service, Some("What sofa fits a small room?"));

        let (outcome, ()) = tokio::join!(chat.run(), async move {
            release.send(()).unwrap();
        });
        outcome.unwrap();

        let output = buffer.contents();
        assert!(output.contains("Try a loveseat."));
        assert!(!output.contains("Analyzing..."));
        assert!(!output.contains("\u{1b}[1F"));
        assert!(!output.contains("\u{1b}[2K"));
    }

    #[tokio::test]
    async fn interactive_session_shows_progress_while_pending() {
        let (release, gate) = oneshot::channel();
        let service = Arc::new(MockAssistantService::gated(gate));
        service.queue_answer("Try a loveseat.");
        let (mut chat, buffer) = build_chat(&service, None, true);

        let (outcome, ()) = tokio::join!(chat.handle_input("Which sofa?"), async move {
            release.send(()).unwrap();
        });
        assert!(outcome.unwrap());

        let output = buffer.contents();
        assert!(output.contains("Analyzing..."));
        assert!(output.contains("Try a loveseat."));
    }

    #[tokio::test]
    async fn blank_single_question_is_reported() {
        let service = Arc::new(MockAssistantService::new());
        let (mut chat, buffer) = chat_with(&service, Some("   "));

        chat.run().await.unwrap();

        assert!(buffer.contents().contains(EMPTY_QUESTION_TEXT));
        assert!(service.questions.lock().unwrap().is_empty());
        assert_eq!(chat.controller.messages().len(), 1);
    }
}
