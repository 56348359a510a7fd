//! Mock assistant service for controller and chat tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::assistant_client::{AnalysisError, AssistantService, RequestFailure, VisualizationError};

/// Returns queued results in order. An optional gate holds the next call
/// until it is released, which lets a test look at state mid-request.
#[derive(Default)]
pub struct MockAssistantService {
    answers: Mutex<VecDeque<Result<String, AnalysisError>>>,
    images: Mutex<VecDeque<Result<String, VisualizationError>>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    /// Questions received by `analyze`, in call order.
    pub questions: Mutex<Vec<String>>,
    /// Prompts received by `visualize`, in call order.
    pub prompts: Mutex<Vec<String>>,
}

impl MockAssistantService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: oneshot::Receiver<()>) -> Self {
        let service = Self::new();
        *service.gate.lock().unwrap() = Some(gate);
        service
    }

    pub fn queue_answer(&self, answer: &str) {
        self.answers.lock().unwrap().push_back(Ok(answer.to_string()));
    }

    pub fn queue_analysis_error(&self, message: &str) {
        self.answers
            .lock()
            .unwrap()
            .push_back(Err(RequestFailure::Transport(message.to_string()).into()));
    }

    pub fn queue_image(&self, url: &str) {
        self.images.lock().unwrap().push_back(Ok(url.to_string()));
    }

    pub fn queue_visualization_error(&self, message: &str) {
        self.images
            .lock()
            .unwrap()
            .push_back(Err(RequestFailure::Transport(message.to_string()).into()));
    }

    async fn wait_for_gate(&self) {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

#[async_trait]
impl AssistantService for MockAssistantService {
    async fn analyze(&self, question: &str) -> Result<String, AnalysisError> {
        self.questions.lock().unwrap().push(question.to_string());
        self.wait_for_gate().await;
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RequestFailure::Transport("no mock answer queued".to_string()).into()))
    }

    async fn visualize(&self, prompt: &str) -> Result<String, VisualizationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.wait_for_gate().await;
        self.images
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RequestFailure::Transport("no mock image queued".to_string()).into()))
    }
}
