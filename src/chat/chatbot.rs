//! The chatbot: runs one turn at a time against the remote backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{debug, info};

use super::grader::AnswerGrader;
use super::message::{Message, Transcript};
use super::state::{ChatState, GREETING, OpenQuestion, TurnOutcome, TurnPlan, plan_turn, resolve_turn};
use crate::api::{
    GenerateQuestionRequest, GeneratedQuestion, ProgressApi, ProgressRecord, QuestionApi, SaveAck,
};
use crate::error::ApiError;

/// The remote calls a turn can make.
#[async_trait]
pub trait TutorBackend: Send + Sync {
    async fn generate_question(
        &self,
        request: &GenerateQuestionRequest,
    ) -> Result<GeneratedQuestion, ApiError>;

    async fn save_progress(&self, record: &ProgressRecord) -> Result<SaveAck, ApiError>;
}

/// Backend backed by the real HTTP facades.
pub struct RemoteBackend {
    questions: QuestionApi,
    progress: ProgressApi,
}

impl RemoteBackend {
    pub fn new(questions: QuestionApi, progress: ProgressApi) -> Self {
        Self {
            questions,
            progress,
        }
    }
}

#[async_trait]
impl TutorBackend for RemoteBackend {
    async fn generate_question(
        &self,
        request: &GenerateQuestionRequest,
    ) -> Result<GeneratedQuestion, ApiError> {
        self.questions.generate_question(request).await
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<SaveAck, ApiError> {
        self.progress.save_progress(record).await
    }
}

/// What happened to a submitted line.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Blank input; nothing recorded.
    Empty,
    /// Another turn is still in flight; the input was dropped.
    Busy,
    /// The turn ran. `replies` are the bot messages it appended.
    Completed { replies: Vec<Message> },
}

struct Conversation {
    state: ChatState,
    transcript: Transcript,
}

/// Clears the in-flight flag when the turn ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Turn-taking chatbot.
///
/// At most one turn runs at a time. A [`submit`](Self::submit) that arrives
/// while another is awaiting the backend returns [`SubmitOutcome::Busy`]
/// without touching the transcript.
pub struct Chatbot {
    backend: Arc<dyn TutorBackend>,
    grader: Arc<dyn AnswerGrader>,
    conversation: std::sync::Mutex<Conversation>,
    in_flight: AtomicBool,
}

impl Chatbot {
    /// Start a conversation seeded with the greeting.
    pub fn new(backend: Arc<dyn TutorBackend>, grader: Arc<dyn AnswerGrader>) -> Self {
        let mut transcript = Transcript::new();
        transcript.push(Message::bot(GREETING));
        Self {
            backend,
            grader,
            conversation: std::sync::Mutex::new(Conversation {
                state: ChatState::default(),
                transcript,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    fn conversation(&self) -> std::sync::MutexGuard<'_, Conversation> {
        self.conversation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether a turn is waiting on the backend.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn state(&self) -> ChatState {
        self.conversation().state.clone()
    }

    pub fn open_question(&self) -> Option<OpenQuestion> {
        self.conversation().state.open_question().cloned()
    }

    /// Snapshot of every message so far, greeting included.
    pub fn messages(&self) -> Vec<Message> {
        self.conversation().transcript.messages().to_vec()
    }

    /// Run one turn for `input`.
    pub async fn submit(&self, input: &str) -> SubmitOutcome {
        let text = input.trim();
        if text.is_empty() {
            return SubmitOutcome::Empty;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Turn already in flight; dropping input");
            return SubmitOutcome::Busy;
        }
        let _in_flight = InFlight(&self.in_flight);

        let plan = {
            let mut conversation = self.conversation();
            conversation.transcript.push(Message::user(text));
            plan_turn(&conversation.state, text, self.grader.as_ref())
        };

        info!(kind = plan.kind(), "Dispatching turn");
        let outcome = match &plan {
            TurnPlan::GenerateQuestion(request) => {
                TurnOutcome::Generated(self.backend.generate_question(request).await)
            }
            TurnPlan::SaveAnswer(record) => {
                TurnOutcome::Saved(self.backend.save_progress(record).await.map(|_| ()))
            }
        };

        let mut conversation = self.conversation();
        let transition = resolve_turn(&conversation.state, outcome);
        if transition.next != conversation.state {
            info!(
                from = state_name(&conversation.state),
                to = state_name(&transition.next),
                "Conversation state changed"
            );
        }
        conversation.state = transition.next;
        conversation.transcript.extend(transition.replies.iter().cloned());

        SubmitOutcome::Completed {
            replies: transition.replies,
        }
    }
}

fn state_name(state: &ChatState) -> &'static str {
    match state {
        ChatState::AwaitingTopicRequest => "awaiting_topic_request",
        ChatState::AwaitingAnswer(_) => "awaiting_answer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::grader::FixedGrader;
    use crate::chat::intent::{Difficulty, Topic};
    use crate::chat::message::Role;
    use crate::chat::state::{ANSWER_ACKS, QUESTION_PROMPT};
    use tokio::sync::{Mutex, Notify};

    /// Records requests and replays scripted results.
    #[derive(Default)]
    struct ScriptedBackend {
        generated: Mutex<Vec<GenerateQuestionRequest>>,
        saved: Mutex<Vec<ProgressRecord>>,
        fail_generate: Option<&'static str>,
        fail_save: Mutex<Option<&'static str>>,
        /// When set, calls wait on this before answering.
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl TutorBackend for ScriptedBackend {
        async fn generate_question(
            &self,
            request: &GenerateQuestionRequest,
        ) -> Result<GeneratedQuestion, ApiError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.generated.lock().await.push(request.clone());
            if let Some(msg) = self.fail_generate {
                return Err(ApiError::new("generate_question", msg));
            }
            Ok(GeneratedQuestion {
                question: format!("A {} {} question", request.difficulty, request.topic),
                topic: request.topic.to_string(),
                difficulty: request.difficulty.to_string(),
            })
        }

        async fn save_progress(&self, record: &ProgressRecord) -> Result<SaveAck, ApiError> {
            self.saved.lock().await.push(record.clone());
            if let Some(msg) = *self.fail_save.lock().await {
                return Err(ApiError::new("save_progress", msg));
            }
            Ok(SaveAck::default())
        }
    }

    fn chatbot(backend: Arc<ScriptedBackend>) -> Chatbot {
        Chatbot::new(backend, Arc::new(FixedGrader(true)))
    }

    #[tokio::test]
    async fn starts_with_greeting() {
        let bot = chatbot(Arc::new(ScriptedBackend::default()));
        let messages = bot.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Bot);
        assert_eq!(messages[0].text, GREETING);
        assert_eq!(bot.state(), ChatState::AwaitingTopicRequest);
    }

    #[tokio::test]
    async fn easy_calculus_request_opens_question() {
        let backend = Arc::new(ScriptedBackend::default());
        let bot = chatbot(backend.clone());

        let outcome = bot.submit("Can you give me an easy calculus question?").await;
        let SubmitOutcome::Completed { replies } = outcome else {
            panic!("expected Completed");
        };
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[1].text, QUESTION_PROMPT);

        let requests = backend.generated.lock().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].topic, Topic::Calculus);
        assert_eq!(requests[0].difficulty, Difficulty::Easy);

        let open = bot.open_question().unwrap();
        assert_eq!(open.question, "A easy calculus question");

        // greeting + user + 2 bot
        let messages = bot.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].role, Role::User);
    }

    #[tokio::test]
    async fn numeric_answer_is_saved_and_closes_question() {
        let backend = Arc::new(ScriptedBackend::default());
        let bot = chatbot(backend.clone());

        bot.submit("calculus please").await;
        let outcome = bot.submit("42").await;
        let SubmitOutcome::Completed { replies } = outcome else {
            panic!("expected Completed");
        };
        let texts: Vec<_> = replies.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ANSWER_ACKS);

        let saved = backend.saved.lock().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].user_answer, "42");
        assert_eq!(saved[0].topic, "calculus");
        assert!(saved[0].is_correct);
        assert!(bot.open_question().is_none());
    }

    #[tokio::test]
    async fn generation_failure_appends_one_error() {
        let backend = Arc::new(ScriptedBackend {
            fail_generate: Some("Failed to generate question"),
            ..Default::default()
        });
        let bot = chatbot(backend);

        let SubmitOutcome::Completed { replies } = bot.submit("algebra").await else {
            panic!("expected Completed");
        };
        assert_eq!(replies.len(), 1);
        assert!(replies[0].text.contains("Failed to generate question"));
        assert!(bot.open_question().is_none());
        assert!(!bot.is_busy());
    }

    #[tokio::test]
    async fn save_failure_keeps_question_and_next_answer_retries() {
        let backend = Arc::new(ScriptedBackend::default());
        *backend.fail_save.lock().await = Some("Failed to save progress");
        let bot = chatbot(backend.clone());

        bot.submit("statistics").await;
        let SubmitOutcome::Completed { replies } = bot.submit("7").await else {
            panic!("expected Completed");
        };
        assert_eq!(replies.len(), 1);
        assert!(replies[0].text.contains("Failed to save progress"));
        assert!(bot.open_question().is_some());

        *backend.fail_save.lock().await = None;
        bot.submit("7").await;
        assert!(bot.open_question().is_none());
        assert_eq!(backend.saved.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let backend = Arc::new(ScriptedBackend::default());
        let bot = chatbot(backend.clone());

        assert!(matches!(bot.submit("   \n").await, SubmitOutcome::Empty));
        assert_eq!(bot.messages().len(), 1);
        assert!(backend.generated.lock().await.is_empty());
    }

    #[tokio::test]
    async fn input_during_pending_call_is_dropped() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(ScriptedBackend {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let bot = Arc::new(chatbot(backend.clone()));

        let first = {
            let bot = Arc::clone(&bot);
            tokio::spawn(async move { bot.submit("geometry").await })
        };

        // Wait until the first turn holds the gate.
        while !bot.is_busy() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(bot.submit("trigonometry").await, SubmitOutcome::Busy));
        // greeting + first user message only
        assert_eq!(bot.messages().len(), 2);

        gate.notify_one();
        let outcome = first.await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Completed { .. }));
        assert!(!bot.is_busy());

        let requests = backend.generated.lock().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].topic, Topic::Geometry);
    }
}
