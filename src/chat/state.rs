//! Conversation state machine: pure transition logic, no I/O.
//!
//! A turn is two steps:
//! 1. [`plan_turn`] reads the current state and the user's input and
//!    describes the one remote call to make.
//! 2. [`resolve_turn`] takes the call's outcome and produces the next state
//!    plus the bot replies to append.
//!
//! The dispatcher in [`super::chatbot`] runs the call in between.

use serde::{Deserialize, Serialize};

use super::grader::{AnswerGrader, PLACEHOLDER_CORRECT_ANSWER};
use super::intent::{extract_difficulty, extract_topic, looks_like_answer};
use super::message::Message;
use crate::api::{GenerateQuestionRequest, GeneratedQuestion, ProgressRecord};
use crate::error::ApiError;

/// Pre-seeded first bot message.
pub const GREETING: &str = "Hello! I'm your UTD Math Question Generator. I can help you practice \
math problems. Try asking me to generate questions on topics like:\n\n\
• Algebra\n• Calculus\n• Linear Algebra\n• Differential Equations\n• Statistics\n• Discrete Math\n\n\
What topic would you like to practice today?";

/// Sent right after a generated question.
pub const QUESTION_PROMPT: &str = "Take your time to solve this problem. When you're ready, \
share your answer and I'll provide feedback!";

/// The two acknowledgements sent after an answer is saved.
pub const ANSWER_ACKS: [&str; 2] = [
    "Thank you for your answer! Let me provide feedback and save your progress.",
    "Progress saved! Would you like to try another question?",
];

/// Bot text for a failed turn.
pub fn error_reply(reason: &str) -> String {
    format!("Sorry, I encountered an error: {reason}. Please try again.")
}

/// The question currently waiting for an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenQuestion {
    pub question: String,
    pub topic: String,
    pub difficulty: String,
}

impl From<GeneratedQuestion> for OpenQuestion {
    fn from(q: GeneratedQuestion) -> Self {
        Self {
            question: q.question,
            topic: q.topic,
            difficulty: q.difficulty,
        }
    }
}

/// Where the conversation is. Holding the open question inside the
/// `AwaitingAnswer` variant keeps it to at most one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChatState {
    #[default]
    AwaitingTopicRequest,
    AwaitingAnswer(OpenQuestion),
}

impl ChatState {
    pub fn open_question(&self) -> Option<&OpenQuestion> {
        match self {
            Self::AwaitingAnswer(q) => Some(q),
            Self::AwaitingTopicRequest => None,
        }
    }
}

/// The remote call a turn needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnPlan {
    GenerateQuestion(GenerateQuestionRequest),
    SaveAnswer(ProgressRecord),
}

impl TurnPlan {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GenerateQuestion(_) => "generate_question",
            Self::SaveAnswer(_) => "save_answer",
        }
    }
}

/// Result of the remote call described by a [`TurnPlan`].
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    Generated(Result<GeneratedQuestion, ApiError>),
    Saved(Result<(), ApiError>),
}

/// Next state plus the bot messages to append.
#[derive(Debug, Clone)]
pub struct Transition {
    pub next: ChatState,
    pub replies: Vec<Message>,
}

/// Classify `input` and describe the call to make.
///
/// Input is an answer only while a question is open and it looks like one;
/// anything else is a request for a new question.
pub fn plan_turn(state: &ChatState, input: &str, grader: &dyn AnswerGrader) -> TurnPlan {
    if let ChatState::AwaitingAnswer(open) = state {
        if looks_like_answer(input) {
            return TurnPlan::SaveAnswer(ProgressRecord {
                question: open.question.clone(),
                user_answer: input.to_string(),
                correct_answer: PLACEHOLDER_CORRECT_ANSWER.to_string(),
                is_correct: grader.grade(&open.question, input),
                topic: open.topic.clone(),
                difficulty: open.difficulty.clone(),
            });
        }
    }

    TurnPlan::GenerateQuestion(GenerateQuestionRequest {
        topic: extract_topic(input),
        difficulty: extract_difficulty(input),
        request: input.to_string(),
    })
}

/// Apply a call's outcome to `state`.
///
/// Failures leave the state as it was, including an open question whose
/// answer failed to save.
pub fn resolve_turn(state: &ChatState, outcome: TurnOutcome) -> Transition {
    match outcome {
        TurnOutcome::Generated(Ok(generated)) => {
            let question_text = generated.question.clone();
            Transition {
                next: ChatState::AwaitingAnswer(generated.into()),
                replies: vec![Message::bot(question_text), Message::bot(QUESTION_PROMPT)],
            }
        }
        TurnOutcome::Saved(Ok(())) => Transition {
            next: ChatState::AwaitingTopicRequest,
            replies: ANSWER_ACKS.iter().map(|text| Message::bot(*text)).collect(),
        },
        TurnOutcome::Generated(Err(e)) | TurnOutcome::Saved(Err(e)) => Transition {
            next: state.clone(),
            replies: vec![Message::bot(error_reply(&e.message))],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::grader::FixedGrader;
    use crate::chat::intent::{Difficulty, Topic};
    use crate::chat::message::Role;

    fn open(question: &str) -> ChatState {
        ChatState::AwaitingAnswer(OpenQuestion {
            question: question.to_string(),
            topic: "calculus".to_string(),
            difficulty: "easy".to_string(),
        })
    }

    fn generated(question: &str) -> GeneratedQuestion {
        GeneratedQuestion {
            question: question.to_string(),
            topic: "calculus".to_string(),
            difficulty: "easy".to_string(),
        }
    }

    #[test]
    fn topic_request_plans_generation() {
        let plan = plan_turn(
            &ChatState::AwaitingTopicRequest,
            "Can you give me an easy calculus question?",
            &FixedGrader(true),
        );
        assert_eq!(
            plan,
            TurnPlan::GenerateQuestion(GenerateQuestionRequest {
                topic: Topic::Calculus,
                difficulty: Difficulty::Easy,
                request: "Can you give me an easy calculus question?".to_string(),
            })
        );
    }

    #[test]
    fn numeric_input_with_open_question_is_an_answer() {
        let plan = plan_turn(&open("What is 6 * 7?"), "42", &FixedGrader(false));
        let TurnPlan::SaveAnswer(record) = plan else {
            panic!("expected SaveAnswer, got {plan:?}");
        };
        assert_eq!(record.user_answer, "42");
        assert_eq!(record.question, "What is 6 * 7?");
        assert_eq!(record.correct_answer, PLACEHOLDER_CORRECT_ANSWER);
        assert!(!record.is_correct);
        assert_eq!(record.topic, "calculus");
        assert_eq!(record.difficulty, "easy");
    }

    #[test]
    fn answer_keyword_counts_without_digits() {
        let plan = plan_turn(&open("Q"), "my Solution is x equals pi", &FixedGrader(true));
        assert_eq!(plan.kind(), "save_answer");
    }

    #[test]
    fn non_answer_with_open_question_requests_new_question() {
        let plan = plan_turn(&open("Q"), "give me a hard geometry one instead", &FixedGrader(true));
        let TurnPlan::GenerateQuestion(req) = plan else {
            panic!("expected GenerateQuestion");
        };
        assert_eq!(req.topic, Topic::Geometry);
        assert_eq!(req.difficulty, Difficulty::Hard);
    }

    #[test]
    fn answer_without_open_question_is_a_topic_request() {
        let plan = plan_turn(&ChatState::AwaitingTopicRequest, "42", &FixedGrader(true));
        let TurnPlan::GenerateQuestion(req) = plan else {
            panic!("expected GenerateQuestion");
        };
        assert_eq!(req.topic, Topic::Algebra);
        assert_eq!(req.difficulty, Difficulty::Medium);
        assert_eq!(req.request, "42");
    }

    #[test]
    fn generation_success_opens_question_with_two_replies() {
        let t = resolve_turn(
            &ChatState::AwaitingTopicRequest,
            TurnOutcome::Generated(Ok(generated("Differentiate x^2."))),
        );
        assert_eq!(t.next.open_question().unwrap().question, "Differentiate x^2.");
        assert_eq!(t.replies.len(), 2);
        assert!(t.replies.iter().all(|m| m.role == Role::Bot));
        assert_eq!(t.replies[0].text, "Differentiate x^2.");
        assert_eq!(t.replies[1].text, QUESTION_PROMPT);
    }

    #[test]
    fn generation_success_replaces_previous_open_question() {
        let t = resolve_turn(
            &open("old"),
            TurnOutcome::Generated(Ok(generated("new"))),
        );
        assert_eq!(t.next.open_question().unwrap().question, "new");
    }

    #[test]
    fn generation_failure_sets_no_question() {
        let t = resolve_turn(
            &ChatState::AwaitingTopicRequest,
            TurnOutcome::Generated(Err(ApiError::new(
                "generate_question",
                "Failed to generate question",
            ))),
        );
        assert_eq!(t.next, ChatState::AwaitingTopicRequest);
        assert_eq!(t.replies.len(), 1);
        assert!(t.replies[0].text.contains("Failed to generate question"));
    }

    #[test]
    fn save_success_closes_question_with_two_acks() {
        let t = resolve_turn(&open("Q"), TurnOutcome::Saved(Ok(())));
        assert_eq!(t.next, ChatState::AwaitingTopicRequest);
        let texts: Vec<_> = t.replies.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ANSWER_ACKS);
    }

    #[test]
    fn save_failure_keeps_question_open() {
        let state = open("Q");
        let t = resolve_turn(
            &state,
            TurnOutcome::Saved(Err(ApiError::new("save_progress", "Token is invalid!"))),
        );
        assert_eq!(t.next, state);
        assert_eq!(t.replies.len(), 1);
        assert_eq!(
            t.replies[0].text,
            "Sorry, I encountered an error: Token is invalid!. Please try again."
        );
    }
}
