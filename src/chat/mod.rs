//! Practice chat: the conversational core.
//!
//! The user asks for a question in free text, the server generates one, the
//! user answers, and the answer is recorded. [`state`] holds the pure
//! transition rules; [`Chatbot`] drives them against a [`TutorBackend`].

pub mod chatbot;
pub mod grader;
pub mod intent;
pub mod message;
pub mod state;

pub use chatbot::{Chatbot, RemoteBackend, SubmitOutcome, TutorBackend};
pub use grader::{AnswerGrader, RandomGrader};
pub use intent::{Difficulty, Topic};
pub use message::{Message, Role};
pub use state::{ChatState, OpenQuestion};
