//! Answer grading.
//!
//! There is no real evaluation yet. [`RandomGrader`] is a stand-in that marks
//! answers correct at a fixed rate so the dashboard has data to show. Swap
//! in a real [`AnswerGrader`] once the server can evaluate answers.

use rand::Rng;

/// Correct-answer text sent with every progress record until real
/// evaluation exists.
pub const PLACEHOLDER_CORRECT_ANSWER: &str = "Answer evaluation would be implemented here";

/// Decides whether an answer is correct.
pub trait AnswerGrader: Send + Sync {
    fn grade(&self, question: &str, answer: &str) -> bool;
}

/// Placeholder grader: an unseeded coin flip weighted by `correct_rate`.
#[derive(Debug, Clone, Copy)]
pub struct RandomGrader {
    correct_rate: f64,
}

impl RandomGrader {
    /// Rates outside 0..=1 are clamped; NaN or infinite rates fall back to
    /// the default.
    pub fn new(correct_rate: f64) -> Self {
        let correct_rate = if correct_rate.is_finite() {
            correct_rate.clamp(0.0, 1.0)
        } else {
            crate::config::DEFAULT_CORRECT_RATE
        };
        Self { correct_rate }
    }
}

impl Default for RandomGrader {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CORRECT_RATE)
    }
}

impl AnswerGrader for RandomGrader {
    fn grade(&self, _question: &str, _answer: &str) -> bool {
        rand::thread_rng().gen_bool(self.correct_rate)
    }
}

/// Always returns the same verdict.
#[derive(Debug, Clone, Copy)]
pub struct FixedGrader(pub bool);

impl AnswerGrader for FixedGrader {
    fn grade(&self, _question: &str, _answer: &str) -> bool {
        self.0
    }
}
