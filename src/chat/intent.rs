//! Keyword heuristics that read intent out of free-text chat input.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Practice topics, in match-priority order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    #[default]
    #[serde(rename = "algebra")]
    Algebra,
    #[serde(rename = "calculus")]
    Calculus,
    #[serde(rename = "linear algebra")]
    LinearAlgebra,
    #[serde(rename = "differential equations")]
    DifferentialEquations,
    #[serde(rename = "statistics")]
    Statistics,
    #[serde(rename = "discrete math")]
    DiscreteMath,
    #[serde(rename = "geometry")]
    Geometry,
    #[serde(rename = "trigonometry")]
    Trigonometry,
    #[serde(rename = "probability")]
    Probability,
    #[serde(rename = "number theory")]
    NumberTheory,
    #[serde(rename = "combinatorics")]
    Combinatorics,
}

impl Topic {
    /// All topics in the order they are tried against input.
    ///
    /// Order matters: `algebra` comes first, so "linear algebra" requests
    /// resolve to `Algebra`.
    pub const ALL: [Topic; 11] = [
        Topic::Algebra,
        Topic::Calculus,
        Topic::LinearAlgebra,
        Topic::DifferentialEquations,
        Topic::Statistics,
        Topic::DiscreteMath,
        Topic::Geometry,
        Topic::Trigonometry,
        Topic::Probability,
        Topic::NumberTheory,
        Topic::Combinatorics,
    ];

    /// The lowercase keyword, which is also the wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Algebra => "algebra",
            Self::Calculus => "calculus",
            Self::LinearAlgebra => "linear algebra",
            Self::DifferentialEquations => "differential equations",
            Self::Statistics => "statistics",
            Self::DiscreteMath => "discrete math",
            Self::Geometry => "geometry",
            Self::Trigonometry => "trigonometry",
            Self::Probability => "probability",
            Self::NumberTheory => "number theory",
            Self::Combinatorics => "combinatorics",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested question difficulty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First topic keyword contained in `message` (case-insensitive), else algebra.
pub fn extract_topic(message: &str) -> Topic {
    let lower = message.to_lowercase();
    Topic::ALL
        .into_iter()
        .find(|topic| lower.contains(topic.as_str()))
        .unwrap_or_default()
}

/// Difficulty keyword in `message`. Easy wins over hard when both appear.
pub fn extract_difficulty(message: &str) -> Difficulty {
    let lower = message.to_lowercase();
    if ["easy", "beginner"].iter().any(|k| lower.contains(k)) {
        Difficulty::Easy
    } else if ["hard", "difficult", "advanced"]
        .iter()
        .any(|k| lower.contains(k))
    {
        Difficulty::Hard
    } else {
        Difficulty::Medium
    }
}

static ANSWER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)answer|solution|[0-9]").expect("answer pattern compiles"));

/// Whether `message` reads like an answer: it mentions "answer" or
/// "solution", or contains a decimal digit.
///
/// Only meaningful while a question is open.
pub fn looks_like_answer(message: &str) -> bool {
    ANSWER_PATTERN.is_match(message)
}
