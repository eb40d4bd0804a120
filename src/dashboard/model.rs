//! Dashboard payload returned by `GET /api/progress/dashboard`.
//!
//! The server builds these from SQL aggregates, so numbers arrive in mixed
//! shapes: plain JSON numbers, decimal strings (`"66.67"`), or `null` when a
//! `SUM` ran over zero rows. Every numeric field is read leniently and
//! defaults to zero.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub overall_stats: OverallStats,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic_performance: Vec<TopicPerformance>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recent_activity: Vec<RecentActivity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub difficulty_performance: Vec<DifficultyPerformance>,
}

impl DashboardData {
    /// No practice recorded yet.
    pub fn is_empty(&self) -> bool {
        self.overall_stats.total_questions == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OverallStats {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_questions: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub correct_answers: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub topics_practiced: u64,
    /// Percentage, 0–100.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub overall_accuracy: f64,
}

impl OverallStats {
    pub fn incorrect_answers(&self) -> u64 {
        self.total_questions.saturating_sub(self.correct_answers)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TopicPerformance {
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_questions: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub correct_answers: u64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub accuracy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DifficultyPerformance {
    #[serde(default, deserialize_with = "null_as_default")]
    pub difficulty: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_questions: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub correct_answers: u64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub accuracy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecentActivity {
    #[serde(default, deserialize_with = "null_as_default")]
    pub question: String,
    #[serde(default)]
    pub user_answer: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_correct: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    /// Server timestamp, kept as the raw string the server sent.
    #[serde(default)]
    pub created_at: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(0.0),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("number out of range: {n}"))),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(0.0),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("expected a number, got {s:?}"))),
        other => Err(D::Error::custom(format!("expected a number, got {other}"))),
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = lenient_f64(deserializer)?;
    if value < 0.0 {
        return Err(D::Error::custom(format!("expected a non-negative count, got {value}")));
    }
    Ok(value.round() as u64)
}
