//! Dashboard view: fetch state plus a plain-text rendering.

use super::model::{DashboardData, DifficultyPerformance, RecentActivity, TopicPerformance};
use crate::api::ProgressApi;
use crate::error::ApiError;

const TITLE: &str = "📊 Progress Dashboard";
const SUBTITLE: &str = "Track your math practice progress";
const BAR_WIDTH: usize = 24;
const RECENT_ACTIVITY_LIMIT: usize = 5;
const QUESTION_PREVIEW_CHARS: usize = 100;

/// What the dashboard is showing.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardState {
    Loading,
    Failed(String),
    /// Loaded, but nothing has been practiced yet.
    Empty,
    Ready(DashboardData),
}

impl DashboardState {
    pub fn from_result(result: Result<DashboardData, ApiError>) -> Self {
        match result {
            Ok(data) if data.is_empty() => Self::Empty,
            Ok(data) => Self::Ready(data),
            Err(e) => Self::Failed(e.message),
        }
    }
}

/// The dashboard screen. Nothing is aggregated client-side; retry is just
/// another [`load`](Self::load).
pub struct DashboardView {
    progress: ProgressApi,
    state: DashboardState,
}

impl DashboardView {
    pub fn new(progress: ProgressApi) -> Self {
        Self {
            progress,
            state: DashboardState::Loading,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Fetch (or re-fetch) the aggregates.
    pub async fn load(&mut self) -> &DashboardState {
        self.state = DashboardState::Loading;
        let result = self.progress.dashboard().await;
        self.state = DashboardState::from_result(result);
        if let DashboardState::Failed(ref reason) = self.state {
            tracing::warn!(reason = %reason, "Dashboard load failed");
        }
        &self.state
    }

    pub fn render(&self) -> String {
        render(&self.state)
    }
}

/// Render a dashboard state as terminal text.
pub fn render(state: &DashboardState) -> String {
    let mut lines: Vec<String> = Vec::new();
    match state {
        DashboardState::Loading => lines.push("Loading your progress data...".to_string()),
        DashboardState::Failed(reason) => {
            lines.push(format!("Error loading dashboard: {reason}"));
            lines.push("Type /dashboard to retry.".to_string());
        }
        DashboardState::Empty => {
            push_header(&mut lines);
            lines.push("No practice data yet".to_string());
            lines.push(
                "Start practicing with the Question Generator to see your progress here!"
                    .to_string(),
            );
        }
        DashboardState::Ready(data) => {
            push_header(&mut lines);
            push_stats(&mut lines, data);
            push_topics(&mut lines, &data.topic_performance);
            push_difficulties(&mut lines, &data.difficulty_performance);
            push_recent(&mut lines, &data.recent_activity);
        }
    }
    lines.join("\n")
}

fn push_header(lines: &mut Vec<String>) {
    lines.push(TITLE.to_string());
    lines.push(SUBTITLE.to_string());
    lines.push(String::new());
}

fn push_stats(lines: &mut Vec<String>, data: &DashboardData) {
    let stats = &data.overall_stats;
    lines.push(format!("Total Questions:  {}", stats.total_questions));
    lines.push(format!("Correct Answers:  {}", stats.correct_answers));
    lines.push(format!(
        "Overall Accuracy: {}%",
        format_number(stats.overall_accuracy)
    ));
    lines.push(format!("Topics Practiced: {}", stats.topics_practiced));
    lines.push(String::new());

    let total = stats.total_questions as f64;
    lines.push("Overall Accuracy".to_string());
    lines.push(format!(
        "  {:<10} {} {}",
        "Correct",
        bar(stats.correct_answers as f64, total),
        stats.correct_answers
    ));
    lines.push(format!(
        "  {:<10} {} {}",
        "Incorrect",
        bar(stats.incorrect_answers() as f64, total),
        stats.incorrect_answers()
    ));
}

fn push_topics(lines: &mut Vec<String>, topics: &[TopicPerformance]) {
    if topics.is_empty() {
        return;
    }
    let max = topics
        .iter()
        .map(|t| t.total_questions)
        .max()
        .unwrap_or(0) as f64;
    let width = topics.iter().map(|t| t.topic.chars().count()).max().unwrap_or(0);

    lines.push(String::new());
    lines.push("Performance by Topic".to_string());
    for t in topics {
        lines.push(format!(
            "  {:<width$}  attempted {} {}",
            t.topic,
            bar(t.total_questions as f64, max),
            t.total_questions
        ));
        lines.push(format!(
            "  {:<width$}  correct   {} {}",
            "",
            bar(t.correct_answers as f64, max),
            t.correct_answers
        ));
    }
}

fn push_difficulties(lines: &mut Vec<String>, difficulties: &[DifficultyPerformance]) {
    if difficulties.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push("Accuracy by Difficulty".to_string());
    for d in difficulties {
        lines.push(format!(
            "  {:<8} {} {}%",
            capitalize(&d.difficulty),
            bar(d.accuracy, 100.0),
            format_number(d.accuracy)
        ));
    }
}

fn push_recent(lines: &mut Vec<String>, activity: &[RecentActivity]) {
    if activity.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push("Recent Activity".to_string());
    for a in activity.iter().take(RECENT_ACTIVITY_LIMIT) {
        lines.push(format!("  {}", preview(&a.question)));
        lines.push(format!(
            "    {} | {}",
            if a.is_correct { "Correct" } else { "Incorrect" },
            a.topic
        ));
    }
}

/// First 100 characters of a question, with "..." when cut.
pub fn preview(question: &str) -> String {
    if question.chars().count() > QUESTION_PREVIEW_CHARS {
        let cut: String = question.chars().take(QUESTION_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        question.to_string()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Unknown".to_string(),
    }
}

/// Whole numbers print without decimals; others with at most two.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let s = format!("{value:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn bar(value: f64, max: f64) -> String {
    let filled = if max > 0.0 {
        ((value / max).clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    format!("{}{}", "█".repeat(filled), "·".repeat(BAR_WIDTH - filled))
}
