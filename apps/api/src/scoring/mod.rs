//! Answer grading and interview summaries.
//!
//! Grading always succeeds: when a remote backend is configured it gets one
//! attempt, and any failure falls back to the deterministic local heuristic.
//! The returned `GradeSource` records which path produced the result.

pub mod heuristic;
pub mod prompts;
pub mod remote;

use serde::Deserialize;
use tracing::warn;

use crate::config::Config;
use crate::models::session::{Answer, Question};
use remote::RemoteGrader;

/// Feedback used when the backend grades an answer but sends no feedback text.
const FEEDBACK_REMOTE_DEFAULT: &str = "Answer evaluated.";

// ──────────────────────────────────────────────
// Types
// ──────────────────────────────────────────────

/// A scored answer: 0..=10 plus one or two sentences of feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub score: u8,
    pub feedback: String,
}

/// Which grading path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeSource {
    Remote,
    Heuristic,
}

#[derive(Debug, Clone)]
pub struct Graded {
    pub evaluation: Evaluation,
    pub source: GradeSource,
}

#[derive(Debug, Clone)]
pub struct Summarized {
    /// Percentage 0..=100, always computed locally from recorded scores.
    pub total_score: u8,
    pub summary: String,
    pub source: GradeSource,
}

/// Wire shape of the backend's grading reply.
#[derive(Debug, Deserialize)]
struct GradeResponse {
    #[serde(default)]
    score: f64,
    feedback: Option<String>,
}

// ──────────────────────────────────────────────
// Grader
// ──────────────────────────────────────────────

/// Grades answers and writes summaries, preferring the remote backend when
/// one is configured.
#[derive(Clone)]
pub struct Grader {
    remote: Option<RemoteGrader>,
}

impl Grader {
    pub fn from_config(config: &Config) -> Self {
        let remote = config.grader_api_key.as_ref().map(|key| {
            RemoteGrader::new(
                key.clone(),
                config.grader_base_url.clone(),
                config.grader_model.clone(),
            )
        });
        Self { remote }
    }

    /// A grader with no remote backend. Every call uses the local heuristic.
    pub fn heuristic_only() -> Self {
        Self { remote: None }
    }

    pub fn remote_model(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.model())
    }

    /// Grade one answer. Never fails: a remote error is logged and the
    /// heuristic result is returned instead.
    pub async fn grade(&self, question: &Question, answer_text: &str) -> Graded {
        if let Some(remote) = &self.remote {
            let prompt = prompts::build_evaluation_prompt(question, answer_text);
            match remote
                .chat_json::<GradeResponse>(prompts::EVALUATION_SYSTEM, &prompt)
                .await
            {
                Ok(response) => {
                    return Graded {
                        evaluation: evaluation_from_response(response),
                        source: GradeSource::Remote,
                    };
                }
                Err(err) => {
                    warn!("Remote grading failed, using heuristic: {err}");
                }
            }
        }

        Graded {
            evaluation: heuristic::evaluate_answer(answer_text),
            source: GradeSource::Heuristic,
        }
    }

    /// Produce the final percentage and summary for a finished interview.
    /// The percentage is always computed locally; only the prose falls back
    /// when the backend is unavailable.
    pub async fn summarize(&self, questions: &[Question], answers: &[Answer]) -> Summarized {
        let total_score = heuristic::percentage(questions.len(), answers);

        if let Some(remote) = &self.remote {
            let prompt = prompts::build_summary_prompt(total_score, questions, answers);
            match remote.chat_plain(prompts::SUMMARY_SYSTEM, &prompt).await {
                Ok(summary) => {
                    return Summarized {
                        total_score,
                        summary,
                        source: GradeSource::Remote,
                    };
                }
                Err(err) => {
                    warn!("Remote summary failed, using canned text: {err}");
                }
            }
        }

        Summarized {
            total_score,
            summary: heuristic::summary_text(total_score),
            source: GradeSource::Heuristic,
        }
    }
}

/// Clamp the backend's score into 0..=10 and fill in default feedback.
fn evaluation_from_response(response: GradeResponse) -> Evaluation {
    let score = response.score.clamp(0.0, 10.0).round() as u8;
    let feedback = response
        .feedback
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| FEEDBACK_REMOTE_DEFAULT.to_string());
    Evaluation { score, feedback }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Difficulty;
    use chrono::Utc;
    use uuid::Uuid;

    fn question(text: &str) -> Question {
        Question {
            id: Uuid::new_v4(),
            text: text.to_string(),
            difficulty: Difficulty::Easy,
            time_limit_secs: 20,
            order_index: 0,
        }
    }

    #[test]
    fn test_evaluation_clamps_high_scores() {
        let response = GradeResponse {
            score: 42.0,
            feedback: Some("Excellent.".to_string()),
        };
        let eval = evaluation_from_response(response);
        assert_eq!(eval.score, 10);
        assert_eq!(eval.feedback, "Excellent.");
    }

    #[test]
    fn test_evaluation_clamps_negative_scores() {
        let response = GradeResponse {
            score: -3.5,
            feedback: None,
        };
        let eval = evaluation_from_response(response);
        assert_eq!(eval.score, 0);
        assert_eq!(eval.feedback, "Answer evaluated.");
    }

    #[test]
    fn test_evaluation_rounds_fractional_scores() {
        let response = GradeResponse {
            score: 7.6,
            feedback: Some(String::new()),
        };
        let eval = evaluation_from_response(response);
        assert_eq!(eval.score, 8);
        assert_eq!(eval.feedback, "Answer evaluated.");
    }

    #[test]
    fn test_grade_response_tolerates_missing_score() {
        let response: GradeResponse = serde_json::from_str(r#"{"feedback": "ok"}"#).unwrap();
        let eval = evaluation_from_response(response);
        assert_eq!(eval.score, 0);
    }

    #[tokio::test]
    async fn test_heuristic_only_grader_never_touches_network() {
        let grader = Grader::heuristic_only();
        let graded = grader
            .grade(&question("What is JSX?"), "JSX is a syntax extension")
            .await;

        assert_eq!(graded.source, GradeSource::Heuristic);
        assert_eq!(graded.evaluation.score, 5);
    }

    #[tokio::test]
    async fn test_heuristic_only_summary_uses_canned_text() {
        let grader = Grader::heuristic_only();
        let questions: Vec<Question> = (0..2).map(|_| question("Q")).collect();
        let answers: Vec<Answer> = questions
            .iter()
            .map(|q| Answer {
                question_id: q.id,
                text: "answer text".to_string(),
                time_taken_secs: 5,
                score: Some(8),
                feedback: None,
                submitted_at: Utc::now(),
            })
            .collect();

        let summarized = grader.summarize(&questions, &answers).await;
        assert_eq!(summarized.total_score, 80);
        assert_eq!(summarized.source, GradeSource::Heuristic);
        assert!(summarized.summary.contains("80%"));
    }
}
