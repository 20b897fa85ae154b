use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contact details for one candidate. Fields are empty strings until
/// supplied; `validate_contact` treats blank-after-trim as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl CandidateInfo {
    pub fn new(name: Option<String>, email: Option<String>, phone: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            phone: phone.unwrap_or_default(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Per-difficulty answer window: 20s / 60s / 120s.
    pub fn time_limit_secs(self) -> u32 {
        match self {
            Difficulty::Easy => 20,
            Difficulty::Medium => 60,
            Difficulty::Hard => 120,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        write!(f, "{label}")
    }
}

/// One interview question. Immutable once generated for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub difficulty: Difficulty,
    pub time_limit_secs: u32,
    pub order_index: usize,
}

/// One submitted answer. Appended in question order, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: Uuid,
    pub text: String,
    pub time_taken_secs: u32,
    pub score: Option<u8>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No session object exists yet. Kept for wire compatibility; a stored
    /// session never carries this status.
    NotStarted,
    CollectingInfo,
    InProgress,
    Completed,
    Paused,
}

impl SessionStatus {
    /// Sessions the welcome-back flow offers to pick up again. A session
    /// left `in_progress` or `collecting_info` by a process restart is
    /// logically equivalent to paused here.
    pub fn is_resumable(self) -> bool {
        matches!(
            self,
            SessionStatus::CollectingInfo | SessionStatus::InProgress | SessionStatus::Paused
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionStatus::NotStarted => "not_started",
            SessionStatus::CollectingInfo => "collecting_info",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Paused => "paused",
        };
        write!(f, "{label}")
    }
}

/// Aggregate root for one candidate's end-to-end interview attempt.
///
/// Invariants maintained by the engine:
/// - `answers.len() == current_question_index` while `in_progress`
/// - `answers.len() == questions.len()` exactly when status becomes `completed`
/// - `current_question_index` never decreases
/// - `total_score` / `summary` are written once, on completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: Uuid,
    pub candidate: CandidateInfo,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
    pub current_question_index: usize,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub time_remaining_secs: Option<u32>,
    pub total_score: Option<u8>,
    pub summary: Option<String>,
}

impl InterviewSession {
    /// Fresh session in `collecting_info` with no questions drawn yet.
    pub fn new(candidate: CandidateInfo) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate,
            questions: Vec::new(),
            answers: Vec::new(),
            current_question_index: 0,
            status: SessionStatus::CollectingInfo,
            started_at: Utc::now(),
            completed_at: None,
            paused_at: None,
            time_remaining_secs: None,
            total_score: None,
            summary: None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_time_limits() {
        assert_eq!(Difficulty::Easy.time_limit_secs(), 20);
        assert_eq!(Difficulty::Medium.time_limit_secs(), 60);
        assert_eq!(Difficulty::Hard.time_limit_secs(), 120);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&SessionStatus::CollectingInfo).unwrap();
        assert_eq!(json, "\"collecting_info\"");
        let back: SessionStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(back, SessionStatus::InProgress);
    }

    #[test]
    fn test_resumable_statuses() {
        assert!(SessionStatus::CollectingInfo.is_resumable());
        assert!(SessionStatus::InProgress.is_resumable());
        assert!(SessionStatus::Paused.is_resumable());
        assert!(!SessionStatus::Completed.is_resumable());
        assert!(!SessionStatus::NotStarted.is_resumable());
    }

    #[test]
    fn test_new_session_starts_collecting_info() {
        let session = InterviewSession::new(CandidateInfo::new(
            Some("Jane Doe".to_string()),
            None,
            None,
        ));
        assert_eq!(session.status, SessionStatus::CollectingInfo);
        assert_eq!(session.current_question_index, 0);
        assert!(session.questions.is_empty());
        assert!(session.answers.is_empty());
        assert!(session.current_question().is_none());
    }

    #[test]
    fn test_session_serde_round_trip() {
        let mut session = InterviewSession::new(CandidateInfo::new(
            Some("Jane Doe".to_string()),
            Some("jane@example.com".to_string()),
            Some("555-010-0199".to_string()),
        ));
        session.status = SessionStatus::InProgress;
        session.time_remaining_secs = Some(45);

        let json = serde_json::to_string(&session).unwrap();
        let back: InterviewSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
