//! The session state machine.
//!
//! One engine owns every interview session. All mutation flows through a
//! single `RwLock` over the snapshot state, and every operation takes an
//! explicit session id — the active-session pointer is ordinary state, not
//! an ambient global. Grading and summary calls are the only suspending
//! operations and run outside the state lock, protected by a per-session
//! in-flight guard so a timer expiry racing a manual send can never record
//! two answers for one question. Every mutation persists the full snapshot
//! through the store before returning.

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::fields::{extract_contact_fields, validate_contact, ContactField};
use crate::interview::bank;
use crate::models::chat::ChatMessage;
use crate::models::session::{Answer, CandidateInfo, InterviewSession, SessionStatus};
use crate::scoring::Grader;
use crate::storage::{SnapshotStore, StoreSnapshot};

/// Answer text recorded when the countdown expires with nothing staged.
pub const EXPIRED_ANSWER_TEXT: &str = "Time expired - no answer provided";

/// What initiated an answer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    Expiry,
}

/// Outcome of one countdown tick, consumed by the timer driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Still counting down. The value may be unchanged while a submission
    /// is settling.
    Running { remaining_secs: u32 },
    /// The countdown just hit zero; the caller should submit with the
    /// expiry trigger.
    Expired,
    /// The session is not the active one, or no longer in progress. The
    /// caller should stop ticking.
    Idle,
}

/// A session together with its transcript, as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session: InterviewSession,
    pub messages: Vec<ChatMessage>,
}

pub struct Engine {
    state: RwLock<StoreSnapshot>,
    /// Session ids with a submission currently being graded. Sync lock,
    /// never held across an await; cleared by guard drop, so a submission
    /// future abandoned mid-grade cannot leave its session wedged.
    in_flight: StdMutex<HashSet<Uuid>>,
    rng: Mutex<StdRng>,
    store: Arc<dyn SnapshotStore>,
    grader: Grader,
}

/// Clears the in-flight mark when the submission ends, normally or not.
struct InFlightGuard<'a> {
    in_flight: &'a StdMutex<HashSet<Uuid>>,
    session_id: Uuid,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
    }
}

impl Engine {
    /// Hydrate an engine from the store. Fails if the store holds a snapshot
    /// it cannot read — silently starting empty would discard every recorded
    /// interview.
    pub async fn new(
        store: Arc<dyn SnapshotStore>,
        grader: Grader,
        seed: Option<u64>,
    ) -> anyhow::Result<Self> {
        let snapshot = store.load().await?;
        if !snapshot.sessions.is_empty() {
            let resumable = snapshot
                .sessions
                .iter()
                .filter(|s| s.status.is_resumable())
                .count();
            info!(
                "Restored {} session(s) from snapshot ({} resumable)",
                snapshot.sessions.len(),
                resumable
            );
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            state: RwLock::new(snapshot),
            in_flight: StdMutex::new(HashSet::new()),
            rng: Mutex::new(rng),
            store,
            grader,
        })
    }

    // ──────────────────────────────────────────────
    // Transitions
    // ──────────────────────────────────────────────

    /// Create a session from successfully extracted resume text. The new
    /// session becomes the active one. Starts the interview immediately when
    /// the resume already carries name, email, and phone.
    pub async fn create_session(&self, resume_text: &str) -> Result<SessionView, AppError> {
        let fields = extract_contact_fields(resume_text);
        let candidate = CandidateInfo::new(fields.name, fields.email, fields.phone);
        let mut session = InterviewSession::new(candidate);
        let mut log = vec![ChatMessage::system(
            "Resume uploaded successfully. Let me verify your information.",
        )];

        let validation = validate_contact(&session.candidate);
        if validation.is_valid {
            self.begin_interview(&mut session, &mut log).await;
        } else {
            let missing = validation
                .missing
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            log.push(ChatMessage::assistant(format!(
                "I noticed some information is missing from your resume. Please provide your {missing}."
            )));
        }

        let session_id = session.id;
        info!("Created session {session_id} ({})", session.status);

        let mut state = self.state.write().await;
        state.sessions.push(session);
        state.chat_log.insert(session_id, log);
        state.active_session_id = Some(session_id);
        self.persist(&state).await?;
        Self::view(&state, session_id)
    }

    /// Route one user message by session status: a field value while
    /// collecting info, an answer while in progress. Blank input is rejected
    /// before any dispatch.
    pub async fn handle_message(
        &self,
        session_id: Uuid,
        content: &str,
    ) -> Result<SessionView, AppError> {
        if content.trim().is_empty() {
            return Err(AppError::Validation(
                "Message content cannot be empty".to_string(),
            ));
        }

        let status = {
            let state = self.state.read().await;
            state
                .sessions
                .iter()
                .find(|s| s.id == session_id)
                .map(|s| s.status)
                .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?
        };

        match status {
            SessionStatus::CollectingInfo => self.supply_field(session_id, content).await,
            SessionStatus::InProgress => {
                self.submit_answer(session_id, Some(content.to_string()), SubmitTrigger::Manual)
                    .await
            }
            SessionStatus::Paused => Err(AppError::Conflict(
                "Interview is paused. Resume the session to continue".to_string(),
            )),
            SessionStatus::Completed | SessionStatus::NotStarted => {
                Err(AppError::Conflict("Interview already completed".to_string()))
            }
        }
    }

    /// Submit an answer for the current question. The in-flight guard makes
    /// a concurrent second attempt a no-op returning the unchanged view.
    pub async fn submit_answer(
        &self,
        session_id: Uuid,
        text: Option<String>,
        trigger: SubmitTrigger,
    ) -> Result<SessionView, AppError> {
        let Some(_guard) = self.mark_in_flight(session_id) else {
            debug!("Submission already in flight for session {session_id}; ignoring {trigger:?} attempt");
            return self.session_view(session_id).await;
        };
        self.grade_and_record(session_id, text, trigger).await
    }

    fn mark_in_flight(&self, session_id: Uuid) -> Option<InFlightGuard<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if in_flight.insert(session_id) {
            Some(InFlightGuard {
                in_flight: &self.in_flight,
                session_id,
            })
        } else {
            None
        }
    }

    async fn grade_and_record(
        &self,
        session_id: Uuid,
        text: Option<String>,
        trigger: SubmitTrigger,
    ) -> Result<SessionView, AppError> {
        let answer_text = text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| EXPIRED_ANSWER_TEXT.to_string());

        // Capture the question under the lock, then grade outside it.
        let (question, time_taken) = {
            let mut state = self.state.write().await;
            let (session, log) = Self::session_and_log(&mut state, session_id)?;
            if session.status != SessionStatus::InProgress {
                return Err(AppError::Conflict(format!(
                    "Cannot submit an answer while the session is {}",
                    session.status
                )));
            }
            let Some(current) = session.current_question() else {
                return Err(AppError::Conflict(
                    "No question is currently presented".to_string(),
                ));
            };
            let question = current.clone();
            let time_taken = question
                .time_limit_secs
                .saturating_sub(session.time_remaining_secs.unwrap_or(0));
            if trigger == SubmitTrigger::Manual {
                log.push(ChatMessage::user(answer_text.clone()));
                self.persist(&state).await?;
            }
            (question, time_taken)
        };

        let graded = self.grader.grade(&question, &answer_text).await;

        let mut state = self.state.write().await;
        let (session, log) = Self::session_and_log(&mut state, session_id)?;
        if session.status != SessionStatus::InProgress
            || session.current_question().map(|q| q.id) != Some(question.id)
        {
            debug!("Session {session_id} changed while grading; dropping the submission");
            return Err(AppError::Conflict(
                "The interview state changed while grading".to_string(),
            ));
        }

        session.answers.push(Answer {
            question_id: question.id,
            text: answer_text,
            time_taken_secs: time_taken,
            score: Some(graded.evaluation.score),
            feedback: Some(graded.evaluation.feedback.clone()),
            submitted_at: Utc::now(),
        });
        log.push(ChatMessage::system(format!(
            "Score: {}/10. {}",
            graded.evaluation.score, graded.evaluation.feedback
        )));

        let last_index = session.questions.len().saturating_sub(1);
        if session.current_question_index < last_index {
            session.current_question_index += 1;
            if let Some(next) = session.current_question().cloned() {
                session.time_remaining_secs = Some(next.time_limit_secs);
                log.push(ChatMessage::question(
                    format!(
                        "Question {} ({}):\n{}",
                        session.current_question_index + 1,
                        next.difficulty,
                        next.text
                    ),
                    next.id,
                ));
            }
            info!(
                "Session {session_id}: answer {} scored {}/10",
                session.answers.len(),
                graded.evaluation.score
            );
            self.persist(&state).await?;
            Self::view(&state, session_id)
        } else {
            // Final answer. Complete first, then summarize outside the lock;
            // the completed status blocks any further submission meanwhile.
            session.status = SessionStatus::Completed;
            session.completed_at = Some(Utc::now());
            session.time_remaining_secs = None;
            let questions = session.questions.clone();
            let answers = session.answers.clone();
            self.persist(&state).await?;
            drop(state);

            let summarized = self.grader.summarize(&questions, &answers).await;

            let mut state = self.state.write().await;
            let (session, log) = Self::session_and_log(&mut state, session_id)?;
            if session.total_score.is_none() {
                session.total_score = Some(summarized.total_score);
                session.summary = Some(summarized.summary.clone());
            }
            log.push(ChatMessage::system(format!(
                "🎉 Interview Complete!\n\nFinal Score: {}%\n\n{}",
                summarized.total_score, summarized.summary
            )));
            info!(
                "Session {session_id} completed with total score {}%",
                summarized.total_score
            );
            self.persist(&state).await?;
            Self::view(&state, session_id)
        }
    }

    /// Pause an in-progress interview, preserving the question index, the
    /// countdown value, and all recorded answers.
    pub async fn pause(&self, session_id: Uuid) -> Result<SessionView, AppError> {
        let mut state = self.state.write().await;
        let (session, log) = Self::session_and_log(&mut state, session_id)?;
        if session.status != SessionStatus::InProgress {
            return Err(AppError::Conflict(format!(
                "Cannot pause a session that is {}",
                session.status
            )));
        }
        session.status = SessionStatus::Paused;
        session.paused_at = Some(Utc::now());
        log.push(ChatMessage::system(
            "Interview paused. Your progress has been saved.",
        ));
        info!("Session {session_id} paused");
        self.persist(&state).await?;
        Self::view(&state, session_id)
    }

    /// Reactivate a session. A paused session flips back to in-progress with
    /// its preserved countdown; a session left collecting or in progress by a
    /// restart only becomes active again. Completed sessions stay terminal.
    pub async fn resume(&self, session_id: Uuid) -> Result<SessionView, AppError> {
        let mut state = self.state.write().await;
        let (session, log) = Self::session_and_log(&mut state, session_id)?;
        match session.status {
            SessionStatus::Paused => {
                session.status = SessionStatus::InProgress;
                session.paused_at = None;
            }
            SessionStatus::CollectingInfo | SessionStatus::InProgress => {}
            SessionStatus::Completed | SessionStatus::NotStarted => {
                return Err(AppError::Conflict(
                    "Interview already completed".to_string(),
                ));
            }
        }
        let status = session.status;
        log.push(ChatMessage::system(
            "Welcome back! Your interview will continue.",
        ));
        state.active_session_id = Some(session_id);
        info!("Session {session_id} resumed ({status})");
        self.persist(&state).await?;
        Self::view(&state, session_id)
    }

    /// One second of countdown. Only the active, in-progress session with no
    /// submission in flight is ever decremented; the new value is mirrored
    /// into the store so a restart mid-question does not reset the clock.
    pub async fn tick(&self, session_id: Uuid) -> TimerTick {
        let frozen = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&session_id);
        if frozen {
            let state = self.state.read().await;
            let remaining = state
                .sessions
                .iter()
                .find(|s| s.id == session_id)
                .and_then(|s| s.time_remaining_secs)
                .unwrap_or(0);
            return TimerTick::Running {
                remaining_secs: remaining,
            };
        }

        let mut state = self.state.write().await;
        if state.active_session_id != Some(session_id) {
            return TimerTick::Idle;
        }
        let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id) else {
            return TimerTick::Idle;
        };
        if session.status != SessionStatus::InProgress {
            return TimerTick::Idle;
        }
        let Some(remaining) = session.time_remaining_secs else {
            return TimerTick::Idle;
        };
        if remaining == 0 {
            // Already expired; the expiry submission has not landed yet.
            return TimerTick::Expired;
        }

        let remaining = remaining - 1;
        session.time_remaining_secs = Some(remaining);
        if let Err(err) = self.persist(&state).await {
            warn!("Failed to mirror countdown for session {session_id}: {err}");
        }

        if remaining == 0 {
            TimerTick::Expired
        } else {
            TimerTick::Running {
                remaining_secs: remaining,
            }
        }
    }

    // ──────────────────────────────────────────────
    // Reads
    // ──────────────────────────────────────────────

    pub async fn session_view(&self, session_id: Uuid) -> Result<SessionView, AppError> {
        let state = self.state.read().await;
        Self::view(&state, session_id)
    }

    pub async fn list_sessions(&self) -> Vec<InterviewSession> {
        self.state.read().await.sessions.clone()
    }

    /// Sessions the welcome-back flow can pick up, most recent first.
    pub async fn resumable_sessions(&self) -> Vec<InterviewSession> {
        let state = self.state.read().await;
        let mut sessions: Vec<InterviewSession> = state
            .sessions
            .iter()
            .filter(|s| s.status.is_resumable())
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        sessions
    }

    // ──────────────────────────────────────────────
    // Internals
    // ──────────────────────────────────────────────

    async fn supply_field(&self, session_id: Uuid, content: &str) -> Result<SessionView, AppError> {
        let mut state = self.state.write().await;
        let (session, log) = Self::session_and_log(&mut state, session_id)?;
        if session.status != SessionStatus::CollectingInfo {
            return Err(AppError::Conflict(format!(
                "Session is {}, not collecting information",
                session.status
            )));
        }

        log.push(ChatMessage::user(content));

        // Fill the first missing field, as typed; never overwrite a present one.
        let validation = validate_contact(&session.candidate);
        if let Some(field) = validation.missing.first() {
            let value = content.to_string();
            match field {
                ContactField::Name => session.candidate.name = value,
                ContactField::Email => session.candidate.email = value,
                ContactField::Phone => session.candidate.phone = value,
            }
        }

        let validation = validate_contact(&session.candidate);
        if validation.is_valid {
            self.begin_interview(session, log).await;
            info!("Session {session_id}: contact info complete, interview started");
        } else if let Some(next) = validation.missing.first() {
            log.push(ChatMessage::assistant(format!(
                "Thank you! Now, please provide your {next}."
            )));
        }

        self.persist(&state).await?;
        Self::view(&state, session_id)
    }

    /// Draw the question set and present question 1.
    async fn begin_interview(&self, session: &mut InterviewSession, log: &mut Vec<ChatMessage>) {
        let questions = {
            let mut rng = self.rng.lock().await;
            bank::draw_question_set(&mut rng)
        };

        if let Some(first) = questions.first() {
            session.time_remaining_secs = Some(first.time_limit_secs);
            log.push(ChatMessage::question(
                format!(
                    "Great! Let's begin the interview.\n\nQuestion 1 ({}):\n{}",
                    first.difficulty, first.text
                ),
                first.id,
            ));
        }
        session.questions = questions;
        session.status = SessionStatus::InProgress;
    }

    fn session_and_log(
        state: &mut StoreSnapshot,
        session_id: Uuid,
    ) -> Result<(&mut InterviewSession, &mut Vec<ChatMessage>), AppError> {
        let session = state
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;
        let log = state.chat_log.entry(session_id).or_default();
        Ok((session, log))
    }

    fn view(state: &StoreSnapshot, session_id: Uuid) -> Result<SessionView, AppError> {
        let session = state
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;
        let messages = state.chat_log.get(&session_id).cloned().unwrap_or_default();
        Ok(SessionView { session, messages })
    }

    async fn persist(&self, snapshot: &StoreSnapshot) -> Result<(), AppError> {
        self.store.save(snapshot).await?;
        Ok(())
    }
}
