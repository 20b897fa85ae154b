//! Deterministic local grading — always available, used as the sole strategy
//! when no backend is configured and as the fallback when one fails.
//!
//! Scoring: base 5; +2 for >50 words, else +1 for >20; +2 for any domain
//! keyword; flat 2 for answers under 10 characters; clamp to [0,10].
//! Identical input always produces identical output.

use crate::models::session::Answer;
use crate::scoring::Evaluation;

const ANSWER_KEYWORDS: &[&str] = &[
    "react",
    "node",
    "javascript",
    "component",
    "state",
    "props",
    "hook",
    "express",
    "api",
    "database",
];

/// Answers shorter than this are treated as no-answer submissions.
const MIN_ANSWER_LEN: usize = 10;

pub const FEEDBACK_GOOD: &str = "Good answer with relevant details.";
pub const FEEDBACK_ADEQUATE: &str = "Adequate answer but could be more comprehensive.";
pub const FEEDBACK_NEEDS_DETAIL: &str = "Answer needs more detail and technical depth.";

pub fn evaluate_answer(answer: &str) -> Evaluation {
    let word_count = answer.split_whitespace().count();
    let lower = answer.to_lowercase();
    let has_keywords = ANSWER_KEYWORDS.iter().any(|kw| lower.contains(kw));

    let mut score: i32 = 5;

    if word_count > 50 {
        score += 2;
    } else if word_count > 20 {
        score += 1;
    }

    if has_keywords {
        score += 2;
    }

    if answer.len() < MIN_ANSWER_LEN {
        score = 2;
    }

    let score = score.clamp(0, 10) as u8;

    Evaluation {
        score,
        feedback: feedback_for(score).to_string(),
    }
}

fn feedback_for(score: u8) -> &'static str {
    if score >= 7 {
        FEEDBACK_GOOD
    } else if score >= 5 {
        FEEDBACK_ADEQUATE
    } else {
        FEEDBACK_NEEDS_DETAIL
    }
}

/// `round(100 * Σ score / (10 * question_count))`; unscored answers count 0.
pub fn percentage(question_count: usize, answers: &[Answer]) -> u8 {
    if question_count == 0 {
        return 0;
    }
    let actual: u32 = answers.iter().map(|a| u32::from(a.score.unwrap_or(0))).sum();
    let possible = (question_count * 10) as f64;
    ((f64::from(actual) / possible) * 100.0).round() as u8
}

/// The fixed-template summary, used verbatim whenever the remote path is
/// unavailable or fails.
pub fn summary_text(percentage: u8) -> String {
    let band = if percentage >= 70 {
        "Strong performance overall."
    } else if percentage >= 50 {
        "Adequate performance with room for improvement."
    } else {
        "Needs significant improvement in technical skills."
    };
    format!("Candidate completed the interview with a score of {percentage}%. {band}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn scored_answer(score: Option<u8>) -> Answer {
        Answer {
            question_id: Uuid::new_v4(),
            text: "text".to_string(),
            time_taken_secs: 5,
            score,
            feedback: None,
            submitted_at: Utc::now(),
        }
    }

    fn words(n: usize, word: &str) -> String {
        vec![word; n].join(" ")
    }

    #[test]
    fn test_empty_answer_scores_flat_two() {
        let eval = evaluate_answer("");
        assert_eq!(eval.score, 2);
        assert_eq!(eval.feedback, FEEDBACK_NEEDS_DETAIL);
    }

    #[test]
    fn test_under_ten_chars_scores_flat_two() {
        // "React" alone would earn keyword points, but it is under 10 chars
        let eval = evaluate_answer("React");
        assert_eq!(eval.score, 2);
    }

    #[test]
    fn test_sixty_words_with_keyword_scores_nine() {
        let answer = words(60, "React");
        let eval = evaluate_answer(&answer);
        assert_eq!(eval.score, 9); // 5 base + 2 length + 2 keyword
        assert_eq!(eval.feedback, FEEDBACK_GOOD);
    }

    #[test]
    fn test_length_bonus_tiers() {
        // 25 words, no keywords: 5 + 1
        assert_eq!(evaluate_answer(&words(25, "word")).score, 6);
        // 55 words, no keywords: 5 + 2
        assert_eq!(evaluate_answer(&words(55, "word")).score, 7);
        // 15 words, no keywords: base only
        assert_eq!(evaluate_answer(&words(15, "word")).score, 5);
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let eval = evaluate_answer("I would use NODE for this");
        assert_eq!(eval.score, 7); // 5 + 2 keyword
    }

    #[test]
    fn test_feedback_bands() {
        assert_eq!(evaluate_answer(&words(55, "word")).feedback, FEEDBACK_GOOD); // 7
        assert_eq!(evaluate_answer(&words(15, "word")).feedback, FEEDBACK_ADEQUATE); // 5
        assert_eq!(evaluate_answer("").feedback, FEEDBACK_NEEDS_DETAIL); // 2
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let answer = words(30, "component");
        let first = evaluate_answer(&answer);
        let second = evaluate_answer(&answer);
        assert_eq!(first.score, second.score);
        assert_eq!(first.feedback, second.feedback);
    }

    #[test]
    fn test_percentage_rounds() {
        // 43/60 → 71.67 → 72
        let answers: Vec<Answer> = [8, 7, 9, 6, 5, 8]
            .into_iter()
            .map(|s| scored_answer(Some(s)))
            .collect();
        assert_eq!(percentage(6, &answers), 72);
    }

    #[test]
    fn test_percentage_counts_unscored_as_zero() {
        let answers = vec![scored_answer(Some(10)), scored_answer(None)];
        // 10/60 → 16.67 → 17
        assert_eq!(percentage(6, &answers), 17);
    }

    #[test]
    fn test_percentage_with_no_questions_is_zero() {
        assert_eq!(percentage(0, &[]), 0);
    }

    #[test]
    fn test_summary_bands() {
        assert_eq!(
            summary_text(72),
            "Candidate completed the interview with a score of 72%. Strong performance overall."
        );
        assert!(summary_text(70).contains("Strong performance overall."));
        assert!(summary_text(69).contains("Adequate performance with room for improvement."));
        assert!(summary_text(50).contains("Adequate performance with room for improvement."));
        assert!(summary_text(49).contains("Needs significant improvement in technical skills."));
    }
}
