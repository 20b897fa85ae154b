// Prompt constants and builders for the remote grading backend.

use crate::models::session::{Answer, Question};

/// System prompt for per-answer grading — demands a JSON object back.
pub const EVALUATION_SYSTEM: &str =
    "You are an expert technical interviewer evaluating answers for a full-stack developer role. \
    You MUST respond with valid JSON only.";

/// System prompt for the final performance summary (plain text).
pub const SUMMARY_SYSTEM: &str =
    "You are an expert technical interviewer providing candidate summaries.";

pub fn build_evaluation_prompt(question: &Question, answer: &str) -> String {
    format!(
        "Evaluate the following answer to a technical interview question.\n\
         \n\
         Question: {}\n\
         Difficulty: {}\n\
         Answer: {}\n\
         \n\
         Provide:\n\
         1. A score from 0 to 10\n\
         2. Brief feedback (max 2 sentences)\n\
         \n\
         Format your response as JSON:\n\
         {{\n\
           \"score\": <number>,\n\
           \"feedback\": \"<string>\"\n\
         }}",
        question.text, question.difficulty, answer
    )
}

pub fn build_summary_prompt(percentage: u8, questions: &[Question], answers: &[Answer]) -> String {
    format!(
        "Generate a brief summary (2-3 sentences) for a candidate's interview performance.\n\
         \n\
         Total Score: {percentage}%\n\
         Number of Questions: {}\n\
         \n\
         Performance by difficulty:\n\
         - Easy questions: {}\n\
         - Medium questions: {}\n\
         - Hard questions: {}\n\
         \n\
         Provide a professional summary highlighting strengths and areas for improvement.",
        questions.len(),
        band_scores(answers, 0..2),
        band_scores(answers, 2..4),
        band_scores(answers, 4..6),
    )
}

fn band_scores(answers: &[Answer], range: std::ops::Range<usize>) -> String {
    answers
        .get(range)
        .unwrap_or(&[])
        .iter()
        .map(|a| a.score.unwrap_or(0).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Difficulty;
    use chrono::Utc;
    use uuid::Uuid;

    fn question(text: &str, difficulty: Difficulty) -> Question {
        Question {
            id: Uuid::new_v4(),
            text: text.to_string(),
            difficulty,
            time_limit_secs: difficulty.time_limit_secs(),
            order_index: 0,
        }
    }

    fn answer(score: u8) -> Answer {
        Answer {
            question_id: Uuid::new_v4(),
            text: "an answer".to_string(),
            time_taken_secs: 10,
            score: Some(score),
            feedback: None,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_evaluation_prompt_carries_question_and_answer() {
        let q = question("Explain what JSX is in React.", Difficulty::Easy);
        let prompt = build_evaluation_prompt(&q, "JSX is a syntax extension");

        assert!(prompt.contains("Question: Explain what JSX is in React."));
        assert!(prompt.contains("Difficulty: easy"));
        assert!(prompt.contains("Answer: JSX is a syntax extension"));
        assert!(prompt.contains("\"score\": <number>"));
    }

    #[test]
    fn test_summary_prompt_groups_scores_by_band() {
        let questions: Vec<Question> = (0..6)
            .map(|_| question("q", Difficulty::Easy))
            .collect();
        let answers: Vec<Answer> = [8, 7, 9, 6, 5, 8].into_iter().map(answer).collect();

        let prompt = build_summary_prompt(72, &questions, &answers);
        assert!(prompt.contains("Total Score: 72%"));
        assert!(prompt.contains("- Easy questions: 8, 7"));
        assert!(prompt.contains("- Medium questions: 9, 6"));
        assert!(prompt.contains("- Hard questions: 5, 8"));
    }
}
