//! Question Bank — fixed template pools per difficulty band.
//!
//! The draw has constant shape: 2 easy (20s), 2 medium (60s), 2 hard (120s),
//! `order_index` 0..5 in that order. Selection within a pool is
//! uniform-random WITH replacement — the two picks from one pool may repeat.
//! The RNG is caller-owned and seedable, so equal seeds yield equal sets.

use rand::rngs::StdRng;
use rand::Rng;
use uuid::Uuid;

use crate::models::session::{Difficulty, Question};

const EASY_POOL: &[&str] = &[
    "What is React and what are its key features?",
    "Explain the difference between state and props in React.",
    "What is Node.js and why is it useful for backend development?",
    "Describe the purpose of package.json in a Node.js project.",
    "What are React hooks and name a few commonly used ones?",
    "Explain what JSX is in React.",
];

const MEDIUM_POOL: &[&str] = &[
    "Explain the useEffect hook and its common use cases.",
    "How would you implement authentication in a Node.js Express application?",
    "What is the Virtual DOM and how does React use it?",
    "Describe the event loop in Node.js.",
    "How do you handle state management in large React applications?",
    "Explain middleware in Express.js with examples.",
];

const HARD_POOL: &[&str] = &[
    "How would you optimize a React application for performance?",
    "Design a scalable microservices architecture using Node.js.",
    "Explain React's reconciliation algorithm and fiber architecture.",
    "How would you implement server-side rendering with React and Node.js?",
    "Describe strategies for handling database transactions in Node.js.",
    "How would you implement real-time features using WebSockets in a full-stack application?",
];

const PICKS_PER_BAND: usize = 2;

/// Draws the fixed-shape six-question set for one session.
/// Cannot fail; the only side effect is advancing the caller's RNG.
pub fn draw_question_set(rng: &mut StdRng) -> Vec<Question> {
    let mut questions = Vec::with_capacity(PICKS_PER_BAND * 3);

    for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
        let pool = pool_for(difficulty);
        for _ in 0..PICKS_PER_BAND {
            let text = pool[rng.gen_range(0..pool.len())];
            questions.push(Question {
                id: Uuid::new_v4(),
                text: text.to_string(),
                difficulty,
                time_limit_secs: difficulty.time_limit_secs(),
                order_index: questions.len(),
            });
        }
    }

    questions
}

fn pool_for(difficulty: Difficulty) -> &'static [&'static str] {
    match difficulty {
        Difficulty::Easy => EASY_POOL,
        Difficulty::Medium => MEDIUM_POOL,
        Difficulty::Hard => HARD_POOL,
    }
}
