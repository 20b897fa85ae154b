use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Everything has a default except the grader key, whose absence simply
/// selects heuristic-only grading.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Path of the JSON session snapshot file.
    pub data_path: String,
    /// Optional remote grading backend key. None => local heuristic only.
    pub grader_api_key: Option<String>,
    pub grader_base_url: String,
    pub grader_model: String,
    /// Optional fixed seed for question draws. None => entropy.
    pub question_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            data_path: std::env::var("DATA_PATH")
                .unwrap_or_else(|_| "data/sessions.json".to_string()),
            grader_api_key: optional_env("GRADER_API_KEY"),
            grader_base_url: std::env::var("GRADER_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            grader_model: std::env::var("GRADER_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            question_seed: match optional_env("QUESTION_SEED") {
                Some(raw) => Some(
                    raw.parse::<u64>()
                        .context("QUESTION_SEED must be an unsigned integer")?,
                ),
                None => None,
            },
        })
    }
}

/// Present-and-non-blank env var, or None.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
