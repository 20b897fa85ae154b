//! Field Extractor — best-guess contact fields from raw resume text.
//!
//! Pure heuristics over plain text: never fails, returns unset fields for
//! anything it cannot place. Email is the first address-shaped substring
//! (lower-cased), phone is the first loose phone-shaped substring with
//! 10–15 digits (kept as typed), and name is the first of the leading
//! non-blank lines that reads like a 2–4 word capitalized name.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::session::CandidateInfo;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9._-]+@[a-zA-Z0-9._-]+\.[a-zA-Z0-9_-]+").unwrap());

/// Loose international/local phone shape; candidates are filtered by digit
/// count afterwards, so this is allowed to over-match.
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+?\d{1,3}[-.\s]?)?\(?\d{1,4}\)?[-.\s]?\d{1,4}[-.\s]?\d{1,9}").unwrap()
});

static LONG_DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4,}").unwrap());

static NAME_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z\s'-]+$").unwrap());

/// How many leading non-blank lines are scanned for a name.
const NAME_SCAN_LINES: usize = 5;
const NAME_MAX_LEN: usize = 50;

/// Extraction output. Absence of a field is normal, not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub fn extract_contact_fields(text: &str) -> ExtractedFields {
    ExtractedFields {
        name: extract_name(text),
        email: extract_email(text),
        phone: extract_phone(text),
    }
}

fn extract_email(text: &str) -> Option<String> {
    EMAIL_REGEX.find(text).map(|m| m.as_str().to_lowercase())
}

fn extract_phone(text: &str) -> Option<String> {
    PHONE_REGEX
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|candidate| {
            let digits = candidate.chars().filter(char::is_ascii_digit).count();
            (10..=15).contains(&digits)
        })
        .map(|candidate| candidate.trim().to_string())
}

fn extract_name(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(NAME_SCAN_LINES)
        .find(|line| is_name_candidate(line))
        .map(str::to_string)
}

fn is_name_candidate(line: &str) -> bool {
    if line.len() >= NAME_MAX_LEN || line.contains('@') {
        return false;
    }
    // Long digit runs mean dates, zip codes, phone fragments
    if LONG_DIGIT_RUN.is_match(line) {
        return false;
    }
    let lower = line.to_lowercase();
    if lower.contains("resume") || lower.contains("curriculum") {
        return false;
    }
    if !NAME_CHARS.is_match(line) {
        return false;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    if !(2..=4).contains(&words.len()) {
        return false;
    }
    words
        .iter()
        .all(|word| word.chars().next().is_some_and(|c| !c.is_lowercase()))
}

// ────────────────────────────────────────────────────────────────────────────
// Contact validation
// ────────────────────────────────────────────────────────────────────────────

/// The contact fields in their fixed prompting priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactField {
    Name,
    Email,
    Phone,
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContactField::Name => "name",
            ContactField::Email => "email",
            ContactField::Phone => "phone",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactValidation {
    pub is_valid: bool,
    /// Always in name, email, phone order regardless of which are missing.
    pub missing: Vec<ContactField>,
}

/// A field is missing iff blank after trimming.
pub fn validate_contact(info: &CandidateInfo) -> ContactValidation {
    let mut missing = Vec::new();
    if info.name.trim().is_empty() {
        missing.push(ContactField::Name);
    }
    if info.email.trim().is_empty() {
        missing.push(ContactField::Email);
    }
    if info.phone.trim().is_empty() {
        missing.push(ContactField::Phone);
    }

    ContactValidation {
        is_valid: missing.is_empty(),
        missing,
    }
}
