//! Pulls the candidate batch out of a free-text model answer.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    /// First ```json fenced block; the body sits between the opening and closing fence lines.
    static ref JSON_BLOCK: Regex = Regex::new(r"```json\r?\n([\s\S]*?)\r?\n```").expect("static regex");
}

/// A story as the model described it, before any cleanup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCandidate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
}

impl RawCandidate {
    /// Non-string or empty fields count as missing.
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            title: field("title"),
            description: field("description"),
            url: field("url"),
            source: field("source"),
            category: field("category"),
        }
    }
}

/// Every way reading a model answer can end.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateBatch {
    Items(Vec<RawCandidate>),
    /// No fenced JSON block in the answer.
    NoBlock,
    /// A block was found but it is not valid JSON.
    ParseError(String),
    /// Valid JSON, but not an array.
    NotAnArray,
}

pub fn parse_candidate_batch(raw: &str) -> CandidateBatch {
    let Some(block) = JSON_BLOCK.captures(raw).and_then(|c| c.get(1)) else {
        return CandidateBatch::NoBlock;
    };

    match serde_json::from_str::<Value>(block.as_str()) {
        Ok(Value::Array(items)) => CandidateBatch::Items(items.iter().map(RawCandidate::from_value).collect()),
        Ok(_) => CandidateBatch::NotAnArray,
        Err(e) => CandidateBatch::ParseError(e.to_string()),
    }
}
