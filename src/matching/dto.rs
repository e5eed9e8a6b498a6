use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchAnalysis {
    pub score: u8, // 0..=100
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub suggestions: Vec<String>,
}

impl MatchAnalysis {
    /// Returned when the completion API cannot produce a usable answer.
    pub fn unavailable() -> Self {
        Self {
            score: 0,
            strengths: Vec::new(),
            improvements: vec!["AI analysis unavailable. Please try later.".to_string()],
            suggestions: Vec::new(),
        }
    }
}
