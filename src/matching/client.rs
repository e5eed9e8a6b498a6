//! Resume/job match scoring over an OpenAI-compatible chat-completions API.
//!
//! Every call goes through [`MatchClient::analyze`], which never fails: any
//! transport, status or parse problem is logged and replaced by
//! [`MatchAnalysis::unavailable`].
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use super::dto::MatchAnalysis;
use crate::config::MatcherConfig;

const MAX_ATTEMPTS: u32 = 2;
const TEMPERATURE: f32 = 0.7;
const MAX_ITEMS: usize = 3;

const SYSTEM_PROMPT: &str = "You are a professional career advisor. Analyze how well this resume \
matches the job description and provide: 1. Match percentage (0-100) 2. 3 key strengths \
3. 3 improvement areas 4. 3 suggestions. Return as JSON with: score, strengths, improvements, \
suggestions";

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("completion returned no content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Shape the model is asked to produce. Kept loose: scores show up as
/// numbers, numeric strings or "85%".
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAnalysis {
    score: serde_json::Value,
    strengths: Vec<String>,
    improvements: Vec<String>,
    suggestions: Vec<String>,
}

#[derive(Clone)]
pub struct MatchClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl MatchClient {
    /// `None` when no API key is configured.
    pub fn from_config(http: reqwest::Client, cfg: &MatcherConfig) -> Option<Self> {
        Some(Self {
            http,
            api_key: cfg.api_key.clone()?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
        })
    }

    pub async fn analyze(&self, resume_text: &str, job_description: &str) -> MatchAnalysis {
        match self.try_analyze(resume_text, job_description).await {
            Ok(analysis) => analysis,
            Err(e) => {
                error!(error = %e, "match analysis failed");
                MatchAnalysis::unavailable()
            }
        }
    }

    async fn try_analyze(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<MatchAnalysis, MatchError> {
        let prompt = format!(
            "JOB DESCRIPTION:\n{job_description}\n\nRESUME CONTENT:\n{resume_text}"
        );
        let content = self.complete(&prompt).await?;
        let raw: RawAnalysis = serde_json::from_str(strip_json_fences(&content))?;
        Ok(normalize(raw))
    }

    /// Retries once on 429 and 5xx.
    async fn complete(&self, prompt: &str) -> Result<String, MatchError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: TEMPERATURE,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };
        let url = format!("{}/chat/completions", self.base_url);

        let mut last_error = MatchError::EmptyContent;
        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                warn!(attempt, error = %last_error, "retrying completion");
                tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
            }

            let res = match self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = MatchError::Http(e);
                    continue;
                }
            };

            let status = res.status();
            if status.as_u16() == 429 || status.is_server_error() {
                last_error = MatchError::Api {
                    status: status.as_u16(),
                    message: res.text().await.unwrap_or_default(),
                };
                continue;
            }
            if !status.is_success() {
                return Err(MatchError::Api {
                    status: status.as_u16(),
                    message: res.text().await.unwrap_or_default(),
                });
            }

            let parsed: ChatResponse = res.json().await?;
            debug!(choices = parsed.choices.len(), "completion received");
            return parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|c| !c.trim().is_empty())
                .ok_or(MatchError::EmptyContent);
        }

        Err(last_error)
    }
}

fn parse_score(v: &serde_json::Value) -> f64 {
    match v {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn normalize(raw: RawAnalysis) -> MatchAnalysis {
    let score = parse_score(&raw.score);
    let score = if score.is_finite() { score.clamp(0.0, 100.0) } else { 0.0 };
    let take = |v: Vec<String>| v.into_iter().take(MAX_ITEMS).collect::<Vec<_>>();

    MatchAnalysis {
        score: score.round() as u8,
        strengths: take(raw.strengths),
        improvements: take(raw.improvements),
        suggestions: take(raw.suggestions),
    }
}

/// Strips ```json ... ``` or ``` ... ``` fences some models wrap JSON in.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(rest) => rest.trim().strip_suffix("```").unwrap_or(rest).trim(),
        None => text,
    }
}
