use thiserror::Error;
use tracing::{debug, warn};

use super::dto::{AdzunaJob, AdzunaResponse, Job};
use crate::config::JobsConfig;

const DEFAULT_CURRENCY: &str = "GBP";

#[derive(Debug, Error)]
pub enum JobsError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Adzuna returned status {status}: {body}")]
    Status { status: u16, body: String },
}

// The request URL carries the app key in its query string.
impl From<reqwest::Error> for JobsError {
    fn from(e: reqwest::Error) -> Self {
        JobsError::Http(e.without_url())
    }
}

/// Thin client over the Adzuna search endpoint.
#[derive(Clone)]
pub struct JobSearchClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    app_key: String,
    country: String,
    results_per_page: u32,
}

impl JobSearchClient {
    /// `None` when the Adzuna credentials are not configured.
    pub fn from_config(http: reqwest::Client, cfg: &JobsConfig) -> Option<Self> {
        Some(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            app_id: cfg.app_id.clone()?,
            app_key: cfg.app_key.clone()?,
            country: cfg.country.clone(),
            results_per_page: cfg.results_per_page,
        })
    }

    pub async fn search(&self, keywords: &str, location: &str) -> Result<Vec<Job>, JobsError> {
        let url = format!("{}/{}/search/1", self.base_url, self.country);
        let per_page = self.results_per_page.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("app_id", self.app_id.as_str()),
                ("app_key", self.app_key.as_str()),
                ("results_per_page", per_page.as_str()),
                ("what", keywords),
                ("where", location),
                ("content-type", "application/json"),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, "adzuna search failed");
            return Err(JobsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: AdzunaResponse = res.json().await?;
        debug!(count = payload.results.len(), "adzuna search ok");
        Ok(payload.results.into_iter().map(normalize).collect())
    }
}

fn normalize(raw: AdzunaJob) -> Job {
    let salary = format_salary(
        raw.salary_min,
        raw.salary_max,
        raw.salary_currency.as_deref(),
    );
    Job {
        id: raw.id,
        title: raw.title,
        company: raw.company.and_then(|c| c.display_name),
        location: raw.location.and_then(|l| l.display_name),
        description: raw.description,
        salary,
        contract_type: raw.contract_type,
        created: raw.created,
        redirect_url: raw.redirect_url,
    }
}

/// Human readable salary range; zero counts as missing.
pub fn format_salary(min: Option<f64>, max: Option<f64>, currency: Option<&str>) -> Option<String> {
    let min = min.filter(|v| *v != 0.0);
    let max = max.filter(|v| *v != 0.0);
    if min.is_none() && max.is_none() {
        return None;
    }

    let low = min.unwrap_or(0.0);
    let high = max.unwrap_or(low);
    let currency = currency.unwrap_or(DEFAULT_CURRENCY);

    if group_thousands(low) == group_thousands(high) {
        Some(format!("{} {}", currency, group_thousands(low)))
    } else {
        Some(format!(
            "{} {} - {}",
            currency,
            group_thousands(low),
            group_thousands(high)
        ))
    }
}

fn group_thousands(amount: f64) -> String {
    let n = amount.round() as i64;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}
