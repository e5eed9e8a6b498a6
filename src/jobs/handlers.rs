use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    client::JobSearchClient,
    dto::{Job, SearchQuery},
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

const DEFAULT_KEYWORDS: &str = "developer";
const DEFAULT_LOCATION: &str = "new york";

pub fn jobs_routes() -> Router<AppState> {
    Router::new().route("/jobs", get(search_jobs))
}

fn or_default<'a>(v: &'a Option<String>, default: &'a str) -> &'a str {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
}

#[instrument(skip(state))]
pub async fn search_jobs(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> AppResult<Json<Vec<Job>>> {
    let client = JobSearchClient::from_config(state.http.clone(), &state.config.jobs)
        .ok_or(AppError::NotConfigured("Adzuna API credentials not configured"))?;

    let keywords = or_default(&q.keywords, DEFAULT_KEYWORDS);
    let location = or_default(&q.location, DEFAULT_LOCATION);

    let jobs = client
        .search(keywords, location)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    info!(keywords, location, count = jobs.len(), "job search");
    Ok(Json(jobs))
}
