use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    client::MatchClient,
    dto::{MatchAnalysis, MatchRequest},
};
use crate::{
    auth::extractors::CurrentUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn match_routes() -> Router<AppState> {
    Router::new().route("/match", post(analyze_match))
}

#[instrument(skip_all)]
pub async fn analyze_match(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<MatchRequest>, JsonRejection>,
) -> AppResult<Json<MatchAnalysis>> {
    let Json(body) = body?;
    if body.resume_text.trim().is_empty() || body.job_description.trim().is_empty() {
        return Err(AppError::validation(
            "resume_text and job_description are required",
        ));
    }

    let client = MatchClient::from_config(state.http.clone(), &state.config.matcher)
        .ok_or(AppError::NotConfigured("AI matching not configured"))?;

    let analysis = client.analyze(&body.resume_text, &body.job_description).await;
    info!(user_id = %user.id, score = analysis.score, "match analyzed");
    Ok(Json(analysis))
}
