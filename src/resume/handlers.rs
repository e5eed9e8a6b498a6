use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{instrument, warn};

use super::services::{self, ResumeUpload};
use crate::{
    auth::extractors::CurrentUser,
    error::{AppError, AppResult},
    profile::dto::ProfileView,
    state::AppState,
};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024; // 10MB

#[derive(Debug, Serialize)]
pub struct ResumeResponse {
    pub message: &'static str,
    pub user: ProfileView,
}

pub fn resume_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/upload-resume",
            post(upload_resume)
                .delete(delete_resume)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/resume", get(download_resume))
}

/// POST /upload-resume (multipart, field `resume`)
#[instrument(skip_all)]
pub async fn upload_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut mp: Multipart,
) -> AppResult<Json<ResumeResponse>> {
    let mut file: Option<ResumeUpload> = None;
    loop {
        let field = match mp.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "malformed multipart body");
                return Err(AppError::validation("Malformed upload"));
            }
        };
        if field.name() != Some("resume") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let body = field.bytes().await.map_err(|e| {
            warn!(error = %e, "failed reading resume field");
            AppError::validation("Malformed upload")
        })?;
        file = Some(ResumeUpload { filename, body });
        break;
    }

    let file = file.ok_or_else(|| AppError::validation("No file part"))?;
    let updated = services::upload(&state, &user, file).await?;

    Ok(Json(ResumeResponse {
        message: "Resume uploaded successfully",
        user: ProfileView::from(&updated),
    }))
}

#[instrument(skip_all)]
pub async fn delete_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ResumeResponse>> {
    let updated = services::delete(&state, &user).await?;
    Ok(Json(ResumeResponse {
        message: "Resume deleted successfully",
        user: ProfileView::from(&updated),
    }))
}

/// 307 to a short-lived presigned URL of the current resume.
#[instrument(skip_all)]
pub async fn download_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Redirect> {
    let url = services::presigned_url(&state, &user).await?;
    Ok(Redirect::temporary(&url))
}
