use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{ProfileResponse, ProfileUpdateRequest, ProfileView},
    services,
};
use crate::{
    auth::extractors::CurrentUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(put_profile))
}

#[instrument(skip_all)]
pub async fn get_profile(CurrentUser(user): CurrentUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        message: None,
        user: Some(ProfileView::from(&user)),
    })
}

#[instrument(skip_all)]
pub async fn put_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> AppResult<Json<ProfileResponse>> {
    let Json(body) = body?;
    if body.is_password_change() {
        let (Some(current), Some(new)) = (&body.current_password, &body.new_password) else {
            return Err(AppError::validation(
                "current_password and new_password are required",
            ));
        };
        services::change_password(&state, &user, current, new).await?;
        return Ok(Json(ProfileResponse {
            message: Some("Password updated successfully"),
            user: None,
        }));
    }

    let updated = services::update_profile(
        &state,
        &user,
        body.first_name.as_deref(),
        body.last_name.as_deref(),
    )
    .await?;

    Ok(Json(ProfileResponse {
        message: Some("Profile updated successfully"),
        user: Some(ProfileView::from(&updated)),
    }))
}
