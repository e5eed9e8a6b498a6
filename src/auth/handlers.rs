use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MeResponse, MessageResponse, PublicUser, SignupRequest},
        extractors::CurrentUser,
        services,
        session::SessionKeys,
    },
    error::{AppError, AppResult},
    state::AppState,
    users::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(get_me))
}

fn start_session(state: &AppState, jar: CookieJar, user: &User) -> AppResult<CookieJar> {
    let keys = SessionKeys::from_ref(state);
    let token = keys.sign(user.id)?;
    Ok(jar.add(keys.session_cookie(token)))
}

#[instrument(skip(state, jar, payload))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> AppResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let user = services::signup(&state, &payload).await?;
    let jar = start_session(&state, jar, &user)?;

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "User created successfully",
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let user = services::login(&state, &payload.email, &payload.password).await?;
    let jar = start_session(&state, jar, &user)?;

    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful",
            user: PublicUser::from(&user),
        }),
    ))
}

/// Always succeeds; clears the session cookie if the caller sent one.
#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let keys = SessionKeys::from_ref(&state);
    let had_session = jar.get(&keys.cookie_name).is_some();
    if had_session {
        info!("session cleared");
    }
    (
        jar.remove(keys.removal_cookie()),
        Json(MessageResponse {
            message: "Logged out successfully",
        }),
    )
}

#[instrument(skip(user))]
pub async fn get_me(user: Result<CurrentUser, AppError>) -> Response {
    match user {
        Ok(CurrentUser(user)) => Json(MeResponse {
            user: Some(PublicUser::from(&user)),
        })
        .into_response(),
        Err(AppError::Unauthorized) => {
            (StatusCode::UNAUTHORIZED, Json(MeResponse { user: None })).into_response()
        }
        Err(e) => e.into_response(),
    }
}
